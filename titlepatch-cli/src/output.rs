//! Console output for manifests and download progress.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use titlepatch::download::{DownloadEvent, DownloadObserver, RunReport};
use titlepatch::manifest::format_size_mb;
use titlepatch::Manifest;

/// Print the package list of a manifest.
pub fn print_manifest(manifest: &Manifest) {
    let title = manifest
        .records
        .iter()
        .map(|r| r.title.as_str())
        .find(|t| !t.is_empty())
        .unwrap_or("(untitled)");

    println!(
        "{} [{}]",
        style(title).bold(),
        style(&manifest.title_id).cyan()
    );
    println!(
        "{} package(s), {} total",
        manifest.records.len(),
        format_size_mb(manifest.total_size())
    );
    println!();

    for record in &manifest.records {
        println!(
            "  v{:<6} {:>12}  fw {:<8} {}",
            record.version,
            record.size_mb(),
            record.system_version,
            record.filename().unwrap_or(&record.url)
        );
    }
    println!();
}

/// Print the outcome of a download run.
pub fn print_summary(report: &RunReport) {
    println!();
    println!(
        "{} downloaded ({}), {} skipped",
        report.downloaded.len(),
        format_size_mb(report.bytes_downloaded),
        report.skipped.len()
    );

    for failure in &report.failures {
        println!(
            "  {} v{}: {}",
            style("failed").red(),
            failure.record.version,
            failure.error
        );
    }
}

/// Observer that shows a spinner per download and a line per outcome.
#[derive(Default)]
pub struct ConsoleObserver {
    spinner: Option<ProgressBar>,
}

impl ConsoleObserver {
    pub fn new() -> Self {
        Self::default()
    }

    fn clear_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

impl DownloadObserver for ConsoleObserver {
    fn on_event(&mut self, event: DownloadEvent<'_>) {
        match event {
            DownloadEvent::Starting {
                record, replacing, ..
            } => {
                self.clear_spinner();
                let spinner = ProgressBar::new_spinner();
                spinner.set_style(
                    ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                let verb = if replacing { "Replacing" } else { "Downloading" };
                spinner.set_message(format!("{} {}", verb, record));
                spinner.enable_steady_tick(Duration::from_millis(120));
                self.spinner = Some(spinner);
            }
            DownloadEvent::Completed { path, bytes, .. } => {
                self.clear_spinner();
                println!(
                    "{} {} ({})",
                    style("✓").green(),
                    path.display(),
                    format_size_mb(bytes)
                );
            }
            DownloadEvent::Skipped { path, .. } => {
                self.clear_spinner();
                println!("{} {} (kept existing file)", style("-").dim(), path.display());
            }
            DownloadEvent::Failed { path, error, .. } => {
                self.clear_spinner();
                eprintln!("{} {}: {}", style("✗").red(), path.display(), error);
            }
        }
    }
}

impl Drop for ConsoleObserver {
    fn drop(&mut self) {
        self.clear_spinner();
    }
}
