//! titlepatch command-line interface.

mod error;
mod output;

use std::error::Error as _;
use std::io;
use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use console::style;
use titlepatch::config::config_dir;
use titlepatch::download::{LinePrompt, OverwritePolicy};
use titlepatch::logging::init_logging;
use titlepatch::{ConfigFile, PackageSelection, TitleUpdater, UpdaterConfig};

use error::CliError;
use output::ConsoleObserver;

/// Overwrite behaviour for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
enum OverwriteArg {
    /// Ask before replacing each existing file
    Ask,
    /// Replace existing files without asking
    All,
    /// Keep existing files
    Skip,
}

impl From<OverwriteArg> for OverwritePolicy {
    fn from(arg: OverwriteArg) -> Self {
        match arg {
            OverwriteArg::Ask => OverwritePolicy::AskEachTime,
            OverwriteArg::All => OverwritePolicy::OverwriteAll,
            OverwriteArg::Skip => OverwritePolicy::SkipExisting,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "titlepatch")]
#[command(version, about = "Fetch and download PS3 title update packages", long_about = None)]
struct Cli {
    /// Title id of the game, e.g. BLUS30443
    title_id: String,

    /// Directory to download packages into [default: ~/PS3 Updates]
    #[arg(short = 'd', long, value_name = "DIR")]
    target_dir: Option<PathBuf>,

    /// What to do when a package file already exists
    #[arg(short, long, value_enum)]
    overwrite: Option<OverwriteArg>,

    /// Only download the newest package
    #[arg(long, conflicts_with = "pkg_version")]
    latest: bool,

    /// Only download the package with this version, e.g. 01.02
    #[arg(long, value_name = "VERSION")]
    pkg_version: Option<String>,

    /// List the available packages without downloading
    #[arg(short, long)]
    list: bool,

    /// Skip TLS certificate validation
    #[arg(long)]
    accept_invalid_certs: bool,

    /// Keep downloading remaining packages after a failed one
    #[arg(short = 'k', long)]
    keep_going: bool,

    /// Manifest URL template containing {title_id}
    #[arg(long, value_name = "TEMPLATE")]
    manifest_url: Option<String>,

    /// Config file to use instead of ~/.titlepatch/config.ini
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug output on stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn selection(&self) -> PackageSelection {
        match (&self.pkg_version, self.latest) {
            (Some(version), _) => PackageSelection::Version(version.clone()),
            (None, true) => PackageSelection::Latest,
            (None, false) => PackageSelection::All,
        }
    }
}

/// Layer CLI arguments over config file values over defaults.
fn build_config(cli: &Cli, file: &ConfigFile) -> UpdaterConfig {
    let mut config = file.apply(UpdaterConfig::default());

    if let Some(ref dir) = cli.target_dir {
        config = config.with_target_dir(dir.clone());
    }
    if let Some(overwrite) = cli.overwrite {
        config = config.with_overwrite_policy(overwrite.into());
    }
    if let Some(ref template) = cli.manifest_url {
        config = config.with_manifest_url_template(template.clone());
    }
    if cli.accept_invalid_certs {
        config = config.with_accept_invalid_certs(true);
    }
    if cli.keep_going {
        config = config.with_continue_on_error(true);
    }
    config
}

/// Initialise logging, run the update and report any error.
///
/// Returns `false` when the run failed.
fn run(cli: &Cli) -> bool {
    let log_dir = config_dir();
    let log_guard = match init_logging(&log_dir, cli.verbose) {
        Ok(guard) => guard,
        Err(e) => {
            report_error(&CliError::Logging {
                dir: log_dir,
                reason: e.to_string(),
            });
            return false;
        }
    };

    match update(cli) {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(error = %e, "run failed");
            report_error(&e);
            eprintln!("  log: {}", log_guard.log_path().display());
            false
        }
    }
}

fn update(cli: &Cli) -> Result<(), CliError> {
    let file = match cli.config {
        Some(ref path) => ConfigFile::load_from(path),
        None => ConfigFile::load(),
    }
    .map_err(|e| CliError::Config(e.to_string()))?;

    let config = build_config(cli, &file);
    tracing::debug!(config = ?config, "effective configuration");
    let updater = TitleUpdater::new(config)?;

    let manifest = updater.fetch_manifest(&cli.title_id)?;
    output::print_manifest(&manifest);

    if cli.list {
        return Ok(());
    }
    if manifest.is_empty() {
        println!("No update packages are published for {}.", manifest.title_id);
        return Ok(());
    }

    println!("Downloading to {}", updater.config().target_dir.display());

    let stdin = io::stdin();
    let mut prompt = LinePrompt::new(stdin.lock(), io::stdout());
    let mut observer = ConsoleObserver::new();
    let report = updater.download(&manifest, &cli.selection(), &mut prompt, &mut observer)?;
    drop(observer);

    output::print_summary(&report);

    if report.has_failures() {
        return Err(CliError::PartialFailure {
            failed: report.failures.len(),
            total: report.failures.len() + report.downloaded.len() + report.skipped.len(),
        });
    }
    Ok(())
}

/// Print `error` and its cause chain to stderr.
fn report_error(error: &CliError) {
    eprintln!(
        "{} {}",
        style(format!("error[{}]:", error.label())).red().bold(),
        error
    );
    let mut source = error.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {}", cause);
        source = cause.source();
    }
}

fn main() {
    let cli = Cli::parse();

    if !run(&cli) {
        process::exit(1);
    }
}
