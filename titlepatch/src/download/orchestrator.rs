//! Sequential download orchestration.
//!
//! Records are handled one at a time in manifest order. A record whose target
//! file is missing is always downloaded; an existing file goes through the
//! run's `OverwriteState`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::events::{DownloadEvent, DownloadObserver, FailedDownload, RunReport};
use super::http::PackageDownloader;
use super::policy::{OverwriteDecision, OverwritePolicy, OverwritePrompt, OverwriteState};
use crate::error::{UpdateError, UpdateResult};
use crate::manifest::UpdateRecord;

/// Drives the downloads for a list of records.
pub struct DownloadOrchestrator<'a> {
    downloader: &'a dyn PackageDownloader,
    target_dir: PathBuf,
    continue_on_error: bool,
}

impl<'a> DownloadOrchestrator<'a> {
    /// Create an orchestrator that downloads into `target_dir`.
    pub fn new(downloader: &'a dyn PackageDownloader, target_dir: impl Into<PathBuf>) -> Self {
        Self {
            downloader,
            target_dir: target_dir.into(),
            continue_on_error: false,
        }
    }

    /// Collect per-package transport/integrity failures in the report instead
    /// of aborting on the first one.
    pub fn with_continue_on_error(mut self, keep_going: bool) -> Self {
        self.continue_on_error = keep_going;
        self
    }

    /// Local path a record downloads to.
    pub fn target_path(&self, record: &UpdateRecord) -> UpdateResult<PathBuf> {
        let filename = record.filename().ok_or_else(|| UpdateError::Parse {
            title_id: record.title_id.clone(),
            reason: format!("package URL '{}' does not name a file", record.url),
        })?;
        Ok(self.target_dir.join(filename))
    }

    /// Process `records` in order.
    ///
    /// `policy` is the starting overwrite policy; `prompt` is only consulted
    /// while it is `AskEachTime`.
    ///
    /// # Errors
    ///
    /// The first failure aborts the run, unless failures are being collected,
    /// in which case only non per-package errors (e.g. the target directory
    /// cannot be created) abort it.
    pub fn run(
        &self,
        records: &[UpdateRecord],
        policy: OverwritePolicy,
        prompt: &mut dyn OverwritePrompt,
        observer: &mut dyn DownloadObserver,
    ) -> UpdateResult<RunReport> {
        fs::create_dir_all(&self.target_dir)
            .map_err(|e| UpdateError::filesystem(&self.target_dir, "create directory", e))?;

        let mut state = OverwriteState::new(policy);
        let mut report = RunReport::default();

        for record in records {
            let path = self.target_path(record)?;
            let exists = path.exists();

            if exists {
                match state.decide(record, &path, prompt) {
                    OverwriteDecision::Skip => {
                        debug!(path = %path.display(), "keeping existing file");
                        observer.on_event(DownloadEvent::Skipped {
                            record,
                            path: &path,
                        });
                        report.skipped.push(path);
                        continue;
                    }
                    OverwriteDecision::Download => {
                        debug!(
                            path = %path.display(),
                            policy = %state.policy(),
                            "replacing existing file"
                        );
                    }
                }
            }

            info!(
                title = %record.title,
                version = %record.version,
                title_id = %record.title_id,
                size = %record.size_mb(),
                "dispatching download"
            );
            observer.on_event(DownloadEvent::Starting {
                record,
                path: &path,
                replacing: exists,
            });

            match self.downloader.download(&record.url, &path, record.size_bytes) {
                Ok(bytes) => {
                    observer.on_event(DownloadEvent::Completed {
                        record,
                        path: &path,
                        bytes,
                    });
                    report.bytes_downloaded += bytes;
                    report.downloaded.push(path);
                }
                Err(error) => {
                    observer.on_event(DownloadEvent::Failed {
                        record,
                        path: &path,
                        error: &error,
                    });
                    if !(self.continue_on_error && error.is_per_package()) {
                        return Err(error);
                    }
                    warn!(path = %path.display(), error = %error, "download failed, continuing");
                    report.failures.push(FailedDownload {
                        record: record.clone(),
                        path,
                        error,
                    });
                }
            }
        }

        info!(
            downloaded = report.downloaded.len(),
            skipped = report.skipped.len(),
            failed = report.failures.len(),
            "download run finished"
        );
        Ok(report)
    }
}
