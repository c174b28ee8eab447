//! Download events and run reports.

use std::path::{Path, PathBuf};

use crate::error::UpdateError;
use crate::manifest::UpdateRecord;

/// Something that happened to one record during a run.
#[derive(Debug)]
pub enum DownloadEvent<'a> {
    /// A download is about to start. `replacing` is set when an existing
    /// file is being overwritten.
    Starting {
        record: &'a UpdateRecord,
        path: &'a Path,
        replacing: bool,
    },
    /// The package was downloaded and its size verified.
    Completed {
        record: &'a UpdateRecord,
        path: &'a Path,
        bytes: u64,
    },
    /// The file already existed and was kept.
    Skipped {
        record: &'a UpdateRecord,
        path: &'a Path,
    },
    /// The download failed.
    Failed {
        record: &'a UpdateRecord,
        path: &'a Path,
        error: &'a UpdateError,
    },
}

/// Receives download events as they happen.
pub trait DownloadObserver {
    fn on_event(&mut self, event: DownloadEvent<'_>);
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl DownloadObserver for NullObserver {
    fn on_event(&mut self, _event: DownloadEvent<'_>) {}
}

/// A record whose download failed while failures were being collected.
#[derive(Debug)]
pub struct FailedDownload {
    pub record: UpdateRecord,
    pub path: PathBuf,
    pub error: UpdateError,
}

/// Outcome of one orchestration run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Files downloaded and verified, in order.
    pub downloaded: Vec<PathBuf>,
    /// Existing files that were kept.
    pub skipped: Vec<PathBuf>,
    /// Per-package failures. Only populated when failures are isolated.
    pub failures: Vec<FailedDownload>,
    /// Verified bytes written across all downloads.
    pub bytes_downloaded: u64,
}

impl RunReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Number of integrity (size mismatch) failures.
    pub fn integrity_failures(&self) -> usize {
        self.failures
            .iter()
            .filter(|f| matches!(f.error, UpdateError::Integrity { .. }))
            .count()
    }
}
