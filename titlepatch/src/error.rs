//! Error types for title update retrieval.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for update operations.
pub type UpdateResult<T> = Result<T, UpdateError>;

/// Errors that can occur while validating, fetching, parsing or downloading.
///
/// Every variant is fatal to a run unless the caller opts into
/// `continue_on_error`, in which case per-package `Transport` and
/// `Integrity` failures are collected into the run report instead.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// The identifier does not have the `AAAA00000` shape.
    #[error("invalid title id '{input}': {reason}")]
    Format { input: String, reason: String },

    /// The identifier is well formed but its prefix is not a known region code.
    #[error("unsupported title id '{title_id}': prefix '{prefix}' is not a known platform/region code")]
    UnsupportedIdentifier { title_id: String, prefix: String },

    /// The manifest could not be retrieved.
    ///
    /// The endpoint answers unknown titles the same way it answers outages,
    /// so both end up here; `reason` says which one was observed.
    #[error("failed to fetch update manifest for {title_id}: {reason}")]
    Fetch {
        title_id: String,
        reason: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// The manifest was retrieved but is not a usable document.
    #[error("failed to parse update manifest for {title_id}: {reason}")]
    Parse { title_id: String, reason: String },

    /// The package download failed before the payload was fully received.
    #[error("failed to download {url}: {reason}")]
    Transport {
        url: String,
        reason: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// The downloaded file does not have the size the manifest announced.
    ///
    /// Size is the only integrity signal the endpoint provides. A payload that
    /// is corrupted without changing its length passes this check.
    #[error("size mismatch for {}: expected {expected} bytes, got {actual} bytes", path.display())]
    Integrity {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    /// A local file or directory operation failed.
    #[error("{operation} failed on {}", path.display())]
    Filesystem {
        path: PathBuf,
        operation: &'static str,
        #[source]
        source: io::Error,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl UpdateError {
    /// Short stable name for the error kind, used in logs and reports.
    pub fn category(&self) -> &'static str {
        match self {
            UpdateError::Format { .. } => "format",
            UpdateError::UnsupportedIdentifier { .. } => "unsupported_identifier",
            UpdateError::Fetch { .. } => "fetch",
            UpdateError::Parse { .. } => "parse",
            UpdateError::Transport { .. } => "transport",
            UpdateError::Integrity { .. } => "integrity",
            UpdateError::Filesystem { .. } => "filesystem",
            UpdateError::Config(_) => "config",
        }
    }

    /// Whether the failure concerns a single package and can be isolated
    /// from the rest of a batch.
    pub fn is_per_package(&self) -> bool {
        matches!(
            self,
            UpdateError::Transport { .. } | UpdateError::Integrity { .. }
        )
    }

    pub(crate) fn filesystem(
        path: impl Into<PathBuf>,
        operation: &'static str,
        source: io::Error,
    ) -> Self {
        UpdateError::Filesystem {
            path: path.into(),
            operation,
            source,
        }
    }
}
