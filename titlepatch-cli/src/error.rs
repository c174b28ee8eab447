//! CLI error type.

use std::fmt;
use std::path::PathBuf;

use titlepatch::UpdateError;

/// Errors surfaced to the user by the `titlepatch` binary.
#[derive(Debug)]
pub enum CliError {
    /// The update pipeline failed.
    Update(UpdateError),
    /// The configuration file could not be used.
    Config(String),
    /// Some packages failed while `--keep-going` was set.
    PartialFailure { failed: usize, total: usize },
    /// The log directory could not be prepared.
    Logging { dir: PathBuf, reason: String },
}

impl CliError {
    /// Short category label shown before the message.
    pub fn label(&self) -> &'static str {
        match self {
            CliError::Update(e) => e.category(),
            CliError::Config(_) => "config",
            CliError::PartialFailure { .. } => "download",
            CliError::Logging { .. } => "logging",
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Update(e) => write!(f, "{}", e),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::PartialFailure { failed, total } => {
                write!(f, "{} of {} packages failed to download", failed, total)
            }
            CliError::Logging { dir, reason } => {
                write!(f, "Failed to set up logging in {}: {}", dir.display(), reason)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Update(e) => std::error::Error::source(e),
            _ => None,
        }
    }
}

impl From<UpdateError> for CliError {
    fn from(e: UpdateError) -> Self {
        CliError::Update(e)
    }
}
