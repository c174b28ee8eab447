//! Package downloads.
//!
//! - `policy`: overwrite policy state machine and prompts
//! - `http`: streaming HTTP downloader (`PackageDownloader`)
//! - `verify`: byte-size verification
//! - `orchestrator`: sequential per-record download driver
//! - `events`: observer events and run reports
//!
//! # Architecture
//!
//! ```text
//! DownloadOrchestrator
//!         │
//!         ├── OverwriteState ── OverwritePrompt (trait)
//!         │                         ├── LinePrompt (console)
//!         │                         └── ScriptedPrompt
//!         │
//!         ├── PackageDownloader (trait)
//!         │       └── HttpDownloader ── verify_size
//!         │
//!         └── DownloadObserver (trait)
//! ```

mod events;
mod http;
mod orchestrator;
mod policy;
mod verify;

pub use events::{DownloadEvent, DownloadObserver, FailedDownload, NullObserver, RunReport};
pub use http::{HttpDownloader, PackageDownloader};
pub use orchestrator::DownloadOrchestrator;
pub use policy::{
    LinePrompt, OverwriteAnswer, OverwriteDecision, OverwritePolicy, OverwritePrompt,
    ScriptedPrompt,
};
pub use verify::verify_size;
