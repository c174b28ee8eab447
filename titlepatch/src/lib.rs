//! titlepatch - PS3 title update retrieval
//!
//! This library looks up the official update manifest for a PS3 title,
//! turns it into a list of update packages and downloads them into a local
//! directory.
//!
//! # Architecture
//!
//! ```text
//! raw id ──► identifier::TitleId ──► manifest::ManifestSource ──► manifest::parse_manifest
//!                                                                        │
//!                                                                        ▼
//!                         download::DownloadOrchestrator ◄── manifest::PackageSelection
//!                                  │
//!                     ┌────────────┼──────────────┐
//!                     ▼            ▼              ▼
//!             OverwritePrompt  PackageDownloader  DownloadObserver
//! ```
//!
//! `pipeline::TitleUpdater` wires these together for the common case.

pub mod config;
pub mod download;
pub mod error;
pub mod identifier;
pub mod logging;
pub mod manifest;
pub mod pipeline;

mod transport;

pub use config::{ConfigFile, UpdaterConfig};
pub use error::{UpdateError, UpdateResult};
pub use identifier::TitleId;
pub use manifest::{Manifest, PackageSelection, UpdateRecord};
pub use pipeline::TitleUpdater;
