//! Update manifests: fetching, parsing and package selection.
//!
//! - `fetch`: retrieve the manifest text for a title (`ManifestSource`)
//! - `parser`: turn manifest XML into `UpdateRecord`s
//! - `record`: the record type and size formatting
//! - `selection`: pick which records to download

mod fetch;
mod parser;
mod record;
mod selection;

pub use fetch::{HttpManifestFetcher, ManifestSource};
pub use parser::{parse_manifest, Manifest};
pub use record::{format_size_mb, url_filename, UpdateRecord};
pub use selection::PackageSelection;
