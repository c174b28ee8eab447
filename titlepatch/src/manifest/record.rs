//! Update records extracted from a manifest.

use std::fmt;

const BYTES_PER_MB: f64 = 1_048_576.0;

/// Format a byte count as megabytes with two decimals.
///
/// ```
/// use titlepatch::manifest::format_size_mb;
///
/// assert_eq!(format_size_mb(1_048_576), "1.00 MB");
/// assert_eq!(format_size_mb(1_572_864), "1.50 MB");
/// assert_eq!(format_size_mb(0), "0.00 MB");
/// ```
pub fn format_size_mb(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / BYTES_PER_MB)
}

/// Final `/`-delimited segment of a URL, used as the local file name.
///
/// Any query string or fragment is ignored. Returns `None` when the URL
/// names no file: it ends with `/`, or its last segment is `.` or `..`.
pub fn url_filename(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/')
        .next()
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
}

/// One downloadable update package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRecord {
    /// Title id the manifest was published for.
    pub title_id: String,
    /// Package version, e.g. `01.02`.
    pub version: String,
    /// Exact size of the package file in bytes.
    pub size_bytes: u64,
    /// Minimum system software version required to install the package.
    pub system_version: String,
    /// Where the package is downloaded from.
    pub url: String,
    /// Display title. May be empty when no package in the manifest had one.
    pub title: String,
}

impl UpdateRecord {
    pub fn new(
        title_id: impl Into<String>,
        version: impl Into<String>,
        size_bytes: u64,
        system_version: impl Into<String>,
        url: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            title_id: title_id.into(),
            version: version.into(),
            size_bytes,
            system_version: system_version.into(),
            url: url.into(),
            title: title.into(),
        }
    }

    /// Human readable size, e.g. `12.34 MB`.
    pub fn size_mb(&self) -> String {
        format_size_mb(self.size_bytes)
    }

    /// Local file name for this package.
    pub fn filename(&self) -> Option<&str> {
        url_filename(&self.url)
    }
}

impl fmt::Display for UpdateRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = if self.title.is_empty() {
            "(untitled)"
        } else {
            self.title.as_str()
        };
        write!(
            f,
            "{} v{} [{}] {}",
            title,
            self.version,
            self.title_id,
            self.size_mb()
        )
    }
}
