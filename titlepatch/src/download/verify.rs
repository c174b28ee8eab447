//! Size verification for downloaded packages.
//!
//! The manifest only carries a byte size we can rely on, so a download is
//! accepted when the file on disk has exactly that many bytes. This does not
//! detect corruption that preserves length.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{UpdateError, UpdateResult};

/// Check that the file at `path` is exactly `expected` bytes long.
///
/// Returns the actual size on success. A missing file counts as 0 bytes.
pub fn verify_size(path: &Path, expected: u64) -> UpdateResult<u64> {
    let actual = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
        Err(e) => return Err(UpdateError::filesystem(path, "read metadata", e)),
    };

    if actual != expected {
        return Err(UpdateError::Integrity {
            path: path.to_path_buf(),
            expected,
            actual,
        });
    }

    debug!(path = %path.display(), bytes = actual, "size verified");
    Ok(actual)
}

/// Remove a file that failed verification so it is not mistaken for a
/// complete download on the next run.
pub(crate) fn discard_corrupt(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => warn!(path = %path.display(), "removed incomplete download"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "could not remove incomplete download"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_exact_size_passes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("update.pkg");
        fs::write(&path, vec![0u8; 1000]).unwrap();

        assert_eq!(verify_size(&path, 1000).unwrap(), 1000);
    }

    #[test]
    fn test_short_file_is_integrity_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("update.pkg");
        fs::write(&path, vec![0u8; 999]).unwrap();

        match verify_size(&path, 1000) {
            Err(UpdateError::Integrity {
                expected, actual, ..
            }) => {
                assert_eq!(expected, 1000);
                assert_eq!(actual, 999);
            }
            other => panic!("expected Integrity error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_counts_as_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.pkg");

        assert!(matches!(
            verify_size(&path, 10),
            Err(UpdateError::Integrity { actual: 0, .. })
        ));
        assert_eq!(verify_size(&path, 0).unwrap(), 0);
    }

    #[test]
    fn test_discard_corrupt_removes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("update.pkg");
        fs::write(&path, b"partial").unwrap();

        discard_corrupt(&path);
        assert!(!path.exists());

        // Second call on a missing file is a no-op.
        discard_corrupt(&path);
    }
}
