//! HTTP package downloader.
//!
//! Streams a package straight to its target file, then checks the size on
//! disk against the size the manifest announced.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use reqwest::blocking::Client;
use tracing::{debug, info, warn};

use super::verify::{discard_corrupt, verify_size};
use crate::config::UpdaterConfig;
use crate::error::{UpdateError, UpdateResult};
use crate::transport::build_client;

/// Buffer size for reading/writing during downloads (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Downloads one package to a local file.
pub trait PackageDownloader {
    /// Download `url` into `dest`, replacing any existing file, and verify
    /// that exactly `expected_size` bytes landed on disk.
    ///
    /// Returns the verified size.
    ///
    /// # Errors
    ///
    /// - `UpdateError::Transport` if the request fails or the stream breaks.
    /// - `UpdateError::Integrity` if the file size differs from `expected_size`.
    /// - `UpdateError::Filesystem` if the target file cannot be created.
    fn download(&self, url: &str, dest: &Path, expected_size: u64) -> UpdateResult<u64>;
}

/// Blocking HTTP implementation of `PackageDownloader`.
#[derive(Debug)]
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    /// Create a downloader using the transport settings in `config`.
    pub fn new(config: &UpdaterConfig) -> UpdateResult<Self> {
        Ok(Self {
            client: build_client(config)?,
        })
    }

    /// Stream the response body into `dest`.
    ///
    /// A broken stream removes the partial file and is a transport error.
    /// Local write failures only stop the copy; the size check afterwards
    /// reports them as an integrity failure.
    fn stream_to_file(&self, url: &str, dest: &Path) -> UpdateResult<u64> {
        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|e| UpdateError::Transport {
                url: url.to_string(),
                reason: "request failed".to_string(),
                source: Some(e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpdateError::Transport {
                url: url.to_string(),
                reason: format!("server returned HTTP {}", status),
                source: None,
            });
        }

        let file =
            File::create(dest).map_err(|e| UpdateError::filesystem(dest, "create file", e))?;
        let mut writer = BufWriter::new(file);
        let copied = copy_body(&mut response, &mut writer, dest);

        if let Err(e) = writer.flush() {
            warn!(path = %dest.display(), error = %e, "flush failed");
        }
        drop(writer);

        copied.map_err(|e| {
            discard_corrupt(dest);
            UpdateError::Transport {
                url: url.to_string(),
                reason: format!("stream interrupted: {}", e),
                source: None,
            }
        })
    }
}

/// Copy `body` into `writer` in `BUFFER_SIZE` chunks.
///
/// Read errors are returned. A write error stops the copy and the bytes
/// written so far are returned as success.
fn copy_body<R: Read, W: Write>(body: &mut R, writer: &mut W, dest: &Path) -> io::Result<u64> {
    let mut buffer = vec![0u8; BUFFER_SIZE];
    let mut written: u64 = 0;

    loop {
        let bytes_read = match body.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!(path = %dest.display(), bytes = written, error = %e, "stream interrupted");
                return Err(e);
            }
        };

        if let Err(e) = writer.write_all(&buffer[..bytes_read]) {
            warn!(path = %dest.display(), error = %e, "write failed, stopping download");
            break;
        }
        written += bytes_read as u64;
    }

    Ok(written)
}

impl PackageDownloader for HttpDownloader {
    fn download(&self, url: &str, dest: &Path, expected_size: u64) -> UpdateResult<u64> {
        info!(url = %url, dest = %dest.display(), expected = expected_size, "downloading package");

        let streamed = self.stream_to_file(url, dest)?;
        debug!(url = %url, bytes = streamed, "stream finished");

        match verify_size(dest, expected_size) {
            Ok(size) => {
                info!(path = %dest.display(), bytes = size, "package verified");
                Ok(size)
            }
            Err(err @ UpdateError::Integrity { .. }) => {
                discard_corrupt(dest);
                Err(err)
            }
            Err(other) => Err(other),
        }
    }
}
