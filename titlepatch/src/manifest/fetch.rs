//! Manifest retrieval.

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use tracing::{debug, info};

use crate::config::UpdaterConfig;
use crate::error::{UpdateError, UpdateResult};
use crate::identifier::TitleId;
use crate::transport::build_client;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Something that can produce the manifest text for a title.
pub trait ManifestSource {
    /// Retrieve the manifest for `title_id` as UTF-8 text.
    fn fetch(&self, title_id: &TitleId) -> UpdateResult<String>;
}

/// Fetches manifests from the update endpoint over HTTP.
#[derive(Debug)]
pub struct HttpManifestFetcher {
    client: Client,
    config: UpdaterConfig,
}

impl HttpManifestFetcher {
    /// Create a fetcher for the endpoint described by `config`.
    pub fn new(config: &UpdaterConfig) -> UpdateResult<Self> {
        Ok(Self {
            client: build_client(config)?,
            config: config.clone(),
        })
    }
}

impl ManifestSource for HttpManifestFetcher {
    fn fetch(&self, title_id: &TitleId) -> UpdateResult<String> {
        let url = self.config.manifest_url(title_id);
        info!(title_id = %title_id, url = %url, "fetching update manifest");

        let fetch_error = |reason: String, source: Option<reqwest::Error>| UpdateError::Fetch {
            title_id: title_id.to_string(),
            reason,
            source,
        };

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "text/xml")
            .send()
            .map_err(|e| fetch_error(format!("network error contacting {}", url), Some(e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(fetch_error(
                "no update manifest exists for this title (HTTP 404)".to_string(),
                None,
            ));
        }
        if !status.is_success() {
            return Err(fetch_error(
                format!("update server returned HTTP {}", status),
                None,
            ));
        }

        let body = response.bytes().map_err(|e| {
            fetch_error(
                "connection dropped while reading manifest".to_string(),
                Some(e),
            )
        })?;
        debug!(title_id = %title_id, bytes = body.len(), "manifest received");

        decode_manifest(title_id, &body)
    }
}

/// Decode a manifest body as UTF-8.
///
/// An empty body is how the endpoint reports a title without updates.
pub(crate) fn decode_manifest(title_id: &TitleId, body: &[u8]) -> UpdateResult<String> {
    let body = body.strip_prefix(UTF8_BOM).unwrap_or(body);
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(UpdateError::Fetch {
            title_id: title_id.to_string(),
            reason: "no updates are published for this title (empty response)".to_string(),
            source: None,
        });
    }

    String::from_utf8(body.to_vec()).map_err(|e| UpdateError::Parse {
        title_id: title_id.to_string(),
        reason: format!("manifest is not valid UTF-8: {}", e),
    })
}
