//! Shared blocking HTTP client construction.

use reqwest::blocking::Client;
use tracing::warn;

use crate::config::UpdaterConfig;
use crate::error::{UpdateError, UpdateResult};

/// Build the blocking client used for manifest and package requests.
///
/// No request timeout is set beyond the client default.
pub(crate) fn build_client(config: &UpdaterConfig) -> UpdateResult<Client> {
    if config.accept_invalid_certs {
        warn!("TLS certificate validation is disabled for update requests");
    }

    Client::builder()
        .user_agent(&config.user_agent)
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .build()
        .map_err(|e| UpdateError::Config(format!("failed to create HTTP client: {}", e)))
}
