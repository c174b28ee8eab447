//! Configuration for the update pipeline.
//!
//! `UpdaterConfig` is the explicit value passed into the pipeline. It can be
//! built directly with the builder methods, or layered from the INI file in
//! [`file`] with command-line overrides on top.

mod file;

pub use file::{config_dir, config_file_path, ConfigFile};

use std::path::PathBuf;

use crate::download::OverwritePolicy;
use crate::error::{UpdateError, UpdateResult};
use crate::identifier::{TitleId, DEFAULT_PREFIXES};

/// Placeholder substituted with the title id in the manifest URL template.
pub const TITLE_ID_PLACEHOLDER: &str = "{title_id}";

/// Default manifest location on the update endpoint.
pub const DEFAULT_MANIFEST_URL_TEMPLATE: &str =
    "https://a0.ww.np.dl.playstation.net/tpl/np/{title_id}/{title_id}-ver.xml";

/// Name of the default download folder under the home directory.
pub const DEFAULT_TARGET_DIR_NAME: &str = "PS3 Updates";

/// Default user agent for manifest and package requests.
pub const DEFAULT_USER_AGENT: &str = concat!("titlepatch/", env!("CARGO_PKG_VERSION"));

/// Default download directory: `$HOME/PS3 Updates`.
pub fn default_target_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_TARGET_DIR_NAME)
}

/// Configuration for one update run.
#[derive(Debug, Clone)]
pub struct UpdaterConfig {
    /// Manifest URL template containing `{title_id}`.
    pub manifest_url_template: String,

    /// Accepted title id prefixes.
    pub allowed_prefixes: Vec<String>,

    /// Directory packages are downloaded into.
    pub target_dir: PathBuf,

    /// What to do when a package file already exists.
    pub overwrite_policy: OverwritePolicy,

    /// Skip TLS certificate validation for manifest and package requests.
    ///
    /// The vendor endpoint presents a certificate chain that public trust
    /// stores reject, so HTTPS manifests usually need this turned on.
    pub accept_invalid_certs: bool,

    /// Record per-package transport/integrity failures and keep going
    /// instead of aborting the run.
    pub continue_on_error: bool,

    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            manifest_url_template: DEFAULT_MANIFEST_URL_TEMPLATE.to_string(),
            allowed_prefixes: DEFAULT_PREFIXES.iter().map(|p| p.to_string()).collect(),
            target_dir: default_target_dir(),
            overwrite_policy: OverwritePolicy::AskEachTime,
            accept_invalid_certs: false,
            continue_on_error: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl UpdaterConfig {
    /// Create a new configuration downloading into `target_dir`.
    pub fn new(target_dir: PathBuf) -> Self {
        Self {
            target_dir,
            ..Default::default()
        }
    }

    /// Set the manifest URL template.
    pub fn with_manifest_url_template(mut self, template: impl Into<String>) -> Self {
        self.manifest_url_template = template.into();
        self
    }

    /// Replace the accepted prefixes.
    pub fn with_allowed_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Set the download directory.
    pub fn with_target_dir(mut self, path: PathBuf) -> Self {
        self.target_dir = path;
        self
    }

    /// Set the overwrite policy.
    pub fn with_overwrite_policy(mut self, policy: OverwritePolicy) -> Self {
        self.overwrite_policy = policy;
        self
    }

    /// Enable or disable TLS certificate validation bypass.
    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Enable or disable per-package failure isolation.
    pub fn with_continue_on_error(mut self, keep_going: bool) -> Self {
        self.continue_on_error = keep_going;
        self
    }

    /// Set the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Check the configuration for values the pipeline cannot work with.
    pub fn validate(&self) -> UpdateResult<()> {
        if !self.manifest_url_template.contains(TITLE_ID_PLACEHOLDER) {
            return Err(UpdateError::Config(format!(
                "manifest URL template '{}' does not contain {}",
                self.manifest_url_template, TITLE_ID_PLACEHOLDER
            )));
        }
        if self.allowed_prefixes.is_empty() {
            return Err(UpdateError::Config(
                "no title id prefixes are allowed".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the manifest URL for a title id.
    ///
    /// ```
    /// use titlepatch::config::UpdaterConfig;
    /// use titlepatch::identifier::{TitleId, DEFAULT_PREFIXES};
    ///
    /// let config = UpdaterConfig::default()
    ///     .with_manifest_url_template("http://host/tpl/{title_id}/{title_id}-ver.xml");
    /// let id = TitleId::parse("BLUS30443", &DEFAULT_PREFIXES).unwrap();
    /// assert_eq!(
    ///     config.manifest_url(&id),
    ///     "http://host/tpl/BLUS30443/BLUS30443-ver.xml"
    /// );
    /// ```
    pub fn manifest_url(&self, title_id: &TitleId) -> String {
        self.manifest_url_template
            .replace(TITLE_ID_PLACEHOLDER, title_id.as_str())
    }
}
