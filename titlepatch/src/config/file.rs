//! INI configuration file support.
//!
//! The file lives at `~/.titlepatch/config.ini` and is optional. Every key is
//! optional too; anything left out keeps the built-in default.
//!
//! ```ini
//! [manifest]
//! url_template = https://a0.ww.np.dl.playstation.net/tpl/np/{title_id}/{title_id}-ver.xml
//!
//! [identifiers]
//! allowed_prefixes = BLUS, BLES, NPUB
//!
//! [download]
//! target_dir = ~/PS3 Updates
//! overwrite = ask
//! accept_invalid_certs = true
//! continue_on_error = false
//! ```

use std::path::{Path, PathBuf};

use ini::Ini;
use tracing::debug;

use super::UpdaterConfig;
use crate::download::OverwritePolicy;
use crate::error::{UpdateError, UpdateResult};

const CONFIG_DIR_NAME: &str = ".titlepatch";
const CONFIG_FILE_NAME: &str = "config.ini";

/// Directory holding the config file and logs.
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Full path of the config file.
pub fn config_file_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

/// Values read from the config file. `None` means "not set".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub manifest_url_template: Option<String>,
    pub allowed_prefixes: Option<Vec<String>>,
    pub target_dir: Option<PathBuf>,
    pub overwrite_policy: Option<OverwritePolicy>,
    pub accept_invalid_certs: Option<bool>,
    pub continue_on_error: Option<bool>,
}

impl ConfigFile {
    /// Load the config file from its default location.
    ///
    /// A missing file is not an error and yields an empty `ConfigFile`.
    pub fn load() -> UpdateResult<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load a config file from `path`. A missing file yields an empty config.
    pub fn load_from(path: &Path) -> UpdateResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|e| {
            UpdateError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "loaded config file");
        Self::from_ini(&ini)
    }

    /// Parse config file contents.
    pub fn parse(contents: &str) -> UpdateResult<Self> {
        let ini = Ini::load_from_str(contents)
            .map_err(|e| UpdateError::Config(format!("malformed config file: {}", e)))?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> UpdateResult<Self> {
        let get = |section: &str, key: &str| -> Option<String> {
            ini.section(Some(section))
                .and_then(|props| props.get(key))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let allowed_prefixes = get("identifiers", "allowed_prefixes").map(|list| {
            list.split(',')
                .map(|p| p.trim().to_ascii_uppercase())
                .filter(|p| !p.is_empty())
                .collect::<Vec<_>>()
        });

        let overwrite_policy = get("download", "overwrite")
            .map(|v| {
                v.parse::<OverwritePolicy>()
                    .map_err(|e| UpdateError::Config(format!("[download] overwrite: {}", e)))
            })
            .transpose()?;

        Ok(Self {
            manifest_url_template: get("manifest", "url_template"),
            allowed_prefixes,
            target_dir: get("download", "target_dir").map(|v| expand_home(&v)),
            overwrite_policy,
            accept_invalid_certs: get("download", "accept_invalid_certs")
                .map(|v| parse_bool("accept_invalid_certs", &v))
                .transpose()?,
            continue_on_error: get("download", "continue_on_error")
                .map(|v| parse_bool("continue_on_error", &v))
                .transpose()?,
        })
    }

    /// Layer the values that are set over `config`.
    pub fn apply(&self, mut config: UpdaterConfig) -> UpdaterConfig {
        if let Some(ref template) = self.manifest_url_template {
            config.manifest_url_template = template.clone();
        }
        if let Some(ref prefixes) = self.allowed_prefixes {
            config.allowed_prefixes = prefixes.clone();
        }
        if let Some(ref dir) = self.target_dir {
            config.target_dir = dir.clone();
        }
        if let Some(policy) = self.overwrite_policy {
            config.overwrite_policy = policy;
        }
        if let Some(accept) = self.accept_invalid_certs {
            config.accept_invalid_certs = accept;
        }
        if let Some(keep_going) = self.continue_on_error {
            config.continue_on_error = keep_going;
        }
        config
    }
}

fn parse_bool(key: &str, value: &str) -> UpdateResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => Err(UpdateError::Config(format!(
            "{}: expected true or false, got '{}'",
            key, other
        ))),
    }
}

/// Expand a leading `~` to the home directory.
fn expand_home(value: &str) -> PathBuf {
    match value.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') => {
            let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
            home.join(rest.trim_start_matches(['/', '\\']))
        }
        _ => PathBuf::from(value),
    }
}
