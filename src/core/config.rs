//! core::config
//!
//! Client configuration schema and loading.
//!
//! # Precedence
//!
//! Values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. Environment variables (`CREDHUB_SERVER`, `CREDHUB_CLIENT`,
//!    `CREDHUB_SECRET`, `CREDHUB_SKIP_TLS_VALIDATION`)
//!
//! # Config File Locations
//!
//! Searched in order:
//! 1. An explicit path (e.g. `--config`), which must exist
//! 2. `$CREDHUB_CLIENT_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/credhub-client/config.toml`
//! 4. `~/.credhub-client/config.toml`
//!
//! # Example
//!
//! ```toml
//! url = "https://credhub.example.com:8844"
//! client_id = "director_to_credhub"
//! client_secret = "..."
//! skip_tls_verify = false
//! request_timeout_secs = 30
//! converge_comparison = "ignore-server-derived"
//! ```

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::values::ConvergeComparison;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "CREDHUB_CLIENT_CONFIG";

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("missing required config value '{0}'")]
    MissingValue(&'static str),

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Settings needed to construct a client.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// CredHub base URL.
    pub url: Option<String>,

    /// UAA client id.
    pub client_id: Option<String>,

    /// UAA client secret.
    pub client_secret: Option<String>,

    /// Disable TLS certificate verification.
    pub skip_tls_verify: bool,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: Option<u64>,

    /// Equality policy for the converge write mode.
    pub converge_comparison: ConvergeComparison,
}

impl ClientConfig {
    /// Build a config from explicit values.
    pub fn new(
        url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            url: Some(url.into()),
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret.into()),
            ..Self::default()
        }
    }

    /// Load configuration from a file and the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if `explicit` does not exist, or if a config file
    /// exists but cannot be read or parsed. A missing default config file is
    /// not an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let env: HashMap<String, String> = std::env::vars().collect();
        Self::load_with_env(explicit, &env)
    }

    /// Like [`ClientConfig::load`] but with an explicit environment map.
    pub fn load_with_env(
        explicit: Option<&Path>,
        env: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let mut config = match Self::find_file(explicit, env) {
            Some(path) => Self::read_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(env)?;
        config.validate()?;
        Ok(config)
    }

    /// Locate the config file to read, if any.
    fn find_file(explicit: Option<&Path>, env: &HashMap<String, String>) -> Option<PathBuf> {
        // An explicit path is returned even if missing so the read fails loudly.
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }

        if let Some(path) = env.get(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Some(xdg_home) = env.get("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("credhub-client/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        if let Some(home) = dirs::home_dir() {
            let path = home.join(".credhub-client/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        None
    }

    /// Read and parse a config file.
    pub fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn apply_env(&mut self, env: &HashMap<String, String>) -> Result<(), ConfigError> {
        if let Some(url) = env.get("CREDHUB_SERVER") {
            self.url = Some(url.clone());
        }
        if let Some(id) = env.get("CREDHUB_CLIENT") {
            self.client_id = Some(id.clone());
        }
        if let Some(secret) = env.get("CREDHUB_SECRET") {
            self.client_secret = Some(secret.clone());
        }
        if let Some(skip) = env.get("CREDHUB_SKIP_TLS_VALIDATION") {
            self.skip_tls_verify = match skip.to_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" | "" => false,
                other => {
                    return Err(ConfigError::InvalidValue(format!(
                        "CREDHUB_SKIP_TLS_VALIDATION must be true or false, got '{}'",
                        other
                    )))
                }
            };
        }
        Ok(())
    }

    /// Validate the configuration values.
    ///
    /// Only values that are present are checked; required values are checked
    /// by the accessors so a partial config can still be loaded and shown.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.url {
            if url.trim().is_empty() {
                return Err(ConfigError::InvalidValue("url must not be empty".into()));
            }
        }
        if self.request_timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// The CredHub URL, required for connecting.
    pub fn url(&self) -> Result<&str, ConfigError> {
        self.url.as_deref().ok_or(ConfigError::MissingValue("url"))
    }

    /// The client id, required for connecting.
    pub fn client_id(&self) -> Result<&str, ConfigError> {
        self.client_id
            .as_deref()
            .ok_or(ConfigError::MissingValue("client_id"))
    }

    /// The client secret, required for connecting.
    pub fn client_secret(&self) -> Result<&str, ConfigError> {
        self.client_secret
            .as_deref()
            .ok_or(ConfigError::MissingValue("client_secret"))
    }

    /// Effective per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }
}

// Custom Debug to avoid exposing the client secret
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("url", &self.url)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("skip_tls_verify", &self.skip_tls_verify)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("converge_comparison", &self.converge_comparison)
            .finish()
    }
}
