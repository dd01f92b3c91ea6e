//! ttsync configuration.
//!
//! Read from `~/.config/ttsync/config.toml`, then overridden by `TTSYNC_*`
//! environment variables (`TTSYNC_USERNAME`, `TTSYNC_PASSWORD`, ...).

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::constants::{
    DEFAULT_AGENT, DEFAULT_API_URL, DEFAULT_AUTH_TIMEOUT_SECS, DEFAULT_REFRESH_INTERVAL_SECS,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};
use crate::error::{TtError, TtResult};
use crate::remote::transport::{CredentialsProvider, Login};

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_agent() -> String {
    DEFAULT_AGENT.to_string()
}

fn default_refresh_interval() -> u64 {
    DEFAULT_REFRESH_INTERVAL_SECS
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_auth_timeout() -> u64 {
    DEFAULT_AUTH_TIMEOUT_SECS
}

#[derive(Deserialize, Clone)]
pub struct TtConfig {
    pub username: Option<String>,
    pub password: Option<String>,

    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_agent")]
    pub agent: String,

    /// Only sync the calendar with this exact name.
    pub calendar: Option<String>,

    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_auth_timeout")]
    pub auth_timeout_secs: u64,
}

impl std::fmt::Debug for TtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("agent", &self.agent)
            .field("calendar", &self.calendar)
            .field("refresh_interval_secs", &self.refresh_interval_secs)
            .finish_non_exhaustive()
    }
}

impl TtConfig {
    pub fn config_path() -> TtResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| TtError::Config("Could not determine config directory".into()))?
            .join("ttsync");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from `path` (which may be absent), layered under the environment.
    pub fn load_from(path: &Path) -> TtResult<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("TTSYNC").try_parsing(true))
            .build()
            .map_err(|e| TtError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| TtError::Config(e.to_string()))
    }

    /// Create a default config file with the optional settings commented out.
    pub fn create_default_config(path: &Path) -> TtResult<()> {
        let contents = format!(
            "\
# ttsync configuration

# TimeTree account used to sign in:
username = \"you@example.com\"
password = \"\"

# Only sync the calendar with this name:
# calendar = \"Family\"

# Seconds between polls in `ttsync watch`:
# refresh_interval_secs = {}

# API endpoint and client agent header:
# api_url = \"{}\"
# agent = \"{}\"
",
            DEFAULT_REFRESH_INTERVAL_SECS, DEFAULT_API_URL, DEFAULT_AGENT
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;

        Ok(())
    }
}

impl CredentialsProvider for TtConfig {
    fn credentials(&self) -> TtResult<Login> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                Ok(Login {
                    username: username.clone(),
                    password: password.clone(),
                })
            }
            _ => Err(TtError::Config(
                "username and password must both be set".into(),
            )),
        }
    }
}
