use crate::error::ClientError;
use directories::ProjectDirs;
use std::path::PathBuf;
use std::time::Duration;

// Headers sent with every request
pub const USER_AGENT: &str = "cuentacuentos-core/0.1";
pub const ACCEPT: &str = "application/json";

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

pub const API_URL_ENV: &str = "CUENTACUENTOS_API_URL";
pub const TIMEOUT_ENV: &str = "CUENTACUENTOS_TIMEOUT_SECS";

/// Where the API lives and how long to wait for it.
///
/// Story generation and audio synthesis are slow on the server side, hence the
/// generous default timeout.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into()),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Defaults overridden by `CUENTACUENTOS_API_URL` and `CUENTACUENTOS_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ClientError> {
        let base_url = std::env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let mut config = Self::new(base_url);

        if let Ok(raw) = std::env::var(TIMEOUT_ENV) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ClientError::Config(format!("{} must be a number of seconds, got '{}'", TIMEOUT_ENV, raw))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = normalize_base_url(base_url);
        self
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

/// Directory holding client state such as the saved session.
pub fn data_dir() -> Result<PathBuf, ClientError> {
    ProjectDirs::from("", "", "cuentacuentos")
        .map(|proj_dirs| proj_dirs.data_dir().to_path_buf())
        .ok_or_else(|| ClientError::Config("Could not determine data directory".to_string()))
}
