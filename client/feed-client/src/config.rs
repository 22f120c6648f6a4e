//! Client configuration
//!
//! Loaded from `FEED_CLIENT_*` environment variables (a `.env` file is honored for
//! local development). Every field has a default so an empty environment yields a
//! client pointed at a local backend.

use serde::Deserialize;
use std::time::Duration;

use crate::error::{ClientError, Result};

pub const ENV_PREFIX: &str = "FEED_CLIENT_";

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Origin of the REST API, e.g. `http://localhost:8080`
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Path under the origin where uploaded assets are served
    #[serde(default = "default_upload_path")]
    pub upload_path: String,

    #[serde(default = "default_avatar_placeholder")]
    pub avatar_placeholder: String,

    #[serde(default = "default_background_placeholder")]
    pub background_placeholder: String,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Pre-issued bearer token, used when no login is performed
    #[serde(default)]
    pub token: Option<String>,

    /// Username the token belongs to
    #[serde(default)]
    pub username: Option<String>,

    /// `json` or `pretty`; read by the binary's subscriber setup
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_api_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_upload_path() -> String {
    "/uploads".to_string()
}

fn default_avatar_placeholder() -> String {
    "/default-profile.png".to_string()
}

fn default_background_placeholder() -> String {
    "/default-bg.jpg".to_string()
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            upload_path: default_upload_path(),
            avatar_placeholder: default_avatar_placeholder(),
            background_placeholder: default_background_placeholder(),
            poll_interval_secs: default_poll_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            token: None,
            username: None,
            log_format: default_log_format(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config: Self = envy::prefixed(ENV_PREFIX).from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from explicit key/value pairs (keys carry the prefix)
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Self = envy::prefixed(ENV_PREFIX).from_iter(pairs)?;
        config.validate()?;
        Ok(config)
    }

    /// Point the config at another origin, keeping the remaining defaults
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_base_url = base_url.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(ClientError::Config("api_base_url must not be empty".into()));
        }
        if self.poll_interval_secs == 0 {
            return Err(ClientError::Config(
                "poll_interval_secs must be greater than zero".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ClientError::Config(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// API origin without a trailing slash
    pub fn origin(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }

    /// Absolute base that bare upload filenames are joined to
    pub fn upload_base_url(&self) -> String {
        format!(
            "{}/{}",
            self.origin(),
            self.upload_path.trim_matches('/')
        )
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(key: &str, value: &str) -> (String, String) {
        (format!("{}{}", ENV_PREFIX, key), value.to_string())
    }

    #[test]
    fn test_defaults_from_empty_environment() {
        let config = ClientConfig::from_pairs(Vec::new()).unwrap();
        assert_eq!(config.api_base_url, "http://localhost:8080");
        assert_eq!(config.upload_base_url(), "http://localhost:8080/uploads");
        assert_eq!(config.poll_interval(), Duration::from_secs(10));
        assert!(config.token.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_pairs(vec![
            pair("API_BASE_URL", "https://api.example.com/"),
            pair("UPLOAD_PATH", "media"),
            pair("POLL_INTERVAL_SECS", "3"),
            pair("TOKEN", "abc"),
            pair("USERNAME", "alice"),
        ])
        .unwrap();
        assert_eq!(config.origin(), "https://api.example.com");
        assert_eq!(config.upload_base_url(), "https://api.example.com/media");
        assert_eq!(config.poll_interval_secs, 3);
        assert_eq!(config.token.as_deref(), Some("abc"));
        assert_eq!(config.username.as_deref(), Some("alice"));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = ClientConfig::from_pairs(vec![pair("POLL_INTERVAL_SECS", "0")]).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_unparsable_value_is_config_error() {
        let err =
            ClientConfig::from_pairs(vec![pair("REQUEST_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }
}
