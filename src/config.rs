//! Client configuration parsed from environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";
pub const STATE_DIR_NAME: &str = "fileshare";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown auth scheme '{0}' (expected 'raw' or 'bearer')")]
    UnknownAuthScheme(String),
    #[error("invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
}

/// How the stored token is rendered into the `Authorization` header.
///
/// The backend reads the header verbatim and verifies it as a token, so the
/// default is `Raw`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthScheme {
    #[default]
    Raw,
    Bearer,
}

impl AuthScheme {
    #[must_use]
    pub fn header_value(self, token: &str) -> String {
        match self {
            Self::Raw => token.to_owned(),
            Self::Bearer => format!("Bearer {token}"),
        }
    }
}

impl FromStr for AuthScheme {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(Self::Raw),
            "bearer" => Ok(Self::Bearer),
            _ => Err(ConfigError::UnknownAuthScheme(raw.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub state_dir: PathBuf,
    pub auth_scheme: AuthScheme,
    /// Whole-request timeout handed to the HTTP client. `None` leaves it unbounded.
    pub request_timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            state_dir: default_state_dir(None, None),
            auth_scheme: AuthScheme::Raw,
            request_timeout: None,
            connect_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `FILESHARE_API_BASE_URL`: default `http://localhost:3000`
    /// - `FILESHARE_STATE_DIR`: default `$XDG_CONFIG_HOME/fileshare`, then `$HOME/.config/fileshare`
    /// - `FILESHARE_AUTH_SCHEME`: `raw` (default) or `bearer`
    /// - `FILESHARE_REQUEST_TIMEOUT_SECS`: unset by default
    /// - `FILESHARE_CONNECT_TIMEOUT_SECS`: unset by default
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_base_url = normalize_base_url(
            &env_non_empty("FILESHARE_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_owned()),
        );
        let state_dir = env_non_empty("FILESHARE_STATE_DIR").map_or_else(
            || default_state_dir(env_non_empty("XDG_CONFIG_HOME"), env_non_empty("HOME")),
            PathBuf::from,
        );
        let auth_scheme = match env_non_empty("FILESHARE_AUTH_SCHEME") {
            Some(raw) => raw.parse()?,
            None => AuthScheme::Raw,
        };

        Ok(Self {
            api_base_url,
            state_dir,
            auth_scheme,
            request_timeout: env_secs("FILESHARE_REQUEST_TIMEOUT_SECS")?,
            connect_timeout: env_secs("FILESHARE_CONNECT_TIMEOUT_SECS")?,
        })
    }
}

pub(crate) fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

pub(crate) fn default_state_dir(xdg_config_home: Option<String>, home: Option<String>) -> PathBuf {
    if let Some(xdg) = xdg_config_home {
        return PathBuf::from(xdg).join(STATE_DIR_NAME);
    }
    if let Some(home) = home {
        return PathBuf::from(home).join(".config").join(STATE_DIR_NAME);
    }
    PathBuf::from(format!(".{STATE_DIR_NAME}"))
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).into_iter().find(|value| !value.trim().is_empty())
}

fn env_secs(key: &'static str) -> Result<Option<Duration>, ConfigError> {
    let Some(raw) = env_non_empty(key) else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(ConfigError::InvalidValue { var: key, value: raw }),
        Ok(secs) => Ok(Some(Duration::from_secs(secs))),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
