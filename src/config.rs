//! Session context configuration parsed from environment variables.

use crate::error::ConfigError;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Base URL of the remote authentication service, without a trailing `/`.
    pub backend_url: String,
    /// TCP connect timeout. A connect attempt that exceeds it fails the
    /// operation with `SessionError::Backend`, like any other transport
    /// failure. Requests themselves are never timed out.
    pub connect_timeout_secs: u64,
    pub user_agent: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            user_agent: None,
        }
    }
}

impl SessionConfig {
    /// Build typed session config from environment variables.
    ///
    /// Optional:
    /// - `WEBQUIZ_BACKEND_URL`: default `http://localhost:5000`
    /// - `WEBQUIZ_CONNECT_TIMEOUT_SECS`: default 10
    /// - `WEBQUIZ_USER_AGENT`: reqwest default when absent
    ///
    /// # Errors
    ///
    /// Returns an error if the backend URL is not an `http(s)` URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend_url = std::env::var("WEBQUIZ_BACKEND_URL").unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string());
        Ok(Self {
            backend_url: normalize_backend_url(&backend_url)?,
            connect_timeout_secs: env_parse_u64("WEBQUIZ_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
            user_agent: std::env::var("WEBQUIZ_USER_AGENT")
                .ok()
                .filter(|v| !v.trim().is_empty()),
        })
    }

    /// Replace the backend URL, validating it the same way as `from_env`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not an `http(s)` URL.
    pub fn with_backend_url(mut self, url: &str) -> Result<Self, ConfigError> {
        self.backend_url = normalize_backend_url(url)?;
        Ok(self)
    }

    /// Absolute URL for an endpoint path such as `/user/login`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.backend_url, path)
    }
}

fn normalize_backend_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let rest = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .ok_or_else(|| ConfigError::Parse(format!("backend URL must start with http:// or https://: {raw}")))?;
    if rest.is_empty() {
        return Err(ConfigError::Parse(format!("backend URL has no host: {raw}")));
    }
    Ok(trimmed.to_string())
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
