use std::time::Duration;

/// Console configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Base URL of the catalog server, without a trailing slash.
    pub api_url: String,
    /// Token handed to the CSRF resolver ahead of cookie and form lookup.
    pub csrf_token: Option<String>,
    /// Per-request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConsoleConfigError {
    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var} must be an http(s) URL, got {value:?}")]
    InvalidUrl { var: &'static str, value: String },
}

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

impl ConsoleConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default                 |
    /// |--------------------------------|-------------------------|
    /// | `CATALOG_API_URL`              | `http://localhost:8000` |
    /// | `CATALOG_CSRF_TOKEN`           | unset                   |
    /// | `CATALOG_REQUEST_TIMEOUT_SECS` | `30`                    |
    pub fn from_env() -> Result<Self, ConsoleConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConsoleConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = match lookup("CATALOG_API_URL").filter(|v| !v.trim().is_empty()) {
            Some(raw) => parse_api_url(&raw)?,
            None => DEFAULT_API_URL.to_string(),
        };

        let csrf_token = lookup("CATALOG_CSRF_TOKEN")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let request_timeout_secs = match lookup("CATALOG_REQUEST_TIMEOUT_SECS") {
            Some(raw) => parse_positive("CATALOG_REQUEST_TIMEOUT_SECS", &raw)?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        Ok(Self {
            api_url,
            csrf_token,
            request_timeout_secs,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Validate a catalog server base URL and strip any trailing slash.
///
/// Shared by the environment lookup and the `--api-url` flag.
pub fn parse_api_url(raw: &str) -> Result<String, ConsoleConfigError> {
    let value = raw.trim();
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(value.trim_end_matches('/').to_string())
    } else {
        Err(ConsoleConfigError::InvalidUrl {
            var: "CATALOG_API_URL",
            value: value.to_string(),
        })
    }
}

fn parse_positive(var: &'static str, raw: &str) -> Result<u64, ConsoleConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConsoleConfigError::InvalidNumber {
            var,
            value: raw.to_string(),
        }),
    }
}
