//! Client configuration.
//!
//! `ClientConfig` is plain data owned by the client once constructed. It
//! derives `Deserialize` so a host application can load it from whatever
//! format it already uses; the retry and timeout fields fall back to their
//! defaults when missing.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_RETRIES: u32 = 1;
pub const DEFAULT_TIMEOUT_MS: u64 = 500;

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Sent as the `Api-Key` header on every request.
    pub api_key: String,
    pub host: String,
    pub port: String,
    #[serde(default)]
    pub is_ssl: bool,
    /// Retries allowed after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Applied to each attempt separately.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl ClientConfig {
    pub fn new(
        api_key: impl Into<String>,
        host: impl Into<String>,
        port: impl Into<String>,
        is_ssl: bool,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            host: host.into(),
            port: port.into(),
            is_ssl,
            max_retries: DEFAULT_MAX_RETRIES,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// `{http|https}://{host}:{port}`, without a trailing slash.
    pub fn base_url(&self) -> String {
        let scheme = if self.is_ssl { "https" } else { "http" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }
}

// The API key stays out of logs and panic messages.
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"[REDACTED]")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("is_ssl", &self.is_ssl)
            .field("max_retries", &self.max_retries)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}
