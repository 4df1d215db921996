//! Client configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use vimeo_common::{Error, Result};

/// Default API protocol.
const DEFAULT_PROTOCOL: &str = "https";
/// Default API hostname.
const DEFAULT_HOSTNAME: &str = "api.vimeo.com";
/// Default API port.
const DEFAULT_PORT: u16 = 443;
/// Media type requesting API version 3.4 responses.
const DEFAULT_ACCEPT: &str = "application/vnd.vimeo.*+json;version=3.4";

/// Bytes sent per tus PATCH request (128MB).
const DEFAULT_CHUNK_SIZE: u64 = 128 * 1024 * 1024;

/// Delays before each tus retry attempt, in milliseconds.
const DEFAULT_RETRY_DELAYS_MS: [u64; 4] = [0, 1000, 3000, 5000];

/// Configuration for talking to the API.
///
/// Every field has a default, so a partial JSON document is enough to
/// override a single setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// `http` or `https`.
    pub protocol: String,
    /// API hostname.
    pub hostname: String,
    /// API port.
    pub port: u16,
    /// `Accept` header sent with every API request.
    pub accept: String,
    /// `User-Agent` header sent with every API request.
    pub user_agent: String,
    /// Maximum body size of a single tus PATCH.
    pub chunk_size: u64,
    /// Delays between tus retry attempts.
    pub retry_delays_ms: Vec<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            protocol: DEFAULT_PROTOCOL.to_string(),
            hostname: DEFAULT_HOSTNAME.to_string(),
            port: DEFAULT_PORT,
            accept: DEFAULT_ACCEPT.to_string(),
            user_agent: format!("vimeo.rs/{}", env!("CARGO_PKG_VERSION")),
            chunk_size: DEFAULT_CHUNK_SIZE,
            retry_delays_ms: DEFAULT_RETRY_DELAYS_MS.to_vec(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from JSON, filling missing fields with defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::Serialization(format!("Invalid client config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values no request could be built from.
    pub fn validate(&self) -> Result<()> {
        normalize_protocol(&self.protocol)?;
        if self.hostname.is_empty() {
            return Err(Error::InvalidInput("Hostname cannot be empty".to_string()));
        }
        if self.chunk_size == 0 {
            return Err(Error::InvalidInput("Chunk size must be positive".to_string()));
        }
        Ok(())
    }

    /// Set protocol.
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    /// Set hostname.
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    /// Set port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set tus chunk size.
    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set tus retry delays.
    pub fn with_retry_delays(mut self, delays: &[Duration]) -> Self {
        self.retry_delays_ms = delays
            .iter()
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .collect();
        self
    }

    /// Point the client at a base URL such as `http://127.0.0.1:8080`.
    pub fn with_base_url(mut self, base: &str) -> Result<Self> {
        let url = url::Url::parse(base)
            .map_err(|e| Error::InvalidInput(format!("Invalid base URL: {}", e)))?;
        let hostname = url
            .host_str()
            .ok_or_else(|| Error::InvalidInput("Base URL has no host".to_string()))?;
        self.protocol = url.scheme().to_string();
        self.hostname = hostname.to_string();
        self.port = url
            .port_or_known_default()
            .ok_or_else(|| Error::InvalidInput("Base URL has no port".to_string()))?;
        Ok(self)
    }

    /// Render `protocol://hostname[:port]`, leaving out the scheme's default port.
    pub fn base_url(&self) -> String {
        let protocol = normalize_protocol(&self.protocol).unwrap_or(DEFAULT_PROTOCOL);
        if Some(self.port) == default_port(protocol) {
            format!("{}://{}", protocol, self.hostname)
        } else {
            format!("{}://{}:{}", protocol, self.hostname, self.port)
        }
    }

    /// Retry delays as durations.
    pub fn retry_delays(&self) -> Vec<Duration> {
        self.retry_delays_ms
            .iter()
            .map(|ms| Duration::from_millis(*ms))
            .collect()
    }
}

/// Accept both `https` and the `https:` spelling.
pub(crate) fn normalize_protocol(protocol: &str) -> Result<&'static str> {
    match protocol.trim_end_matches(':').to_ascii_lowercase().as_str() {
        "https" => Ok("https"),
        "http" => Ok("http"),
        other => Err(Error::InvalidInput(format!(
            "Unsupported protocol: {}",
            other
        ))),
    }
}

pub(crate) fn default_port(protocol: &str) -> Option<u16> {
    match protocol {
        "https" => Some(443),
        "http" => Some(80),
        _ => None,
    }
}
