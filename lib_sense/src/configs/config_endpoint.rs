use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::EndpointError;

/// Fixed delay between a session failure and the next connect attempt.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 5_000;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// # Endpoint Configuration
///
/// The server address an endpoint is bound to for its whole life, plus the
/// delay of the naive reconnect loop. There is no backoff, jitter or attempt
/// limit to configure.
pub struct EndpointConfig {
    /// The WebSocket address, e.g. `ws://localhost:8081/tweets/`.
    pub address: String,
    /// Milliseconds to wait after an error or close before reconnecting.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_retry_delay_ms() -> u64 {
    DEFAULT_RETRY_DELAY_MS
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

impl EndpointConfig {
    /// Creates a configuration for `address` with the default 5 second retry delay.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Default::default()
        }
    }

    /// Overrides the retry delay.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay_ms = delay.as_millis() as u64;
        self
    }

    /// The retry delay as a `Duration`.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Parses a configuration from JSON and validates it.
    pub fn from_json_str(json: &str) -> Result<Self, EndpointError> {
        let config: EndpointConfig =
            serde_json::from_str(json).map_err(|e| EndpointError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the address is a `ws://` or `wss://` URL.
    pub fn validate(&self) -> Result<(), EndpointError> {
        let url = Url::parse(&self.address)
            .map_err(|e| EndpointError::Config(format!("{}: {}", self.address, e)))?;
        match url.scheme() {
            "ws" | "wss" => Ok(()),
            other => Err(EndpointError::Config(format!(
                "unsupported scheme '{}' in {}",
                other, self.address
            ))),
        }
    }
}
