//! WebSocket transport configuration.

use std::time::Duration;

use url::Url;

use crate::error::{TransportError, TransportResult};

/// Default connect and readiness timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default interval between keep-alive pings.
pub const DEFAULT_KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Configuration for [`WebSocketTransport`](crate::WebSocketTransport).
#[derive(Clone)]
pub struct WebSocketTransportConfig {
    /// Endpoint, `ws://` or `wss://`
    pub base_url: String,
    /// Bearer credential appended as the `token` query parameter
    pub token: String,
    /// Limit for the WebSocket handshake and for `wait_for_ready`
    pub timeout: Duration,
    /// Interval between keep-alive pings; zero disables them
    pub keep_alive_interval: Duration,
    /// Log raw payloads on the `chucky_transport::wire` target
    pub debug: bool,
}

impl std::fmt::Debug for WebSocketTransportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketTransportConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("keep_alive_interval", &self.keep_alive_interval)
            .field("debug", &self.debug)
            .finish()
    }
}

impl WebSocketTransportConfig {
    /// Configuration with default timings.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            timeout: DEFAULT_TIMEOUT,
            keep_alive_interval: DEFAULT_KEEP_ALIVE_INTERVAL,
            debug: false,
        }
    }

    /// Set the connect/readiness timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the keep-alive interval
    pub fn with_keep_alive_interval(mut self, interval: Duration) -> Self {
        self.keep_alive_interval = interval;
        self
    }

    /// Enable raw payload logging
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// URL actually dialed: the base URL plus `token` and `type=prompt`.
    ///
    /// Any `token` or `type` already present in the base URL is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ConnectionFailed`] when the base URL does not
    /// parse or is not a WebSocket URL.
    pub fn connection_url(&self) -> TransportResult<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            TransportError::ConnectionFailed(format!("invalid URL '{}': {}", self.base_url, e))
        })?;

        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(TransportError::ConnectionFailed(format!(
                "unsupported URL scheme '{}', expected ws or wss",
                url.scheme()
            )));
        }

        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != "token" && key != "type")
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair("token", &self.token)
            .append_pair("type", "prompt");
        Ok(url)
    }
}
