//! Client configuration.
//!
//! [`ClientOptions`] can be built in code or loaded with the `config` crate
//! from a TOML/YAML/JSON file, with `CHUCKY_*` environment variables taking
//! precedence:
//!
//! ```toml
//! token = "ak_live_..."
//! base_url = "wss://conjure.chucky.cloud/ws"
//! timeout_ms = 60000
//! keep_alive_ms = 300000
//! tool_timeout_ms = 60000
//! debug = false
//! ```

use std::path::Path;
use std::time::Duration;

use chucky_transport::WebSocketTransportConfig;
use serde::Deserialize;
use thiserror::Error;

/// Default service endpoint.
pub const DEFAULT_BASE_URL: &str = "wss://conjure.chucky.cloud/ws";

/// Default connect and readiness timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default interval between keep-alive pings.
pub const DEFAULT_KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Default limit for a single client-side tool execution.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(60);

/// Prefix of environment variables read by the loaders.
pub const ENV_PREFIX: &str = "CHUCKY";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or parse a configuration source
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A value is missing or out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Options shared by every session a [`Client`](crate::Client) creates.
#[derive(Clone)]
pub struct ClientOptions {
    /// Service endpoint
    pub base_url: String,
    /// Bearer credential
    pub token: String,
    /// Connect and readiness timeout
    pub timeout: Duration,
    /// Keep-alive interval; zero disables pings
    pub keep_alive_interval: Duration,
    /// Limit for a single client-side tool execution
    pub tool_timeout: Duration,
    /// Log raw wire payloads
    pub debug: bool,
}

impl std::fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientOptions")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("keep_alive_interval", &self.keep_alive_interval)
            .field("tool_timeout", &self.tool_timeout)
            .field("debug", &self.debug)
            .finish()
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: String::new(),
            timeout: DEFAULT_TIMEOUT,
            keep_alive_interval: DEFAULT_KEEP_ALIVE_INTERVAL,
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
            debug: false,
        }
    }
}

/// File/environment representation; durations in milliseconds.
#[derive(Debug, Default, Deserialize)]
struct RawClientOptions {
    base_url: Option<String>,
    token: Option<String>,
    timeout_ms: Option<u64>,
    keep_alive_ms: Option<u64>,
    tool_timeout_ms: Option<u64>,
    debug: Option<bool>,
}

impl ClientOptions {
    /// Options with default endpoint and timings.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Self::default()
        }
    }

    /// Set the service endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
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

    /// Set the tool execution limit
    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    /// Enable raw payload logging
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Load from a configuration file, overridden by `CHUCKY_*` variables.
    ///
    /// The format is chosen from the file extension.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] if the file cannot be read or parsed and
    /// [`ConfigError::Invalid`] if the resulting options are unusable.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(env_source())
            .build()?;
        Self::from_settings(settings)
    }

    /// Load from `CHUCKY_*` environment variables only.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `CHUCKY_TOKEN` is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let settings = config::Config::builder().add_source(env_source()).build()?;
        Self::from_settings(settings)
    }

    fn from_settings(settings: config::Config) -> Result<Self, ConfigError> {
        let raw: RawClientOptions = settings.try_deserialize()?;
        let defaults = Self::default();

        let options = Self {
            base_url: raw.base_url.unwrap_or(defaults.base_url),
            token: raw.token.unwrap_or_default(),
            timeout: raw
                .timeout_ms
                .map_or(defaults.timeout, Duration::from_millis),
            keep_alive_interval: raw
                .keep_alive_ms
                .map_or(defaults.keep_alive_interval, Duration::from_millis),
            tool_timeout: raw
                .tool_timeout_ms
                .map_or(defaults.tool_timeout, Duration::from_millis),
            debug: raw.debug.unwrap_or(defaults.debug),
        };
        options.validate()?;
        Ok(options)
    }

    /// Check that the options can open a session.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an empty token or base URL, or a
    /// zero timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.trim().is_empty() {
            return Err(ConfigError::Invalid("token is required".to_string()));
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("base_url must not be empty".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::Invalid("timeout must be greater than zero".to_string()));
        }
        if self.tool_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "tool_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Transport configuration for one session.
    pub fn transport_config(&self) -> WebSocketTransportConfig {
        WebSocketTransportConfig::new(self.base_url.clone(), self.token.clone())
            .with_timeout(self.timeout)
            .with_keep_alive_interval(self.keep_alive_interval)
            .with_debug(self.debug)
    }
}

fn env_source() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX).try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn defaults_match_the_hosted_service() {
        let options = ClientOptions::new("tok");
        assert_eq!(options.base_url, "wss://conjure.chucky.cloud/ws");
        assert_eq!(options.timeout, Duration::from_secs(60));
        assert_eq!(options.keep_alive_interval, Duration::from_secs(300));
        assert_eq!(options.tool_timeout, Duration::from_secs(60));
        assert!(options.validate().is_ok());
    }

    #[test]
    fn validation_rejects_missing_token() {
        let err = ClientOptions::default().validate().unwrap_err();
        assert!(err.to_string().contains("token"));
    }

    #[test]
    fn transport_config_carries_timings() {
        let options = ClientOptions::new("tok")
            .with_base_url("ws://localhost:9000/ws")
            .with_timeout(Duration::from_secs(5))
            .with_keep_alive_interval(Duration::ZERO)
            .with_debug(true);
        let config = options.transport_config();

        assert_eq!(config.base_url, "ws://localhost:9000/ws");
        assert_eq!(config.token, "tok");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(config.keep_alive_interval.is_zero());
        assert!(config.debug);
    }

    #[test]
    #[serial_test::serial]
    fn loads_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "token = \"from-file\"\nbase_url = \"ws://127.0.0.1:1/ws\"\ntool_timeout_ms = 1500"
        )
        .unwrap();

        let options = ClientOptions::from_file(file.path()).unwrap();
        assert_eq!(options.token, "from-file");
        assert_eq!(options.base_url, "ws://127.0.0.1:1/ws");
        assert_eq!(options.tool_timeout, Duration::from_millis(1500));
        assert_eq!(options.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    #[serial_test::serial]
    fn file_without_token_is_invalid() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "debug = true").unwrap();

        let err = ClientOptions::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
