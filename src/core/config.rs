use crate::core::types::TokensPair;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Runtime settings of one exchange feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Fixed delay between two health-check ticks
    pub health_check_interval_ms: u64,
    /// Upper bound for one websocket handshake
    pub connect_timeout_ms: u64,
    /// Capacity of the outbound trade channel
    pub trade_buffer_size: usize,
    /// Capacity of the lifecycle event channel
    pub event_buffer_size: usize,
    /// Overrides the exchange's default websocket endpoint
    pub ws_url: Option<String>,
    /// Pairs to subscribe to, as `BASE_QUOTE` labels
    pub pairs: Vec<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            health_check_interval_ms: 10_000, // 10 seconds
            connect_timeout_ms: 10_000,       // 10 seconds
            trade_buffer_size: 1024,
            event_buffer_size: 64,
            ws_url: None,
            pairs: Vec::new(),
        }
    }
}

impl FeedConfig {
    /// Create configuration from environment variables
    ///
    /// Recognized variables (all optional):
    /// - `{EXCHANGE}_HEALTH_CHECK_MS`
    /// - `{EXCHANGE}_CONNECT_TIMEOUT_MS`
    /// - `{EXCHANGE}_TRADE_BUFFER_SIZE`, `{EXCHANGE}_EVENT_BUFFER_SIZE`
    /// - `{EXCHANGE}_WS_URL`
    /// - `{EXCHANGE}_PAIRS` (e.g. `BTC_USD,ETH_USD`)
    pub fn from_env(exchange_prefix: &str) -> Result<Self, ConfigError> {
        let prefix = exchange_prefix.to_uppercase();
        let mut config = Self::default();

        if let Some(ms) = parse_var::<u64>(&format!("{}_HEALTH_CHECK_MS", prefix))? {
            config.health_check_interval_ms = ms;
        }
        if let Some(ms) = parse_var::<u64>(&format!("{}_CONNECT_TIMEOUT_MS", prefix))? {
            config.connect_timeout_ms = ms;
        }
        if let Some(size) = parse_var::<usize>(&format!("{}_TRADE_BUFFER_SIZE", prefix))? {
            config.trade_buffer_size = size;
        }
        if let Some(size) = parse_var::<usize>(&format!("{}_EVENT_BUFFER_SIZE", prefix))? {
            config.event_buffer_size = size;
        }
        config.ws_url = env::var(format!("{}_WS_URL", prefix)).ok();
        if let Ok(pairs) = env::var(format!("{}_PAIRS", prefix)) {
            config.pairs = pairs
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from a .env file and environment variables
    ///
    /// A missing .env file is not an error; system variables are used instead.
    #[cfg(feature = "env-file")]
    pub fn from_env_file(exchange_prefix: &str) -> Result<Self, ConfigError> {
        Self::from_env_file_with_path(exchange_prefix, ".env")
    }

    /// Create configuration from a specific .env file path
    #[cfg(feature = "env-file")]
    pub fn from_env_file_with_path(
        exchange_prefix: &str,
        env_file_path: &str,
    ) -> Result<Self, ConfigError> {
        match dotenv::from_path(env_file_path) {
            Ok(_) => {}
            Err(dotenv::Error::Io(io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ConfigError::InvalidConfiguration(format!(
                    "Failed to load .env file '{}': {}",
                    env_file_path, e
                )));
            }
        }

        Self::from_env(exchange_prefix)
    }

    #[must_use]
    pub const fn health_check_interval_ms(mut self, ms: u64) -> Self {
        self.health_check_interval_ms = ms;
        self
    }

    #[must_use]
    pub const fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.connect_timeout_ms = ms;
        self
    }

    #[must_use]
    pub fn ws_url(mut self, url: impl Into<String>) -> Self {
        self.ws_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn pairs(mut self, pairs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.pairs = pairs.into_iter().map(Into::into).collect();
        self
    }

    /// Trade and event buffer sizes for channels shared by several feeds: the
    /// largest configured size of each, or the default when `configs` is empty
    pub fn shared_buffer_sizes<'a>(
        configs: impl IntoIterator<Item = &'a Self>,
    ) -> (usize, usize) {
        let defaults = Self::default();
        configs
            .into_iter()
            .fold(None, |sizes: Option<(usize, usize)>, config| {
                let (trades, events) = sizes.unwrap_or((0, 0));
                Some((
                    trades.max(config.trade_buffer_size),
                    events.max(config.event_buffer_size),
                ))
            })
            .unwrap_or((defaults.trade_buffer_size, defaults.event_buffer_size))
    }

    pub fn health_check_interval(&self) -> Duration {
        Duration::from_millis(self.health_check_interval_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Parse the configured `BASE_QUOTE` labels
    pub fn tokens_pairs(&self) -> Result<Vec<TokensPair>, ConfigError> {
        self.pairs
            .iter()
            .map(|label| {
                TokensPair::from_label(label, "_")
                    .map_err(|e| ConfigError::InvalidConfiguration(e.to_string()))
            })
            .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.health_check_interval_ms == 0 {
            return Err(ConfigError::InvalidConfiguration(
                "health check interval must be positive".to_string(),
            ));
        }
        if self.connect_timeout_ms == 0 {
            return Err(ConfigError::InvalidConfiguration(
                "connect timeout must be positive".to_string(),
            ));
        }
        if self.trade_buffer_size == 0 || self.event_buffer_size == 0 {
            return Err(ConfigError::InvalidConfiguration(
                "channel buffers must not be empty".to_string(),
            ));
        }
        self.tokens_pairs().map(|_| ())
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                variable: name.to_string(),
                value: raw,
            }),
        Err(_) => Ok(None),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for environment variable {variable}")]
    InvalidValue { variable: String, value: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FeedConfig::default();
        assert_eq!(config.health_check_interval(), Duration::from_secs(10));
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_env_reads_prefixed_variables() {
        env::set_var("CFGTEST_HEALTH_CHECK_MS", "2500");
        env::set_var("CFGTEST_PAIRS", "btc_usd, ETH_USD,");
        env::set_var("CFGTEST_WS_URL", "wss://localhost:9000");
        env::set_var("CFGTEST_TRADE_BUFFER_SIZE", "4096");

        let config = FeedConfig::from_env("cfgtest").unwrap();

        assert_eq!(config.health_check_interval_ms, 2500);
        assert_eq!(config.connect_timeout_ms, 10_000);
        assert_eq!(config.trade_buffer_size, 4096);
        assert_eq!(config.event_buffer_size, 64);
        assert_eq!(config.ws_url.as_deref(), Some("wss://localhost:9000"));
        assert_eq!(
            config.tokens_pairs().unwrap(),
            vec![TokensPair::new("BTC", "USD"), TokensPair::new("ETH", "USD")]
        );
    }

    #[test]
    fn test_shared_buffer_sizes_take_largest() {
        let small = FeedConfig {
            trade_buffer_size: 16,
            event_buffer_size: 128,
            ..FeedConfig::default()
        };
        let large = FeedConfig {
            trade_buffer_size: 4096,
            event_buffer_size: 8,
            ..FeedConfig::default()
        };

        assert_eq!(FeedConfig::shared_buffer_sizes([&small, &large]), (4096, 128));
        assert_eq!(FeedConfig::shared_buffer_sizes([&small]), (16, 128));
        assert_eq!(FeedConfig::shared_buffer_sizes(std::iter::empty()), (1024, 64));
    }

    #[test]
    fn test_from_env_rejects_garbage_numbers() {
        env::set_var("CFGBAD_CONNECT_TIMEOUT_MS", "soon");
        let result = FeedConfig::from_env("cfgbad");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_validate_rejects_bad_pair_labels() {
        let config = FeedConfig::default().pairs(["BTCUSD"]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: FeedConfig =
            serde_json::from_str(r#"{"connect_timeout_ms": 500, "pairs": ["BTC_ETH"]}"#).unwrap();
        assert_eq!(config.connect_timeout_ms, 500);
        assert_eq!(config.health_check_interval_ms, 10_000);
        assert_eq!(config.pairs, vec!["BTC_ETH".to_string()]);
    }
}
