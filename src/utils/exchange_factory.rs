use crate::core::{
    config::ConfigError,
    errors::ExchangeError,
    kernel::{TungsteniteConnector, WsConnector},
    metadata::ExchangeMetadata,
    traits::ExchangeFeed,
    types::{TokensPair, Trade},
};
use crate::exchanges::{bitfinex, hitbtc, poloniex};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Supported exchange types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExchangeType {
    Bitfinex,
    Poloniex,
    HitBtc,
}

impl ExchangeType {
    pub const ALL: [Self; 3] = [Self::Bitfinex, Self::Poloniex, Self::HitBtc];

    /// Prefix of this exchange's environment variables, e.g. `BITFINEX`
    pub const fn env_prefix(self) -> &'static str {
        match self {
            Self::Bitfinex => "BITFINEX",
            Self::Poloniex => "POLONIEX",
            Self::HitBtc => "HITBTC",
        }
    }
}

impl std::fmt::Display for ExchangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bitfinex => write!(f, "{}", bitfinex::EXCHANGE_NAME),
            Self::Poloniex => write!(f, "{}", poloniex::EXCHANGE_NAME),
            Self::HitBtc => write!(f, "{}", hitbtc::EXCHANGE_NAME),
        }
    }
}

impl FromStr for ExchangeType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bitfinex" => Ok(Self::Bitfinex),
            "poloniex" => Ok(Self::Poloniex),
            "hitbtc" => Ok(Self::HitBtc),
            other => Err(ConfigError::InvalidConfiguration(format!(
                "Unsupported exchange: {}",
                other
            ))),
        }
    }
}

/// Factory for creating exchange feeds
pub struct ExchangeFactory;

impl ExchangeFactory {
    /// Create the feed of the given exchange, forwarding trades to `trades`
    pub fn create_feed(
        exchange_type: ExchangeType,
        trades: mpsc::Sender<Trade>,
    ) -> Arc<dyn ExchangeFeed> {
        match exchange_type {
            ExchangeType::Bitfinex => Arc::new(bitfinex::create_bitfinex_feed(trades)),
            ExchangeType::Poloniex => Arc::new(poloniex::create_poloniex_feed(trades)),
            ExchangeType::HitBtc => Arc::new(hitbtc::create_hitbtc_feed(trades)),
        }
    }

    pub fn create_connector(exchange_type: ExchangeType) -> Arc<dyn WsConnector> {
        Arc::new(TungsteniteConnector::new(exchange_type.to_string()))
    }

    /// Metadata for exchanges whose channels follow from the pair alone.
    ///
    /// Poloniex channel ids have to be fetched from its REST ticker first, so
    /// they cannot be built here.
    pub fn static_metadata(
        exchange_type: ExchangeType,
        pairs: &[TokensPair],
        ws_url: Option<&str>,
    ) -> Result<ExchangeMetadata, ExchangeError> {
        match exchange_type {
            ExchangeType::Bitfinex => Ok(bitfinex::metadata(pairs, ws_url)),
            ExchangeType::HitBtc => Ok(hitbtc::metadata(pairs, ws_url)),
            ExchangeType::Poloniex => Err(ConfigError::InvalidConfiguration(
                "Poloniex channel ids require a REST bootstrap".to_string(),
            )
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_type_round_trips_through_display() {
        for exchange in ExchangeType::ALL {
            assert_eq!(exchange.to_string().parse::<ExchangeType>().unwrap(), exchange);
        }
        assert_eq!(" HITBTC ".parse::<ExchangeType>().unwrap(), ExchangeType::HitBtc);
        assert!("kraken".parse::<ExchangeType>().is_err());
    }

    #[test]
    fn test_static_metadata() {
        let pairs = [TokensPair::new("ETH", "BTC")];

        let bitfinex = ExchangeFactory::static_metadata(ExchangeType::Bitfinex, &pairs, None).unwrap();
        assert_eq!(bitfinex.pair_for_symbol("tETHBTC"), Some(&pairs[0]));

        let hitbtc = ExchangeFactory::static_metadata(
            ExchangeType::HitBtc,
            &pairs,
            Some("ws://localhost:9000"),
        )
        .unwrap();
        assert_eq!(hitbtc.ws_uri, "ws://localhost:9000");
        assert_eq!(hitbtc.pair_for_symbol("ETHBTC"), Some(&pairs[0]));

        assert!(matches!(
            ExchangeFactory::static_metadata(ExchangeType::Poloniex, &pairs, None),
            Err(ExchangeError::ConfigError(_))
        ));
    }

    #[test]
    fn test_create_feed_names_exchange() {
        let (tx, _rx) = mpsc::channel(1);
        for exchange in ExchangeType::ALL {
            let feed = ExchangeFactory::create_feed(exchange, tx.clone());
            assert_eq!(feed.exchange(), exchange.to_string());
        }
    }
}
