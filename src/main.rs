use anyhow::Context;
use marketfeed::utils::{ExchangeFactory, ExchangeType};
use marketfeed::{ConnectionManager, FeedConfig};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};

const EXCHANGES_VAR: &str = "MARKETFEED_EXCHANGES";
const DEFAULT_EXCHANGES: &str = "bitfinex,hitbtc";
const DEFAULT_PAIRS: [&str; 2] = ["BTC_USD", "ETH_BTC"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut feeds = Vec::new();
    for exchange in load_exchanges()? {
        let mut config = load_config(exchange)?;
        if config.pairs.is_empty() {
            config = config.pairs(DEFAULT_PAIRS);
        }
        feeds.push((exchange, config));
    }

    let (trade_buffer, event_buffer) =
        FeedConfig::shared_buffer_sizes(feeds.iter().map(|(_, config)| config));
    let (trades_tx, mut trades_rx) = mpsc::channel(trade_buffer);
    let (events_tx, mut events_rx) = broadcast::channel(event_buffer);

    let mut tasks = Vec::new();
    for (exchange, config) in feeds {
        let pairs = config.tokens_pairs()?;

        let metadata = match ExchangeFactory::static_metadata(
            exchange,
            &pairs,
            config.ws_url.as_deref(),
        ) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(exchange = %exchange, error = %e, "skipping exchange");
                continue;
            }
        };

        let manager = Arc::new(ConnectionManager::new(
            ExchangeFactory::create_feed(exchange, trades_tx.clone()),
            ExchangeFactory::create_connector(exchange),
            config,
            events_tx.clone(),
        ));
        tasks.push(manager.initialize(metadata).await?);
        info!(exchange = manager.exchange(), pairs = pairs.len(), "feed started");
    }
    drop(trades_tx);

    tokio::spawn(async move {
        loop {
            match events_rx.recv().await {
                Ok(event) => {
                    info!(exchange = event.exchange(), time = event.time(), ?event, "lifecycle event");
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "lifecycle event receiver lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    tokio::spawn(async move {
        while let Some(trade) = trades_rx.recv().await {
            info!(
                exchange = trade.exchange(),
                trade_id = trade.trade_id(),
                side = ?trade.trade_type(),
                base = trade.base_token(),
                quote = trade.quote_token(),
                amount = %trade.base_amount(),
                price = %trade.spot_price(),
                "trade"
            );
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("shutting down");
    for task in tasks {
        task.abort();
    }
    Ok(())
}

fn load_exchanges() -> anyhow::Result<Vec<ExchangeType>> {
    let list = std::env::var(EXCHANGES_VAR).unwrap_or_else(|_| DEFAULT_EXCHANGES.to_string());
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<ExchangeType>()
                .with_context(|| format!("Invalid {} entry '{}'", EXCHANGES_VAR, s))
        })
        .collect()
}

#[cfg(feature = "env-file")]
fn load_config(exchange: ExchangeType) -> anyhow::Result<FeedConfig> {
    FeedConfig::from_env_file(exchange.env_prefix())
        .with_context(|| format!("Invalid {} configuration", exchange))
}

#[cfg(not(feature = "env-file"))]
fn load_config(exchange: ExchangeType) -> anyhow::Result<FeedConfig> {
    FeedConfig::from_env(exchange.env_prefix())
        .with_context(|| format!("Invalid {} configuration", exchange))
}
