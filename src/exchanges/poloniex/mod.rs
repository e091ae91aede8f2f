pub mod codec;
pub mod types;

use crate::core::feed::CodecFeed;
use crate::core::metadata::ExchangeMetadata;
use crate::core::types::{TokensPair, Trade};
use tokio::sync::mpsc;

pub use codec::PoloniexCodec;

pub const EXCHANGE_NAME: &str = "Poloniex";
pub const WS_URL: &str = "wss://api2.poloniex.com";

/// Metadata from a channel id listing (obtained from the ticker endpoint)
pub fn metadata(
    channels: impl IntoIterator<Item = (u64, TokensPair)>,
    ws_url: Option<&str>,
) -> ExchangeMetadata {
    ExchangeMetadata::new(EXCHANGE_NAME, ws_url.unwrap_or(WS_URL)).with_channel_ids(channels)
}

pub fn create_poloniex_feed(trades: mpsc::Sender<Trade>) -> CodecFeed<PoloniexCodec> {
    CodecFeed::new(PoloniexCodec, trades)
}
