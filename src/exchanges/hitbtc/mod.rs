pub mod codec;
pub mod types;

use crate::core::feed::CodecFeed;
use crate::core::metadata::ExchangeMetadata;
use crate::core::types::{TokensPair, Trade};
use tokio::sync::mpsc;

pub use codec::HitbtcCodec;

pub const EXCHANGE_NAME: &str = "HitBTC";
pub const WS_URL: &str = "wss://api.hitbtc.com/api/2/ws";

/// Exchange symbol of a pair, e.g. `ETHBTC`
pub fn symbol(pair: &TokensPair) -> String {
    format!("{}{}", pair.base(), pair.quote())
}

pub fn metadata(pairs: &[TokensPair], ws_url: Option<&str>) -> ExchangeMetadata {
    ExchangeMetadata::new(EXCHANGE_NAME, ws_url.unwrap_or(WS_URL))
        .with_channel_symbols(pairs.iter().map(|p| (symbol(p), p.clone())))
}

pub fn create_hitbtc_feed(trades: mpsc::Sender<Trade>) -> CodecFeed<HitbtcCodec> {
    CodecFeed::new(HitbtcCodec, trades)
}
