pub mod codec;
pub mod types;

use crate::core::feed::CodecFeed;
use crate::core::metadata::ExchangeMetadata;
use crate::core::types::{Trade, TokensPair};
use tokio::sync::mpsc;

pub use codec::BitfinexCodec;

pub const EXCHANGE_NAME: &str = "Bitfinex";
pub const WS_URL: &str = "wss://api.bitfinex.com/ws/2";

/// Trading symbol of a pair, e.g. `tBTCUSD`
pub fn trading_symbol(pair: &TokensPair) -> String {
    format!("t{}{}", pair.base(), pair.quote())
}

/// Metadata for the given pairs. Channel ids are learned from subscription
/// acknowledgements, so only the symbol mapping is populated.
pub fn metadata(pairs: &[TokensPair], ws_url: Option<&str>) -> ExchangeMetadata {
    ExchangeMetadata::new(EXCHANGE_NAME, ws_url.unwrap_or(WS_URL))
        .with_channel_symbols(pairs.iter().map(|p| (trading_symbol(p), p.clone())))
}

pub fn create_bitfinex_feed(trades: mpsc::Sender<Trade>) -> CodecFeed<BitfinexCodec> {
    CodecFeed::new(BitfinexCodec, trades)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_maps_trading_symbols() {
        let pairs = [TokensPair::new("BTC", "USD"), TokensPair::new("ETH", "BTC")];
        let meta = metadata(&pairs, None);
        assert_eq!(meta.ws_uri, WS_URL);
        assert_eq!(meta.pair_for_symbol("tBTCUSD"), Some(&pairs[0]));
        assert_eq!(meta.pair_for_symbol("tETHBTC"), Some(&pairs[1]));
        assert!(meta.channel_id_to_pair.is_empty());
    }
}
