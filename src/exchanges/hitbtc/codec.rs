use crate::core::errors::ExchangeError;
use crate::core::kernel::WsCodec;
use crate::core::metadata::ExchangeMetadata;
use crate::core::types::{conversion, ParsedMessage, TokensPair, Trade, TradeType};
use crate::exchanges::hitbtc::types::{
    HitbtcSubscribe, HitbtcSymbolParams, HitbtcTrade, HitbtcTradesParams,
};
use crate::exchanges::hitbtc::EXCHANGE_NAME;
use chrono::DateTime;
use serde_json::{Map, Value};
use tokio_tungstenite::tungstenite::Message;

const SNAPSHOT_TRADES: &str = "snapshotTrades";
const UPDATE_TRADES: &str = "updateTrades";
const SUBSCRIBE_TRADES: &str = "subscribeTrades";

/// HitBTC JSON-RPC codec.
///
/// All symbols share one socket; each notification names its symbol in
/// `params.symbol`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HitbtcCodec;

impl HitbtcCodec {
    fn parse_object(
        object: &Map<String, Value>,
        metadata: &ExchangeMetadata,
        raw: &str,
    ) -> ParsedMessage {
        if object.contains_key("result") {
            return ParsedMessage::empty();
        }

        let method = object.get("method").and_then(Value::as_str);
        if !matches!(method, Some(SNAPSHOT_TRADES | UPDATE_TRADES)) {
            return ParsedMessage::Unrecognized(raw.to_string());
        }

        let Some(params) = object
            .get("params")
            .and_then(|p| serde_json::from_value::<HitbtcTradesParams>(p.clone()).ok())
        else {
            return ParsedMessage::Unrecognized(raw.to_string());
        };

        let Some(pair) = metadata.pair_for_symbol(&params.symbol) else {
            return ParsedMessage::UnknownTokensPair(params.symbol);
        };

        params
            .data
            .iter()
            .map(|trade| parse_trade(trade, pair))
            .collect::<Option<Vec<_>>>()
            .map_or_else(
                || ParsedMessage::Unrecognized(raw.to_string()),
                ParsedMessage::TradeBatch,
            )
    }
}

fn parse_trade(trade: &HitbtcTrade, pair: &TokensPair) -> Option<Trade> {
    let trade_type = match trade.side.as_str() {
        "buy" => TradeType::Buy,
        "sell" => TradeType::Sell,
        _ => return None,
    };
    let timestamp = DateTime::parse_from_rfc3339(&trade.timestamp)
        .ok()?
        .timestamp();

    Trade::new(
        conversion::value_to_id(&trade.id)?,
        EXCHANGE_NAME,
        pair,
        trade_type,
        conversion::value_to_decimal(&trade.quantity)?,
        conversion::value_to_decimal(&trade.price)?,
        timestamp,
    )
    .ok()
}

impl WsCodec for HitbtcCodec {
    fn exchange(&self) -> &'static str {
        EXCHANGE_NAME
    }

    fn encode_subscriptions(
        &self,
        metadata: &ExchangeMetadata,
    ) -> Result<Vec<Message>, ExchangeError> {
        metadata
            .channel_symbol_to_pair
            .keys()
            .zip(1u64..)
            .map(|(symbol, id)| {
                let request = HitbtcSubscribe {
                    method: SUBSCRIBE_TRADES,
                    params: HitbtcSymbolParams { symbol },
                    id,
                };
                serde_json::to_string(&request)
                    .map(Message::Text)
                    .map_err(|e| {
                        ExchangeError::SerializationError(format!(
                            "Failed to encode subscription: {}",
                            e
                        ))
                    })
            })
            .collect()
    }

    fn parse(&self, raw: &str, metadata: &ExchangeMetadata) -> ParsedMessage {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(object)) => Self::parse_object(&object, metadata, raw),
            _ => ParsedMessage::Unrecognized(raw.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn metadata() -> ExchangeMetadata {
        ExchangeMetadata::new(EXCHANGE_NAME, "wss://api.hitbtc.com/api/2/ws")
            .with_channel_symbols([("ETHBTC".to_string(), TokensPair::new("ETH", "BTC"))])
    }

    #[test]
    fn test_parse_update_trades() {
        let frame = r#"{"jsonrpc":"2.0","method":"updateTrades","params":{"data":[{"id":54469813,"price":"0.054670","quantity":"0.183","side":"buy","timestamp":"2017-10-19T16:34:25.041Z"},{"id":54469814,"price":"0.054669","quantity":"0.5","side":"sell","timestamp":"2017-10-19T16:34:26.000Z"}],"symbol":"ETHBTC"}}"#;

        let ParsedMessage::TradeBatch(trades) = HitbtcCodec.parse(frame, &metadata()) else {
            panic!("Expected trade batch");
        };

        assert_eq!(trades.len(), 2);
        let first = &trades[0];
        assert_eq!(first.trade_id(), "54469813");
        assert_eq!(first.exchange(), "HitBTC");
        assert_eq!(first.trade_type(), TradeType::Buy);
        assert_eq!(first.base_token(), "ETH");
        assert_eq!(first.quote_token(), "BTC");
        assert_eq!(first.spot_price(), Decimal::from_str("0.054670").unwrap());
        assert_eq!(first.base_amount(), Decimal::from_str("0.183").unwrap());
        assert_eq!(first.quote_amount(), Decimal::from_str("0.01000461").unwrap());
        assert_eq!(first.timestamp(), 1_508_430_865);
        assert_eq!(trades[1].trade_type(), TradeType::Sell);
        assert_eq!(trades[1].timestamp(), 1_508_430_866);
    }

    #[test]
    fn test_empty_snapshot() {
        let frame = r#"{"jsonrpc":"2.0","method":"snapshotTrades","params":{"data":[],"symbol":"ETHBTC"}}"#;
        assert_eq!(HitbtcCodec.parse(frame, &metadata()), ParsedMessage::empty());
    }

    #[test]
    fn test_subscription_result_is_empty_batch() {
        let frame = r#"{"jsonrpc":"2.0","result":true,"id":1}"#;
        assert_eq!(HitbtcCodec.parse(frame, &metadata()), ParsedMessage::empty());
    }

    #[test]
    fn test_unknown_symbol() {
        let frame = r#"{"jsonrpc":"2.0","method":"updateTrades","params":{"data":[],"symbol":"LTCUSD"}}"#;
        assert_eq!(
            HitbtcCodec.parse(frame, &metadata()),
            ParsedMessage::UnknownTokensPair("LTCUSD".to_string())
        );
    }

    #[test]
    fn test_malformed_frames_are_unrecognized() {
        for frame in [
            r#"{"jsonrpc":"2.0","error":{"code":2001,"message":"Symbol not found"},"id":1}"#,
            r#"{"jsonrpc":"2.0","method":"ticker","params":{"symbol":"ETHBTC"}}"#,
            r#"{"jsonrpc":"2.0","method":"updateTrades","params":{"symbol":"ETHBTC"}}"#,
            r#"{"jsonrpc":"2.0","method":"updateTrades","params":{"data":[{"id":1,"price":"0.1","quantity":"1","side":"hold","timestamp":"2017-10-19T16:34:25.041Z"}],"symbol":"ETHBTC"}}"#,
            r#"{"jsonrpc":"2.0","method":"updateTrades","params":{"data":[{"id":1,"price":"0.1","quantity":"1","side":"buy","timestamp":"yesterday"}],"symbol":"ETHBTC"}}"#,
            "[1,2,3]",
            "{",
        ] {
            assert_eq!(
                HitbtcCodec.parse(frame, &metadata()),
                ParsedMessage::Unrecognized(frame.to_string()),
                "frame {frame:?}"
            );
        }
    }

    #[test]
    fn test_encode_subscriptions() {
        let meta = metadata().with_channel_symbols([(
            "BTCUSD".to_string(),
            TokensPair::new("BTC", "USD"),
        )]);
        let messages = HitbtcCodec.encode_subscriptions(&meta).unwrap();
        assert_eq!(
            messages,
            vec![
                Message::Text(
                    r#"{"method":"subscribeTrades","params":{"symbol":"BTCUSD"},"id":1}"#
                        .to_string()
                ),
                Message::Text(
                    r#"{"method":"subscribeTrades","params":{"symbol":"ETHBTC"},"id":2}"#
                        .to_string()
                ),
            ]
        );
    }
}
