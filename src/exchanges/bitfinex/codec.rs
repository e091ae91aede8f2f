use crate::core::errors::ExchangeError;
use crate::core::kernel::WsCodec;
use crate::core::metadata::ExchangeMetadata;
use crate::core::types::{conversion, ParsedMessage, TokensPair, Trade, TradeType};
use crate::exchanges::bitfinex::types::{BitfinexSubscribe, BitfinexSubscribed};
use crate::exchanges::bitfinex::EXCHANGE_NAME;
use rust_decimal::Decimal;
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message;

const TRADE_EXECUTED: &str = "te";
const TRADE_UPDATED: &str = "tu";
const HEARTBEAT: &str = "hb";

/// Bitfinex v2 public trades codec.
///
/// Channel ids are allocated by the exchange on subscription and announced in
/// an `{"event":"subscribed",...}` frame. Data frames look like
///
/// ```text
/// [53,"te",[43334639,1499972199000,-0.01293103,2320]]   executed trade
/// [53,"tu",[43334639,1499972199000,-0.01293103,2320]]   same trade, ignored
/// [53,[[id,mts,amount,price],...]]                      snapshot
/// [53,"hb"]                                             heartbeat
/// ```
///
/// A negative amount is a sell.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitfinexCodec;

impl BitfinexCodec {
    fn parse_event(value: &Value, metadata: &ExchangeMetadata, raw: &str) -> ParsedMessage {
        match value.get("event").and_then(Value::as_str) {
            Some("subscribed") => {
                let Ok(subscribed) = serde_json::from_value::<BitfinexSubscribed>(value.clone())
                else {
                    return ParsedMessage::Unrecognized(raw.to_string());
                };
                metadata.pair_for_symbol(&subscribed.symbol).map_or_else(
                    || ParsedMessage::UnknownTokensPair(subscribed.symbol.clone()),
                    |pair| ParsedMessage::ChannelSubscribed {
                        channel_id: subscribed.chan_id,
                        pair: pair.clone(),
                    },
                )
            }
            Some(_) => ParsedMessage::empty(),
            None => ParsedMessage::Unrecognized(raw.to_string()),
        }
    }

    fn parse_channel_frame(
        frame: &[Value],
        metadata: &ExchangeMetadata,
        raw: &str,
    ) -> ParsedMessage {
        let Some(channel_id) = frame.first().and_then(Value::as_u64) else {
            return ParsedMessage::Unrecognized(raw.to_string());
        };
        let Some(pair) = metadata.pair_for_channel_id(channel_id) else {
            return ParsedMessage::UnknownTokensPair(channel_id.to_string());
        };

        let trades = match frame.get(1) {
            Some(Value::String(kind)) if kind == TRADE_EXECUTED => match frame.get(2) {
                Some(Value::Array(record)) => parse_trade(record, pair).map(|t| vec![t]),
                _ => None,
            },
            Some(Value::String(kind)) if kind == TRADE_UPDATED || kind == HEARTBEAT => {
                Some(Vec::new())
            }
            Some(Value::Array(snapshot)) => snapshot
                .iter()
                .map(|record| record.as_array().and_then(|r| parse_trade(r, pair)))
                .collect(),
            _ => None,
        };

        trades.map_or_else(
            || ParsedMessage::Unrecognized(raw.to_string()),
            ParsedMessage::TradeBatch,
        )
    }
}

/// `[id, mts, amount, price]`
fn parse_trade(record: &[Value], pair: &TokensPair) -> Option<Trade> {
    let [id, mts, amount, price] = record else {
        return None;
    };

    let trade_id = conversion::value_to_id(id)?;
    let timestamp = conversion::millis_to_seconds(mts.as_i64()?);
    let amount = conversion::value_to_decimal(amount)?;
    let price = conversion::value_to_decimal(price)?;
    let trade_type = if amount < Decimal::ZERO {
        TradeType::Sell
    } else {
        TradeType::Buy
    };

    Trade::new(trade_id, EXCHANGE_NAME, pair, trade_type, amount, price, timestamp).ok()
}

impl WsCodec for BitfinexCodec {
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
            .map(|symbol| {
                let request = BitfinexSubscribe {
                    event: "subscribe",
                    channel: "trades",
                    symbol,
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
            Ok(Value::Array(frame)) => Self::parse_channel_frame(&frame, metadata, raw),
            Ok(value @ Value::Object(_)) => Self::parse_event(&value, metadata, raw),
            _ => ParsedMessage::Unrecognized(raw.to_string()),
        }
    }
}
