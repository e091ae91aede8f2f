use crate::core::errors::ExchangeError;
use crate::core::kernel::WsCodec;
use crate::core::metadata::ExchangeMetadata;
use crate::core::types::{conversion, ParsedMessage, TokensPair, Trade, TradeType};
use crate::exchanges::poloniex::types::PoloniexCommand;
use crate::exchanges::poloniex::EXCHANGE_NAME;
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message;

/// Channel used by the exchange for connection heartbeats
pub const HEARTBEAT_CHANNEL: u64 = 1010;

const TRADE_RECORD: &str = "t";

/// Poloniex push API codec.
///
/// Market channels (ids below 1000) carry
/// `[channelId, seq, [records...]]` where each record is an order book update
/// (`"o"`/`"i"`) or a trade:
///
/// ```text
/// ["t", "126320", 1, "0.00003328", "399377.76875000", 1499708547]
///  kind  id       side rate         amount             time (s)
/// ```
///
/// Side `1` is a buy, `0` a sell.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoloniexCodec;

impl PoloniexCodec {
    fn parse_frame(frame: &[Value], metadata: &ExchangeMetadata, raw: &str) -> ParsedMessage {
        let Some(channel_id) = frame.first().and_then(Value::as_u64) else {
            return ParsedMessage::Unrecognized(raw.to_string());
        };
        if channel_id == HEARTBEAT_CHANNEL {
            return ParsedMessage::empty();
        }
        let Some(pair) = metadata.pair_for_channel_id(channel_id) else {
            return ParsedMessage::UnknownTokensPair(channel_id.to_string());
        };

        match (frame.get(1), frame.get(2)) {
            // subscription acknowledgement: [channelId, 1]
            (Some(ack), None) if ack.as_u64().is_some() => ParsedMessage::empty(),
            (Some(seq), Some(Value::Array(records))) if seq.as_u64().is_some() => records
                .iter()
                .filter(|record| is_trade_record(record))
                .map(|record| record.as_array().and_then(|r| parse_trade(r, pair)))
                .collect::<Option<Vec<_>>>()
                .map_or_else(
                    || ParsedMessage::Unrecognized(raw.to_string()),
                    ParsedMessage::TradeBatch,
                ),
            _ => ParsedMessage::Unrecognized(raw.to_string()),
        }
    }
}

fn is_trade_record(record: &Value) -> bool {
    record.get(0).and_then(Value::as_str) == Some(TRADE_RECORD)
}

/// `["t", id, side, rate, amount, time]`
fn parse_trade(record: &[Value], pair: &TokensPair) -> Option<Trade> {
    let [_, id, side, rate, amount, time] = record else {
        return None;
    };

    let trade_type = match side.as_u64()? {
        0 => TradeType::Sell,
        1 => TradeType::Buy,
        _ => return None,
    };
    let rate = conversion::value_to_decimal(rate)?;
    let amount = conversion::value_to_decimal(amount)?;

    Trade::new(
        conversion::value_to_id(id)?,
        EXCHANGE_NAME,
        pair,
        trade_type,
        amount,
        rate,
        time.as_i64()?,
    )
    .ok()
}

impl WsCodec for PoloniexCodec {
    fn exchange(&self) -> &'static str {
        EXCHANGE_NAME
    }

    fn encode_subscriptions(
        &self,
        metadata: &ExchangeMetadata,
    ) -> Result<Vec<Message>, ExchangeError> {
        metadata
            .channel_id_to_pair
            .keys()
            .map(|&channel| {
                serde_json::to_string(&PoloniexCommand::subscribe(channel))
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
            Ok(Value::Array(frame)) => Self::parse_frame(&frame, metadata, raw),
            _ => ParsedMessage::Unrecognized(raw.to_string()),
        }
    }
}
