use crate::core::types::TokensPair;
use serde::Deserialize;

/// Separator of pair labels in client commands, e.g. `BTC_ETH`
pub const PAIR_LABEL_SEPARATOR: &str = "_";

const TRADES_STREAM: &str = "trades";

/// Command sent by a downstream websocket client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsCommand {
    /// `{"subscribe":"trades","pairs":["BTC_ETH",...]}`; pairs keep request order
    TradeChannelSubscription { pairs: Vec<TokensPair> },
    /// Anything else, carrying the original text
    Unknown(String),
}

#[derive(Debug, Deserialize)]
struct SubscribeRequest {
    subscribe: String,
    pairs: Vec<String>,
}

/// Parse one client text frame. Never fails: unrecognized input is returned
/// as [`WsCommand::Unknown`].
pub fn parse_command(text: &str) -> WsCommand {
    let unknown = || WsCommand::Unknown(text.to_string());

    let Ok(request) = serde_json::from_str::<SubscribeRequest>(text) else {
        return unknown();
    };
    if request.subscribe != TRADES_STREAM {
        return unknown();
    }

    request
        .pairs
        .iter()
        .map(|label| TokensPair::from_label(label, PAIR_LABEL_SEPARATOR))
        .collect::<Result<Vec<_>, _>>()
        .map_or_else(|_| unknown(), |pairs| WsCommand::TradeChannelSubscription { pairs })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_json_is_unknown() {
        let message = "[q34342%&$&__~~~~";
        assert_eq!(parse_command(message), WsCommand::Unknown(message.to_string()));
    }

    #[test]
    fn test_trade_subscription() {
        let message = r#"{"subscribe":"trades","pairs":["BTC_ETH","ETH_USD"]}"#;
        let expected = vec![
            TokensPair::from_label("BTC_ETH", "_").unwrap(),
            TokensPair::from_label("ETH_USD", "_").unwrap(),
        ];
        assert_eq!(
            parse_command(message),
            WsCommand::TradeChannelSubscription { pairs: expected }
        );
    }

    #[test]
    fn test_pairs_keep_request_order() {
        let message = r#"{"subscribe":"trades","pairs":["eth_usd","BTC_ETH"]}"#;
        let WsCommand::TradeChannelSubscription { pairs } = parse_command(message) else {
            panic!("Expected subscription");
        };
        assert_eq!(pairs, vec![TokensPair::new("ETH", "USD"), TokensPair::new("BTC", "ETH")]);
    }

    #[test]
    fn test_other_shapes_are_unknown() {
        for message in [
            r#"{"subscribe":"orders","pairs":["BTC_ETH"]}"#,
            r#"{"subscribe":"trades"}"#,
            r#"{"subscribe":"trades","pairs":"BTC_ETH"}"#,
            r#"{"subscribe":"trades","pairs":["BTCETH"]}"#,
            r#"{"subscribe":"trades","pairs":["BTC_ETH_USD"]}"#,
            r#"["subscribe","trades"]"#,
            "",
        ] {
            assert_eq!(
                parse_command(message),
                WsCommand::Unknown(message.to_string()),
                "message {message:?}"
            );
        }
    }
}
