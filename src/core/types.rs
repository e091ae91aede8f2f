use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Typed errors for the canonical model
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypesError {
    #[error("Invalid tokens pair: {0}")]
    InvalidTokensPair(String),
    #[error("Invalid price: {0}")]
    InvalidPrice(String),
    #[error("Arithmetic overflow: {0}")]
    Overflow(String),
}

/// Canonical (base, quote) trading pair with upper-cased tokens
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokensPair {
    base: String,
    quote: String,
}

impl TokensPair {
    pub fn new(base: impl AsRef<str>, quote: impl AsRef<str>) -> Self {
        Self {
            base: base.as_ref().trim().to_uppercase(),
            quote: quote.as_ref().trim().to_uppercase(),
        }
    }

    /// Split a combined label such as `"BTC_ETH"` on `separator`.
    ///
    /// The label must contain the separator exactly once with non-empty tokens
    /// on both sides.
    pub fn from_label(label: &str, separator: &str) -> Result<Self, TypesError> {
        if separator.is_empty() {
            return Err(TypesError::InvalidTokensPair(format!(
                "empty separator for label '{}'",
                label
            )));
        }

        let mut parts = label.split(separator);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(base), Some(quote), None)
                if !base.trim().is_empty() && !quote.trim().is_empty() =>
            {
                Ok(Self::new(base, quote))
            }
            _ => Err(TypesError::InvalidTokensPair(format!(
                "'{}' is not a <base>{}<quote> label",
                label, separator
            ))),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn quote(&self) -> &str {
        &self.quote
    }

    /// Render back into a combined label
    pub fn label(&self, separator: &str) -> String {
        format!("{}{}{}", self.base, separator, self.quote)
    }
}

impl fmt::Display for TokensPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeType {
    Buy,
    Sell,
}

/// Canonical trade event.
///
/// `quote_amount` is always `base_amount * spot_price` computed with exact
/// decimal arithmetic; the only way to build a trade is [`Trade::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trade {
    trade_id: String,
    exchange: String,
    trade_type: TradeType,
    base_token: String,
    quote_token: String,
    #[serde(with = "rust_decimal::serde::str")]
    base_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    quote_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    spot_price: Decimal,
    timestamp: i64,
}

impl Trade {
    /// Build a trade from exchange values.
    ///
    /// `amount` may carry a sign (some exchanges encode the side that way); the
    /// stored base amount is its magnitude.
    pub fn new(
        trade_id: impl Into<String>,
        exchange: impl Into<String>,
        pair: &TokensPair,
        trade_type: TradeType,
        amount: Decimal,
        spot_price: Decimal,
        timestamp: i64,
    ) -> Result<Self, TypesError> {
        if spot_price <= Decimal::ZERO {
            return Err(TypesError::InvalidPrice(spot_price.to_string()));
        }

        let base_amount = amount.abs();
        let quote_amount = base_amount.checked_mul(spot_price).ok_or_else(|| {
            TypesError::Overflow(format!("{} * {}", base_amount, spot_price))
        })?;

        Ok(Self {
            trade_id: trade_id.into(),
            exchange: exchange.into(),
            trade_type,
            base_token: pair.base().to_string(),
            quote_token: pair.quote().to_string(),
            base_amount,
            quote_amount,
            spot_price,
            timestamp,
        })
    }

    pub fn trade_id(&self) -> &str {
        &self.trade_id
    }

    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    pub fn trade_type(&self) -> TradeType {
        self.trade_type
    }

    pub fn base_token(&self) -> &str {
        &self.base_token
    }

    pub fn quote_token(&self) -> &str {
        &self.quote_token
    }

    pub fn base_amount(&self) -> Decimal {
        self.base_amount
    }

    pub fn quote_amount(&self) -> Decimal {
        self.quote_amount
    }

    pub fn spot_price(&self) -> Decimal {
        self.spot_price
    }

    /// Unix time in whole seconds
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Uniqueness key of a trade across all feeds
    pub fn key(&self) -> (&str, &str) {
        (&self.exchange, &self.trade_id)
    }
}

/// Result of parsing one raw frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedMessage {
    /// Trades carried by the frame, in frame order. Control frames yield an
    /// empty batch.
    TradeBatch(Vec<Trade>),
    /// The frame referenced a channel id or symbol missing from the mapping
    UnknownTokensPair(String),
    /// The exchange confirmed a subscription and assigned it a channel id
    ChannelSubscribed { channel_id: u64, pair: TokensPair },
    /// The frame did not match any known shape
    Unrecognized(String),
}

impl ParsedMessage {
    pub fn empty() -> Self {
        Self::TradeBatch(Vec::new())
    }
}

/// Helpers turning wire literals into exact decimals
pub mod conversion {
    use rust_decimal::Decimal;
    use serde_json::Value;
    use std::str::FromStr;

    /// Parse a decimal literal, accepting scientific notation
    pub fn str_to_decimal(s: &str) -> Option<Decimal> {
        let s = s.trim();
        Decimal::from_str(s)
            .or_else(|_| Decimal::from_scientific(s))
            .ok()
    }

    /// Read a JSON number or numeric string without going through `f64`
    pub fn value_to_decimal(value: &Value) -> Option<Decimal> {
        match value {
            Value::Number(n) => str_to_decimal(&n.to_string()),
            Value::String(s) => str_to_decimal(s),
            _ => None,
        }
    }

    /// Stringify a trade id that may arrive as a number or a string
    pub fn value_to_id(value: &Value) -> Option<String> {
        match value {
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }

    /// Millisecond timestamp to whole seconds (truncating)
    pub fn millis_to_seconds(millis: i64) -> i64 {
        millis / 1000
    }
}
