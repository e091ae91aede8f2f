use crate::core::errors::ExchangeError;
use crate::core::metadata::ExchangeMetadata;
use crate::core::types::ParsedMessage;
use tokio_tungstenite::tungstenite::Message;

/// Codec trait for exchange-specific websocket frames
///
/// Each exchange implements this trait once. Implementations must be pure:
/// the result of [`WsCodec::parse`] depends only on the frame and the supplied
/// metadata snapshot.
pub trait WsCodec: Send + Sync + 'static {
    /// Exchange name stamped on every trade produced by this codec
    fn exchange(&self) -> &'static str;

    /// Encode the subscription requests sent right after a handshake
    ///
    /// # Arguments
    /// * `metadata` - Current channel mapping; every mapped pair is subscribed
    fn encode_subscriptions(&self, metadata: &ExchangeMetadata)
        -> Result<Vec<Message>, ExchangeError>;

    /// Decode one raw text frame
    ///
    /// Never fails: malformed frames become [`ParsedMessage::Unrecognized`]
    /// and frames for unmapped channels [`ParsedMessage::UnknownTokensPair`].
    fn parse(&self, raw: &str, metadata: &ExchangeMetadata) -> ParsedMessage;
}
