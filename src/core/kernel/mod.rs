/// Exchange-agnostic transport layer
///
/// The kernel holds only transport logic and the generic interfaces exchanges
/// plug into:
///
/// - `WsCodec`: per-exchange frame parsing and subscription encoding
/// - `WsConnector` / `WsSession`: websocket handshake and session handle
/// - `FrameHandler`: consumer of inbound text frames, fed by the session's
///   reader task in receipt order
///
/// # Example
/// ```rust,no_run
/// use marketfeed::core::kernel::*;
/// use marketfeed::core::metadata::ExchangeMetadata;
/// use marketfeed::core::types::TokensPair;
/// use marketfeed::exchanges::bitfinex::BitfinexCodec;
///
/// let metadata = ExchangeMetadata::new("Bitfinex", "wss://api.bitfinex.com/ws/2")
///     .with_channel_ids([(53, TokensPair::new("BTC", "ETH"))]);
/// let parsed = BitfinexCodec.parse(r#"[53,"hb"]"#, &metadata);
/// ```
pub mod codec;
pub mod ws;

pub use codec::WsCodec;
pub use ws::{FrameHandler, TungsteniteConnector, TungsteniteSession, WsConnector, WsSession};
