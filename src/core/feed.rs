use crate::core::{
    errors::ExchangeError,
    kernel::{FrameHandler, WsCodec, WsSession},
    metadata::{ExchangeMetadata, MetadataEpochs},
    traits::ExchangeFeed,
    types::{ParsedMessage, Trade},
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// [`ExchangeFeed`] driven by an exchange codec.
///
/// Parsed trades are forwarded to `trades` in frame order.
pub struct CodecFeed<C: WsCodec> {
    codec: Arc<C>,
    trades: mpsc::Sender<Trade>,
}

impl<C: WsCodec> CodecFeed<C> {
    pub fn new(codec: C, trades: mpsc::Sender<Trade>) -> Self {
        Self {
            codec: Arc::new(codec),
            trades,
        }
    }
}

#[async_trait]
impl<C: WsCodec> ExchangeFeed for CodecFeed<C> {
    fn exchange(&self) -> &str {
        self.codec.exchange()
    }

    fn frame_handler(&self, epochs: MetadataEpochs) -> Box<dyn FrameHandler> {
        Box::new(TradeFrameHandler {
            codec: Arc::clone(&self.codec),
            epochs,
            trades: self.trades.clone(),
        })
    }

    async fn setup_channels(
        &self,
        session: &mut dyn WsSession,
        metadata: &ExchangeMetadata,
    ) -> Result<(), ExchangeError> {
        let requests = self.codec.encode_subscriptions(metadata)?;
        info!(
            exchange = self.codec.exchange(),
            requests = requests.len(),
            "subscribing to trade channels"
        );
        for request in requests {
            session.send_raw(request).await?;
        }
        Ok(())
    }
}

/// Frame consumer: decode with the codec against the current epoch, then
/// dispatch on the parse result.
pub struct TradeFrameHandler<C: WsCodec> {
    codec: Arc<C>,
    epochs: MetadataEpochs,
    trades: mpsc::Sender<Trade>,
}

#[async_trait]
impl<C: WsCodec> FrameHandler for TradeFrameHandler<C> {
    async fn on_frame(&mut self, frame: String) {
        let metadata = self.epochs.current();
        let exchange = self.codec.exchange();

        match self.codec.parse(&frame, &metadata) {
            ParsedMessage::TradeBatch(trades) => {
                for trade in trades {
                    if self.trades.send(trade).await.is_err() {
                        warn!(exchange, "trade receiver dropped, discarding frame");
                        return;
                    }
                }
            }
            ParsedMessage::ChannelSubscribed { channel_id, pair } => {
                info!(exchange, channel_id, pair = %pair, "channel subscribed");
                self.epochs.bind_channel(channel_id, pair);
            }
            ParsedMessage::UnknownTokensPair(channel) => {
                warn!(exchange, channel = %channel, "frame references unknown tokens pair");
            }
            ParsedMessage::Unrecognized(raw) => {
                debug!(exchange, message = %raw, "skipping unrecognized frame");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::TokensPair;
    use crate::exchanges::bitfinex::{self, BitfinexCodec};
    use tokio_tungstenite::tungstenite::Message;

    #[derive(Default)]
    struct RecordingSession {
        sent: Vec<Message>,
    }

    #[async_trait]
    impl WsSession for RecordingSession {
        fn is_open(&self) -> bool {
            true
        }

        async fn send_raw(&mut self, msg: Message) -> Result<(), ExchangeError> {
            self.sent.push(msg);
            Ok(())
        }

        async fn ping(&mut self) -> Result<(), ExchangeError> {
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ExchangeError> {
            Ok(())
        }
    }

    fn epochs() -> MetadataEpochs {
        MetadataEpochs::new(bitfinex::metadata(&[TokensPair::new("BTC", "ETH")], None))
    }

    #[tokio::test]
    async fn test_setup_channels_sends_subscriptions() {
        let (tx, _rx) = mpsc::channel(8);
        let feed = CodecFeed::new(BitfinexCodec, tx);
        let mut session = RecordingSession::default();

        feed.setup_channels(&mut session, &epochs().current())
            .await
            .unwrap();

        assert_eq!(
            session.sent,
            vec![Message::Text(
                r#"{"event":"subscribe","channel":"trades","symbol":"tBTCETH"}"#.to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_subscription_ack_binds_channel_for_later_frames() {
        let (tx, mut rx) = mpsc::channel(8);
        let feed = CodecFeed::new(BitfinexCodec, tx);
        let epochs = epochs();
        let mut handler = feed.frame_handler(epochs.clone());

        handler
            .on_frame(r#"[53,"te",[43334639,1499972199000,-0.01293103,2320]]"#.to_string())
            .await;
        assert!(rx.try_recv().is_err());

        handler
            .on_frame(
                r#"{"event":"subscribed","channel":"trades","chanId":53,"symbol":"tBTCETH","pair":"BTCETH"}"#
                    .to_string(),
            )
            .await;
        assert_eq!(
            epochs.current().pair_for_channel_id(53),
            Some(&TokensPair::new("BTC", "ETH"))
        );

        handler
            .on_frame(r#"[53,"te",[43334639,1499972199000,-0.01293103,2320]]"#.to_string())
            .await;
        let trade = rx.try_recv().unwrap();
        assert_eq!(trade.trade_id(), "43334639");
        assert_eq!(trade.base_token(), "BTC");
    }

    #[tokio::test]
    async fn test_dropped_receiver_does_not_panic() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let feed = CodecFeed::new(BitfinexCodec, tx);
        let epochs = epochs();
        epochs.bind_channel(53, TokensPair::new("BTC", "ETH"));
        let mut handler = feed.frame_handler(epochs);

        handler
            .on_frame(r#"[53,[[1,1499972199000,1,2320],[2,1499972199000,-1,2321]]]"#.to_string())
            .await;
    }
}
