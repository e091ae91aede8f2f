use crate::core::{
    errors::ExchangeError,
    kernel::{FrameHandler, WsSession},
    metadata::{ExchangeMetadata, MetadataEpochs},
};
use async_trait::async_trait;

/// Exchange-specific hooks of the connection lifecycle.
///
/// The reconnection algorithm in
/// [`ConnectionManager`](crate::core::connection::ConnectionManager) is shared
/// by all exchanges; only these two steps differ.
#[async_trait]
pub trait ExchangeFeed: Send + Sync + 'static {
    fn exchange(&self) -> &str;

    /// Build the consumer of inbound frames for a new session
    fn frame_handler(&self, epochs: MetadataEpochs) -> Box<dyn FrameHandler>;

    /// Subscribe to the channels of interest on a freshly opened session
    async fn setup_channels(
        &self,
        session: &mut dyn WsSession,
        metadata: &ExchangeMetadata,
    ) -> Result<(), ExchangeError>;
}
