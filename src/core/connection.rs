//! Continuous websocket connection with health-check driven reconnection.
//!
//! Lifecycle of one [`ConnectionManager`]:
//!
//! 1. `Uninitialized` until [`ConnectionManager::initialize`] delivers the
//!    exchange metadata. That call schedules the recurring health check and
//!    returns immediately.
//! 2. `Connecting`: every tick attempts a handshake. The exchange may be
//!    unavailable, so the first session can take several ticks. On success the
//!    channels are subscribed and `Established` is emitted.
//! 3. `Connected`: every tick probes the session (open flag, then a ping).
//! 4. `Lost`: the first tick that finds the session dead emits `Lost`, closes
//!    the stale session and reconnects at once. Further failed ticks stay in
//!    `Lost` without emitting again.
//! 5. A successful reconnect emits `Reestablished` and returns to `Connected`.

use crate::core::{
    config::FeedConfig,
    errors::ExchangeError,
    events::ConnectionEvent,
    kernel::{WsConnector, WsSession},
    metadata::{ExchangeMetadata, MetadataEpochs},
    traits::ExchangeFeed,
};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Uninitialized,
    Connecting,
    Connected,
    Lost,
}

struct ConnectionSlot {
    state: ConnectionState,
    session: Option<Box<dyn WsSession>>,
    lost_event_fired: bool,
    epochs: Option<MetadataEpochs>,
}

/// Keeps one exchange connection alive for the lifetime of the process.
///
/// Every tick runs entirely under one lock, so two ticks can never race into
/// duplicate reconnects or duplicate `Lost` events.
pub struct ConnectionManager {
    exchange: String,
    feed: Arc<dyn ExchangeFeed>,
    connector: Arc<dyn WsConnector>,
    config: FeedConfig,
    events: broadcast::Sender<ConnectionEvent>,
    slot: Mutex<ConnectionSlot>,
}

impl ConnectionManager {
    pub fn new(
        feed: Arc<dyn ExchangeFeed>,
        connector: Arc<dyn WsConnector>,
        config: FeedConfig,
        events: broadcast::Sender<ConnectionEvent>,
    ) -> Self {
        Self {
            exchange: feed.exchange().to_string(),
            feed,
            connector,
            config,
            events,
            slot: Mutex::new(ConnectionSlot {
                state: ConnectionState::Uninitialized,
                session: None,
                lost_event_fired: false,
                epochs: None,
            }),
        }
    }

    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }

    pub async fn state(&self) -> ConnectionState {
        self.slot.lock().await.state
    }

    /// Current metadata epoch, once initialized
    pub async fn metadata(&self) -> Option<Arc<ExchangeMetadata>> {
        self.slot.lock().await.epochs.as_ref().map(MetadataEpochs::current)
    }

    /// Metadata-ready signal: store the first epoch and schedule the health
    /// check with a fixed delay between ticks.
    ///
    /// The returned task runs until aborted.
    pub async fn initialize(
        self: &Arc<Self>,
        metadata: ExchangeMetadata,
    ) -> Result<JoinHandle<()>, ExchangeError> {
        {
            let mut slot = self.slot.lock().await;
            if slot.state != ConnectionState::Uninitialized {
                return Err(ExchangeError::AlreadyInitialized(self.exchange.clone()));
            }
            slot.epochs = Some(MetadataEpochs::new(metadata));
            slot.state = ConnectionState::Connecting;
        }

        let interval = self.config.health_check_interval();
        info!(
            exchange = %self.exchange,
            interval_ms = self.config.health_check_interval_ms,
            "scheduling websocket health check"
        );

        let manager = Arc::clone(self);
        Ok(tokio::spawn(async move {
            loop {
                manager.tick().await;
                sleep(interval).await;
            }
        }))
    }

    /// Swap in a new metadata epoch.
    ///
    /// Frame handlers see it on their next frame. Channel ids the live session
    /// already bound stay valid for pairs still in `metadata`; the endpoint and
    /// the subscription list are used from the next handshake on.
    pub async fn replace_metadata(&self, metadata: ExchangeMetadata) -> Result<(), ExchangeError> {
        let slot = self.slot.lock().await;
        let epochs = slot
            .epochs
            .as_ref()
            .ok_or_else(|| ExchangeError::NotInitialized(self.exchange.clone()))?;
        epochs.replace(metadata);
        info!(exchange = %self.exchange, "exchange metadata replaced");
        Ok(())
    }

    /// One health-check tick
    pub async fn tick(&self) {
        let mut slot = self.slot.lock().await;
        let Some(epochs) = slot.epochs.clone() else {
            debug!(exchange = %self.exchange, "health check skipped, metadata not ready");
            return;
        };

        match slot.state {
            ConnectionState::Uninitialized => {}
            ConnectionState::Connecting => {
                if let Some(session) = self.open_session(&epochs).await {
                    slot.session = Some(session);
                    slot.state = ConnectionState::Connected;
                    self.emit(ConnectionEvent::established(&self.exchange));
                }
            }
            ConnectionState::Connected | ConnectionState::Lost => {
                if self.is_session_alive(slot.session.as_mut()).await {
                    return;
                }
                self.reconnect(&mut slot, &epochs).await;
            }
        }
    }

    async fn is_session_alive(&self, session: Option<&mut Box<dyn WsSession>>) -> bool {
        let Some(session) = session else {
            return false;
        };
        if !session.is_open() {
            return false;
        }
        // Some transports never flag an abnormally dropped connection as
        // closed; a failed probe is treated the same as a closed session.
        match session.ping().await {
            Ok(()) => true,
            Err(e) => {
                error!(
                    exchange = %self.exchange,
                    error = %e,
                    "session reported open but connection is lost"
                );
                false
            }
        }
    }

    async fn reconnect(&self, slot: &mut ConnectionSlot, epochs: &MetadataEpochs) {
        if !slot.lost_event_fired {
            warn!(exchange = %self.exchange, "connection with exchange lost");
            self.emit(ConnectionEvent::lost(&self.exchange));
            slot.lost_event_fired = true;
        }
        slot.state = ConnectionState::Lost;

        if let Some(mut stale) = slot.session.take() {
            match timeout(self.config.connect_timeout(), stale.close()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    debug!(exchange = %self.exchange, error = %e, "closing stale session failed");
                }
                Err(_) => debug!(exchange = %self.exchange, "closing stale session timed out"),
            }
        }

        if let Some(session) = self.open_session(epochs).await {
            slot.session = Some(session);
            slot.state = ConnectionState::Connected;
            slot.lost_event_fired = false;
            info!(exchange = %self.exchange, "connection with exchange reestablished");
            self.emit(ConnectionEvent::reestablished(&self.exchange));
        }
    }

    async fn open_session(&self, epochs: &MetadataEpochs) -> Option<Box<dyn WsSession>> {
        // channel ids are allocated per session
        epochs.reset_bindings();
        let metadata = epochs.current();
        info!(
            exchange = %self.exchange,
            url = %metadata.ws_uri,
            "connecting to exchange websocket endpoint"
        );

        let handler = self.feed.frame_handler(epochs.clone());
        let handshake = self.connector.connect(&metadata.ws_uri, handler);
        let result = timeout(self.config.connect_timeout(), handshake)
            .await
            .unwrap_or_else(|_| {
                Err(ExchangeError::ConnectionTimeout(format!(
                    "no handshake within {}ms",
                    self.config.connect_timeout_ms
                )))
            });
        let mut session = match result {
            Ok(session) => session,
            Err(e) => {
                warn!(exchange = %self.exchange, error = %e, "websocket handshake failed");
                return None;
            }
        };

        info!(exchange = %self.exchange, "connected to exchange websocket endpoint");
        if let Err(e) = self.feed.setup_channels(session.as_mut(), &metadata).await {
            error!(exchange = %self.exchange, error = %e, "channel subscription failed");
        }
        Some(session)
    }

    fn emit(&self, event: ConnectionEvent) {
        if self.events.send(event).is_err() {
            debug!(exchange = %self.exchange, "no lifecycle event subscribers");
        }
    }
}
