use crate::core::errors::ExchangeError;
use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, instrument, warn};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsStream = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Consumer of inbound text frames for one session.
///
/// Frames are delivered one at a time, in receipt order.
#[async_trait]
pub trait FrameHandler: Send + 'static {
    async fn on_frame(&mut self, frame: String);
}

/// WebSocket session trait - pure transport layer
#[async_trait]
pub trait WsSession: Send + Sync {
    /// Transport-level open flag
    fn is_open(&self) -> bool;

    /// Send a raw message
    async fn send_raw(&mut self, msg: Message) -> Result<(), ExchangeError>;

    /// Send a ping control frame; an error means the session is dead
    async fn ping(&mut self) -> Result<(), ExchangeError>;

    /// Close the connection
    async fn close(&mut self) -> Result<(), ExchangeError>;
}

/// Opens websocket sessions. Production code uses [`TungsteniteConnector`].
#[async_trait]
pub trait WsConnector: Send + Sync + 'static {
    /// Perform the handshake and start feeding inbound frames to `handler`
    async fn connect(
        &self,
        url: &str,
        handler: Box<dyn FrameHandler>,
    ) -> Result<Box<dyn WsSession>, ExchangeError>;
}

/// Tungstenite-based connector
#[derive(Debug, Clone)]
pub struct TungsteniteConnector {
    exchange_name: String,
}

impl TungsteniteConnector {
    pub fn new(exchange_name: impl Into<String>) -> Self {
        Self {
            exchange_name: exchange_name.into(),
        }
    }
}

#[async_trait]
impl WsConnector for TungsteniteConnector {
    #[instrument(skip(self, handler), fields(exchange = %self.exchange_name, url = %url))]
    async fn connect(
        &self,
        url: &str,
        handler: Box<dyn FrameHandler>,
    ) -> Result<Box<dyn WsSession>, ExchangeError> {
        let (ws_stream, _) = connect_async(url).await.map_err(|e| {
            ExchangeError::NetworkError(format!("WebSocket connection failed: {}", e))
        })?;

        let (write, read) = ws_stream.split();
        let write = Arc::new(Mutex::new(write));
        let open = Arc::new(AtomicBool::new(true));

        let reader = tokio::spawn(read_loop(
            read,
            Arc::clone(&write),
            Arc::clone(&open),
            handler,
            self.exchange_name.clone(),
        ));

        Ok(Box::new(TungsteniteSession {
            exchange_name: self.exchange_name.clone(),
            write,
            open,
            reader,
        }))
    }
}

async fn read_loop(
    mut read: WsStream,
    write: Arc<Mutex<WsSink>>,
    open: Arc<AtomicBool>,
    mut handler: Box<dyn FrameHandler>,
    exchange_name: String,
) {
    while let Some(message) = read.next().await {
        match message {
            Ok(Message::Text(text)) => handler.on_frame(text).await,
            Ok(Message::Binary(data)) => match String::from_utf8(data) {
                Ok(text) => handler.on_frame(text).await,
                Err(e) => {
                    debug!(exchange = %exchange_name, error = %e, "dropping non UTF-8 binary frame");
                }
            },
            Ok(Message::Ping(payload)) => {
                // Auto-respond to pings at transport level
                if let Err(e) = write.lock().await.send(Message::Pong(payload)).await {
                    warn!(exchange = %exchange_name, error = %e, "failed to send pong response");
                    break;
                }
            }
            Ok(Message::Close(frame)) => {
                info!(exchange = %exchange_name, ?frame, "websocket closed by remote");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(exchange = %exchange_name, error = %e, "websocket read error");
                break;
            }
        }
    }
    open.store(false, Ordering::SeqCst);
}

/// Live tungstenite session; inbound frames are consumed by a reader task
pub struct TungsteniteSession {
    exchange_name: String,
    write: Arc<Mutex<WsSink>>,
    open: Arc<AtomicBool>,
    reader: JoinHandle<()>,
}

#[async_trait]
impl WsSession for TungsteniteSession {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst) && !self.reader.is_finished()
    }

    #[instrument(skip(self, msg), fields(exchange = %self.exchange_name))]
    async fn send_raw(&mut self, msg: Message) -> Result<(), ExchangeError> {
        if !self.is_open() {
            return Err(ExchangeError::NetworkError(
                "WebSocket not connected".to_string(),
            ));
        }

        self.write.lock().await.send(msg).await.map_err(|e| {
            self.open.store(false, Ordering::SeqCst);
            ExchangeError::NetworkError(format!("Failed to send WebSocket message: {}", e))
        })
    }

    async fn ping(&mut self) -> Result<(), ExchangeError> {
        self.send_raw(Message::Ping(Vec::new())).await
    }

    #[instrument(skip(self), fields(exchange = %self.exchange_name))]
    async fn close(&mut self) -> Result<(), ExchangeError> {
        let result = self.write.lock().await.send(Message::Close(None)).await;
        self.open.store(false, Ordering::SeqCst);
        self.reader.abort();
        result.map_err(|e| ExchangeError::NetworkError(format!("Failed to close WebSocket: {}", e)))
    }
}

impl Drop for TungsteniteSession {
    fn drop(&mut self) {
        self.reader.abort();
    }
}
