use crate::core::errors::{BingxError, Result};
use crate::core::kernel::codec;
use crate::core::kernel::dispatcher::Dispatcher;
use crate::core::kernel::subscription::{generate_request_id, SubscriptionRequest};
use crate::core::types::ConnectionState;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockWriteGuard};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{watch, Mutex};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, instrument, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, Message>;
type WsReader = SplitStream<WsStream>;

/// WebSocket connection settings
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// Handshake timeout in milliseconds
    pub connect_timeout_ms: u64,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 60_000,
        }
    }
}

/// One persistent duplex stream.
///
/// All methods take `&self`; share the connection through an `Arc` so one
/// task can drive [`listen`](Self::listen) while others subscribe, send or stop.
pub struct StreamConnection {
    url: String,
    exchange_name: String,
    config: WsConfig,
    state: RwLock<ConnectionState>,
    writer: Mutex<Option<WsWriter>>,
    reader: Mutex<Option<WsReader>>,
    shutdown: watch::Sender<bool>,
    dispatcher: Dispatcher<Value>,
}

impl fmt::Debug for StreamConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamConnection")
            .field("endpoint", &self.endpoint())
            .field("exchange_name", &self.exchange_name)
            .field("state", &self.state())
            .field("observers", &self.dispatcher.len())
            .finish_non_exhaustive()
    }
}

impl StreamConnection {
    /// Create a disconnected stream for `url`
    ///
    /// # Arguments
    /// * `url` - The WebSocket URL to connect to
    /// * `exchange_name` - Name used in logs and spans
    pub fn new(url: String, exchange_name: String) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            url,
            exchange_name,
            config: WsConfig::default(),
            state: RwLock::new(ConnectionState::Disconnected),
            writer: Mutex::new(None),
            reader: Mutex::new(None),
            shutdown,
            dispatcher: Dispatcher::new(),
        }
    }

    /// Append a connection-specific query pair, e.g. `listenKey`
    #[must_use]
    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        let separator = if self.url.contains('?') { '&' } else { '?' };
        let pair = url::form_urlencoded::Serializer::new(String::new())
            .append_pair(key, value)
            .finish();
        self.url = format!("{}{}{}", self.url, separator, pair);
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: WsConfig) -> Self {
        self.config = config;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// URL without its query suffix, safe to log
    fn endpoint(&self) -> &str {
        self.url.split('?').next().unwrap_or_default()
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_mut(&self) -> RwLockWriteGuard<'_, ConnectionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: ConnectionState) {
        *self.state_mut() = state;
    }

    pub fn is_connected(&self) -> bool {
        matches!(
            self.state(),
            ConnectionState::Connected | ConnectionState::Listening
        )
    }

    /// Observer registry this connection fans messages out to
    pub fn dispatcher(&self) -> &Dispatcher<Value> {
        &self.dispatcher
    }

    /// Register a callback for every decoded, non keep-alive message
    pub fn on_message<F>(&self, observer: F) -> usize
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.dispatcher.register(observer)
    }

    /// Perform the transport handshake.
    ///
    /// On failure the connection is left exactly as it was.
    #[instrument(skip(self), fields(exchange = %self.exchange_name, endpoint = %self.endpoint()))]
    pub async fn connect(&self) -> Result<()> {
        if self.is_connected() {
            return Err(BingxError::WebSocketError(
                "WebSocket already connected".to_string(),
            ));
        }

        let connect_timeout = Duration::from_millis(self.config.connect_timeout_ms);
        let (ws_stream, _) = tokio::time::timeout(connect_timeout, connect_async(self.url.as_str()))
            .await
            .map_err(|_| {
                BingxError::ConnectionTimeout(format!(
                    "WebSocket handshake exceeded {}ms",
                    self.config.connect_timeout_ms
                ))
            })?
            .map_err(|e| BingxError::WebSocketError(format!("WebSocket connection failed: {}", e)))?;

        let (write, read) = ws_stream.split();
        *self.writer.lock().await = Some(write);
        *self.reader.lock().await = Some(read);
        self.shutdown.send_replace(false);
        self.set_state(ConnectionState::Connected);

        info!("WebSocket connected");
        Ok(())
    }

    /// Serialize `message` to JSON and write it as one text frame
    #[instrument(skip(self, message), fields(exchange = %self.exchange_name))]
    pub async fn send<T: Serialize + ?Sized>(&self, message: &T) -> Result<()> {
        if !self.is_connected() {
            return Err(BingxError::WebSocketError(
                "WebSocket not connected".to_string(),
            ));
        }

        let text = serde_json::to_string(message).map_err(|e| {
            BingxError::SerializationError(format!("Failed to serialize message: {}", e))
        })?;

        let mut writer = self.writer.lock().await;
        let write = writer.as_mut().ok_or_else(|| {
            BingxError::WebSocketError("WebSocket write stream not available".to_string())
        })?;

        write.send(Message::Text(text)).await.map_err(|e| {
            BingxError::WebSocketError(format!("Failed to send WebSocket message: {}", e))
        })
    }

    /// Subscribe to `channel` under a freshly generated request id
    pub async fn subscribe(&self, channel: impl fmt::Display) -> Result<String> {
        let id = generate_request_id();
        self.send(&SubscriptionRequest::subscribe(id.as_str(), channel))
            .await?;
        Ok(id)
    }

    pub async fn subscribe_with_id(&self, id: &str, channel: impl fmt::Display) -> Result<()> {
        self.send(&SubscriptionRequest::subscribe(id, channel)).await
    }

    /// Unsubscribe from `channel` under a freshly generated request id
    pub async fn unsubscribe(&self, channel: impl fmt::Display) -> Result<String> {
        let id = generate_request_id();
        self.send(&SubscriptionRequest::unsubscribe(id.as_str(), channel))
            .await?;
        Ok(id)
    }

    pub async fn unsubscribe_with_id(&self, id: &str, channel: impl fmt::Display) -> Result<()> {
        self.send(&SubscriptionRequest::unsubscribe(id, channel))
            .await
    }

    /// Receive loop. Run it on its own task.
    ///
    /// Returns `Ok(())` after [`stop`](Self::stop), [`disconnect`](Self::disconnect)
    /// or a graceful remote close, and an error when the connection drops
    /// unexpectedly. Undecodable frames are dropped; keep-alive probes are
    /// answered here and never reach observers.
    #[instrument(skip(self), fields(exchange = %self.exchange_name, endpoint = %self.endpoint()))]
    pub async fn listen(&self) -> Result<()> {
        {
            let mut state = self.state_mut();
            match *state {
                ConnectionState::Connected => *state = ConnectionState::Listening,
                ConnectionState::Stopping | ConnectionState::Closed => {
                    *state = ConnectionState::Closed;
                    return Ok(());
                }
                ConnectionState::Listening => {
                    return Err(BingxError::WebSocketError(
                        "WebSocket is already listening".to_string(),
                    ));
                }
                ConnectionState::Disconnected => {
                    return Err(BingxError::WebSocketError(
                        "WebSocket not connected".to_string(),
                    ));
                }
            }
        }

        let Some(mut read) = self.reader.lock().await.take() else {
            self.set_state(ConnectionState::Closed);
            return Err(BingxError::WebSocketError(
                "WebSocket read stream not available".to_string(),
            ));
        };

        let mut shutdown = self.shutdown.subscribe();
        let result = loop {
            if *shutdown.borrow_and_update() {
                debug!("Stop requested, leaving receive loop");
                break Ok(());
            }

            let frame = tokio::select! {
                biased;
                _ = shutdown.changed() => continue,
                frame = read.next() => frame,
            };

            match frame {
                None => break Ok(()),
                Some(Ok(Message::Close(frame))) => break Self::close_result(frame),
                Some(Ok(message)) => self.handle_frame(&message).await,
                Some(Err(e)) => {
                    if *shutdown.borrow() {
                        break Ok(());
                    }
                    break Self::read_error_result(e);
                }
            }
        };

        self.set_state(ConnectionState::Closed);
        result
    }

    async fn handle_frame(&self, message: &Message) {
        match codec::decode_frame(message) {
            Ok(Some(value)) => {
                if let Some(reply) = codec::keep_alive_reply(&value) {
                    debug!("Answering keep-alive probe");
                    if let Err(e) = self.send(&reply).await {
                        warn!("Failed to send keep-alive reply: {}", e);
                    }
                    return;
                }
                self.dispatcher.dispatch(&value);
            }
            Ok(None) => {}
            Err(e) => debug!("Dropping frame: {}", e),
        }
    }

    fn close_result(frame: Option<CloseFrame<'static>>) -> Result<()> {
        match frame {
            None => Ok(()),
            Some(frame) if matches!(frame.code, CloseCode::Normal | CloseCode::Away) => {
                info!(code = %frame.code, "WebSocket closed by server");
                Ok(())
            }
            Some(frame) => {
                warn!(code = %frame.code, reason = %frame.reason, "WebSocket closed unexpectedly");
                Err(BingxError::WebSocketError(format!(
                    "WebSocket connection closed unexpectedly: {} {}",
                    frame.code, frame.reason
                )))
            }
        }
    }

    fn read_error_result(error: tungstenite::Error) -> Result<()> {
        match error {
            tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => Ok(()),
            other => {
                warn!("WebSocket read failed: {}", other);
                Err(BingxError::WebSocketError(format!(
                    "WebSocket connection closed unexpectedly: {}",
                    other
                )))
            }
        }
    }

    /// Ask the receive loop to exit. Idempotent, callable from any task.
    pub fn stop(&self) {
        {
            let mut state = self.state_mut();
            if matches!(
                *state,
                ConnectionState::Connected | ConnectionState::Listening
            ) {
                *state = ConnectionState::Stopping;
            }
        }
        self.shutdown.send_replace(true);
    }

    /// Stop and close the transport, whether or not `listen` is running
    #[instrument(skip(self), fields(exchange = %self.exchange_name))]
    pub async fn disconnect(&self) -> Result<()> {
        self.stop();

        let writer = self.writer.lock().await.take();
        self.reader.lock().await.take();
        self.set_state(ConnectionState::Closed);

        if let Some(mut write) = writer {
            if let Err(e) = write.close().await {
                debug!("Error while closing WebSocket: {}", e);
            }
        }

        info!("WebSocket disconnected");
        Ok(())
    }
}
