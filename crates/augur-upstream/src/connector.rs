//! Backend connection layer.
//!
//! [`BackendConnector`] abstracts "open one duplex session to the
//! inference backend" so the retry engine in [`crate::client`] can be
//! exercised with scripted connections in tests. [`WsConnector`] is the
//! production implementation over `tokio-tungstenite`.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;

/// Transport-level failure while connecting, sending or reading.
#[derive(Debug, Clone, Error)]
#[error("backend connection failure: {0}")]
pub struct ConnectError(pub String);

/// One open duplex session with the inference backend.
#[async_trait]
pub trait BackendSession: Send {
    /// Send one text payload (the composed prompt).
    async fn send_text(&mut self, payload: String) -> Result<(), ConnectError>;

    /// Next text message from the backend; `Ok(None)` means the backend
    /// closed the session.
    async fn next_message(&mut self) -> Result<Option<String>, ConnectError>;
}

/// Opens sessions against the inference backend.
#[async_trait]
pub trait BackendConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn BackendSession>, ConnectError>;
}

/// Production connector dialing the configured `ws://` endpoint.
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl BackendConnector for WsConnector {
    async fn connect(&self) -> Result<Box<dyn BackendSession>, ConnectError> {
        let (stream, _response) = connect_async(&self.url)
            .await
            .map_err(|err| ConnectError(err.to_string()))?;
        debug!(url = %self.url, "connected to inference backend");
        Ok(Box::new(WsSession { stream }))
    }
}

struct WsSession {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl BackendSession for WsSession {
    async fn send_text(&mut self, payload: String) -> Result<(), ConnectError> {
        self.stream
            .send(Message::Text(payload))
            .await
            .map_err(|err| ConnectError(err.to_string()))
    }

    async fn next_message(&mut self) -> Result<Option<String>, ConnectError> {
        loop {
            match self.stream.next().await {
                None => return Ok(None),
                Some(Ok(Message::Text(text))) => return Ok(Some(text)),
                Some(Ok(Message::Close(_))) => return Ok(None),
                // Control and binary frames are not part of the token
                // protocol; skip them.
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(ConnectError(err.to_string())),
            }
        }
    }
}
