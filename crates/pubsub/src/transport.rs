//! The connection a listener reads events from.
//!
//! [WsConnector] is the production implementation. The traits exist so that
//! the subscription logic can be driven by any full-duplex text transport.
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Connection closed")]
    Closed,
    #[error("Received a non UTF-8 binary frame")]
    NotText,
    #[error(transparent)]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// A full-duplex connection exchanging text frames.
#[async_trait::async_trait]
pub trait Connection: Send + 'static {
    async fn send(&mut self, frame: String) -> Result<(), TransportError>;

    /// Returns the next text frame, skipping control frames.
    ///
    /// Must be cancellation safe: dropping the future before it resolves
    /// loses no text frame.
    async fn recv(&mut self) -> Result<String, TransportError>;

    /// Closes the connection. Failures are not reported since the connection
    /// is unusable afterwards either way.
    async fn close(&mut self);
}

/// Opens [Connection]s to a single endpoint.
#[async_trait::async_trait]
pub trait Connector: Send + Sync + 'static {
    type Connection: Connection;

    async fn connect(&self) -> Result<Self::Connection, TransportError>;
}

#[derive(Debug, Clone)]
pub struct WsConnector {
    url: Url,
}

impl WsConnector {
    pub fn new(url: Url) -> Self {
        Self { url }
    }
}

#[async_trait::async_trait]
impl Connector for WsConnector {
    type Connection = WsConnection;

    async fn connect(&self) -> Result<WsConnection, TransportError> {
        let (stream, response) = tokio_tungstenite::connect_async(self.url.as_str()).await?;
        tracing::trace!(url=%self.url, status=%response.status(), "Websocket connected");

        Ok(WsConnection { inner: stream })
    }
}

pub struct WsConnection {
    inner: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait::async_trait]
impl Connection for WsConnection {
    async fn send(&mut self, frame: String) -> Result<(), TransportError> {
        self.inner.send(Message::Text(frame)).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<String, TransportError> {
        loop {
            match self.inner.next().await {
                Some(Ok(Message::Text(text))) => return Ok(text),
                Some(Ok(Message::Binary(bytes))) => {
                    return String::from_utf8(bytes).map_err(|_| TransportError::NotText)
                }
                // Pings are answered by tungstenite on the next read or write.
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
                Some(Ok(Message::Close(frame))) => {
                    tracing::trace!(?frame, "Websocket closed by the remote");
                    return Err(TransportError::Closed);
                }
                Some(Err(e)) => return Err(e.into()),
                None => return Err(TransportError::Closed),
            }
        }
    }

    async fn close(&mut self) {
        if let Err(error) = self.inner.close(None).await {
            tracing::trace!(%error, "Closing websocket");
        }
    }
}
