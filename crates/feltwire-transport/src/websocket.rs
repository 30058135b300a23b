//! WebSocket transport implementation using `tokio-tungstenite`.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio_tungstenite::tungstenite::Message;

use crate::{Connector, Socket, SocketId, TransportError};

/// Counter for generating unique socket IDs.
static NEXT_SOCKET_ID: AtomicU64 = AtomicU64::new(1);

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// A WebSocket-based [`Connector`] that dials a fixed URL.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    url: String,
}

impl WebSocketConnector {
    /// Creates a connector for the given host and port
    /// (`ws://{host}:{port}`).
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            url: format!("ws://{host}:{port}"),
        }
    }

    /// Creates a connector for an explicit URL.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// The URL this connector dials.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Connector for WebSocketConnector {
    type Socket = WebSocketSocket;
    type Error = TransportError;

    async fn connect(&self) -> Result<Self::Socket, Self::Error> {
        let (ws, _response) = tokio_tungstenite::connect_async(&self.url)
            .await
            .map_err(|e| {
                TransportError::ConnectFailed(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    e,
                ))
            })?;

        let id = SocketId::new(NEXT_SOCKET_ID.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(%id, url = %self.url, "WebSocket connected");

        Ok(WebSocketSocket { id, ws })
    }
}

/// A single dialed WebSocket connection.
///
/// Exclusively owned by the connection manager, so all operations take
/// `&mut self` and no lock is involved.
pub struct WebSocketSocket {
    id: SocketId,
    ws: WsStream,
}

impl Socket for WebSocketSocket {
    type Error = TransportError;

    async fn send(&mut self, frame: &str) -> Result<(), Self::Error> {
        use futures_util::SinkExt;
        self.ws
            .send(Message::text(frame.to_string()))
            .await
            .map_err(|e| {
                TransportError::SendFailed(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    e,
                ))
            })
    }

    async fn recv(&mut self) -> Result<Option<String>, Self::Error> {
        use futures_util::StreamExt;
        loop {
            match self.ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_str().to_string()));
                }
                Some(Ok(Message::Binary(data))) => {
                    // The protocol is text frames; tolerate a server that
                    // sends UTF-8 in binary frames, drop anything else.
                    match String::from_utf8(data.into()) {
                        Ok(text) => return Ok(Some(text)),
                        Err(_) => {
                            tracing::debug!(
                                id = %self.id,
                                "dropping non-UTF-8 binary frame"
                            );
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => {} // ping/pong/raw frame
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(
                        std::io::Error::new(
                            std::io::ErrorKind::ConnectionReset,
                            e,
                        ),
                    ));
                }
            }
        }
    }

    async fn close(&mut self) -> Result<(), Self::Error> {
        use futures_util::SinkExt;
        self.ws.close(None).await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    fn id(&self) -> SocketId {
        self.id
    }
}
