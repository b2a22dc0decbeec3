//! # Transport Abstraction
//!
//! The connection manager only needs four things from the wire: open a session
//! to an address, close it, and a stream of what happens on it (text payloads,
//! errors, the close). `Transport` and `Session` capture exactly that;
//! `WsTransport` implements them over `tokio-tungstenite`.

use std::future::Future;

use futures_util::stream::BoxStream;

use crate::errors::EndpointError;

/// Something that happened on an open session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A text payload arrived.
    Text(String),
    /// The session failed.
    Error(String),
    /// The session was closed by the peer.
    Closed,
}

/// The events of one session. A stream that ends is treated like `Closed`.
pub type EventStream = BoxStream<'static, TransportEvent>;

/// # Session
///
/// The handle the connection manager keeps for an open connection.
pub trait Session: Send + 'static {
    /// Closes the session. Closing twice must not panic.
    fn close(&mut self) -> impl Future<Output = Result<(), EndpointError>> + Send;
}

/// An open session together with its event stream.
pub struct Connection<S> {
    /// The handle used to close the session.
    pub session: S,
    /// Everything the server sends until the session ends.
    pub events: EventStream,
}

/// # Transport
///
/// Opens sessions to a server address.
pub trait Transport: Send + Sync + 'static {
    /// The session type this transport produces.
    type Session: Session;

    /// Makes one connect attempt.
    fn connect(
        &self,
        address: &str,
    ) -> impl Future<Output = Result<Connection<Self::Session>, EndpointError>> + Send;
}

#[cfg(feature = "websocket")]
pub use self::websocket::{WsSession, WsTransport};

#[cfg(feature = "websocket")]
mod websocket {
    use futures_util::stream::SplitSink;
    use futures_util::{future, SinkExt, StreamExt};
    use tokio::net::TcpStream;
    use tokio_tungstenite::tungstenite::protocol::Message;
    use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

    use super::{Connection, Session, Transport, TransportEvent};
    use crate::errors::EndpointError;

    type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

    /// # WebSocket Transport
    ///
    /// Connects with `tokio_tungstenite::connect_async`. Text frames become
    /// `TransportEvent::Text`, a close frame becomes `Closed`, read errors
    /// become `Error`. Binary, ping and pong frames are not part of the
    /// endpoint's contract and are skipped.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct WsTransport;

    /// The write half of a WebSocket connection.
    pub struct WsSession {
        sink: WsSink,
        closed: bool,
    }

    impl Session for WsSession {
        async fn close(&mut self) -> Result<(), EndpointError> {
            if self.closed {
                return Ok(());
            }
            self.closed = true;
            self.sink
                .close()
                .await
                .map_err(|e| EndpointError::Close(e.to_string()))
        }
    }

    impl Transport for WsTransport {
        type Session = WsSession;

        async fn connect(&self, address: &str) -> Result<Connection<WsSession>, EndpointError> {
            let (ws_stream, _) = connect_async(address)
                .await
                .map_err(|e| EndpointError::Connect {
                    address: address.to_string(),
                    reason: e.to_string(),
                })?;

            let (sink, read) = ws_stream.split();
            let events = read
                .filter_map(|msg| {
                    future::ready(match msg {
                        Ok(Message::Text(text)) => Some(TransportEvent::Text(text.to_string())),
                        Ok(Message::Close(_)) => Some(TransportEvent::Closed),
                        Ok(_) => None,
                        Err(e) => Some(TransportEvent::Error(e.to_string())),
                    })
                })
                .boxed();

            Ok(Connection {
                session: WsSession { sink, closed: false },
                events,
            })
        }
    }
}
