//! # Ingestors Module
//!
//! The "front door" of the library: the client endpoint that owns the server
//! connection, and the transports it opens sessions with.
//!
//! ## Contained Modules:
//! - **`endpoint`**: `ClientEndpoint`, the connection manager with its
//!   connect / naive-retry state machine.
//! - **`transport`**: the `Transport` and `Session` seams plus `WsTransport`,
//!   the tokio-tungstenite implementation.

/// The connection manager.
pub mod endpoint;
/// Transport seams and the WebSocket transport.
pub mod transport;

// --- Public API Re-exports ---
pub use endpoint::{ClientEndpoint, ConnectionState};
pub use transport::{Connection, EventStream, Session, Transport, TransportEvent};
#[cfg(feature = "websocket")]
pub use transport::{WsSession, WsTransport};
