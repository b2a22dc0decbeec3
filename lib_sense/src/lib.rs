//! # lib_sense
//!
//! A long-lived client endpoint for a single streaming (WebSocket) server.
//!
//! The endpoint keeps its connection alive with a fixed-delay reconnect loop and
//! re-publishes every inbound text message, after an application-supplied
//! transform, to any number of local subscribers. Subscribers pull items by
//! declaring demand on their `SubscriptionHandle`.
//!
//! ```no_run
//! use std::sync::Arc;
//! use lib_sense::{ClientEndpoint, Subscriber, SubscriptionHandle};
//!
//! struct Printer;
//!
//! impl Subscriber for Printer {
//!     fn on_subscribe(&self, subscription: SubscriptionHandle) {
//!         subscription.request(10);
//!     }
//!     fn on_next(&self, item: Arc<str>) {
//!         println!("{item}");
//!     }
//! }
//!
//! # async fn run() {
//! let endpoint = ClientEndpoint::open("ws://localhost:8081/tweets/", |s: String| s.to_uppercase()).await;
//! endpoint.subscribe(Arc::new(Printer));
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Error taxonomy shared by every component.
pub mod errors;
/// Endpoint configuration.
pub mod configs;
/// Subscriptions, the subscription registry and the message router.
pub mod core;
/// The connection manager and its transports.
pub mod ingestors;

// --- Public API Re-exports ---
pub use errors::EndpointError;
pub use configs::config_endpoint::EndpointConfig;
pub use self::core::registry::SubscriptionRegistry;
pub use self::core::router::{Fallible, MessageRouter, MessageTransform};
pub use self::core::subscription::{Subscriber, Subscription, SubscriptionHandle};
pub use ingestors::endpoint::{ClientEndpoint, ConnectionState};
pub use ingestors::transport::{Connection, EventStream, Session, Transport, TransportEvent};
#[cfg(feature = "websocket")]
pub use ingestors::transport::{WsSession, WsTransport};
