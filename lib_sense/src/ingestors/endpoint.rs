//! # Client Endpoint (Connection Manager)
//!
//! Owns the one session to one fixed server address and keeps it alive.
//!
//! ## Lifecycle
//!
//! `Disconnected -> Connecting -> Connected -> (Error | Closed) -> Connecting -> ...`
//!
//! - `open` makes exactly one connect attempt. If it fails the endpoint logs a
//!   warning and stays `Disconnected`; nothing retries it.
//! - Once connected, every transport error closes the session and retries,
//!   every close retries directly. A retry waits the fixed delay (5 seconds by
//!   default) and makes one connect attempt. There is no backoff, no jitter and
//!   no attempt limit. A retry whose connect fails is, like the initial attempt,
//!   not retried again.
//!
//! ## Runtime
//!
//! Each connected session gets a spawned pump task that drains its event
//! stream and dispatches to the handlers below. The retry wait runs on that
//! same task, so the session's remaining events wait with it. The wait is
//! interrupted by `shutdown`, which abandons the cycle.
//!
//! A failing transform only fails the delivery of that one payload. The pump
//! logs the error and keeps the session.

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::{FutureExt, StreamExt};
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use crate::configs::config_endpoint::EndpointConfig;
use crate::core::registry::SubscriptionRegistry;
use crate::core::router::{MessageRouter, MessageTransform};
use crate::core::subscription::{Subscriber, SubscriptionHandle};
use crate::errors::EndpointError;
use crate::ingestors::transport::{Connection, EventStream, Session, Transport, TransportEvent};

#[cfg(feature = "websocket")]
use crate::ingestors::transport::WsTransport;

/// Lifecycle states of the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No session. Initial state, and the state after a failed connect attempt.
    Disconnected,
    /// A connect attempt is in flight.
    Connecting,
    /// A session is open and its events are being pumped.
    Connected,
    /// The transport reported an error; a retry is pending.
    Error,
    /// The server closed the session; a retry is pending.
    Closed,
}

/// # Client Endpoint
///
/// Cheap to clone; all clones share one connection and one subscription
/// registry.
pub struct ClientEndpoint<T: Transport> {
    inner: Arc<EndpointInner<T>>,
}

struct EndpointInner<T: Transport> {
    config: EndpointConfig,
    transport: T,
    router: MessageRouter,
    state: RwLock<ConnectionState>,
    session: Mutex<Option<T::Session>>,
    shutdown: CancellationToken,
}

#[cfg(feature = "websocket")]
impl ClientEndpoint<WsTransport> {
    /// Opens a WebSocket endpoint to `address` with the default 5 second retry
    /// delay, making one connect attempt before returning.
    pub async fn open(address: impl Into<String>, transform: impl MessageTransform) -> Self {
        Self::open_with(EndpointConfig::new(address), WsTransport, transform).await
    }
}

impl<T: Transport> ClientEndpoint<T> {
    /// Builds an endpoint over `transport` and makes one connect attempt.
    ///
    /// A failed attempt is logged and leaves the endpoint `Disconnected`.
    pub async fn open_with(config: EndpointConfig, transport: T, transform: impl MessageTransform) -> Self {
        let registry = Arc::new(SubscriptionRegistry::new());
        let inner = Arc::new(EndpointInner {
            config,
            transport,
            router: MessageRouter::new(transform, registry),
            state: RwLock::new(ConnectionState::Disconnected),
            session: Mutex::new(None),
            shutdown: CancellationToken::new(),
        });
        Arc::clone(&inner).connect().await;
        Self { inner }
    }

    /// Registers `subscriber`. Its `on_subscribe` runs before this returns.
    pub fn subscribe(&self, subscriber: Arc<dyn Subscriber>) -> SubscriptionHandle {
        self.inner.router.registry().subscribe(subscriber)
    }

    /// Transforms `payload` and fans it out, exactly as an inbound text frame
    /// would be. Returns the number of subscribers it reached.
    pub fn on_transport_message(&self, payload: String) -> Result<usize, EndpointError> {
        self.inner.on_transport_message(payload)
    }

    /// The server address this endpoint is bound to.
    pub fn address(&self) -> &str {
        &self.inner.config.address
    }

    /// The current lifecycle state.
    pub async fn state(&self) -> ConnectionState {
        *self.inner.state.read().await
    }

    /// Number of subscriptions ever registered. Cancelled ones still count.
    pub fn subscriber_count(&self) -> usize {
        self.inner.router.registry().len()
    }

    /// Closes the current session, if any. Failures are logged, never returned.
    pub async fn close(&self) {
        self.inner.close().await;
    }

    /// Stops the endpoint: interrupts a pending retry, stops the event pump and
    /// closes the session. The endpoint never reconnects afterwards.
    pub async fn shutdown(&self) {
        log::info!("Shutting down endpoint for {}", self.inner.config.address);
        self.inner.shutdown.cancel();
        if let Some(mut session) = self.inner.session.lock().await.take() {
            if let Err(e) = session.close().await {
                log::warn!("{}", e);
            }
        }
        self.inner.set_state(ConnectionState::Disconnected).await;
    }
}

impl<T: Transport> Clone for ClientEndpoint<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> fmt::Debug for ClientEndpoint<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientEndpoint")
            .field("address", &self.inner.config.address)
            .field("router", &self.inner.router)
            .finish()
    }
}

impl<T: Transport> EndpointInner<T> {
    async fn set_state(&self, next: ConnectionState) {
        let mut state = self.state.write().await;
        if *state != next {
            log::debug!("{}: {:?} -> {:?}", self.config.address, *state, next);
            *state = next;
        }
    }

    /// One connect attempt. On success the session is stored and a pump task
    /// is spawned for its events.
    ///
    /// Boxed so the pump, which reconnects through here, has a nameable type.
    fn connect(self: Arc<Self>) -> BoxFuture<'static, ()> {
        async move {
            let address = self.config.address.as_str();
            log::debug!("Connecting to {}", address);
            self.set_state(ConnectionState::Connecting).await;

            match self.transport.connect(address).await {
                Ok(Connection { mut session, events }) => {
                    if self.shutdown.is_cancelled() {
                        if let Err(e) = session.close().await {
                            log::warn!("{}", e);
                        }
                        self.set_state(ConnectionState::Disconnected).await;
                        return;
                    }
                    *self.session.lock().await = Some(session);
                    self.set_state(ConnectionState::Connected).await;
                    log::info!("Connected to: {}", address);
                    tokio::spawn(Arc::clone(&self).pump(events));
                }
                Err(e) => {
                    log::warn!("{}", e);
                    self.set_state(ConnectionState::Disconnected).await;
                }
            }
        }
        .boxed()
    }

    async fn pump(self: Arc<Self>, mut events: EventStream) {
        loop {
            let event = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return,
                event = events.next() => event,
            };

            match event {
                Some(TransportEvent::Text(payload)) => {
                    if let Err(e) = self.on_transport_message(payload) {
                        log::error!("Dropped message from {}: {}", self.config.address, e);
                    }
                }
                Some(TransportEvent::Error(cause)) => {
                    self.on_transport_error(cause).await;
                    return;
                }
                Some(TransportEvent::Closed) | None => {
                    self.on_transport_close().await;
                    return;
                }
            }
        }
    }

    fn on_transport_message(&self, payload: String) -> Result<usize, EndpointError> {
        self.router.route(payload)
    }

    async fn on_transport_error(self: &Arc<Self>, cause: String) {
        log::warn!("Error received: {}", cause);
        self.set_state(ConnectionState::Error).await;
        self.close().await;
        self.retry().await;
    }

    async fn on_transport_close(self: &Arc<Self>) {
        log::warn!("Session to {} closed, retrying...", self.config.address);
        self.set_state(ConnectionState::Closed).await;
        self.retry().await;
    }

    async fn retry(self: &Arc<Self>) {
        match self.wait_retry_delay().await {
            Ok(()) => Arc::clone(self).connect().await,
            Err(e) => log::warn!("{} for {}, giving up this cycle", e, self.config.address),
        }
    }

    async fn wait_retry_delay(&self) -> Result<(), EndpointError> {
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => Err(EndpointError::RetryInterrupted),
            _ = tokio::time::sleep(self.config.retry_delay()) => Ok(()),
        }
    }

    async fn close(&self) {
        if let Some(session) = self.session.lock().await.as_mut() {
            if let Err(e) = session.close().await {
                log::warn!("{}", e);
            }
        }
    }
}
