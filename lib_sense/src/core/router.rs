//! # Message Router
//!
//! `route(payload)` is `broadcast(transform(payload))`. The transform is
//! supplied once, at construction, and runs once per inbound payload. A
//! failing transform is not caught here; the error goes back to whoever
//! delivered the payload and nothing is broadcast for it.

use std::fmt;
use std::sync::Arc;

use crate::core::registry::SubscriptionRegistry;
use crate::errors::EndpointError;

/// # Message Transform
///
/// A pure function from one payload to one output. Any
/// `Fn(String) -> String` closure is a transform; wrap fallible closures in
/// `Fallible`.
pub trait MessageTransform: Send + Sync + 'static {
    /// Maps one inbound payload to the item subscribers receive.
    fn apply(&self, input: String) -> Result<String, EndpointError>;
}

impl<F> MessageTransform for F
where
    F: Fn(String) -> String + Send + Sync + 'static,
{
    fn apply(&self, input: String) -> Result<String, EndpointError> {
        Ok(self(input))
    }
}

/// Adapts a closure returning `Result<String, E>` into a `MessageTransform`.
pub struct Fallible<F>(pub F);

impl<F, E> MessageTransform for Fallible<F>
where
    F: Fn(String) -> Result<String, E> + Send + Sync + 'static,
    E: fmt::Display,
{
    fn apply(&self, input: String) -> Result<String, EndpointError> {
        (self.0)(input).map_err(|e| EndpointError::Transform(e.to_string()))
    }
}

/// # Message Router
pub struct MessageRouter {
    transform: Box<dyn MessageTransform>,
    registry: Arc<SubscriptionRegistry>,
}

impl MessageRouter {
    /// Creates a router that feeds `registry` through `transform`.
    pub fn new(transform: impl MessageTransform, registry: Arc<SubscriptionRegistry>) -> Self {
        Self {
            transform: Box::new(transform),
            registry,
        }
    }

    /// The registry this router broadcasts into.
    pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.registry
    }

    /// Transforms `payload` and broadcasts the output.
    ///
    /// Returns the number of subscribers that received it, or the transform's
    /// error untouched.
    pub fn route(&self, payload: String) -> Result<usize, EndpointError> {
        let output = self.transform.apply(payload)?;
        Ok(self.registry.broadcast(Arc::from(output)))
    }
}

impl fmt::Debug for MessageRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageRouter")
            .field("subscribers", &self.registry.len())
            .finish()
    }
}
