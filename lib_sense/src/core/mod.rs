//! # Core Fan-out Module
//!
//! Everything between a decoded server payload and the local subscribers.
//!
//! ## Core Components:
//!
//! - **`subscription`**: one `Subscription` per subscriber, owning the signed
//!   demand counter and the delivery gate. Subscribers steer it through a
//!   `SubscriptionHandle`.
//!
//! - **`registry`**: the append-only `SubscriptionRegistry`. Subscriptions are
//!   never removed; cancelling one only zeroes its demand.
//!
//! - **`router`**: the `MessageRouter` applies the caller's transform to each
//!   payload and fans the result out through the registry.

/// Per-subscriber demand accounting and the delivery gate.
pub mod subscription;
/// Append-only, copy-on-write collection of subscriptions.
pub mod registry;
/// Transform-then-broadcast routing of inbound payloads.
pub mod router;

// --- Public API Re-exports ---
pub use registry::SubscriptionRegistry;
pub use router::{Fallible, MessageRouter, MessageTransform};
pub use subscription::{Subscriber, Subscription, SubscriptionHandle};
