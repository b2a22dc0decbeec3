//! # Subscriptions and Demand Accounting
//!
//! A `Subscription` binds one `Subscriber` to the endpoint's output stream.
//! Flow control is pull-based: the subscriber declares how many items it is
//! ready for, and the delivery gate only hands items over while that demand is
//! positive.
//!
//! The demand contract is deliberately non-standard:
//!
//! - `request(n)` **overwrites** the counter. A later, smaller request shrinks
//!   outstanding demand instead of adding to it.
//! - `cancel()` sets the counter to zero. The subscription stays registered and
//!   resumes delivering after the next positive `request`.
//! - Every delivery attempt decrements the counter, delivered or not, so the
//!   counter runs negative while broadcasts continue past exhausted demand. The
//!   next `request` simply replaces the negative value.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// # Subscriber
///
/// A consumer of transformed messages.
pub trait Subscriber: Send + Sync {
    /// Called exactly once, synchronously, while `subscribe` runs. The handle is
    /// how the subscriber requests or cancels demand from now on.
    fn on_subscribe(&self, subscription: SubscriptionHandle);

    /// Called for every item that passes the delivery gate.
    fn on_next(&self, item: Arc<str>);
}

/// # Subscription Handle
///
/// The subscriber-facing side of a `Subscription`. Cloning it is cheap and all
/// clones steer the same demand counter.
#[derive(Clone)]
pub struct SubscriptionHandle {
    demand: Arc<AtomicI64>,
}

impl SubscriptionHandle {
    /// Replaces the current demand with `n`. This is a store, not an add.
    pub fn request(&self, n: i64) {
        self.demand.store(n, Ordering::SeqCst);
    }

    /// Stops delivery by setting demand to zero. The subscription is not removed.
    pub fn cancel(&self) {
        self.demand.store(0, Ordering::SeqCst);
    }

    /// The live demand. Negative once broadcasts have outrun the last request.
    pub fn demand(&self) -> i64 {
        self.demand.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("demand", &self.demand())
            .finish()
    }
}

/// # Subscription
///
/// One registry slot: a shared reference to the subscriber and the demand
/// counter its handle writes to.
pub struct Subscription {
    subscriber: Arc<dyn Subscriber>,
    demand: Arc<AtomicI64>,
}

impl Subscription {
    /// Binds `subscriber` with zero demand.
    pub fn new(subscriber: Arc<dyn Subscriber>) -> Self {
        Self {
            subscriber,
            demand: Arc::new(AtomicI64::new(0)),
        }
    }

    /// A new handle onto this subscription's demand counter.
    pub fn handle(&self) -> SubscriptionHandle {
        SubscriptionHandle {
            demand: Arc::clone(&self.demand),
        }
    }

    /// # Delivery Gate
    ///
    /// Atomically reads and decrements the demand. The item reaches the
    /// subscriber only if the value read before the decrement was positive.
    ///
    /// Returns `true` when the item was delivered.
    pub fn on_next(&self, item: &Arc<str>) -> bool {
        if self.demand.fetch_sub(1, Ordering::SeqCst) > 0 {
            self.subscriber.on_next(Arc::clone(item));
            true
        } else {
            false
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("demand", &self.demand.load(Ordering::SeqCst))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collector {
        items: Mutex<Vec<String>>,
    }

    impl Subscriber for Collector {
        fn on_subscribe(&self, _subscription: SubscriptionHandle) {}

        fn on_next(&self, item: Arc<str>) {
            self.items.lock().unwrap().push(item.to_string());
        }
    }

    fn setup() -> (Arc<Collector>, Subscription) {
        let collector = Arc::new(Collector::default());
        let subscription = Subscription::new(collector.clone());
        (collector, subscription)
    }

    #[test]
    fn test_new_subscription_has_no_demand() {
        let (collector, subscription) = setup();
        assert_eq!(subscription.handle().demand(), 0);
        assert!(!subscription.on_next(&Arc::from("dropped")));
        assert!(collector.items.lock().unwrap().is_empty());
    }

    #[test]
    fn test_request_three_delivers_exactly_three() {
        let (collector, subscription) = setup();
        subscription.handle().request(3);

        let delivered: Vec<bool> = (0..5)
            .map(|i| subscription.on_next(&Arc::from(format!("m{i}"))))
            .collect();

        assert_eq!(delivered, vec![true, true, true, false, false]);
        assert_eq!(*collector.items.lock().unwrap(), vec!["m0", "m1", "m2"]);
    }

    #[test]
    fn test_request_overwrites_instead_of_accumulating() {
        let (collector, subscription) = setup();
        let handle = subscription.handle();

        handle.request(5);
        handle.request(2);
        assert_eq!(handle.demand(), 2);

        for _ in 0..4 {
            subscription.on_next(&Arc::from("x"));
        }
        assert_eq!(collector.items.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_demand_runs_negative_and_is_reset_by_request() {
        let (collector, subscription) = setup();
        let handle = subscription.handle();

        handle.request(1);
        for _ in 0..4 {
            subscription.on_next(&Arc::from("x"));
        }
        // One delivered, three refused, four decrements.
        assert_eq!(handle.demand(), -3);
        assert_eq!(collector.items.lock().unwrap().len(), 1);

        handle.request(2);
        assert_eq!(handle.demand(), 2);
        assert!(subscription.on_next(&Arc::from("y")));
        assert_eq!(handle.demand(), 1);
    }

    #[test]
    fn test_cancel_starves_until_next_request() {
        let (collector, subscription) = setup();
        let handle = subscription.handle();

        handle.request(10);
        handle.cancel();
        for _ in 0..3 {
            assert!(!subscription.on_next(&Arc::from("x")));
        }
        assert!(collector.items.lock().unwrap().is_empty());

        handle.request(1);
        assert!(subscription.on_next(&Arc::from("back")));
        assert_eq!(*collector.items.lock().unwrap(), vec!["back"]);
    }

    #[test]
    fn test_live_demand_is_last_request_minus_attempts() {
        let (_collector, subscription) = setup();
        let handle = subscription.handle();

        for (request, attempts) in [(4_i64, 2_i64), (1, 5), (7, 0), (0, 3)] {
            handle.request(request);
            for _ in 0..attempts {
                subscription.on_next(&Arc::from("x"));
            }
            assert_eq!(handle.demand(), request - attempts);
        }
    }

    #[test]
    fn test_concurrent_delivery_never_over_delivers() {
        let (collector, subscription) = setup();
        let subscription = Arc::new(subscription);
        subscription.handle().request(100);

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let subscription = Arc::clone(&subscription);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        subscription.on_next(&Arc::from("x"));
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(collector.items.lock().unwrap().len(), 100);
        assert_eq!(subscription.handle().demand(), 100 - 400);
    }
}
