//! # Subscription Registry
//!
//! An insertion-ordered, append-only list of subscriptions that can be grown
//! and scanned from any number of threads.
//!
//! The list is copy-on-write: `broadcast` takes a snapshot (`Arc` clone under a
//! short read lock) and iterates it lock-free, so appends never invalidate an
//! in-progress fan-out and readers never see a half-built entry. An append
//! only copies the underlying `Vec` while some snapshot is still alive.
//!
//! Nothing is ever removed. A cancelled subscription keeps its slot and just
//! stops passing the delivery gate.

use std::sync::{Arc, PoisonError, RwLock};

use crate::core::subscription::{Subscriber, Subscription, SubscriptionHandle};

/// A point-in-time view of the registry, in insertion order.
pub type Snapshot = Arc<Vec<Arc<Subscription>>>;

/// # Subscription Registry
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    entries: RwLock<Snapshot>,
}

impl SubscriptionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// # Subscribe
    ///
    /// 1. Builds a `Subscription` for `subscriber` with zero demand.
    /// 2. Hands the subscriber its handle through `on_subscribe`.
    /// 3. Appends the subscription.
    ///
    /// Steps 2 and 3 are not atomic with respect to concurrent broadcasts: the
    /// subscriber may already request demand while a broadcast that started
    /// before the append skips it. Every broadcast that begins after the append
    /// reaches it.
    pub fn subscribe(&self, subscriber: Arc<dyn Subscriber>) -> SubscriptionHandle {
        let subscription = Arc::new(Subscription::new(Arc::clone(&subscriber)));
        let handle = subscription.handle();
        subscriber.on_subscribe(handle.clone());
        self.append(subscription);
        handle
    }

    fn append(&self, subscription: Arc<Subscription>) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Arc::make_mut(&mut *entries).push(subscription);
    }

    /// The current contents in insertion order.
    pub fn snapshot(&self) -> Snapshot {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*entries)
    }

    /// # Broadcast
    ///
    /// Offers `item` to every subscription of a snapshot, in insertion order.
    /// Each subscription decides on its own demand; there is no coordination
    /// between them.
    ///
    /// Returns how many subscribers the item was delivered to.
    pub fn broadcast(&self, item: Arc<str>) -> usize {
        let snapshot = self.snapshot();
        let delivered = snapshot
            .iter()
            .filter(|subscription| subscription.on_next(&item))
            .count();
        log::trace!("Broadcast delivered to {}/{} subscribers", delivered, snapshot.len());
        delivered
    }

    /// Number of subscriptions ever registered.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing has subscribed yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every item into a log shared by all subscribers, tagged with its name.
    struct Tagged {
        name: &'static str,
        demand: i64,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Subscriber for Tagged {
        fn on_subscribe(&self, subscription: SubscriptionHandle) {
            subscription.request(self.demand);
        }

        fn on_next(&self, item: Arc<str>) {
            self.log.lock().unwrap().push(format!("{}:{}", self.name, item));
        }
    }

    struct Probe {
        registry: Arc<SubscriptionRegistry>,
        seen_len: Mutex<Option<usize>>,
        calls: Mutex<usize>,
    }

    impl Subscriber for Probe {
        fn on_subscribe(&self, _subscription: SubscriptionHandle) {
            *self.calls.lock().unwrap() += 1;
            *self.seen_len.lock().unwrap() = Some(self.registry.len());
        }

        fn on_next(&self, _item: Arc<str>) {}
    }

    #[test]
    fn test_subscribe_notifies_once_before_append() {
        let registry = Arc::new(SubscriptionRegistry::new());
        let probe = Arc::new(Probe {
            registry: Arc::clone(&registry),
            seen_len: Mutex::new(None),
            calls: Mutex::new(0),
        });

        let handle = registry.subscribe(probe.clone());

        assert_eq!(*probe.calls.lock().unwrap(), 1);
        assert_eq!(*probe.seen_len.lock().unwrap(), Some(0));
        assert_eq!(registry.len(), 1);
        assert_eq!(handle.demand(), 0);
    }

    #[test]
    fn test_broadcast_follows_insertion_order() {
        let registry = SubscriptionRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for name in ["a", "b", "c"] {
            registry.subscribe(Arc::new(Tagged { name, demand: 10, log: log.clone() }));
        }

        assert_eq!(registry.broadcast(Arc::from("one")), 3);
        assert_eq!(registry.broadcast(Arc::from("two")), 3);

        assert_eq!(
            *log.lock().unwrap(),
            vec!["a:one", "b:one", "c:one", "a:two", "b:two", "c:two"]
        );
    }

    #[test]
    fn test_fanout_is_independent_per_subscriber() {
        let registry = SubscriptionRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        registry.subscribe(Arc::new(Tagged { name: "hungry", demand: 3, log: log.clone() }));
        let idle = registry.subscribe(Arc::new(Tagged { name: "idle", demand: 0, log: log.clone() }));

        let delivered: usize = (0..4).map(|i| registry.broadcast(Arc::from(i.to_string()))).sum();

        assert_eq!(delivered, 3);
        assert_eq!(*log.lock().unwrap(), vec!["hungry:0", "hungry:1", "hungry:2"]);
        assert_eq!(idle.demand(), -4);
    }

    #[test]
    fn test_cancelled_subscription_stays_registered() {
        let registry = SubscriptionRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let handle = registry.subscribe(Arc::new(Tagged { name: "s", demand: 5, log: log.clone() }));

        handle.cancel();
        assert_eq!(registry.broadcast(Arc::from("muted")), 0);
        assert_eq!(registry.len(), 1);

        handle.request(1);
        assert_eq!(registry.broadcast(Arc::from("heard")), 1);
        assert_eq!(*log.lock().unwrap(), vec!["s:heard"]);
    }

    #[test]
    fn test_snapshot_is_stable_across_appends() {
        let registry = SubscriptionRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        registry.subscribe(Arc::new(Tagged { name: "first", demand: 1, log: log.clone() }));

        let before = registry.snapshot();
        registry.subscribe(Arc::new(Tagged { name: "second", demand: 1, log: log.clone() }));

        assert_eq!(before.len(), 1);
        assert_eq!(registry.snapshot().len(), 2);
    }

    #[test]
    fn test_concurrent_subscribe_loses_nothing() {
        let registry = Arc::new(SubscriptionRegistry::new());
        let log = Arc::new(Mutex::new(Vec::new()));

        let workers: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let log = Arc::clone(&log);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        registry.subscribe(Arc::new(Tagged { name: "t", demand: 1, log: log.clone() }));
                        registry.broadcast(Arc::from("noise"));
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(registry.len(), 400);
        for subscription in registry.snapshot().iter() {
            subscription.handle().request(1);
        }
        assert_eq!(registry.broadcast(Arc::from("final")), 400);
    }
}
