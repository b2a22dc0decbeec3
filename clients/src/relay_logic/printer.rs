use std::io::Write;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use lib_sense::{Subscriber, SubscriptionHandle};

/// Writes every delivered item as one line and re-requests a fresh batch of
/// demand each time a batch has been consumed.
pub struct LinePrinter<W: Write + Send> {
    batch: i64,
    received: AtomicI64,
    subscription: OnceLock<SubscriptionHandle>,
    out: Mutex<W>,
}

impl LinePrinter<std::io::Stdout> {
    pub fn stdout(batch: i64) -> Self {
        Self::new(batch, std::io::stdout())
    }
}

impl<W: Write + Send> LinePrinter<W> {
    pub fn new(batch: i64, out: W) -> Self {
        Self {
            batch: batch.max(1),
            received: AtomicI64::new(0),
            subscription: OnceLock::new(),
            out: Mutex::new(out),
        }
    }

    pub fn received(&self) -> i64 {
        self.received.load(Ordering::SeqCst)
    }
}

impl<W: Write + Send> Subscriber for LinePrinter<W> {
    fn on_subscribe(&self, subscription: SubscriptionHandle) {
        subscription.request(self.batch);
        if self.subscription.set(subscription).is_err() {
            log::warn!("Printer subscribed twice; keeping the first subscription");
        }
    }

    fn on_next(&self, item: Arc<str>) {
        {
            let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
            if let Err(e) = writeln!(out, "{}", item).and_then(|_| out.flush()) {
                log::error!("Failed to write item: {}", e);
            }
        }

        let received = self.received.fetch_add(1, Ordering::SeqCst) + 1;
        if received % self.batch == 0 {
            if let Some(subscription) = self.subscription.get() {
                log::debug!("Batch of {} consumed, requesting more", self.batch);
                subscription.request(self.batch);
            }
        }
    }
}
