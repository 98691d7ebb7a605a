//! Replay-latest broadcast feeds.
//!
//! A [`Feed`] is a [`tokio::sync::broadcast`] channel paired with a
//! one-value cache. Every [`Subscription`] first yields the cached value (if
//! any) and then every later publication, so late subscribers see the current
//! state immediately without the source re-fetching it.
//!
//! Publishing and subscribing take the same lock, so a subscriber never
//! misses a value published concurrently with its registration and never
//! sees one twice.

use parking_lot::Mutex;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

/// Default number of buffered publications per subscriber.
pub const DEFAULT_FEED_CAPACITY: usize = 64;

/// A broadcast source that remembers its latest value.
pub struct Feed<T> {
    latest: Mutex<Option<T>>,
    tx: broadcast::Sender<T>,
}

impl<T: Clone + Send + 'static> Default for Feed<T> {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

impl<T: Clone + Send + 'static> Feed<T> {
    /// Creates an empty feed buffering up to `capacity` values per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            latest: Mutex::new(None),
            tx,
        }
    }

    /// Stores `value` as the latest and delivers it to every subscriber.
    ///
    /// Publishing an unchanged value is a plain re-notification.
    pub fn publish(&self, value: T) {
        let mut latest = self.latest.lock();
        *latest = Some(value.clone());
        // No receivers is fine; the value is still cached for replay.
        let _ = self.tx.send(value);
    }

    /// Registers a subscriber that starts with the cached value.
    #[must_use]
    pub fn subscribe(&self) -> Subscription<T> {
        let latest = self.latest.lock();
        Subscription {
            pending: latest.clone(),
            rx: self.tx.subscribe(),
        }
    }

    /// Returns the cached value, if anything was published yet.
    #[must_use]
    pub fn latest(&self) -> Option<T> {
        self.latest.lock().clone()
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Receiving half of a [`Feed`].
pub struct Subscription<T> {
    pending: Option<T>,
    rx: broadcast::Receiver<T>,
}

impl<T: Clone> Subscription<T> {
    /// Waits for the next value.
    ///
    /// Returns `None` once the feed has been dropped. A subscriber that fell
    /// behind skips straight to the newest buffered value.
    pub async fn recv(&mut self) -> Option<T> {
        if let Some(value) = self.pending.take() {
            return Some(value);
        }
        loop {
            match self.rx.recv().await {
                Ok(value) => return Some(value),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "feed subscriber lagged, skipping to newest");
                    if let Some(value) = self.drain_to_newest() {
                        return Some(value);
                    }
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Returns the next value if one is ready, without waiting.
    pub fn try_recv(&mut self) -> Option<T> {
        if let Some(value) = self.pending.take() {
            return Some(value);
        }
        loop {
            match self.rx.try_recv() {
                Ok(value) => return Some(value),
                Err(TryRecvError::Lagged(_)) => {}
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Discards everything that is ready and returns the newest value.
    pub fn drain_to_newest(&mut self) -> Option<T> {
        let mut newest = None;
        while let Some(value) = self.try_recv() {
            newest = Some(value);
        }
        newest
    }
}
