//! Continuously refreshed user snapshot.
//!
//! [`UserService`] polls the user collection and republishes each result
//! through a replay-latest [`Feed`]. Polling starts with the first
//! subscription and is shared by every later one.
//!
//! A failed poll keeps the previous snapshot and is only logged; the next
//! tick retries.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use taskboard_proto::user::User;

use crate::api::TaskApi;
use crate::feed::{Feed, Subscription};
use crate::poll::{self, Poller};

/// Default user poll interval.
pub const DEFAULT_USER_POLL_INTERVAL: Duration = Duration::from_secs(12);

/// Shared, lazily started user poller.
pub struct UserService<A: TaskApi> {
    api: Arc<A>,
    interval: Duration,
    feed: Arc<Feed<Vec<User>>>,
    poller: Mutex<Option<Poller>>,
}

impl<A: TaskApi> UserService<A> {
    /// Creates a service that polls every `interval` once subscribed.
    #[must_use]
    pub fn new(api: Arc<A>, interval: Duration) -> Self {
        Self {
            api,
            interval,
            feed: Arc::new(Feed::default()),
            poller: Mutex::new(None),
        }
    }

    /// Subscribes to user snapshots, starting the poller if needed.
    ///
    /// The subscription starts with the cached snapshot, if any.
    #[must_use]
    pub fn users(&self) -> Subscription<Vec<User>> {
        self.start();
        self.feed.subscribe()
    }

    /// The most recent snapshot, if a poll has succeeded yet.
    #[must_use]
    pub fn latest(&self) -> Option<Vec<User>> {
        self.feed.latest()
    }

    /// Starts polling. Does nothing if already running.
    pub fn start(&self) {
        let mut poller = self.poller.lock();
        if poller.as_ref().is_some_and(Poller::is_running) {
            return;
        }
        let api = Arc::clone(&self.api);
        let feed = Arc::clone(&self.feed);
        let interval = self.interval;
        *poller = Some(Poller::spawn("users", poll_users(api, feed, interval)));
    }

    /// Stops polling. The cached snapshot is kept.
    pub fn stop(&self) {
        if let Some(poller) = self.poller.lock().take() {
            poller.stop();
        }
    }

    /// Whether the poller is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.poller.lock().as_ref().is_some_and(Poller::is_running)
    }
}

async fn poll_users<A: TaskApi>(api: Arc<A>, feed: Arc<Feed<Vec<User>>>, interval: Duration) {
    let mut ticker = poll::ticker(interval);
    loop {
        ticker.tick().await;
        match api.list_users().await {
            Ok(users) => {
                tracing::debug!(count = users.len(), "user snapshot refreshed");
                feed.publish(users);
            }
            Err(e) => {
                tracing::warn!(error = %e, "user poll failed, keeping previous snapshot");
            }
        }
    }
}
