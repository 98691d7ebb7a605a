//! The task service: polled task list, user join, and local mutations.
//!
//! `TaskService` runs a single pipeline task that waits on three sources:
//!
//! ```text
//!   trigger (local mutations) ──┐
//!   task poll (every interval) ─┼─> latest tasks ─┐
//!   user feed (UserService) ────┴─> latest users ─┴─> merge_users -> cache -> Feed
//! ```
//!
//! Nothing is emitted until both a task list and a user snapshot are known.
//! Local mutations update the cache after the backend confirms them and push
//! the new list through the trigger, so subscribers see the change without
//! waiting for the next poll.
//!
//! The trigger only carries snapshots while the pipeline runs. A mutation
//! made while it is stopped just updates the cache; the pipeline's first
//! poll after (re)start reads the backend, which already has the change.
//!
//! A poll result that was already in flight when a local mutation completed
//! can overwrite that mutation until the following poll. This is accepted.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use taskboard_proto::task::{Task, TaskId};
use taskboard_proto::user::User;
use tokio::sync::mpsc;

use super::TaskError;
use super::merge::merge_users;
use crate::api::TaskApi;
use crate::feed::{Feed, Subscription};
use crate::poll::{self, Poller};
use crate::users::UserService;

/// Default task poll interval.
pub const DEFAULT_TASK_POLL_INTERVAL: Duration = Duration::from_secs(5);

type Trigger = Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Vec<Task>>>>;

/// Owns the task cache and the denormalized task stream.
pub struct TaskService<A: TaskApi> {
    api: Arc<A>,
    users: Arc<UserService<A>>,
    interval: Duration,
    /// Latest denormalized list. Only this service writes it.
    cache: Arc<Mutex<Vec<Task>>>,
    trigger_tx: mpsc::UnboundedSender<Vec<Task>>,
    trigger_rx: Trigger,
    feed: Arc<Feed<Vec<Task>>>,
    pipeline: Mutex<Option<Poller>>,
}

impl<A: TaskApi> TaskService<A> {
    /// Creates a service that polls tasks every `interval` once subscribed.
    #[must_use]
    pub fn new(api: Arc<A>, users: Arc<UserService<A>>, interval: Duration) -> Self {
        let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();
        Self {
            api,
            users,
            interval,
            cache: Arc::new(Mutex::new(Vec::new())),
            trigger_tx,
            trigger_rx: Arc::new(tokio::sync::Mutex::new(trigger_rx)),
            feed: Arc::new(Feed::default()),
            pipeline: Mutex::new(None),
        }
    }

    /// Subscribes to the denormalized task list, starting the pipeline if needed.
    #[must_use]
    pub fn tasks(&self) -> Subscription<Vec<Task>> {
        self.start();
        self.feed.subscribe()
    }

    /// The most recent emission, if any.
    #[must_use]
    pub fn latest(&self) -> Option<Vec<Task>> {
        self.feed.latest()
    }

    /// A copy of the current task cache.
    #[must_use]
    pub fn cached(&self) -> Vec<Task> {
        self.cache.lock().clone()
    }

    /// The user service this pipeline joins against.
    #[must_use]
    pub const fn user_service(&self) -> &Arc<UserService<A>> {
        &self.users
    }

    /// Starts the pipeline (and the user poller). Does nothing if running.
    pub fn start(&self) {
        let mut pipeline = self.pipeline.lock();
        if pipeline.as_ref().is_some_and(Poller::is_running) {
            return;
        }
        let run = run_pipeline(
            Arc::clone(&self.api),
            self.users.users(),
            Arc::clone(&self.trigger_rx),
            Arc::clone(&self.cache),
            Arc::clone(&self.feed),
            self.interval,
        );
        *pipeline = Some(Poller::spawn("tasks", run));
    }

    /// Stops the pipeline. The user poller is left to its own owner.
    pub fn stop(&self) {
        if let Some(pipeline) = self.pipeline.lock().take() {
            pipeline.stop();
        }
    }

    /// Whether the pipeline is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.pipeline.lock().as_ref().is_some_and(Poller::is_running)
    }

    /// Re-publishes the cache without contacting the backend.
    ///
    /// Used after an edit ends so updates that arrived while the view was
    /// suppressed get delivered.
    pub fn force_send_updates(&self) {
        let snapshot = self.cache.lock().clone();
        self.fire(snapshot);
    }

    /// Creates `task` on the backend and appends the stored version.
    ///
    /// Any `id`, `update_date` or `user` on `task` is stripped from the request.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Api`] if the backend rejects the request. The
    /// cache is unchanged in that case.
    pub async fn create(&self, task: &Task) -> Result<Task, TaskError> {
        let created = self.api.create_task(&task.to_create_request()).await?;
        tracing::info!(task_id = ?created.id, "task created");
        let snapshot = {
            let mut cache = self.cache.lock();
            // A poll may already have brought the new row in.
            cache.retain(|t| t.id != created.id);
            cache.push(created.clone());
            cache.clone()
        };
        self.fire(snapshot);
        Ok(created)
    }

    /// Sends `task` to the backend and replaces the cached row in place.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::MissingId`] if `task` was never saved, or
    /// [`TaskError::Api`] if the backend rejects it. The cache is unchanged
    /// on error.
    pub async fn update(&self, task: &Task) -> Result<Task, TaskError> {
        let id = task.id.ok_or(TaskError::MissingId)?;
        let updated = self.api.update_task(task).await?;
        tracing::info!(task_id = %id, "task updated");
        let snapshot = {
            let mut cache = self.cache.lock();
            match cache.iter_mut().find(|t| t.id == Some(id)) {
                Some(slot) => *slot = updated.clone(),
                None => cache.push(updated.clone()),
            }
            cache.clone()
        };
        self.fire(snapshot);
        Ok(updated)
    }

    /// Deletes `task` on the backend and drops it from the cache.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::MissingId`] if `task` was never saved, or
    /// [`TaskError::Api`] if the backend rejects it. The cache is unchanged
    /// on error.
    pub async fn delete(&self, task: &Task) -> Result<(), TaskError> {
        let id = task.id.ok_or(TaskError::MissingId)?;
        self.api.delete_task(id).await?;
        tracing::info!(task_id = %id, "task deleted");
        let snapshot = {
            let mut cache = self.cache.lock();
            cache.retain(|t| t.id != Some(id));
            cache.clone()
        };
        self.fire(snapshot);
        Ok(())
    }

    /// Looks up a cached task by id.
    #[must_use]
    pub fn find(&self, id: TaskId) -> Option<Task> {
        self.cache.lock().iter().find(|t| t.id == Some(id)).cloned()
    }

    fn fire(&self, snapshot: Vec<Task>) {
        if !self.is_running() {
            tracing::trace!("task pipeline not running, trigger skipped");
            return;
        }
        if self.trigger_tx.send(snapshot).is_err() {
            tracing::warn!("task trigger closed, local change not re-emitted");
        }
    }
}

async fn run_pipeline<A: TaskApi>(
    api: Arc<A>,
    mut users: Subscription<Vec<User>>,
    trigger: Trigger,
    cache: Arc<Mutex<Vec<Task>>>,
    feed: Arc<Feed<Vec<Task>>>,
    interval: Duration,
) {
    let mut trigger = trigger.lock().await;
    // Left over from a previous run; the first poll supersedes them.
    while trigger.try_recv().is_ok() {}
    let mut ticker = poll::ticker(interval);
    let mut latest_tasks: Option<Vec<Task>> = None;
    let mut latest_users: Option<Vec<User>> = None;

    loop {
        tokio::select! {
            Some(tasks) = trigger.recv() => {
                tracing::trace!(count = tasks.len(), "local task change");
                latest_tasks = Some(tasks);
            }
            _ = ticker.tick() => match api.list_tasks().await {
                Ok(tasks) => {
                    tracing::debug!(count = tasks.len(), "task list polled");
                    latest_tasks = Some(tasks);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "task poll failed, keeping previous list");
                    continue;
                }
            },
            update = users.recv() => match update {
                Some(snapshot) => latest_users = Some(snapshot),
                None => {
                    tracing::debug!("user feed closed, stopping task pipeline");
                    break;
                }
            },
        }

        if let (Some(tasks), Some(users)) = (&latest_tasks, &latest_users) {
            let merged = merge_users(tasks, users);
            *cache.lock() = merged.clone();
            feed.publish(merged);
        }
    }
}
