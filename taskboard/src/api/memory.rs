//! In-process API for testing.
//!
//! [`MemoryApi`] keeps users and tasks in memory and follows the same rules
//! as the REST backend: new tasks get the next id, and every create/update
//! gets a fresh `update_date`. Stamps come from a logical clock (one second
//! per stamp from a fixed epoch) so tests can predict them.
//!
//! Failures can be injected for reads and writes independently, and an
//! artificial latency can be set to keep requests in flight.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use taskboard_proto::task::{Task, TaskId};
use taskboard_proto::user::User;

use super::{ApiError, TaskApi};

struct Tables {
    users: Vec<User>,
    tasks: Vec<Task>,
    next_id: u64,
    clock: i64,
}

/// In-memory [`TaskApi`] with failure injection.
pub struct MemoryApi {
    tables: Mutex<Tables>,
    fail_reads: Mutex<bool>,
    fail_writes: Mutex<bool>,
    latency: Mutex<Option<Duration>>,
    task_fetches: AtomicUsize,
    user_fetches: AtomicUsize,
}

impl Default for MemoryApi {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

impl MemoryApi {
    /// Creates an API serving the given users and tasks.
    #[must_use]
    pub fn new(users: Vec<User>, tasks: Vec<Task>) -> Self {
        let next_id = tasks
            .iter()
            .filter_map(|t| t.id.map(TaskId::get))
            .max()
            .unwrap_or(0)
            + 1;
        Self {
            tables: Mutex::new(Tables {
                users,
                tasks,
                next_id,
                clock: 0,
            }),
            fail_reads: Mutex::new(false),
            fail_writes: Mutex::new(false),
            latency: Mutex::new(None),
            task_fetches: AtomicUsize::new(0),
            user_fetches: AtomicUsize::new(0),
        }
    }

    /// Returns the stamp the logical clock will hand out after `ticks` more stamps.
    ///
    /// `stamp_at(0)` is the fixed epoch (2024-01-01T00:00:00Z).
    #[must_use]
    pub fn stamp_at(ticks: i64) -> DateTime<Utc> {
        let epoch = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single();
        epoch.map_or(DateTime::UNIX_EPOCH, |e| e + chrono::Duration::seconds(ticks))
    }

    /// Replaces the user table.
    pub fn set_users(&self, users: Vec<User>) {
        self.tables.lock().users = users;
    }

    /// Replaces the task table.
    pub fn set_tasks(&self, tasks: Vec<Task>) {
        self.tables.lock().tasks = tasks;
    }

    /// Simulates another writer: restamps the task with `id` and returns its new stamp.
    pub fn touch(&self, id: TaskId) -> Option<DateTime<Utc>> {
        let mut tables = self.tables.lock();
        tables.clock += 1;
        let stamp = Self::stamp_at(tables.clock);
        let task = tables.tasks.iter_mut().find(|t| t.id == Some(id))?;
        task.update_date = Some(stamp);
        Some(stamp)
    }

    /// Returns a copy of the stored tasks.
    #[must_use]
    pub fn stored_tasks(&self) -> Vec<Task> {
        self.tables.lock().tasks.clone()
    }

    /// Makes every list request fail while `fail` is true.
    pub fn fail_reads(&self, fail: bool) {
        *self.fail_reads.lock() = fail;
    }

    /// Makes every create/update/delete fail while `fail` is true.
    pub fn fail_writes(&self, fail: bool) {
        *self.fail_writes.lock() = fail;
    }

    /// Delays every request by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock() = latency;
    }

    /// Number of task list requests served so far (including failed ones).
    #[must_use]
    pub fn task_fetches(&self) -> usize {
        self.task_fetches.load(Ordering::SeqCst)
    }

    /// Number of user list requests served so far (including failed ones).
    #[must_use]
    pub fn user_fetches(&self) -> usize {
        self.user_fetches.load(Ordering::SeqCst)
    }

    async fn delay(&self) {
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn check(flag: &Mutex<bool>) -> Result<(), ApiError> {
        if *flag.lock() {
            return Err(ApiError::Unavailable("injected failure".to_string()));
        }
        Ok(())
    }
}

impl TaskApi for MemoryApi {
    async fn list_tasks(&self) -> Result<Vec<Task>, ApiError> {
        self.task_fetches.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        Self::check(&self.fail_reads)?;
        Ok(self.tables.lock().tasks.clone())
    }

    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.user_fetches.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        Self::check(&self.fail_reads)?;
        Ok(self.tables.lock().users.clone())
    }

    async fn create_task(&self, task: &Task) -> Result<Task, ApiError> {
        self.delay().await;
        Self::check(&self.fail_writes)?;
        let mut tables = self.tables.lock();
        tables.clock += 1;
        let stored = Task {
            id: Some(TaskId::new(tables.next_id)),
            update_date: Some(Self::stamp_at(tables.clock)),
            user: None,
            ..task.clone()
        };
        tables.next_id += 1;
        tables.tasks.push(stored.clone());
        Ok(stored)
    }

    async fn update_task(&self, task: &Task) -> Result<Task, ApiError> {
        self.delay().await;
        Self::check(&self.fail_writes)?;
        let id = task.id.ok_or_else(|| ApiError::Status {
            status: 400,
            message: "task id is required".to_string(),
        })?;
        let mut tables = self.tables.lock();
        tables.clock += 1;
        let stamp = Self::stamp_at(tables.clock);
        let slot = tables
            .tasks
            .iter_mut()
            .find(|t| t.id == Some(id))
            .ok_or_else(|| ApiError::Status {
                status: 404,
                message: format!("task not found: {id}"),
            })?;
        *slot = Task {
            update_date: Some(stamp),
            user: None,
            ..task.clone()
        };
        Ok(slot.clone())
    }

    async fn delete_task(&self, id: TaskId) -> Result<(), ApiError> {
        self.delay().await;
        Self::check(&self.fail_writes)?;
        let mut tables = self.tables.lock();
        let before = tables.tasks.len();
        tables.tasks.retain(|t| t.id != Some(id));
        if tables.tasks.len() == before {
            return Err(ApiError::Status {
                status: 404,
                message: format!("task not found: {id}"),
            });
        }
        Ok(())
    }
}
