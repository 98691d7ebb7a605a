//! In-memory tables backing the mock API.
//!
//! [`MockDb`] holds the user and task collections behind a single
//! [`RwLock`]. Users are read-only. Tasks get a fresh `update_date` on every
//! create and update, and optionally on every list request (the first task
//! only) so clients can observe "server-side" changes while polling.

use chrono::{DateTime, Duration, Utc};
use taskboard_proto::task::{Task, TaskId};
use taskboard_proto::user::{User, UserId};
use tokio::sync::RwLock;

/// Errors returned by task mutations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DbError {
    /// An update was sent for a task without an id.
    #[error("task id is required")]
    MissingId,
    /// No task with the given id exists.
    #[error("task not found: {0}")]
    NotFound(TaskId),
}

struct Tables {
    users: Vec<User>,
    tasks: Vec<Task>,
    next_id: u64,
    /// Last stamp handed out; stamps are kept strictly increasing.
    last_stamp: Option<DateTime<Utc>>,
}

impl Tables {
    fn stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_stamp {
            Some(prev) if now <= prev => prev + Duration::milliseconds(1),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }
}

/// In-memory user and task collections.
pub struct MockDb {
    tables: RwLock<Tables>,
    touch_first_on_get: bool,
}

impl MockDb {
    /// Creates a database from explicit collections.
    ///
    /// New task ids continue after the highest id in `tasks`.
    #[must_use]
    pub fn new(users: Vec<User>, tasks: Vec<Task>, touch_first_on_get: bool) -> Self {
        let next_id = tasks
            .iter()
            .filter_map(|t| t.id.map(TaskId::get))
            .max()
            .unwrap_or(0)
            + 1;
        Self {
            tables: RwLock::new(Tables {
                users,
                tasks,
                next_id,
                last_stamp: None,
            }),
            touch_first_on_get,
        }
    }

    /// Creates a database holding the demo users and tasks.
    #[must_use]
    pub fn seeded(touch_first_on_get: bool) -> Self {
        let users = vec![
            User::new(UserId::new(1), "Cameron", "D"),
            User::new(UserId::new(2), "Nic", "C"),
            User::new(UserId::new(3), "Wes", "C"),
            User::new(UserId::new(4), "Zach", "W"),
        ];
        let now = Utc::now();
        let seed = [
            (1, "Buy Groceries", 1),
            (2, "Exchange Present", 2),
            (3, "Go Running", 1),
            (4, "Visit DevCon", 3),
            (5, "Switch to React", 4),
        ];
        let tasks = seed
            .into_iter()
            .map(|(id, title, user)| Task {
                id: Some(TaskId::new(id)),
                title: title.to_string(),
                due_date: now,
                update_date: Some(now),
                user_id: UserId::new(user),
                user: None,
            })
            .collect();
        Self::new(users, tasks, touch_first_on_get)
    }

    /// Returns every user.
    pub async fn list_users(&self) -> Vec<User> {
        self.tables.read().await.users.clone()
    }

    /// Returns every task, touching the first one if configured to.
    pub async fn list_tasks(&self) -> Vec<Task> {
        if !self.touch_first_on_get {
            return self.tables.read().await.tasks.clone();
        }
        let mut tables = self.tables.write().await;
        if !tables.tasks.is_empty() {
            let stamp = tables.stamp();
            tables.tasks[0].update_date = Some(stamp);
        }
        tables.tasks.clone()
    }

    /// Stores a new task under a fresh id and returns it.
    ///
    /// Any `id`, `update_date` or `user` on the request is ignored.
    pub async fn create_task(&self, task: Task) -> Task {
        let mut tables = self.tables.write().await;
        let id = TaskId::new(tables.next_id);
        tables.next_id += 1;
        let stored = Task {
            id: Some(id),
            update_date: Some(tables.stamp()),
            user: None,
            ..task
        };
        tables.tasks.push(stored.clone());
        drop(tables);
        tracing::debug!(task_id = %id, "task created");
        stored
    }

    /// Replaces the stored task with the same id and returns the stored copy.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::MissingId`] if the request has no id, or
    /// [`DbError::NotFound`] if no such task exists.
    pub async fn update_task(&self, task: Task) -> Result<Task, DbError> {
        let id = task.id.ok_or(DbError::MissingId)?;
        let mut tables = self.tables.write().await;
        let stamp = tables.stamp();
        let slot = tables
            .tasks
            .iter_mut()
            .find(|t| t.id == Some(id))
            .ok_or(DbError::NotFound(id))?;
        *slot = Task {
            update_date: Some(stamp),
            user: None,
            ..task
        };
        let stored = slot.clone();
        drop(tables);
        tracing::debug!(task_id = %id, "task updated");
        Ok(stored)
    }

    /// Removes the task with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if no such task exists.
    pub async fn delete_task(&self, id: TaskId) -> Result<(), DbError> {
        let mut tables = self.tables.write().await;
        let before = tables.tasks.len();
        tables.tasks.retain(|t| t.id != Some(id));
        if tables.tasks.len() == before {
            return Err(DbError::NotFound(id));
        }
        drop(tables);
        tracing::debug!(task_id = %id, "task deleted");
        Ok(())
    }
}
