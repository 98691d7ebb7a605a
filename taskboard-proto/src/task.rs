//! Task records exchanged with the task endpoint.
//!
//! `id` and `update_date` are assigned by the backend and are absent on
//! creation requests. `user` is filled in client-side by joining `user_id`
//! against the current user snapshot; it is never sent to the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::user::{User, UserId};

/// Backend-assigned task identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(u64);

impl TaskId {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A task row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Server-assigned id; `None` until the task has been created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TaskId>,
    /// Task title (the editable column).
    pub title: String,
    /// When the task is due.
    pub due_date: DateTime<Utc>,
    /// Server-stamped on every create and update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_date: Option<DateTime<Utc>>,
    /// Owning user.
    pub user_id: UserId,
    /// Denormalized owner, populated client-side only.
    #[serde(default, skip_serializing)]
    pub user: Option<User>,
}

impl Task {
    /// Builds an unsaved task, suitable for a create request.
    pub fn new(title: impl Into<String>, due_date: DateTime<Utc>, user_id: UserId) -> Self {
        Self {
            id: None,
            title: title.into(),
            due_date,
            update_date: None,
            user_id,
            user: None,
        }
    }

    /// Returns a copy with the server-assigned and derived fields removed.
    #[must_use]
    pub fn to_create_request(&self) -> Self {
        Self {
            id: None,
            update_date: None,
            user: None,
            ..self.clone()
        }
    }

    /// Returns a copy with the given user attached.
    #[must_use]
    pub fn with_user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }
}
