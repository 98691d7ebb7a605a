//! Route paths shared by the client and the mock backend.

use crate::task::TaskId;

/// Task collection: `GET` lists, `POST` creates, `PUT` updates.
pub const TASKS_PATH: &str = "/api/tasks";

/// User collection: `GET` lists.
pub const USERS_PATH: &str = "/api/users";

/// Path of a single task, used by `DELETE`.
#[must_use]
pub fn task_path(id: TaskId) -> String {
    format!("{TASKS_PATH}/{id}")
}

/// JSON body returned by the backend for failed requests.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ErrorBody {
    /// Human-readable reason.
    pub error: String,
}
