//! Task list state for Taskboard.
//!
//! Provides the polled, user-denormalized task stream and the local
//! create/update/delete operations that re-emit it without waiting for the
//! next poll.

pub mod merge;
pub mod service;

pub use merge::{merge_user, merge_users};
pub use service::{DEFAULT_TASK_POLL_INTERVAL, TaskService};

use thiserror::Error;

use crate::api::ApiError;

/// Errors that can occur during task mutations.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The backend rejected the request or could not be reached.
    #[error("api error: {0}")]
    Api(#[from] ApiError),
    /// Update and delete need a server-assigned id.
    #[error("task has no id; it was never saved")]
    MissingId,
}
