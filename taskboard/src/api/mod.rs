//! Task/user API abstraction for Taskboard.
//!
//! Defines the [`TaskApi`] trait that every backend client must satisfy.
//! Concrete implementations include:
//! - [`http::HttpApi`]: `reqwest` client against a REST backend
//! - [`memory::MemoryApi`]: in-process tables for testing

pub mod http;
pub mod memory;

use std::future::Future;

use taskboard_proto::task::{Task, TaskId};
use taskboard_proto::user::User;

/// Errors that can occur while talking to the backend.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The base URL or a joined route was not a valid URL.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// The request could not be sent or the body could not be read.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The response body was not the expected JSON.
    #[error("malformed response: {0}")]
    Decode(#[from] taskboard_proto::codec::CodecError),

    /// The backend answered with a non-success status.
    #[error("server returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body, or the raw body.
        message: String,
    },

    /// The backend is unreachable (used by in-process implementations).
    #[error("api unavailable: {0}")]
    Unavailable(String),
}

/// Async request/response capability consumed by the services.
///
/// Each method maps to one route of the task/user API:
///
/// | Method          | Route                    |
/// |-----------------|--------------------------|
/// | `list_tasks`    | `GET /api/tasks`         |
/// | `list_users`    | `GET /api/users`         |
/// | `create_task`   | `POST /api/tasks`        |
/// | `update_task`   | `PUT /api/tasks`         |
/// | `delete_task`   | `DELETE /api/tasks/{id}` |
///
/// Create and update responses carry a freshly stamped `update_date`.
pub trait TaskApi: Send + Sync + 'static {
    /// Fetch the whole task collection.
    fn list_tasks(&self) -> impl Future<Output = Result<Vec<Task>, ApiError>> + Send;

    /// Fetch the whole user collection.
    fn list_users(&self) -> impl Future<Output = Result<Vec<User>, ApiError>> + Send;

    /// Create a task. The request must not carry `id` or `update_date`.
    fn create_task(&self, task: &Task) -> impl Future<Output = Result<Task, ApiError>> + Send;

    /// Replace a task, returning the stored version.
    fn update_task(&self, task: &Task) -> impl Future<Output = Result<Task, ApiError>> + Send;

    /// Delete a task by id.
    fn delete_task(&self, id: TaskId) -> impl Future<Output = Result<(), ApiError>> + Send;
}
