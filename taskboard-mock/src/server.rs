//! HTTP routes for the mock API.
//!
//! | Method   | Path              | Body         | Response      |
//! |----------|-------------------|--------------|---------------|
//! | `GET`    | `/api/tasks`      |              | `Task[]`      |
//! | `POST`   | `/api/tasks`      | `Task` draft | `Task`        |
//! | `PUT`    | `/api/tasks`      | `Task`       | `Task`        |
//! | `DELETE` | `/api/tasks/{id}` |              | `204`         |
//! | `GET`    | `/api/users`      |              | `User[]`      |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get};
use taskboard_proto::api::{ErrorBody, TASKS_PATH, USERS_PATH};
use taskboard_proto::task::{Task, TaskId};
use taskboard_proto::user::User;

use crate::store::{DbError, MockDb};

impl IntoResponse for DbError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::MissingId => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        };
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Builds the API router over the given database.
pub fn router(db: Arc<MockDb>) -> axum::Router {
    axum::Router::new()
        .route(TASKS_PATH, get(list_tasks).post(create_task).put(update_task))
        .route(&format!("{TASKS_PATH}/{{id}}"), delete(delete_task))
        .route(USERS_PATH, get(list_users))
        .with_state(db)
}

/// Starts the mock server on `addr` with freshly seeded data.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server(
    addr: &str,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    start_server_with_db(addr, Arc::new(MockDb::seeded(true))).await
}

/// Starts the mock server with a pre-built [`MockDb`].
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server_with_db(
    addr: &str,
    db: Arc<MockDb>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = router(db);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "mock server error");
        }
    });

    Ok((bound_addr, handle))
}

async fn list_tasks(State(db): State<Arc<MockDb>>) -> Json<Vec<Task>> {
    Json(db.list_tasks().await)
}

async fn list_users(State(db): State<Arc<MockDb>>) -> Json<Vec<User>> {
    Json(db.list_users().await)
}

async fn create_task(State(db): State<Arc<MockDb>>, Json(task): Json<Task>) -> Json<Task> {
    Json(db.create_task(task).await)
}

async fn update_task(
    State(db): State<Arc<MockDb>>,
    Json(task): Json<Task>,
) -> Result<Json<Task>, DbError> {
    db.update_task(task).await.map(Json)
}

async fn delete_task(
    State(db): State<Arc<MockDb>>,
    Path(id): Path<u64>,
) -> Result<StatusCode, DbError> {
    db.delete_task(TaskId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
