//! Integration tests against the mock REST backend.
//!
//! Each test starts `taskboard-mock` on an ephemeral port and talks to it
//! through `HttpApi`, so the JSON wire format, routes and status mapping
//! are exercised end to end.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use taskboard::api::http::HttpApi;
use taskboard::api::{ApiError, TaskApi};
use taskboard::board::TaskBoard;
use taskboard::tasks::TaskService;
use taskboard::users::UserService;
use taskboard_mock::server::start_server_with_db;
use taskboard_mock::store::MockDb;
use taskboard_proto::task::{Task, TaskId};
use taskboard_proto::user::UserId;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const TIMEOUT: Duration = Duration::from_secs(5);

/// Starts a mock backend and returns a client for it.
async fn start_backend(touch_first_on_get: bool) -> (HttpApi, tokio::task::JoinHandle<()>) {
    let db = Arc::new(MockDb::seeded(touch_first_on_get));
    let (addr, handle) = start_server_with_db("127.0.0.1:0", db)
        .await
        .expect("failed to start mock backend");
    let api = HttpApi::new(&format!("http://{addr}"), TIMEOUT).unwrap();
    (api, handle)
}

// ===========================================================================
// Raw API
// ===========================================================================

#[tokio::test]
async fn lists_seeded_users_and_tasks() {
    let (api, server) = start_backend(false).await;

    let users = api.list_users().await.unwrap();
    assert_eq!(users.len(), 4);
    assert_eq!(users[0].display_name(), "Cameron D");

    let tasks = api.list_tasks().await.unwrap();
    assert_eq!(tasks.len(), 5);
    assert!(tasks.iter().all(|t| t.id.is_some() && t.user.is_none()));

    server.abort();
}

#[tokio::test]
async fn create_update_delete_roundtrip() {
    let (api, server) = start_backend(false).await;

    let draft = Task::new("Write tests", chrono::Utc::now(), UserId::new(2));
    let created = api.create_task(&draft.to_create_request()).await.unwrap();
    assert_eq!(created.id, Some(TaskId::new(6)));
    assert!(created.update_date.is_some());

    let mut edited = created.clone();
    edited.title = "Write more tests".to_string();
    let updated = api.update_task(&edited).await.unwrap();
    assert_eq!(updated.title, "Write more tests");
    assert!(updated.update_date > created.update_date);

    api.delete_task(TaskId::new(6)).await.unwrap();
    let tasks = api.list_tasks().await.unwrap();
    assert!(tasks.iter().all(|t| t.id != Some(TaskId::new(6))));

    server.abort();
}

#[tokio::test]
async fn unknown_task_maps_to_not_found() {
    let (api, server) = start_backend(false).await;

    let err = api.delete_task(TaskId::new(999)).await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 404, .. }));

    let mut ghost = Task::new("ghost", chrono::Utc::now(), UserId::new(1));
    ghost.id = Some(TaskId::new(999));
    let err = api.update_task(&ghost).await.unwrap_err();
    match err {
        ApiError::Status { status, message } => {
            assert_eq!(status, 404);
            assert!(message.contains("999"));
        }
        other => panic!("expected status error, got {other:?}"),
    }

    server.abort();
}

#[tokio::test]
async fn touch_first_on_get_restamps_first_task() {
    let (api, server) = start_backend(true).await;

    let first = api.list_tasks().await.unwrap();
    let second = api.list_tasks().await.unwrap();
    assert!(second[0].update_date > first[0].update_date);
    assert_eq!(second[1].update_date, first[1].update_date);

    server.abort();
}

// ===========================================================================
// Full stack
// ===========================================================================

#[tokio::test]
async fn board_shows_denormalized_rows_from_backend() {
    let (api, server) = start_backend(false).await;
    let api = Arc::new(api);
    let users = Arc::new(UserService::new(Arc::clone(&api), Duration::from_millis(200)));
    let tasks = Arc::new(TaskService::new(api, users, Duration::from_millis(100)));
    let board = TaskBoard::new(tasks);

    let mut rows = board.rows();
    let first = tokio::time::timeout(TIMEOUT, rows.recv())
        .await
        .expect("no rows within timeout")
        .unwrap();
    assert_eq!(first.len(), 5);
    assert_eq!(first[0].user.as_ref().unwrap().display_name(), "Cameron D");

    let created = board
        .create(&Task::new("From board", chrono::Utc::now(), UserId::new(3)))
        .await
        .unwrap();
    let next = tokio::time::timeout(TIMEOUT, rows.recv())
        .await
        .expect("no rows within timeout")
        .unwrap();
    let row = next.iter().find(|t| t.id == created.id).unwrap();
    assert_eq!(row.user.as_ref().unwrap().display_name(), "Wes C");

    board.shutdown();
    server.abort();
}

#[tokio::test]
async fn backend_edit_raises_conflict() {
    let (api, server) = start_backend(true).await;
    let api = Arc::new(api);
    let users = Arc::new(UserService::new(Arc::clone(&api), Duration::from_millis(200)));
    let tasks = Arc::new(TaskService::new(api, users, Duration::from_millis(100)));
    let board = TaskBoard::new(tasks);

    let mut rows = board.rows();
    let first = tokio::time::timeout(TIMEOUT, rows.recv())
        .await
        .expect("no rows within timeout")
        .unwrap();

    // Every GET restamps task 1, so the next poll conflicts.
    board.begin_edit(first[0].clone());
    let mut conflicts = board.conflicts();
    let conflict = tokio::time::timeout(TIMEOUT, async {
        while let Some(update) = conflicts.recv().await {
            if update.is_some() {
                return update;
            }
        }
        None
    })
    .await
    .expect("no conflict within timeout")
    .expect("conflict feed closed");
    assert_eq!(conflict.id, first[0].id);

    board.end_edit();
    board.shutdown();
    server.abort();
}
