//! Integration tests for edit suppression and conflict detection.
//!
//! Drives a `TaskBoard` the way a grid would (edit start, cell value
//! changed, edit stop) against the in-memory API with paused time.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use taskboard::api::memory::MemoryApi;
use taskboard::board::TaskBoard;
use taskboard::edit::EditState;
use taskboard::tasks::TaskService;
use taskboard::users::UserService;
use taskboard_proto::task::{Task, TaskId};
use taskboard_proto::user::{User, UserId};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const TASK_POLL: Duration = Duration::from_secs(5);

fn stored(id: u64, title: &str) -> Task {
    let mut task = Task::new(title, MemoryApi::stamp_at(0), UserId::new(1));
    task.id = Some(TaskId::new(id));
    task.update_date = Some(MemoryApi::stamp_at(0));
    task
}

fn make_board() -> (Arc<MemoryApi>, Arc<TaskBoard<MemoryApi>>) {
    let api = Arc::new(MemoryApi::new(
        vec![User::new(UserId::new(1), "Cameron", "D")],
        vec![stored(1, "A"), stored(2, "B")],
    ));
    let users = Arc::new(UserService::new(Arc::clone(&api), Duration::from_secs(12)));
    let tasks = Arc::new(TaskService::new(Arc::clone(&api), users, TASK_POLL));
    (api, Arc::new(TaskBoard::new(tasks)))
}

/// Lets spawned tasks run without advancing the paused clock.
async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

// ===========================================================================
// Suppression
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn conflict_raised_while_visible_rows_stay_frozen() {
    let (api, board) = make_board();
    let mut rows = board.rows();
    let initial = rows.recv().await.unwrap();
    let t0 = initial[0].update_date;

    board.begin_edit(initial[0].clone());
    let t1 = api.touch(TaskId::new(1)).unwrap();
    tokio::time::sleep(TASK_POLL + Duration::from_secs(1)).await;

    let conflict = board.editor().current_conflict().unwrap();
    assert_eq!(conflict.id, Some(TaskId::new(1)));
    assert_eq!(conflict.update_date, Some(t1));
    assert_eq!(rows.try_recv(), None);
    assert_eq!(board.rows().try_recv().unwrap()[0].update_date, t0);

    board.end_edit();
    let flushed = rows.recv().await.unwrap();
    assert_eq!(flushed[0].update_date, Some(t1));
    assert_eq!(board.editor().current_conflict(), None);
}

#[tokio::test(start_paused = true)]
async fn end_edit_flushes_exactly_once() {
    let (api, board) = make_board();
    let mut rows = board.rows();
    let initial = rows.recv().await.unwrap();

    board.begin_edit(initial[1].clone());
    api.touch(TaskId::new(2));
    tokio::time::sleep(TASK_POLL * 2 + Duration::from_secs(1)).await;
    assert_eq!(rows.try_recv(), None);

    board.end_edit();
    settle().await;
    assert!(rows.try_recv().is_some());
    assert_eq!(rows.try_recv(), None);
}

#[tokio::test(start_paused = true)]
async fn conflict_signal_toggles() {
    let (api, board) = make_board();
    let mut rows = board.rows();
    let initial = rows.recv().await.unwrap();
    let mut conflicts = board.conflicts();
    assert_eq!(conflicts.recv().await, Some(None));

    board.begin_edit(initial[0].clone());
    api.touch(TaskId::new(1));
    tokio::time::sleep(TASK_POLL + Duration::from_secs(1)).await;
    assert!(conflicts.drain_to_newest().unwrap().is_some());

    board.end_edit();
    assert_eq!(conflicts.try_recv(), Some(None));
}

#[tokio::test(start_paused = true)]
async fn editing_a_stale_copy_conflicts_immediately() {
    let (api, board) = make_board();
    let mut rows = board.rows();
    let initial = rows.recv().await.unwrap();

    api.touch(TaskId::new(1));
    tokio::time::sleep(TASK_POLL + Duration::from_secs(1)).await;
    assert!(rows.drain_to_newest().is_some());

    board.begin_edit(initial[0].clone());
    assert!(board.editor().current_conflict().is_some());
}

#[tokio::test(start_paused = true)]
async fn changes_to_other_rows_are_not_conflicts() {
    let (api, board) = make_board();
    let mut rows = board.rows();
    let initial = rows.recv().await.unwrap();

    board.begin_edit(initial[0].clone());
    api.touch(TaskId::new(2));
    tokio::time::sleep(TASK_POLL + Duration::from_secs(1)).await;

    assert_eq!(board.editor().current_conflict(), None);
    assert_eq!(rows.try_recv(), None);
}

// ===========================================================================
// Local saves during an edit
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn own_update_is_not_a_conflict_and_is_flushed_on_end() {
    let (_api, board) = make_board();
    let mut rows = board.rows();
    let initial = rows.recv().await.unwrap();

    board.begin_edit(initial[0].clone());
    let mut edited = initial[0].clone();
    edited.title = "A renamed".to_string();
    let stored = board.cell_value_changed(&edited).await.unwrap();

    settle().await;
    assert_eq!(rows.try_recv(), None);
    assert_eq!(board.editor().current_conflict(), None);
    assert_eq!(board.editor().editing().unwrap().update_date, stored.update_date);

    board.end_edit();
    let flushed = rows.recv().await.unwrap();
    assert_eq!(flushed[0].title, "A renamed");
    assert_eq!(board.editor().state(), EditState::Idle);
}

#[tokio::test(start_paused = true)]
async fn saving_flag_tracks_in_flight_requests() {
    let (api, board) = make_board();
    let mut rows = board.rows();
    rows.recv().await;
    assert!(!board.saving());

    api.set_latency(Some(Duration::from_secs(1)));
    let worker = Arc::clone(&board);
    let request = tokio::spawn(async move {
        worker
            .create(&Task::new("C", MemoryApi::stamp_at(0), UserId::new(1)))
            .await
    });
    settle().await;
    assert!(board.saving());

    request.await.unwrap().unwrap();
    assert!(!board.saving());
}

#[tokio::test(start_paused = true)]
async fn failed_update_keeps_editing() {
    let (api, board) = make_board();
    let mut rows = board.rows();
    let initial = rows.recv().await.unwrap();

    board.begin_edit(initial[0].clone());
    api.fail_writes(true);
    assert!(board.cell_value_changed(&initial[0]).await.is_err());

    assert!(board.editor().is_editing_task(TaskId::new(1)));
    assert!(!board.saving());
}

// ===========================================================================
// Teardown
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn shutdown_stops_forwarding() {
    let (api, board) = make_board();
    let mut rows = board.rows();
    rows.recv().await;
    assert!(board.is_live());

    board.shutdown();
    assert!(!board.is_live());

    api.touch(TaskId::new(1));
    tokio::time::sleep(TASK_POLL + Duration::from_secs(1)).await;
    assert_eq!(rows.try_recv(), None);
}

#[tokio::test(start_paused = true)]
async fn dropping_board_and_services_stops_polling() {
    let (api, board) = make_board();
    let mut rows = board.rows();
    rows.recv().await;

    drop(board);
    settle().await;
    let fetched = api.task_fetches();
    tokio::time::sleep(TASK_POLL * 3).await;
    assert_eq!(api.task_fetches(), fetched);
}
