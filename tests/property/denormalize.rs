//! Property-based tests for task/user denormalization.
//!
//! Uses proptest to verify:
//! 1. A task gets a `user` iff some user in the snapshot has its `user_id`.
//! 2. A pre-set `user` is preserved unchanged.
//! 3. Merging keeps order, length and every non-`user` field.
//! 4. `merge_users` agrees with `merge_user` applied per task.

use proptest::prelude::*;
use taskboard::api::memory::MemoryApi;
use taskboard::tasks::{merge_user, merge_users};
use taskboard_proto::task::{Task, TaskId};
use taskboard_proto::user::{User, UserId};

/// User ids are drawn from a small range so joins hit and miss.
fn arb_user() -> impl Strategy<Value = User> {
    (0u64..8, "[A-Z][a-z]{0,8}", "[A-Z]")
        .prop_map(|(id, first, last)| User::new(UserId::new(id), first, last))
}

fn arb_task() -> impl Strategy<Value = Task> {
    (
        proptest::option::of(0u64..1000),
        "[a-z ]{0,24}",
        0i64..10_000,
        proptest::option::of(0i64..10_000),
        0u64..8,
        proptest::option::of(arb_user()),
    )
        .prop_map(|(id, title, due, stamp, user_id, user)| Task {
            id: id.map(TaskId::new),
            title,
            due_date: MemoryApi::stamp_at(due),
            update_date: stamp.map(MemoryApi::stamp_at),
            user_id: UserId::new(user_id),
            user,
        })
}

proptest! {
    #[test]
    fn user_set_iff_match_or_preset(
        tasks in proptest::collection::vec(arb_task(), 0..16),
        users in proptest::collection::vec(arb_user(), 0..8),
    ) {
        let merged = merge_users(&tasks, &users);
        for (before, after) in tasks.iter().zip(&merged) {
            match &before.user {
                Some(preset) => prop_assert_eq!(after.user.as_ref(), Some(preset)),
                None => {
                    let matched = users.iter().any(|u| u.id == before.user_id);
                    prop_assert_eq!(after.user.is_some(), matched);
                    if let Some(user) = &after.user {
                        prop_assert_eq!(user.id, before.user_id);
                    }
                }
            }
        }
    }

    #[test]
    fn merge_only_touches_user(
        tasks in proptest::collection::vec(arb_task(), 0..16),
        users in proptest::collection::vec(arb_user(), 0..8),
    ) {
        let merged = merge_users(&tasks, &users);
        prop_assert_eq!(merged.len(), tasks.len());
        for (before, after) in tasks.iter().zip(&merged) {
            prop_assert_eq!(after.id, before.id);
            prop_assert_eq!(&after.title, &before.title);
            prop_assert_eq!(after.due_date, before.due_date);
            prop_assert_eq!(after.update_date, before.update_date);
            prop_assert_eq!(after.user_id, before.user_id);
        }
    }

    #[test]
    fn list_merge_matches_single_merge(
        tasks in proptest::collection::vec(arb_task(), 0..16),
        users in proptest::collection::vec(arb_user(), 0..8),
    ) {
        let merged = merge_users(&tasks, &users);
        let single: Vec<Task> = tasks.iter().map(|t| merge_user(t, &users)).collect();
        prop_assert_eq!(merged, single);
    }

    #[test]
    fn merge_is_idempotent(
        tasks in proptest::collection::vec(arb_task(), 0..16),
        users in proptest::collection::vec(arb_user(), 0..8),
    ) {
        let once = merge_users(&tasks, &users);
        let twice = merge_users(&once, &users);
        prop_assert_eq!(once, twice);
    }
}
