//! Denormalization of tasks against the user snapshot.
//!
//! Each task's `user_id` is joined against the current users. A task that
//! already carries a `user` keeps it unchanged, so locally constructed tasks
//! with a pre-attached user survive re-emission.

use std::collections::HashMap;

use taskboard_proto::task::Task;
use taskboard_proto::user::{User, UserId};

/// Returns `task` with `user` resolved from `users`, unless already set.
///
/// `user` stays `None` when no user matches `user_id`.
#[must_use]
pub fn merge_user(task: &Task, users: &[User]) -> Task {
    if task.user.is_some() {
        return task.clone();
    }
    Task {
        user: users.iter().find(|u| u.id == task.user_id).cloned(),
        ..task.clone()
    }
}

/// Denormalizes a whole task list against one user snapshot.
#[must_use]
pub fn merge_users(tasks: &[Task], users: &[User]) -> Vec<Task> {
    // First user wins on duplicate ids, matching `merge_user`.
    let mut by_id: HashMap<UserId, &User> = HashMap::with_capacity(users.len());
    for user in users {
        by_id.entry(user.id).or_insert(user);
    }
    tasks
        .iter()
        .map(|task| match task.user {
            Some(_) => task.clone(),
            None => Task {
                user: by_id.get(&task.user_id).map(|u| (*u).clone()),
                ..task.clone()
            },
        })
        .collect()
}
