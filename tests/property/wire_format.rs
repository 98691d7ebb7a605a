//! Property-based tests for the task/user wire format.
//!
//! Uses proptest to verify:
//! 1. Decoding arbitrary bytes never panics.
//! 2. The denormalized `user` never leaks onto the wire.
//! 3. Create requests never carry server-assigned fields.

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use taskboard_proto::codec;
use taskboard_proto::task::{Task, TaskId};
use taskboard_proto::user::{User, UserId};

/// Strategy for timestamps within a sane range (1970..2100), millisecond precision.
fn arb_timestamp() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..4_102_444_800_000).prop_map(|ms| {
        Utc.timestamp_millis_opt(ms)
            .single()
            .unwrap_or_else(|| Utc.timestamp_millis_opt(0).unwrap())
    })
}

fn arb_user() -> impl Strategy<Value = User> {
    (any::<u64>(), "[A-Za-z]{1,16}", "[A-Za-z]{1,16}")
        .prop_map(|(id, first, last)| User::new(UserId::new(id), first, last))
}

fn arb_task() -> impl Strategy<Value = Task> {
    (
        proptest::option::of(any::<u64>()),
        "[^\x00]{0,64}",
        arb_timestamp(),
        proptest::option::of(arb_timestamp()),
        any::<u64>(),
        proptest::option::of(arb_user()),
    )
        .prop_map(|(id, title, due_date, update_date, user_id, user)| Task {
            id: id.map(TaskId::new),
            title,
            due_date,
            update_date,
            user_id: UserId::new(user_id),
            user,
        })
}

proptest! {
    #[test]
    fn decode_random_bytes_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = codec::decode_tasks(&bytes);
        let _ = codec::decode_users(&bytes);
    }

    #[test]
    fn decoded_task_has_no_user(task in arb_task()) {
        let bytes = codec::encode(&task).unwrap();
        let decoded: Task = codec::decode(&bytes).unwrap();
        prop_assert!(decoded.user.is_none());
        prop_assert_eq!(decoded.id, task.id);
        prop_assert_eq!(decoded.update_date, task.update_date);
        prop_assert_eq!(decoded.title, task.title);
    }

    #[test]
    fn create_request_strips_server_fields(task in arb_task()) {
        let bytes = codec::encode(&task.to_create_request()).unwrap();
        let value: serde_json::Value = codec::decode(&bytes).unwrap();
        let obj = value.as_object().unwrap();
        prop_assert!(!obj.contains_key("id"));
        prop_assert!(!obj.contains_key("updateDate"));
        prop_assert!(!obj.contains_key("user"));
    }
}
