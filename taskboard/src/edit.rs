//! Edit suppression and conflict detection.
//!
//! While a row is being edited the visible task list is frozen: emissions of
//! the underlying task stream are not forwarded to the view. The controller
//! still watches every underlying emission and publishes a conflict signal
//! when the row being edited has a different `update_date` on the server.
//!
//! State machine:
//!
//! ```text
//!            begin_edit(task)
//!   Idle ─────────────────────────> Editing { task, local_update_sent: false }
//!    ^                                   │  mark_update_sent()  -> flag = true
//!    │                                   │  update_settled(..)  -> rebase, flag = false
//!    └──────────── end_edit() ───────────┘
//!          (flushes via force_send_updates() unless an update is in flight)
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use taskboard_proto::task::{Task, TaskId};

use crate::api::TaskApi;
use crate::feed::{Feed, Subscription};
use crate::tasks::TaskService;

/// The row currently being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    /// The row as it was when editing started (or after our own save).
    pub task: Task,
    /// Whether a local update is in flight for this session.
    pub local_update_sent: bool,
}

/// Edit state as seen by the view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditState {
    /// No row is being edited; updates flow through.
    #[default]
    Idle,
    /// One row is being edited; updates are withheld.
    Editing(EditSession),
}

/// Returns the server copy of `editing` if it changed since editing began.
///
/// A server copy counts as changed when it has an `update_date` that differs
/// from the edited copy's. An edited copy with no `update_date` (never saved)
/// is therefore in conflict with any stamped server copy. A server copy with
/// no `update_date` is never a conflict.
#[must_use]
pub fn find_conflict(snapshot: &[Task], editing: &Task) -> Option<Task> {
    let id = editing.id?;
    snapshot
        .iter()
        .find(|t| {
            t.id == Some(id) && t.update_date.is_some() && t.update_date != editing.update_date
        })
        .cloned()
}

/// Freezes the visible rows during an edit and reports server-side changes.
///
/// Shared by handle between the view and the data layer; all transitions
/// are short critical sections with no awaits.
pub struct EditController<A: TaskApi> {
    tasks: Arc<TaskService<A>>,
    state: Mutex<EditState>,
    visible: Feed<Vec<Task>>,
    conflict: Feed<Option<Task>>,
}

impl<A: TaskApi> EditController<A> {
    /// Creates an idle controller over `tasks`.
    #[must_use]
    pub fn new(tasks: Arc<TaskService<A>>) -> Self {
        let conflict = Feed::default();
        conflict.publish(None);
        Self {
            tasks,
            state: Mutex::new(EditState::Idle),
            visible: Feed::default(),
            conflict,
        }
    }

    /// Subscribes to the rows the view should display.
    #[must_use]
    pub fn visible(&self) -> Subscription<Vec<Task>> {
        self.visible.subscribe()
    }

    /// Subscribes to the conflict signal (`Some` while the edited row changed).
    #[must_use]
    pub fn conflicts(&self) -> Subscription<Option<Task>> {
        self.conflict.subscribe()
    }

    /// Current conflict, if any.
    #[must_use]
    pub fn current_conflict(&self) -> Option<Task> {
        self.conflict.latest().flatten()
    }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> EditState {
        self.state.lock().clone()
    }

    /// Whether a row is being edited.
    #[must_use]
    pub fn is_editing(&self) -> bool {
        matches!(*self.state.lock(), EditState::Editing(_))
    }

    /// The row being edited, if any.
    #[must_use]
    pub fn editing(&self) -> Option<Task> {
        match &*self.state.lock() {
            EditState::Editing(session) => Some(session.task.clone()),
            EditState::Idle => None,
        }
    }

    /// Feeds one emission of the underlying task stream through the controller.
    ///
    /// The emission is forwarded to the visible feed only while idle; the
    /// conflict signal is recomputed either way, except while the session's
    /// own update is in flight: a poll may already carry that write, and
    /// [`update_settled`](Self::update_settled) recomputes once it returns.
    pub fn observe(&self, tasks: Vec<Task>) {
        let state = self.state.lock();
        match &*state {
            EditState::Idle => {
                self.set_conflict(None);
                self.visible.publish(tasks);
            }
            EditState::Editing(session) => {
                if !session.local_update_sent {
                    self.set_conflict(find_conflict(&tasks, &session.task));
                }
                tracing::trace!(task_id = ?session.task.id, "row update withheld during edit");
            }
        }
    }

    /// Starts editing `task`, replacing any current session.
    pub fn begin_edit(&self, task: Task) {
        let mut state = self.state.lock();
        tracing::debug!(task_id = ?task.id, "edit started");
        let conflict = self
            .tasks
            .latest()
            .and_then(|snapshot| find_conflict(&snapshot, &task));
        *state = EditState::Editing(EditSession {
            task,
            local_update_sent: false,
        });
        self.set_conflict(conflict);
    }

    /// Records that a local update was sent for the current session.
    pub fn mark_update_sent(&self) {
        if let EditState::Editing(session) = &mut *self.state.lock() {
            session.local_update_sent = true;
        }
    }

    /// Records the outcome of a local update for `requested`.
    ///
    /// If the same row is still being edited, a successful response becomes
    /// the session's baseline (our own write is not a conflict) and the flag
    /// is cleared: the update's own emission was withheld, so edit-stop must
    /// flush.
    pub fn update_settled(&self, requested: &Task, stored: Option<&Task>) {
        let mut state = self.state.lock();
        let EditState::Editing(session) = &mut *state else {
            return;
        };
        if session.task.id != requested.id {
            return;
        }
        if let Some(stored) = stored {
            session.task = stored.clone();
        }
        session.local_update_sent = false;
        let conflict = self
            .tasks
            .latest()
            .and_then(|snapshot| find_conflict(&snapshot, &session.task));
        self.set_conflict(conflict);
    }

    /// Stops editing.
    ///
    /// Without a local update in flight, the cache is re-published so
    /// updates withheld during the edit reach the view. Otherwise that
    /// update's own emission will do it. No-op when idle.
    pub fn end_edit(&self) {
        let previous = {
            let mut state = self.state.lock();
            let previous = std::mem::take(&mut *state);
            self.set_conflict(None);
            previous
        };
        let EditState::Editing(session) = previous else {
            return;
        };
        tracing::debug!(
            task_id = ?session.task.id,
            local_update_sent = session.local_update_sent,
            "edit stopped"
        );
        if !session.local_update_sent {
            self.tasks.force_send_updates();
        }
    }

    /// Whether `id` is the row being edited.
    #[must_use]
    pub fn is_editing_task(&self, id: TaskId) -> bool {
        matches!(&*self.state.lock(), EditState::Editing(s) if s.task.id == Some(id))
    }

    fn set_conflict(&self, conflict: Option<Task>) {
        if self.conflict.latest().flatten() != conflict {
            if let Some(task) = &conflict {
                tracing::info!(task_id = ?task.id, "edited task changed on the server");
            }
            self.conflict.publish(conflict);
        }
    }
}
