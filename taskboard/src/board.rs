//! The task board view model.
//!
//! [`TaskBoard`] is what a grid binds to. It owns the [`EditController`] and
//! the background task that feeds it from the task stream, maps the grid's
//! events (create, edit start, cell value changed, edit stop, delete) onto
//! the services, and tracks whether a save is in flight.
//!
//! Dropping the board, or calling [`TaskBoard::shutdown`], releases its
//! subscription and background task.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use taskboard_proto::task::Task;

use crate::api::TaskApi;
use crate::edit::EditController;
use crate::feed::Subscription;
use crate::poll::Poller;
use crate::tasks::{TaskError, TaskService};

/// Decrements the in-flight counter when a request finishes.
struct Saving(Arc<AtomicUsize>);

impl Saving {
    fn start(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for Saving {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// View model binding the task stream to an editable grid.
pub struct TaskBoard<A: TaskApi> {
    tasks: Arc<TaskService<A>>,
    edit: Arc<EditController<A>>,
    in_flight: Arc<AtomicUsize>,
    forwarder: Mutex<Option<Poller>>,
}

impl<A: TaskApi> TaskBoard<A> {
    /// Creates a board and starts feeding it from `tasks`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn new(tasks: Arc<TaskService<A>>) -> Self {
        let edit = Arc::new(EditController::new(Arc::clone(&tasks)));
        let source = tasks.tasks();
        let forwarder = Poller::spawn("board", forward(source, Arc::clone(&edit)));
        Self {
            tasks,
            edit,
            in_flight: Arc::new(AtomicUsize::new(0)),
            forwarder: Mutex::new(Some(forwarder)),
        }
    }

    /// Rows to display; frozen while a row is being edited.
    #[must_use]
    pub fn rows(&self) -> Subscription<Vec<Task>> {
        self.edit.visible()
    }

    /// The "edited task has changes" signal.
    #[must_use]
    pub fn conflicts(&self) -> Subscription<Option<Task>> {
        self.edit.conflicts()
    }

    /// The edit controller, for views that drive it directly.
    #[must_use]
    pub const fn editor(&self) -> &Arc<EditController<A>> {
        &self.edit
    }

    /// The task service behind this board.
    #[must_use]
    pub const fn service(&self) -> &Arc<TaskService<A>> {
        &self.tasks
    }

    /// Whether any create/update/delete request is in flight.
    #[must_use]
    pub fn saving(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Creates a task.
    ///
    /// # Errors
    ///
    /// Propagates [`TaskError`] from the service.
    pub async fn create(&self, task: &Task) -> Result<Task, TaskError> {
        let _saving = Saving::start(&self.in_flight);
        self.tasks.create(task).await.inspect_err(|e| {
            tracing::warn!(error = %e, "create failed");
        })
    }

    /// Grid event: a cell went into edit mode on `task`'s row.
    pub fn begin_edit(&self, task: Task) {
        self.edit.begin_edit(task);
    }

    /// Grid event: a cell value changed; saves the row.
    ///
    /// # Errors
    ///
    /// Propagates [`TaskError`] from the service.
    pub async fn cell_value_changed(&self, task: &Task) -> Result<Task, TaskError> {
        let _saving = Saving::start(&self.in_flight);
        self.edit.mark_update_sent();
        let result = self.tasks.update(task).await;
        match &result {
            Ok(stored) => self.edit.update_settled(task, Some(stored)),
            Err(e) => {
                tracing::warn!(error = %e, task_id = ?task.id, "update failed");
                self.edit.update_settled(task, None);
            }
        }
        result
    }

    /// Grid event: editing stopped.
    pub fn end_edit(&self) {
        self.edit.end_edit();
    }

    /// Deletes a task.
    ///
    /// # Errors
    ///
    /// Propagates [`TaskError`] from the service.
    pub async fn delete(&self, task: &Task) -> Result<(), TaskError> {
        let _saving = Saving::start(&self.in_flight);
        self.tasks.delete(task).await.inspect_err(|e| {
            tracing::warn!(error = %e, task_id = ?task.id, "delete failed");
        })
    }

    /// Stops forwarding task updates to this board.
    pub fn shutdown(&self) {
        if let Some(forwarder) = self.forwarder.lock().take() {
            forwarder.stop();
        }
    }

    /// Whether the board is still receiving task updates.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.forwarder.lock().as_ref().is_some_and(Poller::is_running)
    }
}

async fn forward<A: TaskApi>(mut source: Subscription<Vec<Task>>, edit: Arc<EditController<A>>) {
    while let Some(tasks) = source.recv().await {
        edit.observe(tasks);
    }
    tracing::debug!("task stream closed, board forwarder exiting");
}
