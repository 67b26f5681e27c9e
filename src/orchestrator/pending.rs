//! In-flight task records and their single-use result handles

use std::collections::HashMap;

use tokio::sync::{oneshot, Mutex};

use crate::protocol::{
    error::A2AError,
    task::{StatusUpdate, Task, TaskStatus},
};

/// What [`TaskTable::resolve`] did with a status report
#[derive(Debug)]
pub(crate) enum Resolution {
    /// Terminal report handed to the waiting caller
    Resolved,

    /// Non-terminal report merged into the in-flight record
    Progressed,

    /// No caller is waiting on this task
    Untracked,

    /// Report does not fit the in-flight record and was discarded
    Rejected(A2AError),
}

#[derive(Default)]
struct Tables {
    in_flight: HashMap<String, Task>,
    callbacks: HashMap<String, oneshot::Sender<StatusUpdate>>,
}

/// In-flight and callback tables behind one lock
///
/// A callback is removed from the table before it is written to, so at most one terminal
/// report is ever delivered per task; later ones find nothing and are `Untracked`.
#[derive(Default)]
pub(crate) struct TaskTable {
    tables: Mutex<Tables>,
}

impl TaskTable {
    /// Record a task and hand back the receiver its terminal report will arrive on
    pub(crate) async fn track(&self, task: Task) -> oneshot::Receiver<StatusUpdate> {
        let (tx, rx) = oneshot::channel();
        let mut tables = self.tables.lock().await;
        tables.callbacks.insert(task.task_id.clone(), tx);
        tables.in_flight.insert(task.task_id.clone(), task);
        rx
    }

    /// Apply a status report from a worker
    pub(crate) async fn resolve(&self, update: StatusUpdate) -> Resolution {
        let mut tables = self.tables.lock().await;

        if update.status.is_terminal() {
            return match tables.callbacks.remove(&update.task_id) {
                // A closed receiver means the waiter already gave up; that is still a no-op
                Some(tx) => {
                    let _ = tx.send(update);
                    Resolution::Resolved
                }
                None => Resolution::Untracked,
            };
        }

        if !tables.callbacks.contains_key(&update.task_id) {
            return Resolution::Untracked;
        }
        match tables.in_flight.get_mut(&update.task_id) {
            Some(task) => match task.apply_update(&update) {
                Ok(()) => Resolution::Progressed,
                Err(e) => Resolution::Rejected(e),
            },
            None => Resolution::Untracked,
        }
    }

    /// Remove a task and merge its terminal report into the record
    pub(crate) async fn settle(&self, task_id: &str, update: &StatusUpdate) -> Option<Task> {
        let mut task = self.remove(task_id).await?;
        if let Err(e) = task.apply_update(update) {
            let reason = format!("Task {} received an inconsistent final status: {}", task_id, e);
            let _ = task.fail(TaskStatus::Failed, reason);
        }
        Some(task)
    }

    /// Remove a task and mark it failed with `reason`
    ///
    /// Returns `None` if the task is no longer tracked, so calling it twice is harmless.
    pub(crate) async fn expire(&self, task_id: &str, reason: impl Into<String>) -> Option<Task> {
        let mut task = self.remove(task_id).await?;
        let _ = task.fail(TaskStatus::Failed, reason);
        Some(task)
    }

    async fn remove(&self, task_id: &str) -> Option<Task> {
        let mut tables = self.tables.lock().await;
        tables.callbacks.remove(task_id);
        tables.in_flight.remove(task_id)
    }

    pub(crate) async fn in_flight_len(&self) -> usize {
        self.tables.lock().await.in_flight.len()
    }

    pub(crate) async fn pending_len(&self) -> usize {
        self.tables.lock().await.callbacks.len()
    }
}
