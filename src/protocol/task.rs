//! Task types and lifecycle management

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    error::{A2AError, A2AResult},
    Artifact,
};

/// A unit of delegated work
///
/// Tasks are created by the initiating agent in the `pending` state and then mutated only
/// by the agent they are assigned to. Every mutation bumps `updated_at`; status changes
/// additionally stamp `status_updated_at`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// Unique identifier for the task
    pub task_id: String,

    /// Task this one was spawned from, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_task_id: Option<String>,

    /// Agent performing the task
    pub assigned_to_agent_id: String,

    /// Agent that created the task and receives its status updates
    pub initiator_agent_id: String,

    /// What the assigned agent is asked to do
    pub description: String,

    /// Current lifecycle status
    #[serde(default)]
    pub status: TaskStatus,

    /// Artifacts handed to the assigned agent
    #[serde(default)]
    pub input_artifacts: Vec<Artifact>,

    /// Artifacts produced by the assigned agent
    #[serde(default)]
    pub output_artifacts: Vec<Artifact>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last mutated
    pub updated_at: DateTime<Utc>,

    /// When the status last changed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_updated_at: Option<DateTime<Utc>>,

    /// Reason for a failed or cancelled task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl Task {
    /// Create a new pending task
    pub fn new(
        task_id: impl Into<String>,
        description: impl Into<String>,
        initiator_agent_id: impl Into<String>,
        assigned_to_agent_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            task_id: task_id.into(),
            parent_task_id: None,
            assigned_to_agent_id: assigned_to_agent_id.into(),
            initiator_agent_id: initiator_agent_id.into(),
            description: description.into(),
            status: TaskStatus::Pending,
            input_artifacts: Vec::new(),
            output_artifacts: Vec::new(),
            created_at: now,
            updated_at: now,
            status_updated_at: None,
            error_message: None,
        }
    }

    /// Set the parent task
    pub fn with_parent(mut self, parent_task_id: impl Into<String>) -> Self {
        self.parent_task_id = Some(parent_task_id.into());
        self
    }

    /// Set the input artifacts
    pub fn with_inputs(mut self, input_artifacts: Vec<Artifact>) -> Self {
        self.input_artifacts = input_artifacts;
        self
    }

    /// Check if the task is in a terminal state
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Move the task to `status`
    ///
    /// Fails with [`A2AError::InvalidTransition`] and leaves the task untouched if the
    /// state machine forbids the change.
    pub fn transition(&mut self, status: TaskStatus) -> A2AResult<()> {
        if !self.status.can_transition_to(status) {
            return Err(A2AError::InvalidTransition {
                task_id: self.task_id.clone(),
                from: self.status,
                to: status,
            });
        }

        let now = Utc::now();
        self.status = status;
        self.updated_at = now;
        self.status_updated_at = Some(now);
        Ok(())
    }

    /// Move the task to a terminal failure state with a reason
    pub fn fail(&mut self, status: TaskStatus, error_message: impl Into<String>) -> A2AResult<()> {
        self.transition(status)?;
        self.error_message = Some(error_message.into());
        Ok(())
    }

    /// Append an output artifact
    pub fn push_output(&mut self, artifact: Artifact) {
        self.output_artifacts.push(artifact);
        self.updated_at = Utc::now();
    }

    /// First output artifact, the one downstream steps consume
    pub fn primary_output(&self) -> Option<&Artifact> {
        self.output_artifacts.first()
    }

    /// Merge a status report from the assigned agent into this record
    ///
    /// Outputs and error message are taken from the report when it carries them. A report
    /// that would move the status backwards is rejected.
    pub fn apply_update(&mut self, update: &StatusUpdate) -> A2AResult<()> {
        if update.status != self.status {
            self.transition(update.status)?;
        }
        if let Some(at) = update.status_updated_at {
            self.status_updated_at = Some(at);
        }
        if !update.output_artifacts.is_empty() {
            self.output_artifacts = update.output_artifacts.clone();
        }
        if update.error_message.is_some() {
            self.error_message = update.error_message.clone();
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Task status
///
/// Task lifecycle: pending → in_progress → completed/failed/cancelled.
/// `pending` may also jump straight to a terminal state; nothing ever returns to `pending`.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task has been created but not picked up
    #[default]
    Pending,

    /// Task is currently being processed
    InProgress,

    /// Task completed successfully
    Completed,

    /// Task failed with an error
    Failed,

    /// Task was abandoned
    Cancelled,
}

impl TaskStatus {
    /// Check if this is a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }

    /// Whether the state machine allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        match self {
            TaskStatus::Pending => next != TaskStatus::Pending,
            TaskStatus::InProgress => next.is_terminal(),
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled => false,
        }
    }

    /// Wire name of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a `task_status_update` message
///
/// Only `task_id` and `status` are required on the wire, so a full serialized [`Task`]
/// also decodes as a status update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusUpdate {
    pub task_id: String,

    pub status: TaskStatus,

    #[serde(default)]
    pub output_artifacts: Vec<Artifact>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_updated_at: Option<DateTime<Utc>>,

    /// Free-form note for logs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusUpdate {
    /// Create a bare status report
    pub fn new(task_id: impl Into<String>, status: TaskStatus) -> Self {
        Self {
            task_id: task_id.into(),
            status,
            output_artifacts: Vec::new(),
            error_message: None,
            status_updated_at: None,
            message: None,
        }
    }

    /// Attach an output artifact
    pub fn with_output(mut self, artifact: Artifact) -> Self {
        self.output_artifacts.push(artifact);
        self
    }

    /// Attach an error message
    pub fn with_error(mut self, error_message: impl Into<String>) -> Self {
        self.error_message = Some(error_message.into());
        self
    }
}

impl From<&Task> for StatusUpdate {
    fn from(task: &Task) -> Self {
        Self {
            task_id: task.task_id.clone(),
            status: task.status,
            output_artifacts: task.output_artifacts.clone(),
            error_message: task.error_message.clone(),
            status_updated_at: task.status_updated_at,
            message: Some(format!("Task {} is now {}", task.task_id, task.status)),
        }
    }
}
