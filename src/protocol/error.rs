//! Error types for agent coordination

use thiserror::Error;

use super::task::TaskStatus;

/// Main error type for message routing and task lifecycle operations
#[derive(Debug, Error)]
pub enum A2AError {
    /// Delivery failure (router gone, handler rejected the message, etc.)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Validation error (inconsistent message or task)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A status change that would break the task state machine
    #[error("Invalid transition for task {task_id}: {from} -> {to}")]
    InvalidTransition {
        task_id: String,
        from: TaskStatus,
        to: TaskStatus,
    },

    /// The agent has no outbound message handler installed
    #[error("Agent {agent_id} has no message handler configured")]
    NoMessageHandler { agent_id: String },

    /// No agent with this id is registered
    #[error("Agent not found: {agent_id}")]
    UnknownAgent { agent_id: String },
}

/// Result type alias for coordination operations
pub type A2AResult<T> = Result<T, A2AError>;

/// Outcome reported by a worker that could not finish its task
///
/// The message is surfaced verbatim as the task's `error_message`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    /// The work failed; the task ends in `failed`
    #[error("{0}")]
    Failed(String),

    /// The worker gave up on the task; the task ends in `cancelled`
    #[error("{0}")]
    Cancelled(String),
}

impl TaskError {
    /// Create a failure outcome
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Create a cancellation outcome
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::Cancelled(message.into())
    }

    /// Terminal status this outcome maps to
    pub fn status(&self) -> TaskStatus {
        match self {
            TaskError::Failed(_) => TaskStatus::Failed,
            TaskError::Cancelled(_) => TaskStatus::Cancelled,
        }
    }

    /// The human-readable message
    pub fn message(&self) -> &str {
        match self {
            TaskError::Failed(message) | TaskError::Cancelled(message) => message,
        }
    }
}
