//! Core coordination protocol types and definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub mod agent;
pub mod error;
pub mod message;
pub mod task;

pub use agent::{AgentCapability, AgentCard};
pub use error::{A2AError, A2AResult, TaskError};
pub use message::{AgentMessage, CapabilityQuery, ErrorReport, MessagePayload, MessageType};
pub use task::{StatusUpdate, Task, TaskStatus};

/// Artifacts are the data products of tasks
///
/// An artifact is immutable once created: tasks carry it by value, and downstream steps
/// receive the same artifact as input rather than a modified copy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Artifact {
    /// Unique identifier of the Artifact
    pub artifact_id: String,

    /// Task that produced the Artifact
    pub task_id: String,

    /// Agent that produced the Artifact
    pub creator_agent_id: String,

    /// MIME type of `data` (e.g. "text/markdown", "application/json")
    pub content_type: String,

    /// Opaque payload
    pub data: Value,

    /// A human readable description of the Artifact
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// When the Artifact was created
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    /// Create a new artifact with a fresh id
    pub fn new(
        task_id: impl Into<String>,
        creator_agent_id: impl Into<String>,
        content_type: impl Into<String>,
        data: Value,
    ) -> Self {
        Self {
            artifact_id: Uuid::now_v7().to_string(),
            task_id: task_id.into(),
            creator_agent_id: creator_agent_id.into(),
            content_type: content_type.into(),
            data,
            description: None,
            created_at: Utc::now(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The payload as text, if it is a JSON string
    pub fn text(&self) -> Option<&str> {
        self.data.as_str()
    }
}
