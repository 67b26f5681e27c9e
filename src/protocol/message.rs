//! Agent message envelope and typed payloads

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{ser::SerializeStruct, Deserialize, Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

use super::{
    error::A2AError,
    task::{StatusUpdate, Task},
    Artifact,
};

/// A message exchanged between agents
///
/// On the wire this is a flat object with `message_id`, `sender_agent_id`,
/// `receiver_agent_id`, `timestamp`, `message_type` and `payload`. The payload is decoded
/// into the variant selected by `message_type` once, when the message is deserialized;
/// unknown message types and payloads that do not fit their type are rejected there.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "WireMessage")]
pub struct AgentMessage {
    /// Unique message identifier
    pub message_id: String,

    /// Agent that sent the message
    pub sender_agent_id: String,

    /// Agent the message is addressed to
    pub receiver_agent_id: String,

    /// When the message was created
    pub timestamp: DateTime<Utc>,

    /// Typed message content
    pub payload: MessagePayload,
}

impl AgentMessage {
    /// Create a message with a fresh id and the current timestamp
    pub fn new(
        sender_agent_id: impl Into<String>,
        receiver_agent_id: impl Into<String>,
        payload: MessagePayload,
    ) -> Self {
        Self {
            message_id: Uuid::now_v7().to_string(),
            sender_agent_id: sender_agent_id.into(),
            receiver_agent_id: receiver_agent_id.into(),
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Kind of this message
    pub fn message_type(&self) -> MessageType {
        self.payload.message_type()
    }

    /// Task this message concerns, if any
    pub fn task_id(&self) -> Option<&str> {
        match &self.payload {
            MessagePayload::TaskAssignment(task) => Some(&task.task_id),
            MessagePayload::TaskStatusUpdate(update) => Some(&update.task_id),
            MessagePayload::ArtifactDelivery(artifact) => Some(&artifact.task_id),
            MessagePayload::QueryCapability(_) => None,
            MessagePayload::Error(report) => report.task_id.as_deref(),
        }
    }

    /// Payload rendered for logs, cut to `max_len` characters
    pub fn payload_preview(&self, max_len: usize) -> String {
        let rendered = self.payload.to_value().to_string();
        if rendered.chars().count() > max_len {
            let cut: String = rendered.chars().take(max_len).collect();
            format!("{}... (truncated)", cut)
        } else {
            rendered
        }
    }
}

impl Serialize for AgentMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("AgentMessage", 6)?;
        state.serialize_field("message_id", &self.message_id)?;
        state.serialize_field("sender_agent_id", &self.sender_agent_id)?;
        state.serialize_field("receiver_agent_id", &self.receiver_agent_id)?;
        state.serialize_field("timestamp", &self.timestamp)?;
        state.serialize_field("message_type", &self.message_type())?;
        match &self.payload {
            MessagePayload::TaskAssignment(task) => state.serialize_field("payload", task)?,
            MessagePayload::TaskStatusUpdate(update) => {
                state.serialize_field("payload", update)?
            }
            MessagePayload::ArtifactDelivery(artifact) => {
                state.serialize_field("payload", artifact)?
            }
            MessagePayload::QueryCapability(query) => state.serialize_field("payload", query)?,
            MessagePayload::Error(report) => state.serialize_field("payload", report)?,
        }
        state.end()
    }
}

/// Closed set of message kinds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    TaskAssignment,
    TaskStatusUpdate,
    ArtifactDelivery,
    QueryCapability,
    Error,
}

impl MessageType {
    /// Wire name of the message type
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::TaskAssignment => "task_assignment",
            MessageType::TaskStatusUpdate => "task_status_update",
            MessageType::ArtifactDelivery => "artifact_delivery",
            MessageType::QueryCapability => "query_capability",
            MessageType::Error => "error",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed message content, one variant per [`MessageType`]
#[derive(Debug, Clone, PartialEq)]
pub enum MessagePayload {
    /// A task handed to the receiver
    TaskAssignment(Task),

    /// Progress or outcome of a task the receiver initiated
    TaskStatusUpdate(StatusUpdate),

    /// An artifact pushed outside the task flow
    ArtifactDelivery(Artifact),

    /// Asks which agents offer a skill
    QueryCapability(CapabilityQuery),

    /// An error report, optionally tied to a task
    Error(ErrorReport),
}

impl MessagePayload {
    /// Kind of this payload
    pub fn message_type(&self) -> MessageType {
        match self {
            MessagePayload::TaskAssignment(_) => MessageType::TaskAssignment,
            MessagePayload::TaskStatusUpdate(_) => MessageType::TaskStatusUpdate,
            MessagePayload::ArtifactDelivery(_) => MessageType::ArtifactDelivery,
            MessagePayload::QueryCapability(_) => MessageType::QueryCapability,
            MessagePayload::Error(_) => MessageType::Error,
        }
    }

    /// Decode a raw payload for the given message type
    pub fn decode(message_type: MessageType, payload: Value) -> Result<Self, serde_json::Error> {
        Ok(match message_type {
            MessageType::TaskAssignment => Self::TaskAssignment(serde_json::from_value(payload)?),
            MessageType::TaskStatusUpdate => {
                Self::TaskStatusUpdate(serde_json::from_value(payload)?)
            }
            MessageType::ArtifactDelivery => {
                Self::ArtifactDelivery(serde_json::from_value(payload)?)
            }
            MessageType::QueryCapability => Self::QueryCapability(serde_json::from_value(payload)?),
            MessageType::Error => Self::Error(serde_json::from_value(payload)?),
        })
    }

    fn to_value(&self) -> Value {
        let value = match self {
            MessagePayload::TaskAssignment(task) => serde_json::to_value(task),
            MessagePayload::TaskStatusUpdate(update) => serde_json::to_value(update),
            MessagePayload::ArtifactDelivery(artifact) => serde_json::to_value(artifact),
            MessagePayload::QueryCapability(query) => serde_json::to_value(query),
            MessagePayload::Error(report) => serde_json::to_value(report),
        };
        value.unwrap_or(Value::Null)
    }
}

/// Payload of a `query_capability` message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CapabilityQuery {
    pub skill_name: String,
}

/// Payload of an `error` message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorReport {
    /// Human-readable error message
    pub message: String,

    /// Task the error belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

impl ErrorReport {
    /// Create an error report not tied to a task
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            task_id: None,
        }
    }

    /// Tie the report to a task
    pub fn for_task(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }
}

/// Untyped wire form of [`AgentMessage`]
#[derive(Debug, Deserialize)]
struct WireMessage {
    message_id: String,
    sender_agent_id: String,
    receiver_agent_id: String,
    timestamp: DateTime<Utc>,
    message_type: MessageType,
    payload: Value,
}

impl TryFrom<WireMessage> for AgentMessage {
    type Error = A2AError;

    fn try_from(wire: WireMessage) -> Result<Self, Self::Error> {
        let payload = MessagePayload::decode(wire.message_type, wire.payload).map_err(|e| {
            A2AError::Validation(format!(
                "Invalid {} payload in message {}: {}",
                wire.message_type, wire.message_id, e
            ))
        })?;

        Ok(Self {
            message_id: wire.message_id,
            sender_agent_id: wire.sender_agent_id,
            receiver_agent_id: wire.receiver_agent_id,
            timestamp: wire.timestamp,
            payload,
        })
    }
}
