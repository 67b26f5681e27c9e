//! JSON codec for agent message frames

use bytes::Bytes;

use crate::{
    codec::Codec,
    protocol::{error::A2AError, message::AgentMessage},
};

/// JSON codec: one message per frame, fields as on [`AgentMessage`]
#[derive(Debug, Clone, Default)]
pub struct JsonCodec;

impl JsonCodec {
    /// Create a new JSON codec
    pub fn new() -> Self {
        Self
    }
}

impl Codec for JsonCodec {
    fn encode_message(&self, message: &AgentMessage) -> Result<Bytes, A2AError> {
        let bytes = serde_json::to_vec(message)?;
        Ok(Bytes::from(bytes))
    }

    fn decode_message(&self, frame: &[u8]) -> Result<AgentMessage, A2AError> {
        if frame.is_empty() {
            return Err(A2AError::Validation("Empty message frame".into()));
        }

        Ok(serde_json::from_slice(frame)?)
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }
}
