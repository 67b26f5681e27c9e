//! Serialization codecs for agent message frames

pub mod json;

pub use json::JsonCodec;

use bytes::Bytes;

use crate::protocol::{error::A2AError, message::AgentMessage};

/// Codec trait for encoding and decoding agent messages
///
/// Decoding is the boundary where untyped input becomes a typed [`AgentMessage`]; a frame
/// that decodes is guaranteed to carry a payload matching its message type.
#[cfg_attr(test, mockall::automock)]
pub trait Codec: Send + Sync {
    /// Serialize a message to bytes
    ///
    /// # Arguments
    ///
    /// * `message` - The message to encode
    fn encode_message(&self, message: &AgentMessage) -> Result<Bytes, A2AError>;

    /// Deserialize a frame into a message
    ///
    /// # Arguments
    ///
    /// * `frame` - The raw frame bytes
    ///
    /// # Returns
    ///
    /// The decoded message, or an error for malformed frames, unknown message types and
    /// payloads that do not match their type
    fn decode_message(&self, frame: &[u8]) -> Result<AgentMessage, A2AError>;

    /// Get the content type for this codec
    fn content_type(&self) -> &'static str;
}
