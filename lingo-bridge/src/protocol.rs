//! Envelope protocol carried over the channel.
//!
//! Wire format (bincode-encoded):
//! ```text
//! ┌──────┬─────────────────┬────────────────┬──────────────────┐
//! │ kind │ topic           │ correlation_id │ payload          │
//! │ 1 B  │ "<NAME>_IN/OUT" │ 16 bytes       │ JSON, variable   │
//! └──────┴─────────────────┴────────────────┴──────────────────┘
//! ```
//!
//! Requests travel on `"<NAME>_IN"`, every reply (response, fault, or
//! unhandled) on `"<NAME>_OUT"`. The correlation id of a reply is the id
//! of the request it answers.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const REQUEST_SUFFIX: &str = "_IN";
pub const RESPONSE_SUFFIX: &str = "_OUT";

pub fn request_topic(endpoint: &str) -> String {
    format!("{endpoint}{REQUEST_SUFFIX}")
}

pub fn response_topic(endpoint: &str) -> String {
    format!("{endpoint}{RESPONSE_SUFFIX}")
}

/// Envelope kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageKind {
    /// Call into a remote handler
    Request = 1,
    /// Handler output
    Response = 2,
    /// Handler failed; payload is a UTF-8 message
    Fault = 3,
    /// No handler registered for the endpoint
    Unhandled = 4,
}

impl MessageKind {
    fn suffix(self) -> &'static str {
        match self {
            MessageKind::Request => REQUEST_SUFFIX,
            _ => RESPONSE_SUFFIX,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Deserialization error: {0}")]
    DeserializationError(String),
    #[error("Topic '{topic}' does not fit a {kind:?} message")]
    InvalidTopic { kind: MessageKind, topic: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub kind: MessageKind,
    pub topic: String,
    pub correlation_id: Uuid,
    pub payload: Vec<u8>,
}

impl Envelope {
    pub fn request(endpoint: &str, correlation_id: Uuid, payload: Vec<u8>) -> Self {
        Self {
            kind: MessageKind::Request,
            topic: request_topic(endpoint),
            correlation_id,
            payload,
        }
    }

    pub fn response(endpoint: &str, correlation_id: Uuid, payload: Vec<u8>) -> Self {
        Self {
            kind: MessageKind::Response,
            topic: response_topic(endpoint),
            correlation_id,
            payload,
        }
    }

    pub fn fault(endpoint: &str, correlation_id: Uuid, message: &str) -> Self {
        Self {
            kind: MessageKind::Fault,
            topic: response_topic(endpoint),
            correlation_id,
            payload: message.as_bytes().to_vec(),
        }
    }

    pub fn unhandled(endpoint: &str, correlation_id: Uuid) -> Self {
        Self {
            kind: MessageKind::Unhandled,
            topic: response_topic(endpoint),
            correlation_id,
            payload: Vec::new(),
        }
    }

    /// Endpoint name with the topic suffix stripped.
    pub fn endpoint(&self) -> &str {
        self.topic
            .strip_suffix(self.kind.suffix())
            .unwrap_or(&self.topic)
    }

    pub fn fault_message(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }

    /// Serialize to binary wire format.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| ProtocolError::SerializationError(e.to_string()))
    }

    /// Deserialize from binary wire format, rejecting mismatched topics.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let (envelope, _): (Envelope, usize) =
            bincode::serde::decode_from_slice(bytes, bincode::config::standard())
                .map_err(|e| ProtocolError::DeserializationError(e.to_string()))?;
        let suffix = envelope.kind.suffix();
        if envelope.topic.len() <= suffix.len() || !envelope.topic.ends_with(suffix) {
            return Err(ProtocolError::InvalidTopic {
                kind: envelope.kind,
                topic: envelope.topic,
            });
        }
        Ok(envelope)
    }
}

/// Encode a typed payload as JSON.
pub fn encode_payload<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, ProtocolError> {
    serde_json::to_vec(value).map_err(|e| ProtocolError::SerializationError(e.to_string()))
}

/// Decode a typed JSON payload.
pub fn decode_payload<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    serde_json::from_slice(bytes).map_err(|e| ProtocolError::DeserializationError(e.to_string()))
}
