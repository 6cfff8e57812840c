//! JSON response envelope.
//!
//! Every JSON body leaving the gateway has the shape
//! `{status, count?, message?, results | result}`.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

/// Result data produced by a handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// List-shaped data; always subject to the item cap.
    List(Vec<Value>),
    /// A single object or scalar.
    Item(Value),
    /// No result data.
    Empty,
}

impl Payload {
    /// Copy of the payload with lists truncated to `limit` entries.
    pub fn capped(&self, limit: usize) -> Payload {
        match self {
            Payload::List(items) => Payload::List(items.iter().take(limit).cloned().collect()),
            other => other.clone(),
        }
    }

    /// Number of entries for list payloads.
    pub fn count(&self) -> Option<usize> {
        match self {
            Payload::List(items) => Some(items.len()),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Payload::List(items) => Value::Array(items.clone()),
            Payload::Item(value) => value.clone(),
            Payload::Empty => Value::Null,
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => Payload::List(items),
            Value::Null => Payload::Empty,
            other => Payload::Item(other),
        }
    }
}

/// Envelope status field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStatus {
    Success,
    Error,
}

impl EnvelopeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvelopeStatus::Success => "success",
            EnvelopeStatus::Error => "error",
        }
    }
}

/// The response body shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub status: EnvelopeStatus,
    pub message: Option<String>,
    pub payload: Payload,
}

impl Envelope {
    pub fn success(payload: Payload, message: Option<String>) -> Self {
        Self {
            status: EnvelopeStatus::Success,
            message,
            payload,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: EnvelopeStatus::Error,
            message: Some(message.into()),
            payload: Payload::Empty,
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("status", self.status.as_str())?;
        if let Some(count) = self.payload.count() {
            map.serialize_entry("count", &count)?;
        }
        if let Some(message) = &self.message {
            map.serialize_entry("message", message)?;
        }
        match &self.payload {
            Payload::List(items) => map.serialize_entry("results", items)?,
            Payload::Item(value) => map.serialize_entry("result", value)?,
            Payload::Empty => {}
        }
        map.end()
    }
}
