//! Response formatting.
//!
//! # Responsibilities
//! - Cap list payloads at the configured item limit before serialization
//! - Production: emit the capped envelope with the given status and finish
//! - Development: emit layered diagnostic views under a fixed status and
//!   leave the body open for devmode introspection
//!
//! # Design Decisions
//! - The cap is a hard limit, not a pagination hint
//! - A terminal body rejects further sections

use axum::http::StatusCode;
use serde_json::{json, Map, Value};

use crate::config::{ResponseConfig, RunMode};
use crate::error::GatewayError;
use crate::response::envelope::{Envelope, Payload};

/// Output of the formatter.
#[derive(Debug, Clone, PartialEq)]
pub struct Formatted {
    pub status: StatusCode,
    pub body: Value,
    /// No further output may be added for this request.
    pub terminal: bool,
}

impl Formatted {
    /// Append a top-level section. Ignored (returns false) once terminal.
    pub fn append(&mut self, key: &str, value: Value) -> bool {
        if self.terminal {
            return false;
        }
        match &mut self.body {
            Value::Object(map) => {
                map.insert(key.to_string(), value);
                true
            }
            _ => false,
        }
    }

    pub fn finish(mut self) -> Self {
        self.terminal = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct ResponseFormatter {
    mode: RunMode,
    item_limit: usize,
    diagnostic_status: StatusCode,
}

impl ResponseFormatter {
    pub fn new(mode: RunMode, config: &ResponseConfig) -> Self {
        Self {
            mode,
            item_limit: config.item_limit,
            diagnostic_status: StatusCode::from_u16(config.diagnostic_status)
                .unwrap_or(StatusCode::FORBIDDEN),
        }
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    pub fn item_limit(&self) -> usize {
        self.item_limit
    }

    /// Render `envelope` with at most `item_limit` list entries.
    pub fn format(&self, envelope: &Envelope, status: StatusCode, item_limit: usize) -> Formatted {
        let capped = Envelope {
            payload: envelope.payload.capped(item_limit),
            ..envelope.clone()
        };

        match self.mode {
            RunMode::Production => Formatted {
                status,
                body: capped.to_value(),
                terminal: true,
            },
            RunMode::Development => {
                let raw = match &envelope.payload {
                    Payload::List(items) if items.len() > item_limit => {
                        Value::Array(items[..item_limit].to_vec())
                    }
                    payload => payload.to_value(),
                };
                let encoded = serde_json::to_string(&capped).unwrap_or_default();

                let mut body = Map::new();
                body.insert("summary".into(), capped.to_value());
                body.insert("raw".into(), raw);
                body.insert("encoded".into(), Value::String(encoded));
                body.insert("original_status".into(), json!(status.as_u16()));

                Formatted {
                    status: self.diagnostic_status,
                    body: Value::Object(body),
                    terminal: false,
                }
            }
        }
    }

    /// Render with the configured item limit.
    pub fn format_default(&self, envelope: &Envelope, status: StatusCode) -> Formatted {
        self.format(envelope, status, self.item_limit)
    }

    /// Error envelope for a failed request.
    pub fn format_error(&self, err: &GatewayError) -> Formatted {
        self.format_default(&Envelope::error(err.to_string()), err.status())
    }
}
