//! Handler identifiers, the handler trait and handler results.

use std::fmt;
use std::str::FromStr;

use axum::http::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::dispatch::context::{Collaborators, RequestContext};
use crate::dispatch::registry::RegistryError;
use crate::response::Payload;
use crate::routing::matcher::Params;

/// Stable identifier of a handler: a controller and one of its actions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandlerId {
    pub controller: String,
    pub action: String,
}

impl HandlerId {
    pub fn new(controller: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            controller: controller.into(),
            action: action.into(),
        }
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.controller, self.action)
    }
}

/// Parses the `Controller@action` form.
impl FromStr for HandlerId {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('@') {
            Some((controller, action))
                if !controller.is_empty() && !action.is_empty() && !action.contains('@') =>
            {
                Ok(Self::new(controller, action))
            }
            _ => Err(RegistryError::InvalidHandlerId(s.to_string())),
        }
    }
}

/// Failure raised by a handler. Forwarded untouched to the response formatter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HandlerError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
}

impl HandlerError {
    pub fn status(&self) -> StatusCode {
        match self {
            HandlerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            HandlerError::Forbidden(_) => StatusCode::FORBIDDEN,
            HandlerError::NotFound(_) => StatusCode::NOT_FOUND,
            HandlerError::Conflict(_) => StatusCode::CONFLICT,
            HandlerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Successful handler output.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResponse {
    pub status: StatusCode,
    pub message: Option<String>,
    pub payload: Payload,
}

impl HandlerResponse {
    pub fn ok(payload: Payload) -> Self {
        Self {
            status: StatusCode::OK,
            message: None,
            payload,
        }
    }

    pub fn list(items: Vec<Value>) -> Self {
        Self::ok(Payload::List(items))
    }

    pub fn item(value: Value) -> Self {
        Self::ok(Payload::Item(value))
    }

    pub fn created(value: Value) -> Self {
        Self::item(value).with_status(StatusCode::CREATED)
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// A callable bound to a [`HandlerId`].
pub trait Handler: Send + Sync {
    fn call(
        &self,
        ctx: &RequestContext,
        params: &Params,
        collaborators: &Collaborators,
    ) -> Result<HandlerResponse, HandlerError>;
}

impl<F> Handler for F
where
    F: Fn(&RequestContext, &Params, &Collaborators) -> Result<HandlerResponse, HandlerError>
        + Send
        + Sync,
{
    fn call(
        &self,
        ctx: &RequestContext,
        params: &Params,
        collaborators: &Collaborators,
    ) -> Result<HandlerResponse, HandlerError> {
        self(ctx, params, collaborators)
    }
}
