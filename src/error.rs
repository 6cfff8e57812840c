//! Pipeline error taxonomy.
//!
//! Gates fail fast and terminate the request; the router never interprets
//! handler failures beyond forwarding them to the response formatter.

use axum::http::{Method, StatusCode};
use thiserror::Error;

use crate::dispatch::{HandlerError, HandlerId};

/// Every way a request can end without a successful handler response.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Environment, referer, IP or origin mismatch.
    #[error("{0}")]
    GateRejection(String),

    #[error("Method {0} is not allowed")]
    MethodNotAllowed(Method),

    /// Fatal for this request; the caller may retry after the window elapses.
    #[error("Too many requests; retry in {retry_after_secs} seconds")]
    RateLimitExceeded { retry_after_secs: u64 },

    /// Authentication was rejected and no anonymous route matched.
    #[error("{0}")]
    Unauthorized(String),

    #[error("No route matches {method} {path}")]
    NoRouteMatch { method: Method, path: String },

    #[error("Request body is not valid JSON: {0}")]
    InvalidBody(String),

    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error(transparent)]
    Handler(#[from] HandlerError),

    /// Only reachable if the registry was not verified against the router.
    #[error("Handler {0} is not registered")]
    UnresolvedHandler(HandlerId),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::GateRejection(_) => StatusCode::FORBIDDEN,
            GatewayError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            GatewayError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            GatewayError::NoRouteMatch { .. } => StatusCode::NOT_FOUND,
            GatewayError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            GatewayError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::Handler(e) => e.status(),
            GatewayError::UnresolvedHandler(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used for metrics and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            GatewayError::GateRejection(_) => "gate_rejection",
            GatewayError::MethodNotAllowed(_) => "method_not_allowed",
            GatewayError::RateLimitExceeded { .. } => "rate_limited",
            GatewayError::Unauthorized(_) => "unauthorized",
            GatewayError::NoRouteMatch { .. } => "no_route",
            GatewayError::InvalidBody(_) => "invalid_body",
            GatewayError::PayloadTooLarge { .. } => "payload_too_large",
            GatewayError::Handler(_) => "handler_failure",
            GatewayError::UnresolvedHandler(_) => "unresolved_handler",
        }
    }
}
