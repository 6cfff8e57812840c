//! Inbound request adaptation.
//!
//! # Responsibilities
//! - Read the request id set by the request-id layer
//! - Buffer the body under the configured size limit
//! - Turn an axum request into a pipeline [`InboundRequest`]
//!
//! # Design Decisions
//! - The body is never decoded here; an oversized or malformed body is judged
//!   by the pipeline after the security gate, so gate rejections win

use std::net::IpAddr;

use axum::body::Body;
use axum::http::{HeaderMap, Request};

use crate::pipeline::{InboundRequest, RawBody};

pub const X_REQUEST_ID: &str = "x-request-id";

/// The id assigned by the request-id layer, if any.
pub fn request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Convert an axum request into the pipeline's request type.
pub async fn into_inbound(request: Request<Body>, client_ip: IpAddr, max_body_size: usize) -> InboundRequest {
    let (parts, body) = request.into_parts();

    let body = match axum::body::to_bytes(body, max_body_size).await {
        Ok(bytes) if bytes.is_empty() => RawBody::Empty,
        Ok(bytes) => RawBody::Bytes(bytes),
        Err(e) => {
            tracing::debug!(client = %client_ip, error = %e, "Request body not buffered");
            RawBody::TooLarge { limit: max_body_size }
        }
    };

    let mut inbound = InboundRequest::new(parts.method, parts.uri.path())
        .with_headers(parts.headers)
        .with_client_ip(client_ip)
        .with_raw_body(body);
    if let Some(id) = request_id(&inbound.headers) {
        inbound = inbound.with_request_id(id);
    }
    if let Some(query) = parts.uri.query() {
        inbound = inbound.with_query_string(query);
    }
    inbound
}
