//! Outbound response rendering.
//!
//! # Responsibilities
//! - Write a [`PipelineResponse`] as an axum response
//! - Render failures that happen outside the pipeline as error envelopes
//!
//! # Design Decisions
//! - JSON bodies always carry `Content-Type: application/json`
//! - The preflight response has no body and no content type

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::pipeline::PipelineResponse;
use crate::response::Envelope;

impl IntoResponse for PipelineResponse {
    fn into_response(self) -> Response {
        let mut response = match self.body {
            Some(body) => {
                let mut response = Response::new(Body::from(body.to_string()));
                response.headers_mut().insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                );
                response
            }
            None => Response::new(Body::empty()),
        };
        *response.status_mut() = self.status;
        response.headers_mut().extend(self.headers);
        response
    }
}

/// Error envelope for a request that never reached the pipeline.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = Envelope::error(message).to_value();
    PipelineResponse {
        status,
        headers: Default::default(),
        body: Some(body),
    }
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;
    use serde_json::json;

    #[test]
    fn test_preflight_is_bodyless() {
        let mut headers = HeaderMap::new();
        headers.insert(header::VARY, HeaderValue::from_static("Origin"));
        let response = PipelineResponse {
            status: StatusCode::OK,
            headers,
            body: None,
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::VARY], "Origin");
        assert!(!response.headers().contains_key(header::CONTENT_TYPE));
    }

    #[test]
    fn test_json_body_has_content_type() {
        let response = PipelineResponse {
            status: StatusCode::NOT_FOUND,
            headers: HeaderMap::new(),
            body: Some(json!({"status": "error"})),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    }
}
