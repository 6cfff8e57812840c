//! Framework-independent snapshot of an inbound request.
//!
//! # Responsibilities
//! - Carry method, path, query, headers, client address and body into the pipeline
//! - Answer the header lookups the gates need (origin, referer, session)
//!
//! # Design Decisions
//! - Built once by the HTTP layer; the pipeline never touches axum types
//! - The query string is decoded eagerly (`application/x-www-form-urlencoded`)
//! - The body stays raw until the gates have passed

use std::collections::HashMap;
use std::net::IpAddr;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method};
use serde_json::Value;
use uuid::Uuid;

use crate::error::GatewayError;

pub const X_SESSION_ID: &str = "x-session-id";

/// Request body as read off the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RawBody {
    #[default]
    Empty,
    Bytes(Bytes),
    /// The transport stopped reading at `limit` bytes.
    TooLarge { limit: usize },
}

impl RawBody {
    /// Decode as JSON. Blank bodies decode to `None`.
    pub fn decode(&self) -> Result<Option<Value>, GatewayError> {
        match self {
            RawBody::Empty => Ok(None),
            RawBody::Bytes(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(None),
            RawBody::Bytes(bytes) => serde_json::from_slice(bytes)
                .map(Some)
                .map_err(|e| GatewayError::InvalidBody(e.to_string())),
            RawBody::TooLarge { limit } => Err(GatewayError::PayloadTooLarge { limit: *limit }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub request_id: String,
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
    pub client_ip: Option<IpAddr>,
    pub body: RawBody,
}

impl InboundRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            method,
            path: path.into(),
            query: HashMap::new(),
            headers: HeaderMap::new(),
            client_ip: None,
            body: RawBody::Empty,
        }
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = id.into();
        self
    }

    /// Decode and attach a raw query string (without the leading `?`).
    pub fn with_query_string(mut self, raw: &str) -> Self {
        self.query = parse_query(raw);
        self
    }

    /// Set a header, replacing earlier values; invalid names or values are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (HeaderName::try_from(name), HeaderValue::from_str(value)) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_client_ip(mut self, ip: IpAddr) -> Self {
        self.client_ip = Some(ip);
        self
    }

    /// Attach a JSON body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = RawBody::Bytes(Bytes::from(body.to_string()));
        self
    }

    pub fn with_raw_body(mut self, body: RawBody) -> Self {
        self.body = body;
        self
    }

    pub fn header(&self, name: impl header::AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn origin(&self) -> Option<&HeaderValue> {
        self.headers.get(header::ORIGIN)
    }

    pub fn referer(&self) -> Option<&str> {
        self.header(header::REFERER)
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v)
            .filter(|v| !v.is_empty())
    }

    /// Key for per-session state: session cookie, then `X-Session-Id`, then client IP.
    pub fn session_key(&self, cookie_name: &str) -> String {
        if let Some(sid) = self.cookie(cookie_name) {
            return format!("sid:{sid}");
        }
        if let Some(sid) = self.header(X_SESSION_ID).filter(|s| !s.is_empty()) {
            return format!("sid:{sid}");
        }
        match self.client_ip {
            Some(ip) => format!("ip:{ip}"),
            None => "anonymous".to_string(),
        }
    }
}

pub fn parse_query(raw: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(raw.as_bytes())
        .into_owned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_is_decoded() {
        let req = InboundRequest::new(Method::GET, "/").with_query_string("token=a%20b&page=2");
        assert_eq!(req.query["token"], "a b");
        assert_eq!(req.query["page"], "2");
    }

    #[test]
    fn test_session_key_precedence() {
        let ip: IpAddr = "10.0.0.9".parse().unwrap();
        let req = InboundRequest::new(Method::GET, "/").with_client_ip(ip);
        assert_eq!(req.session_key("session_id"), "ip:10.0.0.9");

        let req = req.with_header(X_SESSION_ID, "hdr");
        assert_eq!(req.session_key("session_id"), "sid:hdr");

        let req = req.with_header("cookie", "theme=dark; session_id=abc123");
        assert_eq!(req.session_key("session_id"), "sid:abc123");

        assert_eq!(InboundRequest::new(Method::GET, "/").session_key("s"), "anonymous");
    }

    #[test]
    fn test_body_decoding() {
        assert_eq!(RawBody::Empty.decode().unwrap(), None);
        assert_eq!(RawBody::Bytes(Bytes::from_static(b" \n")).decode().unwrap(), None);

        let req = InboundRequest::new(Method::POST, "/").with_body(serde_json::json!({"a": 1}));
        assert_eq!(req.body.decode().unwrap(), Some(serde_json::json!({"a": 1})));

        let err = RawBody::Bytes(Bytes::from_static(b"a=1&b=2")).decode().unwrap_err();
        assert!(matches!(err, GatewayError::InvalidBody(_)));

        let err = RawBody::TooLarge { limit: 16 }.decode().unwrap_err();
        assert!(matches!(err, GatewayError::PayloadTooLarge { limit: 16 }));
    }

    #[test]
    fn test_cookie_lookup_ignores_similar_names() {
        let req = InboundRequest::new(Method::GET, "/").with_header("cookie", "xsession_id=no; session_id=");
        assert_eq!(req.cookie("session_id"), None);
    }
}
