//! CORS and hardening response headers.
//!
//! # Responsibilities
//! - Build the fixed hardening set (caching, sniffing, framing, HSTS,
//!   permissions and referrer policy)
//! - Echo an authorized origin with the CORS allow-* headers
//!
//! # Design Decisions
//! - Header values are rendered once when the gate is built
//! - Config values that are not valid header text are dropped with a warning

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method};

use crate::config::SecurityConfig;

pub const PERMISSIONS_POLICY: HeaderName = HeaderName::from_static("permissions-policy");

/// Pre-rendered header values.
#[derive(Debug, Clone)]
pub struct HeaderPolicy {
    allow_methods: HeaderValue,
    allow_headers: Option<HeaderValue>,
    max_age: HeaderValue,
    hsts: HeaderValue,
}

impl HeaderPolicy {
    pub fn new(config: &SecurityConfig, methods: &[Method]) -> Self {
        let joined = methods.iter().map(Method::as_str).collect::<Vec<_>>().join(", ");
        let allow_methods = HeaderValue::from_str(&joined).unwrap_or(HeaderValue::from_static("GET"));

        let allow_headers = match HeaderValue::from_str(&config.allowed_headers.join(", ")) {
            Ok(v) if !config.allowed_headers.is_empty() => Some(v),
            Ok(_) => None,
            Err(_) => {
                tracing::warn!(headers = ?config.allowed_headers, "Ignoring invalid security.allowed_headers");
                None
            }
        };

        Self {
            allow_methods,
            allow_headers,
            max_age: HeaderValue::from(config.preflight_max_age_secs),
            hsts: HeaderValue::from_str(&format!(
                "max-age={}; includeSubDomains",
                config.hsts_max_age_secs
            ))
            .unwrap_or(HeaderValue::from_static("max-age=31536000; includeSubDomains")),
        }
    }

    pub fn allow_methods(&self) -> &HeaderValue {
        &self.allow_methods
    }

    /// Caching, sniffing, framing, transport and policy headers.
    pub fn apply_hardening(&self, headers: &mut HeaderMap) {
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, no-cache, must-revalidate, max-age=0"),
        );
        headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
        headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
        headers.insert(header::STRICT_TRANSPORT_SECURITY, self.hsts.clone());
        headers.insert(
            PERMISSIONS_POLICY,
            HeaderValue::from_static("geolocation=(), microphone=(), camera=(), payment=()"),
        );
        headers.insert(header::REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    }

    /// CORS headers echoing `origin`.
    pub fn apply_cors(&self, headers: &mut HeaderMap, origin: &HeaderValue) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
        headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, self.allow_methods.clone());
        if let Some(allow_headers) = &self.allow_headers {
            headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, allow_headers.clone());
        }
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
        headers.insert(header::ACCESS_CONTROL_MAX_AGE, self.max_age.clone());
        headers.insert(header::VARY, HeaderValue::from_static("Origin"));
    }
}
