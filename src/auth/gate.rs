//! Authentication gate.
//!
//! # Responsibilities
//! - Extract the caller's token (bearer header first, then query parameter)
//! - Resolve it against the credential store
//! - Produce exactly one verdict per request
//!
//! # Design Decisions
//! - Absent credentials are rejected, never treated as anonymous-but-allowed
//! - Every store failure maps to the same opaque message (no token oracle)
//! - The development override needs development mode plus both override
//!   flags; it is inert in production whatever the flags say

use std::collections::HashMap;

use axum::http::{header, HeaderMap};

use crate::auth::credentials::{CredentialStatus, CredentialStore};
use crate::auth::identity::{AuthVerdict, Identity};
use crate::config::{DevOverrideConfig, GatewayConfig, RunMode};
use crate::observability::metrics;

pub const NO_CREDENTIALS: &str = "No credentials provided";
pub const INVALID_CREDENTIALS: &str = "Invalid or expired credentials";

/// Flags injected into the gate at construction.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub mode: RunMode,
    pub dev_override: DevOverrideConfig,
    pub token_query_param: String,
}

impl AuthSettings {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            mode: config.mode,
            dev_override: config.auth.dev_override.clone(),
            token_query_param: config.auth.token_query_param.clone(),
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self::from_config(&GatewayConfig::default())
    }
}

/// Turns a token into a verdict.
#[derive(Debug, Clone)]
pub struct AuthGate {
    settings: AuthSettings,
}

impl AuthGate {
    pub fn new(settings: AuthSettings) -> Self {
        if settings.mode == RunMode::Production && settings.dev_override.enabled {
            tracing::warn!("Development auth override is configured but inert in production mode");
        }
        Self { settings }
    }

    /// True when the development override short-circuits authentication.
    pub fn dev_override_active(&self) -> bool {
        self.settings.mode == RunMode::Development
            && self.settings.dev_override.enabled
            && self.settings.dev_override.logged_in
    }

    /// Read the token from `Authorization: Bearer` or, failing that, the query.
    pub fn extract_token(&self, headers: &HeaderMap, query: &HashMap<String, String>) -> Option<String> {
        extract_token(headers, query, &self.settings.token_query_param)
    }

    pub fn authenticate(&self, token: Option<&str>, store: &dyn CredentialStore) -> AuthVerdict {
        let verdict = self.evaluate(token, store);
        metrics::record_auth_verdict(verdict.outcome());
        verdict
    }

    fn evaluate(&self, token: Option<&str>, store: &dyn CredentialStore) -> AuthVerdict {
        if self.dev_override_active() {
            let dev = &self.settings.dev_override;
            tracing::debug!(user_id = %dev.user_id, "Development auth override applied");
            return AuthVerdict::Authenticated(Identity::new(
                dev.user_id.clone(),
                "development",
                dev.permissions.clone(),
            ));
        }

        let Some(token) = token else {
            return AuthVerdict::rejected(NO_CREDENTIALS);
        };

        match store.resolve(token) {
            Ok(record) if record.status == CredentialStatus::Ok => {
                AuthVerdict::Authenticated(Identity::new(record.user_id, record.token, record.permissions))
            }
            Ok(record) => {
                tracing::debug!(
                    user_id = %record.user_id,
                    reason = record.message.as_deref().unwrap_or("status error"),
                    "Credential rejected"
                );
                AuthVerdict::rejected(INVALID_CREDENTIALS)
            }
            Err(e) => {
                tracing::debug!(reason = %e, "Credential rejected");
                AuthVerdict::rejected(INVALID_CREDENTIALS)
            }
        }
    }
}

/// Token lookup order: bearer header, then `query[param]`.
pub fn extract_token(headers: &HeaderMap, query: &HashMap<String, String>, param: &str) -> Option<String> {
    let from_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty());

    if let Some(token) = from_header {
        return Some(token.to_string());
    }

    query
        .get(param)
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
