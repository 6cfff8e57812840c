//! Authenticated identity and the gate's verdict.

use std::fmt;

use serde::Serialize;

/// Who the caller is, fixed for the remainder of the request.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: String,
    #[serde(skip)]
    token: String,
    pub permissions: Vec<String>,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, token: impl Into<String>, permissions: Vec<String>) -> Self {
        Self {
            user_id: user_id.into(),
            token: token.into(),
            permissions,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("user_id", &self.user_id)
            .field("token", &"<redacted>")
            .field("permissions", &self.permissions)
            .finish()
    }
}

/// Outcome of the authentication gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthVerdict {
    Authenticated(Identity),
    Rejected { message: String },
}

impl AuthVerdict {
    pub fn rejected(message: impl Into<String>) -> Self {
        AuthVerdict::Rejected {
            message: message.into(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthVerdict::Authenticated(_))
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthVerdict::Authenticated(identity) => Some(identity),
            AuthVerdict::Rejected { .. } => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            AuthVerdict::Authenticated(_) => None,
            AuthVerdict::Rejected { message } => Some(message),
        }
    }

    /// Label for logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            AuthVerdict::Authenticated(_) => "authenticated",
            AuthVerdict::Rejected { .. } => "rejected",
        }
    }
}
