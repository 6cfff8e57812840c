//! Credential store boundary.
//!
//! The store resolves an opaque token to a user. Failures carry a reason for
//! logging only; the gate collapses them into one message for the caller.

use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use thiserror::Error;

use crate::config::StaticTokenConfig;

/// Resolution status reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialStatus {
    Ok,
    Error,
}

/// What the store knows about a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub user_id: String,
    pub token: String,
    pub status: CredentialStatus,
    pub message: Option<String>,
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("token not found")]
    NotFound,
    #[error("token expired")]
    Expired,
    #[error("token revoked")]
    Revoked,
    #[error("credential store unavailable: {0}")]
    Unavailable(String),
}

/// External lookup of tokens. Calls may block.
pub trait CredentialStore: Send + Sync {
    fn resolve(&self, token: &str) -> Result<CredentialRecord, CredentialError>;
}

#[derive(Debug, Clone)]
struct StoredToken {
    user_id: String,
    permissions: Vec<String>,
    expires_at: Option<u64>,
    revoked: bool,
}

/// Token store held in memory, seeded from configuration.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    tokens: DashMap<String, StoredToken>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(tokens: &[StaticTokenConfig]) -> Self {
        let store = Self::new();
        for t in tokens {
            store.tokens.insert(
                t.token.clone(),
                StoredToken {
                    user_id: t.user_id.clone(),
                    permissions: t.permissions.clone(),
                    expires_at: t.expires_at,
                    revoked: t.revoked,
                },
            );
        }
        tracing::info!(tokens = store.tokens.len(), "Credential store seeded");
        store
    }

    /// Issue or replace a token.
    pub fn insert(
        &self,
        token: impl Into<String>,
        user_id: impl Into<String>,
        permissions: Vec<String>,
        expires_at: Option<u64>,
    ) {
        self.tokens.insert(
            token.into(),
            StoredToken {
                user_id: user_id.into(),
                permissions,
                expires_at,
                revoked: false,
            },
        );
    }

    /// Mark a token revoked. Returns false if it was unknown.
    pub fn revoke(&self, token: &str) -> bool {
        match self.tokens.get_mut(token) {
            Some(mut entry) => {
                entry.revoked = true;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn resolve(&self, token: &str) -> Result<CredentialRecord, CredentialError> {
        let entry = self.tokens.get(token).ok_or(CredentialError::NotFound)?;
        if entry.revoked {
            return Err(CredentialError::Revoked);
        }
        if let Some(expires_at) = entry.expires_at {
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs();
            if expires_at <= now {
                return Err(CredentialError::Expired);
            }
        }
        Ok(CredentialRecord {
            user_id: entry.user_id.clone(),
            token: token.to_string(),
            status: CredentialStatus::Ok,
            message: None,
            permissions: entry.permissions.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_token() {
        let store = InMemoryCredentialStore::new();
        store.insert("abc", "7", vec!["infractions:read".into()], None);

        let record = store.resolve("abc").unwrap();
        assert_eq!(record.user_id, "7");
        assert_eq!(record.status, CredentialStatus::Ok);
        assert_eq!(record.permissions, vec!["infractions:read".to_string()]);
    }

    #[test]
    fn test_failure_reasons() {
        let store = InMemoryCredentialStore::new();
        store.insert("old", "1", vec![], Some(1));
        store.insert("live", "2", vec![], None);
        assert!(store.revoke("live"));
        assert!(!store.revoke("ghost"));

        assert_eq!(store.resolve("ghost"), Err(CredentialError::NotFound));
        assert_eq!(store.resolve("old"), Err(CredentialError::Expired));
        assert_eq!(store.resolve("live"), Err(CredentialError::Revoked));
    }

    #[test]
    fn test_from_config() {
        let store = InMemoryCredentialStore::from_config(&[StaticTokenConfig {
            token: "cfg".into(),
            user_id: "9".into(),
            permissions: vec![],
            expires_at: None,
            revoked: false,
        }]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.resolve("cfg").unwrap().user_id, "9");
    }
}
