//! Request-scoped context and injected collaborators.

use std::collections::HashMap;

use axum::http::{Extensions, Method};
use serde_json::Value;

use crate::auth::Identity;
use crate::config::RunMode;
use crate::feedback::FeedbackBus;

/// Everything a handler may know about the current request.
///
/// Built once per request after the gates pass; the identity is fixed at
/// construction and never revalidated.
#[derive(Debug)]
pub struct RequestContext {
    pub request_id: String,
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub body: Option<Value>,
    mode: RunMode,
    identity: Option<Identity>,
    feedback: FeedbackBus,
}

impl RequestContext {
    pub fn new(
        request_id: impl Into<String>,
        method: Method,
        path: impl Into<String>,
        identity: Option<Identity>,
        feedback: FeedbackBus,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            method,
            path: path.into(),
            query: HashMap::new(),
            body: None,
            mode: RunMode::default(),
            identity,
            feedback,
        }
    }

    pub fn with_query(mut self, query: HashMap<String, String>) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: Option<Value>) -> Self {
        self.body = body;
        self
    }

    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    /// Run mode in force when the request entered the pipeline.
    pub fn mode(&self) -> RunMode {
        self.mode
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Bus for recording user-facing and diagnostic messages.
    pub fn feedback(&self) -> &FeedbackBus {
        &self.feedback
    }
}

/// External services handed to handlers, looked up by type.
#[derive(Debug, Clone, Default)]
pub struct Collaborators {
    inner: Extensions,
}

impl Collaborators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T: Clone + Send + Sync + 'static>(mut self, service: T) -> Self {
        self.insert(service);
        self
    }

    pub fn insert<T: Clone + Send + Sync + 'static>(&mut self, service: T) {
        self.inner.insert(service);
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.inner.get::<T>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Debug)]
    struct ProfileStore {
        name: &'static str,
    }

    #[test]
    fn test_collaborators_lookup_by_type() {
        let collaborators = Collaborators::new().with(Arc::new(ProfileStore { name: "pg" }));

        let store = collaborators.get::<Arc<ProfileStore>>().unwrap();
        assert_eq!(store.name, "pg");
        assert!(collaborators.get::<String>().is_none());
    }

    #[test]
    fn test_context_identity_is_optional() {
        let ctx = RequestContext::new("r1", Method::GET, "/", None, FeedbackBus::new());
        assert!(!ctx.is_authenticated());
        assert!(ctx.identity().is_none());
    }
}
