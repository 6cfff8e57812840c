//! Handler registry.
//!
//! # Responsibilities
//! - Map stable [`HandlerId`]s to callables at bootstrap
//! - Resolve a matched route's id to its handler
//! - Verify every routed id resolves before traffic is accepted
//!
//! # Design Decisions
//! - Populated once, then shared read-only behind `Arc`
//! - An unresolvable id is a startup configuration error

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::dispatch::context::{Collaborators, RequestContext};
use crate::dispatch::handler::{Handler, HandlerError, HandlerId, HandlerResponse};
use crate::routing::matcher::Params;
use crate::routing::router::DualModeRouter;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Invalid handler id '{0}', expected Controller@action")]
    InvalidHandlerId(String),

    #[error("Invalid route method '{0}'")]
    InvalidMethod(String),

    #[error("Routes reference unregistered handlers: {}", .0.join(", "))]
    Unresolved(Vec<String>),
}

/// Mapping from handler ids to callables.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<HandlerId, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a closure under `id`, replacing any previous entry.
    pub fn register<F>(&mut self, id: HandlerId, handler: F) -> &mut Self
    where
        F: Fn(&RequestContext, &Params, &Collaborators) -> Result<HandlerResponse, HandlerError>
            + Send
            + Sync
            + 'static,
    {
        self.register_handler(id, handler)
    }

    /// Register any [`Handler`] implementation under `id`.
    pub fn register_handler<H: Handler + 'static>(&mut self, id: HandlerId, handler: H) -> &mut Self {
        if self.handlers.insert(id.clone(), Arc::new(handler)).is_some() {
            tracing::warn!(handler = %id, "Handler replaced in registry");
        }
        self
    }

    pub fn resolve(&self, id: &HandlerId) -> Option<&dyn Handler> {
        self.handlers.get(id).map(|h| h.as_ref())
    }

    pub fn contains(&self, id: &HandlerId) -> bool {
        self.handlers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Check that every route in both tables resolves to a handler.
    pub fn verify(&self, router: &DualModeRouter) -> Result<(), RegistryError> {
        let mut missing: Vec<String> = router
            .all_routes()
            .filter(|route| !self.contains(&route.handler))
            .map(|route| route.handler.to_string())
            .collect();

        if missing.is_empty() {
            return Ok(());
        }
        missing.sort();
        missing.dedup();
        Err(RegistryError::Unresolved(missing))
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<String> = self.handlers.keys().map(ToString::to_string).collect();
        ids.sort();
        f.debug_struct("HandlerRegistry").field("handlers", &ids).finish()
    }
}
