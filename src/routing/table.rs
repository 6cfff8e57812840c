//! Ordered route table.
//!
//! # Responsibilities
//! - Store routes in registration order
//! - Look up the handler for a (method, path) pair
//! - Answer existence queries and expose routes for documentation
//!
//! # Design Decisions
//! - First match wins: insertion order is significant, specificity is not
//! - Duplicate (method, pattern) pairs are accepted; the earlier one shadows the later
//! - Mutation requires `&mut`, so a table shared behind `Arc` is frozen

use axum::http::Method;
use serde::Serialize;

use crate::dispatch::HandlerId;
use crate::routing::matcher::{Params, RoutePattern};

/// A single registered route.
#[derive(Debug, Clone)]
pub struct Route {
    pub method: Method,
    pub pattern: RoutePattern,
    pub handler: HandlerId,
    pub doc: Option<String>,
}

/// Serializable view of a route used by introspection endpoints.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RouteInfo {
    pub method: String,
    pub pattern: String,
    pub handler: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

impl From<&Route> for RouteInfo {
    fn from(route: &Route) -> Self {
        Self {
            method: route.method.to_string(),
            pattern: route.pattern.to_string(),
            handler: route.handler.to_string(),
            doc: route.doc.clone(),
        }
    }
}

/// Ordered collection of routes.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route.
    pub fn add(
        &mut self,
        method: Method,
        pattern: &str,
        handler: HandlerId,
        doc: Option<String>,
    ) {
        let pattern = RoutePattern::parse(pattern);
        if self
            .routes
            .iter()
            .any(|r| r.method == method && r.pattern == pattern)
        {
            tracing::warn!(
                method = %method,
                pattern = %pattern,
                handler = %handler,
                "Duplicate route registered; earlier entry stays authoritative"
            );
        }
        self.routes.push(Route {
            method,
            pattern,
            handler,
            doc,
        });
    }

    /// Attach documentation to the first route registered for (pattern, method).
    /// Returns false when no such route exists.
    pub fn add_documentation(&mut self, pattern: &str, method: &Method, text: impl Into<String>) -> bool {
        match self
            .routes
            .iter_mut()
            .find(|r| r.pattern.as_str() == pattern && &r.method == method)
        {
            Some(route) => {
                route.doc = Some(text.into());
                true
            }
            None => false,
        }
    }

    /// True if any route, regardless of method, matches the path.
    pub fn route_exists(&self, path: &str) -> bool {
        self.routes.iter().any(|r| r.pattern.match_path(path).is_some())
    }

    /// Find the first route matching method and path.
    pub fn find_handler(&self, method: &Method, path: &str) -> Option<(&HandlerId, Params)> {
        self.routes
            .iter()
            .filter(|r| &r.method == method)
            .find_map(|r| r.pattern.match_path(path).map(|params| (&r.handler, params)))
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
