//! Dual-mode route lookup and dispatch.
//!
//! # Responsibilities
//! - Own the authenticated and anonymous route tables
//! - Select exactly one table from the authentication verdict
//! - Resolve the matched handler and invoke it
//!
//! # Design Decisions
//! - Tables are built through `RouterBuilder`, then frozen (no `&mut` access)
//! - Rejected callers only ever see the anonymous table; a miss is 401 with
//!   the gate's message
//! - Authenticated callers only ever see the authenticated table; a miss is 404
//! - Handler failures are forwarded, never reinterpreted

use axum::http::Method;
use serde::Serialize;

use crate::auth::AuthVerdict;
use crate::config::{RouteAccess, RouteConfig};
use crate::dispatch::{
    Collaborators, HandlerId, HandlerRegistry, HandlerResponse, RegistryError, RequestContext,
};
use crate::error::GatewayError;
use crate::routing::matcher::Params;
use crate::routing::table::{Route, RouteTable};

/// Which of the two tables a route lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    Authenticated,
    Anonymous,
}

impl TableKind {
    /// The only table a verdict may consult.
    pub fn for_verdict(verdict: &AuthVerdict) -> Self {
        if verdict.is_authenticated() {
            TableKind::Authenticated
        } else {
            TableKind::Anonymous
        }
    }
}

/// Build-phase owner of both route tables.
#[derive(Debug, Default)]
pub struct RouterBuilder {
    authenticated: RouteTable,
    anonymous: RouteTable,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route that requires an authenticated identity.
    pub fn authenticated(&mut self, method: Method, pattern: &str, handler: HandlerId) -> &mut Self {
        self.add(TableKind::Authenticated, method, pattern, handler, None)
    }

    /// Register a route reachable without credentials.
    pub fn anonymous(&mut self, method: Method, pattern: &str, handler: HandlerId) -> &mut Self {
        self.add(TableKind::Anonymous, method, pattern, handler, None)
    }

    /// Register into both tables. The handler must behave under either context.
    pub fn both(&mut self, method: Method, pattern: &str, handler: HandlerId) -> &mut Self {
        self.add(TableKind::Authenticated, method.clone(), pattern, handler.clone(), None);
        self.add(TableKind::Anonymous, method, pattern, handler, None)
    }

    pub fn add(
        &mut self,
        table: TableKind,
        method: Method,
        pattern: &str,
        handler: HandlerId,
        doc: Option<String>,
    ) -> &mut Self {
        self.table_mut(table).add(method, pattern, handler, doc);
        self
    }

    /// Document an already registered route. Returns false if it is unknown.
    pub fn add_documentation(
        &mut self,
        table: TableKind,
        pattern: &str,
        method: &Method,
        text: impl Into<String>,
    ) -> bool {
        self.table_mut(table).add_documentation(pattern, method, text)
    }

    /// Register `[[routes]]` entries in file order.
    pub fn add_config_routes(&mut self, routes: &[RouteConfig]) -> Result<&mut Self, RegistryError> {
        for route in routes {
            let method = Method::from_bytes(route.method.to_ascii_uppercase().as_bytes())
                .map_err(|_| RegistryError::InvalidMethod(route.method.clone()))?;
            let handler: HandlerId = route.handler.parse()?;
            let tables: &[TableKind] = match route.table {
                RouteAccess::Authenticated => &[TableKind::Authenticated],
                RouteAccess::Anonymous => &[TableKind::Anonymous],
                RouteAccess::Both => &[TableKind::Authenticated, TableKind::Anonymous],
            };
            for &table in tables {
                self.add(table, method.clone(), &route.pattern, handler.clone(), route.doc.clone());
            }
        }
        Ok(self)
    }

    fn table_mut(&mut self, table: TableKind) -> &mut RouteTable {
        match table {
            TableKind::Authenticated => &mut self.authenticated,
            TableKind::Anonymous => &mut self.anonymous,
        }
    }

    /// Freeze the tables.
    pub fn build(self) -> DualModeRouter {
        tracing::info!(
            authenticated_routes = self.authenticated.len(),
            anonymous_routes = self.anonymous.len(),
            "Route tables frozen"
        );
        DualModeRouter {
            authenticated: self.authenticated,
            anonymous: self.anonymous,
        }
    }
}

/// A successful lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch<'a> {
    pub table: TableKind,
    pub handler: &'a HandlerId,
    pub params: Params,
}

/// Immutable pair of route tables.
#[derive(Debug, Default)]
pub struct DualModeRouter {
    authenticated: RouteTable,
    anonymous: RouteTable,
}

impl DualModeRouter {
    pub fn table(&self, kind: TableKind) -> &RouteTable {
        match kind {
            TableKind::Authenticated => &self.authenticated,
            TableKind::Anonymous => &self.anonymous,
        }
    }

    pub fn route_exists(&self, path: &str, kind: TableKind) -> bool {
        self.table(kind).route_exists(path)
    }

    pub fn routes(&self, kind: TableKind) -> &[Route] {
        self.table(kind).routes()
    }

    /// Routes of both tables, authenticated first.
    pub fn all_routes(&self) -> impl Iterator<Item = &Route> {
        self.authenticated.routes().iter().chain(self.anonymous.routes())
    }

    /// Find the route governing this request.
    pub fn resolve(
        &self,
        verdict: &AuthVerdict,
        method: &Method,
        path: &str,
    ) -> Result<RouteMatch<'_>, GatewayError> {
        let kind = TableKind::for_verdict(verdict);
        match self.table(kind).find_handler(method, path) {
            Some((handler, params)) => Ok(RouteMatch {
                table: kind,
                handler,
                params,
            }),
            None => match verdict {
                AuthVerdict::Rejected { message } => Err(GatewayError::Unauthorized(message.clone())),
                AuthVerdict::Authenticated(_) => Err(GatewayError::NoRouteMatch {
                    method: method.clone(),
                    path: path.to_string(),
                }),
            },
        }
    }

    /// Resolve and invoke the handler for the request described by `ctx`.
    pub fn dispatch(
        &self,
        ctx: &RequestContext,
        verdict: &AuthVerdict,
        registry: &HandlerRegistry,
        collaborators: &Collaborators,
    ) -> Result<HandlerResponse, GatewayError> {
        let matched = self.resolve(verdict, &ctx.method, &ctx.path)?;
        let handler = registry
            .resolve(matched.handler)
            .ok_or_else(|| GatewayError::UnresolvedHandler(matched.handler.clone()))?;

        tracing::debug!(
            request_id = %ctx.request_id,
            table = ?matched.table,
            handler = %matched.handler,
            params = ?matched.params,
            "Dispatching"
        );

        Ok(handler.call(ctx, &matched.params, collaborators)?)
    }
}
