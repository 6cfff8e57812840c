//! Handlers behind the built-in endpoints.
//!
//! They read the request context and the collaborators installed at
//! bootstrap; none of them touches gateway state directly.

use serde::Serialize;
use serde_json::json;

use crate::config::RunMode;
use crate::dispatch::{Collaborators, HandlerError, HandlerResponse, RequestContext};
use crate::response::Payload;
use crate::routing::{Params, RouteInfo, TableKind};

#[derive(Debug, Clone, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub mode: RunMode,
}

/// Route listing snapshot, injected as a collaborator at bootstrap.
#[derive(Debug, Clone, Default)]
pub struct RouteCatalog {
    pub authenticated: Vec<RouteInfo>,
    pub anonymous: Vec<RouteInfo>,
}

pub fn get_status(
    ctx: &RequestContext,
    _params: &Params,
    _services: &Collaborators,
) -> Result<HandlerResponse, HandlerError> {
    ctx.feedback().diagnostic(format!("status served to {}", who(ctx)));
    let status = SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        mode: ctx.mode(),
    };
    let value = serde_json::to_value(status).map_err(|e| HandlerError::Internal(e.to_string()))?;
    Ok(HandlerResponse::item(value))
}

/// Lists the routes of the table the caller can reach.
pub fn get_routes(
    ctx: &RequestContext,
    _params: &Params,
    services: &Collaborators,
) -> Result<HandlerResponse, HandlerError> {
    let catalog = services
        .get::<RouteCatalog>()
        .ok_or_else(|| HandlerError::Internal("route catalog not installed".into()))?;

    let (table, routes) = if ctx.is_authenticated() {
        (TableKind::Authenticated, &catalog.authenticated)
    } else {
        (TableKind::Anonymous, &catalog.anonymous)
    };

    let items = routes
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| HandlerError::Internal(e.to_string()))?;

    Ok(HandlerResponse::ok(Payload::List(items)).with_message(format!("{table:?} routes")))
}

pub fn get_whoami(
    ctx: &RequestContext,
    _params: &Params,
    _services: &Collaborators,
) -> Result<HandlerResponse, HandlerError> {
    let identity = ctx
        .identity()
        .ok_or_else(|| HandlerError::Forbidden("No identity bound to this request".into()))?;

    Ok(HandlerResponse::item(json!({
        "user_id": identity.user_id,
        "permissions": identity.permissions,
    })))
}

fn who(ctx: &RequestContext) -> &str {
    ctx.identity().map(|i| i.user_id.as_str()).unwrap_or("anonymous")
}
