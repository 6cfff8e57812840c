//! Built-in gateway endpoints.
//!
//! Registered by `lifecycle::build_pipeline` ahead of the application routes:
//! - `GET /status` → `System@status` (both tables)
//! - `GET /routes` → `Docs@routes` (both tables, lists the caller's table)
//! - `GET /whoami` → `Session@whoami` (authenticated only)

pub mod handlers;

use axum::http::Method;

use crate::dispatch::{Collaborators, HandlerId, HandlerRegistry};
use crate::routing::{DualModeRouter, RouteInfo, RouterBuilder, TableKind};

use self::handlers::*;

pub use self::handlers::{RouteCatalog, SystemStatus};

pub fn status_id() -> HandlerId {
    HandlerId::new("System", "status")
}

pub fn routes_id() -> HandlerId {
    HandlerId::new("Docs", "routes")
}

pub fn whoami_id() -> HandlerId {
    HandlerId::new("Session", "whoami")
}

/// Register the built-in handlers and their routes.
pub fn setup_admin_routes(registry: &mut HandlerRegistry, builder: &mut RouterBuilder) {
    registry
        .register(status_id(), get_status)
        .register(routes_id(), get_routes)
        .register(whoami_id(), get_whoami);

    builder
        .both(Method::GET, "/status", status_id())
        .both(Method::GET, "/routes", routes_id())
        .authenticated(Method::GET, "/whoami", whoami_id());

    for table in [TableKind::Authenticated, TableKind::Anonymous] {
        builder.add_documentation(table, "/status", &Method::GET, "Gateway liveness and version");
        builder.add_documentation(table, "/routes", &Method::GET, "Routes reachable by the caller");
    }
    builder.add_documentation(
        TableKind::Authenticated,
        "/whoami",
        &Method::GET,
        "Identity bound to the presented token",
    );
}

/// Install the collaborators the built-ins read.
pub fn install_collaborators(collaborators: &mut Collaborators, router: &DualModeRouter) {
    let listing = |kind| -> Vec<RouteInfo> { router.routes(kind).iter().map(RouteInfo::from).collect() };
    collaborators.insert(RouteCatalog {
        authenticated: listing(TableKind::Authenticated),
        anonymous: listing(TableKind::Anonymous),
    });
}
