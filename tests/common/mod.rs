//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use serde_json::json;

use gatekeeper::config::{GatewayConfig, RouteAccess, RouteConfig, StaticTokenConfig};
use gatekeeper::dispatch::{Collaborators, HandlerError, HandlerRegistry, HandlerResponse, RequestContext};
use gatekeeper::routing::Params;
use gatekeeper::{build_pipeline, HttpServer, Pipeline, Shutdown};

pub const USER_TOKEN: &str = "tok-alice";
pub const REVOKED_TOKEN: &str = "tok-revoked";

fn route(method: &str, pattern: &str, handler: &str, table: RouteAccess) -> RouteConfig {
    RouteConfig {
        method: method.into(),
        pattern: pattern.into(),
        handler: handler.into(),
        table,
        doc: None,
    }
}

/// Application routes used across the suites.
pub fn demo_routes() -> Vec<RouteConfig> {
    vec![
        route(
            "GET",
            "/infractions/p/:page/pp/:perPage",
            "Infractions@getAllInfractionsPaginated",
            RouteAccess::Authenticated,
        ),
        route("GET", "/items", "Items@list", RouteAccess::Both),
        route("GET", "/profiles/:id", "Profiles@show", RouteAccess::Authenticated),
        route("POST", "/login", "Session@login", RouteAccess::Anonymous),
        route("GET", "/notes", "Notes@list", RouteAccess::Both),
    ]
}

pub fn demo_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.routes = demo_routes();
    config.auth.tokens = vec![
        StaticTokenConfig {
            token: USER_TOKEN.into(),
            user_id: "alice".into(),
            permissions: vec!["infractions:read".into()],
            expires_at: None,
            revoked: false,
        },
        StaticTokenConfig {
            token: REVOKED_TOKEN.into(),
            user_id: "mallory".into(),
            permissions: vec![],
            expires_at: None,
            revoked: true,
        },
    ];
    config
}

fn paginated(ctx: &RequestContext, params: &Params, _: &Collaborators) -> Result<HandlerResponse, HandlerError> {
    let page: u32 = params["page"]
        .parse()
        .map_err(|_| HandlerError::BadRequest("page must be numeric".into()))?;
    let per_page: u32 = params["perPage"]
        .parse()
        .map_err(|_| HandlerError::BadRequest("perPage must be numeric".into()))?;

    ctx.feedback().success(format!("page {page} loaded"));
    let items = (0..per_page)
        .map(|i| json!({ "id": page.saturating_sub(1) * per_page + i, "handler": "getAllInfractionsPaginated" }))
        .collect();
    Ok(HandlerResponse::list(items))
}

fn items(ctx: &RequestContext, _: &Params, _: &Collaborators) -> Result<HandlerResponse, HandlerError> {
    let count = if ctx.is_authenticated() { 250 } else { 3 };
    Ok(HandlerResponse::list((0..count).map(|i| json!({ "id": i })).collect()))
}

fn profile(ctx: &RequestContext, params: &Params, _: &Collaborators) -> Result<HandlerResponse, HandlerError> {
    match params["id"].as_str() {
        "404" => Err(HandlerError::NotFound("No such profile".into())),
        id => {
            ctx.feedback().diagnostic(format!("profile {id} read"));
            Ok(HandlerResponse::item(json!({ "id": id, "viewer": ctx.identity().map(|i| i.user_id.clone()) })))
        }
    }
}

fn login(ctx: &RequestContext, _: &Params, _: &Collaborators) -> Result<HandlerResponse, HandlerError> {
    let user = ctx
        .body
        .as_ref()
        .and_then(|b| b.get("user"))
        .and_then(|u| u.as_str())
        .ok_or_else(|| HandlerError::BadRequest("user is required".into()))?;
    Ok(HandlerResponse::created(json!({ "user": user })).with_message("Logged in"))
}

fn notes(ctx: &RequestContext, _: &Params, _: &Collaborators) -> Result<HandlerResponse, HandlerError> {
    ctx.feedback().warning("notes are stale");
    ctx.feedback().error("notes backend degraded");
    Ok(HandlerResponse::list(vec![json!("n1")]))
}

pub fn demo_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry
        .register("Infractions@getAllInfractionsPaginated".parse().unwrap(), paginated)
        .register("Items@list".parse().unwrap(), items)
        .register("Profiles@show".parse().unwrap(), profile)
        .register("Session@login".parse().unwrap(), login)
        .register("Notes@list".parse().unwrap(), notes);
    registry
}

pub fn pipeline(config: &GatewayConfig) -> Pipeline {
    build_pipeline(config, demo_registry(), Collaborators::new()).expect("pipeline builds")
}

/// Start a gateway on `addr`; trigger the returned handle to stop it.
pub async fn start_gateway(addr: SocketAddr, mut config: GatewayConfig) -> Shutdown {
    config.listener.bind_address = addr.to_string();
    let server = HttpServer::new(&config, pipeline(&config));
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let _ = server.run(listener, None, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
