//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the route tables from the built-ins and `[[routes]]`
//! - Seed the credential store from `[[auth.tokens]]`
//! - Verify the handler registry and assemble the pipeline
//!
//! # Design Decisions
//! - Fail fast: an unresolvable handler id aborts startup
//! - Built-in routes are registered first, so config routes cannot shadow them

use std::sync::Arc;

use thiserror::Error;

use crate::admin;
use crate::auth::InMemoryCredentialStore;
use crate::config::{ConfigError, GatewayConfig};
use crate::dispatch::{Collaborators, HandlerRegistry, RegistryError};
use crate::pipeline::Pipeline;
use crate::routing::RouterBuilder;
use crate::security::InMemorySessionStore;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Handler registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build a pipeline for `config` with the built-in endpoints plus the
/// application handlers in `registry`.
///
/// This is the registration point for application handlers: every handler id
/// named by `config.routes` must be in `registry`, or startup fails with
/// [`RegistryError::Unresolved`].
pub fn build_pipeline(
    config: &GatewayConfig,
    mut registry: HandlerRegistry,
    mut collaborators: Collaborators,
) -> Result<Pipeline, StartupError> {
    let mut builder = RouterBuilder::new();
    admin::setup_admin_routes(&mut registry, &mut builder);
    builder.add_config_routes(&config.routes)?;
    let router = builder.build();

    admin::install_collaborators(&mut collaborators, &router);

    let credentials = Arc::new(InMemoryCredentialStore::from_config(&config.auth.tokens));

    let pipeline = Pipeline::new(
        config,
        router,
        registry,
        collaborators,
        credentials,
        Arc::new(InMemorySessionStore::new()),
    )?;
    Ok(pipeline)
}
