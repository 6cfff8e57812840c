//! Gatekeeper gateway binary.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────────────┐
//!                       │                     GATEKEEPER                       │
//!   Client Request      │  ┌──────────┐   ┌──────────┐   ┌──────────────────┐  │
//!   ────────────────────┼─▶│  http    │──▶│ security │──▶│      auth        │  │
//!                       │  │ server   │   │   gate   │   │      gate        │  │
//!                       │  └──────────┘   └──────────┘   └────────┬─────────┘  │
//!                       │                                         │ verdict    │
//!                       │                                         ▼            │
//!                       │  ┌──────────┐   ┌──────────┐   ┌──────────────────┐  │
//!   ◀───────────────────┼──│ response │◀──│ dispatch │◀──│ dual-mode router │  │
//!   Client Response     │  │formatter │   │ registry │   │ (auth | anon)    │  │
//!                       │  └──────────┘   └──────────┘   └──────────────────┘  │
//!                       │                                                      │
//!                       │  Cross-cutting: config (+ hot reload), feedback bus, │
//!                       │  observability (tracing, Prometheus), lifecycle      │
//!                       └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Handlers
//!
//! This binary registers only the built-in endpoints (`System@status`,
//! `Docs@routes`, `Session@whoami`). A `[[routes]]` entry naming any other
//! handler aborts startup. Applications embed the library instead: register
//! their handlers in a `HandlerRegistry`, pass it to
//! `gatekeeper::build_pipeline`, and serve the result with `HttpServer`.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use gatekeeper::config::{load_config, watcher::ConfigWatcher, GatewayConfig};
use gatekeeper::dispatch::{Collaborators, HandlerRegistry, RegistryError};
use gatekeeper::lifecycle::StartupError;
use gatekeeper::observability::{logging, metrics};
use gatekeeper::{build_pipeline, HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "gatekeeper")]
#[command(about = "Security-first request gateway", long_about = None)]
struct Args {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload gates and formatter when the config file changes.
    #[arg(short, long, requires = "config")]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "gatekeeper starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        mode = ?config.mode,
        restricted = config.environment.restricted,
        routes = config.routes.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let pipeline = build_pipeline(&config, HandlerRegistry::new(), Collaborators::new()).inspect_err(|e| {
        if let StartupError::Registry(RegistryError::Unresolved(ids)) = e {
            tracing::error!(
                handlers = ?ids,
                "The gatekeeper binary serves built-in handlers only; register application \
                 handlers through gatekeeper::build_pipeline in an embedding binary"
            );
        }
    })?;

    // The watcher handle must outlive the server.
    let (_watcher, updates) = match (&args.config, args.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), Some(updates))
        }
        _ => (None, None),
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    HttpServer::new(&config, pipeline)
        .run(listener, updates, Shutdown::new())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
