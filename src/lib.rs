//! Gatekeeper: a security-first request gateway.
//!
//! Requests pass a security gate, an authentication gate and a dual-mode
//! router before a typed handler runs; responses leave through a capped JSON
//! formatter.

pub mod admin;
pub mod auth;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod feedback;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pipeline;
pub mod response;
pub mod routing;
pub mod security;

pub use config::schema::GatewayConfig;
pub use error::GatewayError;
pub use http::HttpServer;
pub use lifecycle::{build_pipeline, Shutdown};
pub use pipeline::{InboundRequest, Pipeline, PipelineResponse};
