//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, addresses parse)
//! - Check route definitions (methods, handler ids, pattern shape)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::{IpAddr, SocketAddr};

use axum::http::{Method, StatusCode};
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::dispatch::HandlerId;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    BindAddress(String),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),

    #[error("response.item_limit must be greater than zero")]
    ItemLimit,

    #[error("response.diagnostic_status {0} is not a valid HTTP status")]
    DiagnosticStatus(u16),

    #[error("rate_limit.{0} must be greater than zero")]
    RateLimit(&'static str),

    #[error("environment.{0} is required in a restricted environment")]
    MissingRestriction(&'static str),

    #[error("environment.allowed_ips entry '{0}' is not an IP address")]
    AllowedIp(String),

    #[error("security.allowed_methods entry '{0}' is not an HTTP method")]
    AllowedMethod(String),

    #[error("timeouts.request_secs must be greater than zero")]
    RequestTimeout,

    #[error("route #{index}: {reason}")]
    Route { index: usize, reason: String },
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.response.item_limit == 0 {
        errors.push(ValidationError::ItemLimit);
    }
    if StatusCode::from_u16(config.response.diagnostic_status).is_err() {
        errors.push(ValidationError::DiagnosticStatus(config.response.diagnostic_status));
    }

    if config.rate_limit.enabled {
        if config.rate_limit.limit == 0 {
            errors.push(ValidationError::RateLimit("limit"));
        }
        if config.rate_limit.period_secs == 0 {
            errors.push(ValidationError::RateLimit("period_secs"));
        }
    }

    let env = &config.environment;
    if env.restricted {
        if env.allowed_domain.is_empty() {
            errors.push(ValidationError::MissingRestriction("allowed_domain"));
        }
        if env.allowed_referer_host.is_empty() {
            errors.push(ValidationError::MissingRestriction("allowed_referer_host"));
        }
        if env.allowed_ips.is_empty() {
            errors.push(ValidationError::MissingRestriction("allowed_ips"));
        }
    }
    for ip in &env.allowed_ips {
        if ip.parse::<IpAddr>().is_err() {
            errors.push(ValidationError::AllowedIp(ip.clone()));
        }
    }

    for method in &config.security.allowed_methods {
        if method.parse::<Method>().is_err() {
            errors.push(ValidationError::AllowedMethod(method.clone()));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::RequestTimeout);
    }

    for (index, route) in config.routes.iter().enumerate() {
        let mut fail = |reason: String| errors.push(ValidationError::Route { index, reason });
        if route.method.parse::<Method>().is_err() {
            fail(format!("invalid method '{}'", route.method));
        }
        if !route.pattern.starts_with('/') {
            fail(format!("pattern '{}' must start with '/'", route.pattern));
        }
        if let Err(e) = route.handler.parse::<HandlerId>() {
            fail(e.to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
