//! The security and rate-limit gate.
//!
//! # Responsibilities
//! - Run the environment, origin, method, preflight and rate-limit checks
//!   in that order
//! - Produce the response headers every later stage builds on
//!
//! # Design Decisions
//! - The first failing check terminates; nothing after it runs
//! - Environment rejections carry no CORS or hardening headers
//! - Rate limiting applies only in restricted environments

use std::time::{Duration, SystemTime};

use axum::http::{header, HeaderMap, HeaderValue, Method};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::pipeline::InboundRequest;
use crate::security::access_control::EnvironmentPolicy;
use crate::security::headers::HeaderPolicy;
use crate::security::rate_limit::{RateDecision, RateLimiter};

/// Outcome of the security gate.
#[derive(Debug)]
pub enum GateDecision {
    /// Continue to authentication with these response headers.
    Proceed { headers: HeaderMap },
    /// OPTIONS request answered with a bodyless 200.
    Preflight { headers: HeaderMap },
    /// Terminate with an error envelope.
    Reject {
        headers: HeaderMap,
        error: GatewayError,
    },
}

impl GateDecision {
    pub fn headers(&self) -> &HeaderMap {
        match self {
            GateDecision::Proceed { headers }
            | GateDecision::Preflight { headers }
            | GateDecision::Reject { headers, .. } => headers,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SecurityGate {
    environment: EnvironmentPolicy,
    headers: HeaderPolicy,
    methods: Vec<Method>,
    session_cookie: String,
    limiter: Option<RateLimiter>,
}

impl SecurityGate {
    /// Build a gate from config. `limiter` supplies the session store; its
    /// policy is replaced with the configured limit and period.
    pub fn new(config: &GatewayConfig, limiter: &RateLimiter) -> Self {
        let methods: Vec<Method> = config
            .security
            .allowed_methods
            .iter()
            .filter_map(|m| Method::from_bytes(m.to_ascii_uppercase().as_bytes()).ok())
            .collect();

        let limiter = (config.environment.restricted && config.rate_limit.enabled).then(|| {
            limiter.with_policy(
                config.rate_limit.limit,
                Duration::from_secs(config.rate_limit.period_secs),
            )
        });

        Self {
            environment: EnvironmentPolicy::from_config(&config.environment),
            headers: HeaderPolicy::new(&config.security, &methods),
            methods,
            session_cookie: config.security.session_cookie.clone(),
            limiter,
        }
    }

    pub fn allowed_methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn rate_limited(&self) -> bool {
        self.limiter.is_some()
    }

    pub fn check(&self, request: &InboundRequest, now: SystemTime) -> GateDecision {
        if let Err(error) = self.environment.check_environment(request) {
            return GateDecision::Reject {
                headers: HeaderMap::new(),
                error,
            };
        }

        let origin = match self.environment.authorize_origin(request) {
            Ok(origin) => origin,
            Err(error) => {
                return GateDecision::Reject {
                    headers: HeaderMap::new(),
                    error,
                }
            }
        };

        let mut headers = HeaderMap::new();
        self.headers.apply_hardening(&mut headers);
        if let Some(origin) = &origin {
            self.headers.apply_cors(&mut headers, origin);
        }

        if !self.methods.contains(&request.method) {
            headers.insert(header::ALLOW, self.headers.allow_methods().clone());
            return GateDecision::Reject {
                headers,
                error: GatewayError::MethodNotAllowed(request.method.clone()),
            };
        }

        if request.method == Method::OPTIONS {
            tracing::debug!(request_id = %request.request_id, path = %request.path, "Preflight answered");
            return GateDecision::Preflight { headers };
        }

        if let Some(limiter) = &self.limiter {
            let key = request.session_key(&self.session_cookie);
            if let RateDecision::Limited { retry_after } = limiter.check(&key, now) {
                // Round up so clients never retry inside the window.
                let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                headers.insert(header::RETRY_AFTER, HeaderValue::from(secs));
                return GateDecision::Reject {
                    headers,
                    error: GatewayError::RateLimitExceeded {
                        retry_after_secs: secs,
                    },
                };
            }
        }

        GateDecision::Proceed { headers }
    }
}
