//! Environment and origin checks.
//!
//! # Responsibilities
//! - Restricted environments: require the configured referer host and an
//!   allowlisted client IP
//! - Decide which origin, if any, is echoed back in CORS headers
//!
//! # Design Decisions
//! - Open environments reflect any present origin; a missing origin is not
//!   a rejection there, it only suppresses the CORS headers
//! - `allowed_domain` may be given as a full origin or as a bare host; a bare
//!   host admits only `https` on the default port

use std::net::IpAddr;

use axum::http::HeaderValue;

use crate::config::EnvironmentConfig;
use crate::error::GatewayError;
use crate::pipeline::InboundRequest;

/// Compiled environment rules.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentPolicy {
    restricted: bool,
    allowed_domain: String,
    referer_host: String,
    allowed_ips: Vec<IpAddr>,
}

impl EnvironmentPolicy {
    pub fn from_config(config: &EnvironmentConfig) -> Self {
        let allowed_ips = config
            .allowed_ips
            .iter()
            .filter_map(|raw| match raw.parse::<IpAddr>() {
                Ok(ip) => Some(ip),
                Err(_) => {
                    tracing::warn!(ip = %raw, "Skipping unparseable allowed IP");
                    None
                }
            })
            .collect();

        Self {
            restricted: config.restricted,
            allowed_domain: config.allowed_domain.trim_end_matches('/').to_string(),
            referer_host: config.allowed_referer_host.clone(),
            allowed_ips,
        }
    }

    pub fn is_restricted(&self) -> bool {
        self.restricted
    }

    /// Referer host and client IP checks. A no-op in open environments.
    pub fn check_environment(&self, request: &InboundRequest) -> Result<(), GatewayError> {
        if !self.restricted {
            return Ok(());
        }

        let referer_host = request
            .referer()
            .and_then(|r| url::Url::parse(r).ok())
            .and_then(|u| u.host_str().map(str::to_ascii_lowercase));
        if referer_host.as_deref() != Some(self.referer_host.to_ascii_lowercase().as_str()) {
            tracing::warn!(
                request_id = %request.request_id,
                referer = ?request.referer(),
                "Referer host rejected"
            );
            return Err(GatewayError::GateRejection("Referer not allowed".into()));
        }

        match request.client_ip {
            Some(ip) if self.allowed_ips.contains(&ip) => Ok(()),
            other => {
                tracing::warn!(request_id = %request.request_id, ip = ?other, "Client IP rejected");
                Err(GatewayError::GateRejection("Client address not allowed".into()))
            }
        }
    }

    /// Origin to echo in CORS headers.
    ///
    /// `Ok(None)` means the request may proceed without CORS headers.
    pub fn authorize_origin(
        &self,
        request: &InboundRequest,
    ) -> Result<Option<HeaderValue>, GatewayError> {
        let origin = request.origin();
        if !self.restricted {
            return Ok(origin.cloned());
        }

        match origin {
            Some(value) if self.origin_allowed(value) => Ok(Some(value.clone())),
            other => {
                tracing::warn!(request_id = %request.request_id, origin = ?other, "Origin rejected");
                Err(GatewayError::GateRejection("Origin not allowed".into()))
            }
        }
    }

    fn origin_allowed(&self, value: &HeaderValue) -> bool {
        let Ok(origin) = value.to_str() else {
            return false;
        };
        let origin = origin.trim_end_matches('/');
        if origin.eq_ignore_ascii_case(&self.allowed_domain) {
            return true;
        }
        url::Url::parse(origin)
            .ok()
            .filter(|u| u.scheme() == "https" && u.port().is_none())
            .and_then(|u| u.host_str().map(|h| h.eq_ignore_ascii_case(&self.allowed_domain)))
            .unwrap_or(false)
    }
}
