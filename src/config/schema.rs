//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    /// Production or development behaviour (formatter, auth override).
    pub mode: RunMode,

    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Referer, IP and origin restrictions.
    pub environment: EnvironmentConfig,

    /// Method allowlist and response hardening.
    pub security: SecurityConfig,

    /// Fixed-window rate limiting (restricted environment only).
    pub rate_limit: RateLimitConfig,

    /// Authentication gate settings.
    pub auth: AuthConfig,

    /// Response formatting.
    pub response: ResponseConfig,

    /// Feedback bus settings.
    pub feedback: FeedbackConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Route definitions, registered in order.
    pub routes: Vec<RouteConfig>,
}

/// Run mode of the process.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Production,
    Development,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Environment restrictions applied by the security gate.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Restricted environments require referer, IP and origin to match.
    pub restricted: bool,

    /// The single origin allowed in a restricted environment
    /// (e.g., "https://app.example.org").
    pub allowed_domain: String,

    /// Host the Referer header must carry in a restricted environment.
    pub allowed_referer_host: String,

    /// Client IPs allowed in a restricted environment.
    pub allowed_ips: Vec<String>,
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SecurityConfig {
    /// HTTP methods accepted by the gateway.
    pub allowed_methods: Vec<String>,

    /// Request headers announced in CORS responses.
    pub allowed_headers: Vec<String>,

    /// `Strict-Transport-Security` max-age in seconds.
    pub hsts_max_age_secs: u64,

    /// Preflight cache lifetime in seconds.
    pub preflight_max_age_secs: u64,

    /// Maximum body size in bytes.
    pub max_body_size: usize,

    /// Cookie carrying the session identifier used for rate limiting.
    pub session_cookie: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            allowed_methods: ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            allowed_headers: ["Content-Type", "Authorization", "X-Requested-With"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
            hsts_max_age_secs: 31_536_000,
            preflight_max_age_secs: 86_400,
            max_body_size: 2 * 1024 * 1024, // 2MB
            session_cookie: "session_id".to_string(),
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting (applies in restricted environments).
    pub enabled: bool,

    /// Requests allowed per session per window.
    pub limit: u32,

    /// Window length in seconds.
    pub period_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            limit: 60,
            period_secs: 60,
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AuthConfig {
    /// Query parameter consulted when no bearer header is present.
    pub token_query_param: String,

    /// Development-only authentication bypass.
    pub dev_override: DevOverrideConfig,

    /// Tokens seeded into the in-memory credential store.
    pub tokens: Vec<StaticTokenConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_query_param: "token".to_string(),
            dev_override: DevOverrideConfig::default(),
            tokens: Vec::new(),
        }
    }
}

/// Development override. Only honoured in development mode with both flags set.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DevOverrideConfig {
    pub enabled: bool,
    pub logged_in: bool,
    pub user_id: String,
    pub permissions: Vec<String>,
}

impl Default for DevOverrideConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            logged_in: false,
            user_id: "dev-user".to_string(),
            permissions: Vec::new(),
        }
    }
}

/// A token known at startup.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct StaticTokenConfig {
    pub token: String,
    pub user_id: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Expiry as seconds since the Unix epoch.
    #[serde(default)]
    pub expires_at: Option<u64>,
    #[serde(default)]
    pub revoked: bool,
}

/// Response formatting configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ResponseConfig {
    /// Hard cap on list entries in any response.
    pub item_limit: usize,

    /// Status used for every response in development mode.
    pub diagnostic_status: u16,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            item_limit: 100,
            diagnostic_status: 403,
        }
    }
}

/// Feedback bus configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Route feedback of tagged requests into per-test stores.
    pub test_mode: bool,

    /// Header naming the test run.
    pub test_header: String,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            test_mode: false,
            test_header: "x-test-run".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable output.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Which table a configured route is registered into.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RouteAccess {
    #[default]
    Authenticated,
    Anonymous,
    Both,
}

/// Route configuration mapping a method and pattern to a handler.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RouteConfig {
    /// HTTP method (e.g., "GET").
    pub method: String,

    /// Path pattern, `:name` segments bind parameters.
    pub pattern: String,

    /// Handler in `Controller@action` form.
    pub handler: String,

    #[serde(default)]
    pub table: RouteAccess,

    /// Human-readable description exposed by route listings.
    #[serde(default)]
    pub doc: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: GatewayConfig = toml::from_str("").unwrap();
        assert_eq!(config, GatewayConfig::default());
        assert_eq!(config.mode, RunMode::Production);
        assert!(!config.environment.restricted);
        assert_eq!(config.response.item_limit, 100);
    }

    #[test]
    fn test_parse_full_config() {
        let raw = r#"
            mode = "development"

            [environment]
            restricted = true
            allowed_domain = "https://app.example.org"
            allowed_referer_host = "app.example.org"
            allowed_ips = ["10.0.0.1"]

            [rate_limit]
            limit = 5
            period_secs = 60

            [auth.dev_override]
            enabled = true
            logged_in = true

            [[auth.tokens]]
            token = "abc"
            user_id = "7"

            [[routes]]
            method = "GET"
            pattern = "/infractions/p/:page/pp/:perPage"
            handler = "Infractions@getAllInfractionsPaginated"

            [[routes]]
            method = "POST"
            pattern = "/login"
            handler = "Session@login"
            table = "anonymous"
            doc = "Exchange credentials for a token"
        "#;
        let config: GatewayConfig = toml::from_str(raw).unwrap();

        assert_eq!(config.mode, RunMode::Development);
        assert_eq!(config.environment.allowed_ips, vec!["10.0.0.1".to_string()]);
        assert_eq!(config.rate_limit.limit, 5);
        assert!(config.rate_limit.enabled);
        assert!(config.auth.dev_override.logged_in);
        assert_eq!(config.auth.tokens[0].expires_at, None);
        assert_eq!(config.routes[0].table, RouteAccess::Authenticated);
        assert_eq!(config.routes[1].table, RouteAccess::Anonymous);
        assert_eq!(config.routes[1].doc.as_deref(), Some("Exchange credentials for a token"));
    }
}
