//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → gates, formatter and route bootstrap
//!
//! On change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → server rebuilds gates and swaps them atomically
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Routes are read at bootstrap only

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AuthConfig, DevOverrideConfig, EnvironmentConfig, FeedbackConfig, GatewayConfig, ListenerConfig,
    ObservabilityConfig, RateLimitConfig, ResponseConfig, RouteAccess, RouteConfig, RunMode,
    SecurityConfig, StaticTokenConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
