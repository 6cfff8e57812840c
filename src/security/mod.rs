//! Security & rate-limit gate.
//!
//! # Data Flow
//! ```text
//! InboundRequest
//!     → access_control.rs (restricted: referer host + client IP)
//!     → access_control.rs (origin authorization)
//!     → headers.rs (hardening + CORS headers)
//!     → gate.rs (method allowlist, OPTIONS short-circuit)
//!     → rate_limit.rs (restricted: fixed window per session)
//!     → GateDecision
//! ```
//!
//! # Design Decisions
//! - Runs before authentication, so rejected traffic never reaches the
//!   credential store
//! - Fail closed: a restricted environment rejects anything it cannot verify

pub mod access_control;
pub mod gate;
pub mod headers;
pub mod rate_limit;

pub use access_control::EnvironmentPolicy;
pub use gate::{GateDecision, SecurityGate};
pub use headers::HeaderPolicy;
pub use rate_limit::{InMemorySessionStore, RateDecision, RateLimiter, RateState, SessionStore};
