//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Request passed the security gate:
//!     → gate.rs (bearer header, else ?token=)
//!     → credentials.rs (CredentialStore::resolve, may block)
//!     → identity.rs (AuthVerdict: Authenticated(Identity) | Rejected)
//!     → verdict picks the route table
//! ```
//!
//! # Design Decisions
//! - Computed once per request, right after the security gate
//! - Rejection is a routing fallback, not an abort
//! - Override flags are injected, never read from globals

pub mod credentials;
pub mod gate;
pub mod identity;

pub use credentials::{
    CredentialError, CredentialRecord, CredentialStatus, CredentialStore, InMemoryCredentialStore,
};
pub use gate::{extract_token, AuthGate, AuthSettings, INVALID_CREDENTIALS, NO_CREDENTIALS};
pub use identity::{AuthVerdict, Identity};
