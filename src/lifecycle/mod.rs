//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build routes → Verify registry → Pipeline
//!
//! Shutdown (shutdown.rs):
//!     Trigger or Ctrl+C → Stop accepting → Drain in-flight requests → Exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then routes, then listeners
//! - Listeners start last, so traffic only arrives once the pipeline exists

pub mod shutdown;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{build_pipeline, StartupError};
