//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at bootstrap):
//!     RouteConfig[] / RouterBuilder calls
//!     → table.rs (ordered RouteTable per access mode)
//!     → router.rs (freeze as immutable DualModeRouter)
//!
//! Incoming Request (verdict, method, path):
//!     → router.rs (pick authenticated or anonymous table)
//!     → table.rs (first matching route in registration order)
//!     → matcher.rs (fixed-arity segment match, bind params)
//!     → Return: RouteMatch or 401 / 404
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path
//! - Deterministic: same input always matches same route
//! - First match wins (ordered by registration)

pub mod matcher;
pub mod router;
pub mod table;

pub use matcher::{match_path, Params, RoutePattern, Segment};
pub use router::{DualModeRouter, RouteMatch, RouterBuilder, TableKind};
pub use table::{Route, RouteInfo, RouteTable};
