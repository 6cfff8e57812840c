//! Feedback and diagnostic bus.
//!
//! # Data Flow
//! ```text
//! Any stage or handler:
//!     ctx.feedback().record(severity, text)   (caller location captured)
//!     → request store (per request)  or  TestFeedbackStore[test id]
//!
//! Response formatter (development mode):
//!     → drain() into the devmode section
//!
//! Gate termination:
//!     → discard() (entries never surfaced)
//! ```
//!
//! Entries are diagnostic only and never change the HTTP status.

pub mod bus;

pub use bus::{FeedbackBus, FeedbackEntry, Origin, Severity, TestFeedbackStore};
