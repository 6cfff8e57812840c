//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Gates, router, dispatch and the HTTP layer produce:
//!     → logging.rs (structured tracing events, request_id field)
//!     → metrics.rs (counters and a latency histogram)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Recording a metric without an installed exporter is a no-op, so the
//!   pipeline records unconditionally
//! - `RUST_LOG` overrides the configured level

pub mod logging;
pub mod metrics;
