//! Response handling and transformation.
//!
//! # Responsibilities
//! - Shape every JSON body as `{status, count?, message?, results|result}`
//! - Cap list payloads to the configured item limit
//! - Switch between terminating production output and layered development output
//!
//! # Design Decisions
//! - Every termination path produces a JSON body, except the OPTIONS preflight
//! - Development mode deliberately overrides the status to a diagnostic code

pub mod envelope;
pub mod formatter;

pub use envelope::{Envelope, EnvelopeStatus, Payload};
pub use formatter::{Formatted, ResponseFormatter};
