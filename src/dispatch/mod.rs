//! Handler dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Bootstrap:
//!     handler callables → registry.rs (HandlerId → Handler)
//!     → verify against both route tables (fail startup on gaps)
//!
//! Per request:
//!     matched route (HandlerId, Params)
//!     → registry.rs (resolve)
//!     → handler.rs (call with RequestContext, Params, Collaborators)
//!     → HandlerResponse | HandlerError
//! ```

pub mod context;
pub mod handler;
pub mod registry;

pub use context::{Collaborators, RequestContext};
pub use handler::{Handler, HandlerError, HandlerId, HandlerResponse};
pub use registry::{HandlerRegistry, RegistryError};
