//! The client/server handler contract
//!
//! Front-ends talk to the core through string-keyed methods carrying JSON
//! payloads. `handlers` holds the registry and the handler functions,
//! `types` the request/response shapes, and `reason` the string-tagged
//! reason codes failed requests resolve with.

pub mod handlers;
pub mod reason;
pub mod types;

pub use handlers::{ApiContext, HandlerRegistry};
