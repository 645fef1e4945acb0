//! Infrastructure layer: outbound HTTP, logging and the application context
//!
//! This layer implements the I/O boundary traits and wires up services.

pub mod context;
pub mod error;
pub mod http;
pub mod logging;
pub mod traits;

pub use context::AppContext;
pub use error::{InfraError, InfraResult};
