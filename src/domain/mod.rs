//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod entities;
pub mod error;
pub mod report;
pub mod weather_code;

pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use report::render_report;
pub use weather_code::describe_weather_code;
