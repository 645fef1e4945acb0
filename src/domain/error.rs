//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violated invariants of domain values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("latitude must be between -90 and 90 degrees, got {0}")]
    InvalidLatitude(f64),

    #[error("longitude must be between -180 and 180 degrees, got {0}")]
    InvalidLongitude(f64),

    #[error("{0} is required but was not provided")]
    MissingField(&'static str),

    #[error("invalid observation time format: {0}")]
    InvalidObservationTime(String),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
