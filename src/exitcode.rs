//! Stable process exit codes
//!
//! The single source of truth for the integer a failure category maps to.
//! Keep the set small and meaningful for scripting.

use std::fmt;

use serde::Serialize;

/// Operation succeeded
pub const SUCCESS: i32 = 0;

/// Network failure or timeout (DNS, connection refused, TLS, cancelled)
pub const NETWORK_OR_TIMEOUT: i32 = 1;

/// Command line validation error or HTTP 4xx client error
pub const VALIDATION_OR_CLIENT_ERROR: i32 = 2;

/// HTTP 5xx server error
pub const SERVER_ERROR: i32 = 3;

/// Unexpected failure
pub const UNEXPECTED: i32 = 4;

/// Failure taxonomy for outbound calls.
///
/// Validation failures never get here: they are resolved inside the router
/// and map to [`VALIDATION_OR_CLIENT_ERROR`] directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorCategory {
    Network,
    Timeout,
    ClientError,
    ServerError,
    Unexpected,
}

impl ErrorCategory {
    /// Exit code registered for this category.
    pub const fn exit_code(self) -> i32 {
        match self {
            ErrorCategory::Network | ErrorCategory::Timeout => NETWORK_OR_TIMEOUT,
            ErrorCategory::ClientError => VALIDATION_OR_CLIENT_ERROR,
            ErrorCategory::ServerError => SERVER_ERROR,
            ErrorCategory::Unexpected => UNEXPECTED,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::ClientError => "client-error",
            ErrorCategory::ServerError => "server-error",
            ErrorCategory::Unexpected => "unexpected",
        };
        f.write_str(name)
    }
}
