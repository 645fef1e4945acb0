//! Outbound-call failure classification
//!
//! Maps transport failures and unsuccessful status codes onto the
//! [`ErrorCategory`] taxonomy. Every classification mints a fresh
//! correlation id and logs the decision at debug level; nothing else.

use std::error::Error as StdError;
use std::fmt;
use std::io;

use reqwest::StatusCode;
use tracing::debug;
use uuid::Uuid;

use crate::exitcode::ErrorCategory;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

const TIMEOUT_MESSAGE: &str = "Request timed out. The server took too long to respond. \
    Try increasing the timeout with --timeout or check your network connection.";
const CONNECTIVITY_MESSAGE: &str =
    "Network connection failed. Please check your internet connection and try again.";
const NETWORK_MESSAGE: &str =
    "HTTP request failed. Please check your network connection and the target URL.";
const UNEXPECTED_MESSAGE: &str = "An unexpected error occurred while making the HTTP request.";

/// Explicit cancellation of an in-flight operation (e.g. Ctrl-C).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationCancelled;

impl fmt::Display for OperationCancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("operation cancelled")
    }
}

impl StdError for OperationCancelled {}

/// Classified outbound-call failure.
#[derive(Debug)]
pub struct HttpError {
    category: ErrorCategory,
    message: String,
    correlation_id: String,
    source: Option<BoxError>,
}

impl HttpError {
    fn new(category: ErrorCategory, message: impl Into<String>, source: Option<BoxError>) -> Self {
        Self {
            category,
            message: message.into(),
            correlation_id: Uuid::new_v4().simple().to_string(),
            source,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        self.category
    }

    /// User-facing message, never empty.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Always the registered code for [`Self::category`].
    pub fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for HttpError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

/// Stateless failure classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorClassifier;

impl ErrorClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify a raised failure. First matching rule wins:
    /// cancellation or elapsed deadline, socket-level failure, other
    /// transport failure, anything else.
    pub fn classify_error(&self, error: impl Into<BoxError>) -> HttpError {
        let error: BoxError = error.into();
        let (category, message) = Self::categorize(error.as_ref());
        let classified = HttpError::new(category, message, Some(error));
        debug!(
            category = %classified.category,
            exit_code = classified.exit_code(),
            correlation_id = %classified.correlation_id,
            cause = ?classified.source,
            "classified failure"
        );
        classified
    }

    /// Classify the status code of a completed but unsuccessful call.
    pub fn classify_status(&self, status: StatusCode) -> HttpError {
        let code = status.as_u16();
        let (category, message) = match code {
            400..=499 => (
                ErrorCategory::ClientError,
                format!(
                    "Request failed with status {code}. Please check your request parameters and try again."
                ),
            ),
            500..=u16::MAX => (
                ErrorCategory::ServerError,
                format!(
                    "Server error occurred (status {code}). The service may be temporarily unavailable. Please try again later."
                ),
            ),
            _ => (
                ErrorCategory::Unexpected,
                format!("Unexpected HTTP response (status {code})."),
            ),
        };
        let classified = HttpError::new(category, message, None);
        debug!(
            status = code,
            category = %classified.category,
            exit_code = classified.exit_code(),
            correlation_id = %classified.correlation_id,
            "classified response"
        );
        classified
    }

    fn categorize(error: &(dyn StdError + Send + Sync + 'static)) -> (ErrorCategory, &'static str) {
        let error: &(dyn StdError + 'static) = error;
        if is_timeout(error) {
            return (ErrorCategory::Timeout, TIMEOUT_MESSAGE);
        }
        if let Some(e) = error.downcast_ref::<reqwest::Error>() {
            if e.is_connect() || chain_contains::<io::Error>(error) {
                return (ErrorCategory::Network, CONNECTIVITY_MESSAGE);
            }
            if e.is_builder() || e.is_decode() {
                return (ErrorCategory::Unexpected, UNEXPECTED_MESSAGE);
            }
            return (ErrorCategory::Network, NETWORK_MESSAGE);
        }
        (ErrorCategory::Unexpected, UNEXPECTED_MESSAGE)
    }
}

fn is_timeout(error: &(dyn StdError + 'static)) -> bool {
    if error.is::<OperationCancelled>() || error.is::<tokio::time::error::Elapsed>() {
        return true;
    }
    if let Some(e) = error.downcast_ref::<reqwest::Error>() {
        if e.is_timeout() {
            return true;
        }
    }
    // A deadline elapsing deep in the stack surfaces as a timed-out io::Error.
    let mut current = Some(error);
    while let Some(e) = current {
        if e.downcast_ref::<io::Error>()
            .is_some_and(|io| io.kind() == io::ErrorKind::TimedOut)
        {
            return true;
        }
        current = e.source();
    }
    false
}

fn chain_contains<T: StdError + 'static>(error: &(dyn StdError + 'static)) -> bool {
    let mut current = error.source();
    while let Some(e) = current {
        if e.is::<T>() {
            return true;
        }
        current = e.source();
    }
    false
}
