//! Logged HTTP transport
//!
//! Thin wrapper over `reqwest` that logs each request and response, and
//! turns every failure into a classified [`HttpError`].

use std::borrow::Cow;
use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

use super::classifier::{ErrorClassifier, HttpError, OperationCancelled};
use crate::config::AppConfig;
use crate::infrastructure::{InfraError, InfraResult};

/// Business cap on the outbound client timeout, tighter than the general
/// configuration range.
pub const MAX_CLIENT_TIMEOUT_SECONDS: u64 = 60;

/// Characters of an error response body written to the log.
const BODY_SNIPPET_CHARS: usize = 2000;

/// Outbound client settings derived from the configuration snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub user_agent: String,
}

impl HttpSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            timeout: Duration::from_secs(client_timeout_seconds(config.http_timeout_seconds)),
            user_agent: user_agent(),
        }
    }
}

/// Clamp a resolved timeout to `1..=60` seconds.
pub fn client_timeout_seconds(resolved: u64) -> u64 {
    resolved.clamp(1, MAX_CLIENT_TIMEOUT_SECONDS)
}

pub fn user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

/// HTTP client bound to one base URL.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    base_url: String,
    classifier: ErrorClassifier,
}

impl HttpClient {
    pub fn new(
        base_url: impl Into<String>,
        settings: &HttpSettings,
        classifier: ErrorClassifier,
    ) -> InfraResult<Self> {
        let inner = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.as_str())
            .build()
            .map_err(InfraError::HttpClient)?;
        Ok(Self {
            inner,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            classifier,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path` and return the body of a successful response.
    pub async fn get_text(&self, path: &str, query: &[(&str, String)]) -> Result<String, HttpError> {
        let url = format!("{}{}", self.base_url, path);
        let request = self
            .inner
            .get(&url)
            .query(query)
            .build()
            .map_err(|e| self.classifier.classify_error(e))?;
        let shown = request.url().to_string();

        info!("HTTP GET {shown}");
        let response = self
            .inner
            .execute(request)
            .await
            .map_err(|e| self.classifier.classify_error(e))?;
        let status = response.status();
        info!("HTTP {} GET {shown}", status.as_u16());

        if !status.is_success() {
            if let Ok(body) = response.text().await {
                warn!(
                    status = status.as_u16(),
                    body = %body_snippet(&body, BODY_SNIPPET_CHARS),
                    "unsuccessful response"
                );
            }
            return Err(self.classifier.classify_status(status));
        }

        response
            .text()
            .await
            .map_err(|e| self.classifier.classify_error(e))
    }
}

/// Run `operation` under an optional deadline, racing it against Ctrl-C.
/// Both an elapsed deadline and an interrupt classify as a timeout.
pub async fn with_deadline<T, F>(
    classifier: &ErrorClassifier,
    deadline: Option<Duration>,
    operation: F,
) -> Result<T, HttpError>
where
    F: Future<Output = Result<T, HttpError>>,
{
    let bounded = async {
        match deadline {
            Some(limit) => match tokio::time::timeout(limit, operation).await {
                Ok(result) => result,
                Err(elapsed) => Err(classifier.classify_error(elapsed)),
            },
            None => operation.await,
        }
    };

    tokio::select! {
        result = bounded => result,
        Ok(()) = tokio::signal::ctrl_c() => Err(classifier.classify_error(OperationCancelled)),
    }
}

fn body_snippet(body: &str, max_chars: usize) -> Cow<'_, str> {
    match body.char_indices().nth(max_chars) {
        Some((cut, _)) => Cow::Owned(format!("{}… [truncated]", &body[..cut])),
        None => Cow::Borrowed(body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_HTTP_TIMEOUT_SECONDS;
    use crate::exitcode::ErrorCategory;
    use rstest::rstest;

    #[rstest]
    #[case(1, 1)]
    #[case(30, 30)]
    #[case(60, 60)]
    #[case(100, 60)]
    #[case(300, 60)]
    fn given_resolved_timeout_when_configuring_client_then_clamps_to_sixty(
        #[case] resolved: u64,
        #[case] expected: u64,
    ) {
        assert_eq!(client_timeout_seconds(resolved), expected);
    }

    #[test]
    fn given_default_config_when_deriving_settings_then_uses_default_timeout() {
        let settings = HttpSettings::from_config(&AppConfig::default());
        assert_eq!(settings.timeout, Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECONDS));
        assert!(settings.user_agent.starts_with("archetype/"));
    }

    #[test]
    fn given_long_body_when_snipping_then_truncates_with_marker() {
        let body = "é".repeat(2500);
        let snippet = body_snippet(&body, BODY_SNIPPET_CHARS);
        assert!(snippet.ends_with("… [truncated]"));
        assert_eq!(snippet.chars().count(), 2000 + "… [truncated]".chars().count());
        assert_eq!(body_snippet("short", BODY_SNIPPET_CHARS), "short");
    }

    #[tokio::test]
    async fn given_slow_operation_when_deadline_elapses_then_classifies_timeout() {
        let classifier = ErrorClassifier::new();
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, HttpError>(())
        };

        let err = with_deadline(&classifier, Some(Duration::from_millis(10)), slow)
            .await
            .unwrap_err();

        assert_eq!(err.category(), ErrorCategory::Timeout);
        assert_eq!(err.exit_code(), 1);
    }

    #[tokio::test]
    async fn given_fast_operation_when_running_with_deadline_then_returns_value() {
        let classifier = ErrorClassifier::new();
        let value = with_deadline(&classifier, Some(Duration::from_secs(5)), async {
            Ok::<_, HttpError>(7)
        })
        .await
        .unwrap();
        assert_eq!(value, 7);
    }
}
