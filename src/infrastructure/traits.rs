//! I/O boundary traits for testability
//!
//! Outbound lookups return the raw response body; interpreting it is the
//! caller's concern. Services hold these as `Arc<dyn ..>` so tests can
//! substitute fakes.

use futures::future::BoxFuture;

use super::http::HttpError;

/// Resolves the caller's approximate location from its public IP.
pub trait GeoIpLookup: Send + Sync {
    fn locate(&self) -> BoxFuture<'_, Result<String, HttpError>>;
}

/// Fetches current conditions for a coordinate pair.
pub trait WeatherLookup: Send + Sync {
    fn current_weather(&self, latitude: f64, longitude: f64) -> BoxFuture<'_, Result<String, HttpError>>;
}
