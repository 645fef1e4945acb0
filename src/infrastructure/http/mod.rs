//! Outbound HTTP: transport, failure classification and provider clients

pub mod classifier;
pub mod client;
pub mod endpoints;
pub mod geoip;
pub mod weather;

pub use classifier::{ErrorClassifier, HttpError, OperationCancelled};
pub use client::{client_timeout_seconds, with_deadline, HttpClient, HttpSettings};
pub use endpoints::{Endpoints, ENDPOINTS_SECTION, ENDPOINT_RULES};
pub use geoip::{GeoIpClient, IpApiResponse};
pub use weather::{CurrentWeather, OpenMeteoClient, OpenMeteoResponse};
