//! ip-api.com GeoIP lookup

use futures::future::BoxFuture;
use serde::Deserialize;

use super::classifier::HttpError;
use super::client::HttpClient;
use crate::infrastructure::traits::GeoIpLookup;

pub const DEFAULT_GEOIP_URL: &str = "http://ip-api.com";

/// Wire format of `GET /json`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpApiResponse {
    pub status: Option<String>,
    pub message: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub city: Option<String>,
    pub region_name: Option<String>,
    pub country: Option<String>,
}

impl IpApiResponse {
    pub fn is_success(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("success"))
    }
}

pub struct GeoIpClient {
    http: HttpClient,
}

impl GeoIpClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

impl GeoIpLookup for GeoIpClient {
    fn locate(&self) -> BoxFuture<'_, Result<String, HttpError>> {
        Box::pin(self.http.get_text("/json", &[]))
    }
}
