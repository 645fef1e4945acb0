//! Open-Meteo current weather

use futures::future::BoxFuture;
use serde::Deserialize;

use super::classifier::HttpError;
use super::client::HttpClient;
use crate::infrastructure::traits::WeatherLookup;

pub const DEFAULT_OPEN_METEO_URL: &str = "https://api.open-meteo.com";

pub const FORECAST_PATH: &str = "/v1/forecast";

/// Wire format of `GET /v1/forecast?current_weather=true`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OpenMeteoResponse {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub current_weather: Option<CurrentWeather>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CurrentWeather {
    /// °C
    pub temperature: Option<f64>,
    /// km/h
    pub windspeed: Option<f64>,
    pub winddirection: Option<f64>,
    pub weathercode: Option<i32>,
    /// ISO-8601 UTC, minute precision
    pub time: Option<String>,
}

pub struct OpenMeteoClient {
    http: HttpClient,
}

impl OpenMeteoClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

impl WeatherLookup for OpenMeteoClient {
    fn current_weather(&self, latitude: f64, longitude: f64) -> BoxFuture<'_, Result<String, HttpError>> {
        Box::pin(async move {
            let query = [
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("current_weather", "true".to_string()),
            ];
            self.http.get_text(FORECAST_PATH, &query).await
        })
    }
}
