//! Current weather lookup
//!
//! Resolves coordinates (given, or via GeoIP), fetches current conditions
//! and maps them onto a [`WeatherReport`]. Each outbound call runs under the
//! caller's deadline and can be interrupted with Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use tracing::{debug, info, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{describe_weather_code, DomainError, Location, Units, WeatherReport, OPEN_METEO_SOURCE};
use crate::infrastructure::http::{with_deadline, ErrorClassifier, IpApiResponse, OpenMeteoResponse};
use crate::infrastructure::traits::{GeoIpLookup, WeatherLookup};

/// Observation time formats accepted from the provider.
const TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherRequest {
    /// Explicit coordinates; GeoIP is used when absent.
    pub coordinates: Option<(f64, f64)>,
    /// Per-call deadline.
    pub timeout: Option<Duration>,
    pub units: Units,
    /// Return the provider body instead of a report.
    pub raw: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WeatherOutcome {
    Report(WeatherReport),
    /// Provider JSON, verbatim. Only returned when it maps cleanly.
    Raw(String),
}

pub struct WeatherService {
    geoip: Arc<dyn GeoIpLookup>,
    weather: Arc<dyn WeatherLookup>,
    classifier: ErrorClassifier,
}

impl WeatherService {
    pub fn new(
        geoip: Arc<dyn GeoIpLookup>,
        weather: Arc<dyn WeatherLookup>,
        classifier: ErrorClassifier,
    ) -> Self {
        Self {
            geoip,
            weather,
            classifier,
        }
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn current(&self, request: &WeatherRequest) -> ApplicationResult<WeatherOutcome> {
        let location = match request.coordinates {
            Some((latitude, longitude)) => Location::new(latitude, longitude, None, None)?,
            None => self.locate(request.timeout).await?,
        };

        let body = with_deadline(
            &self.classifier,
            request.timeout,
            self.weather
                .current_weather(location.latitude(), location.longitude()),
        )
        .await?;

        let forecast: OpenMeteoResponse =
            serde_json::from_str(&body).map_err(|e| ApplicationError::Mapping {
                message: e.to_string(),
            })?;
        let report = map_forecast(&forecast, request.units)?;
        debug!(condition = %report.condition, "weather mapped");

        if request.raw {
            Ok(WeatherOutcome::Raw(body))
        } else {
            Ok(WeatherOutcome::Report(report))
        }
    }

    async fn locate(&self, timeout: Option<Duration>) -> ApplicationResult<Location> {
        let body = with_deadline(&self.classifier, timeout, self.geoip.locate()).await?;
        let response: IpApiResponse =
            serde_json::from_str(&body).map_err(|e| ApplicationError::Provider {
                message: format!("GeoIP provider returned an unreadable response: {e}"),
            })?;
        let location = map_location(response)?;
        info!(
            latitude = location.latitude(),
            longitude = location.longitude(),
            city = ?location.city,
            "location resolved via GeoIP"
        );
        Ok(location)
    }
}

/// GeoIP answer to a [`Location`]; provider-reported failures keep the
/// provider's message.
pub fn map_location(response: IpApiResponse) -> ApplicationResult<Location> {
    if !response.is_success() {
        return Err(ApplicationError::Provider {
            message: response
                .message
                .unwrap_or_else(|| "GeoIP provider returned failure.".to_string()),
        });
    }
    match (response.lat, response.lon) {
        (Some(latitude), Some(longitude)) => {
            Ok(Location::new(latitude, longitude, response.city, response.country)?)
        }
        _ => Err(ApplicationError::Provider {
            message: "GeoIP provider did not return coordinates.".to_string(),
        }),
    }
}

/// Open-Meteo answer to a [`WeatherReport`] in `units`.
pub fn map_forecast(response: &OpenMeteoResponse, units: Units) -> ApplicationResult<WeatherReport> {
    let current = response
        .current_weather
        .as_ref()
        .ok_or(DomainError::MissingField("current_weather"))?;
    let temperature = current
        .temperature
        .ok_or(DomainError::MissingField("temperature"))?;
    let time = current
        .time
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or(DomainError::MissingField("time"))?;
    let observed_at = parse_observation_time(time)?;

    let condition = describe_weather_code(current.weathercode.unwrap_or(-1));
    let report = WeatherReport::from_metric(
        temperature,
        current.windspeed.unwrap_or_default(),
        current.winddirection.unwrap_or_default().round() as i32,
        None,
        condition,
        observed_at,
        OPEN_METEO_SOURCE,
        units,
    )?;
    Ok(report)
}

fn parse_observation_time(time: &str) -> Result<NaiveDateTime, DomainError> {
    let time = time.trim().trim_end_matches('Z');
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(time, format).ok())
        .ok_or_else(|| DomainError::InvalidObservationTime(time.to_string()))
}
