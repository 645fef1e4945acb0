//! Domain entities: core data structures

use std::fmt;

use chrono::NaiveDateTime;

use super::error::{DomainError, DomainResult};

/// km/h to mph
const KMH_TO_MPH: f64 = 0.621371;

/// Provider name recorded on reports built from Open-Meteo data.
pub const OPEN_METEO_SOURCE: &str = "open-meteo";

/// A geographical position with optional place names.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    latitude: f64,
    longitude: f64,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl Location {
    /// Validates latitude in `[-90, 90]` and longitude in `[-180, 180]`.
    pub fn new(
        latitude: f64,
        longitude: f64,
        city: Option<String>,
        country: Option<String>,
    ) -> DomainResult<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(DomainError::InvalidLatitude(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(DomainError::InvalidLongitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
            city,
            country,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Unit system for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Units {
    /// °C and km/h
    #[default]
    Metric,
    /// °F and mph
    Imperial,
}

impl Units {
    pub fn temperature_symbol(self) -> &'static str {
        match self {
            Units::Metric => "C",
            Units::Imperial => "F",
        }
    }

    pub fn speed_label(self) -> &'static str {
        match self {
            Units::Metric => "km/h",
            Units::Imperial => "mph",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Units::Metric => f.write_str("metric"),
            Units::Imperial => f.write_str("imperial"),
        }
    }
}

/// Current conditions at one place and time.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub temperature: f64,
    pub units: Units,
    pub condition: String,
    /// UTC observation time
    pub observed_at: NaiveDateTime,
    pub source: String,
    pub wind_speed: f64,
    /// Degrees, meteorological convention
    pub wind_direction: i32,
    /// Relative humidity in percent, when the provider reports it
    pub humidity: Option<u8>,
}

impl WeatherReport {
    /// Build a report from metric provider values, converting to `units` and
    /// rounding temperature and wind speed to one decimal.
    #[allow(clippy::too_many_arguments)]
    pub fn from_metric(
        temperature_c: f64,
        wind_speed_kmh: f64,
        wind_direction: i32,
        humidity: Option<u8>,
        condition: impl Into<String>,
        observed_at: NaiveDateTime,
        source: impl Into<String>,
        units: Units,
    ) -> DomainResult<Self> {
        let condition = condition.into();
        let source = source.into();
        if condition.trim().is_empty() {
            return Err(DomainError::MissingField("condition"));
        }
        if source.trim().is_empty() {
            return Err(DomainError::MissingField("source"));
        }

        let (temperature, wind_speed) = match units {
            Units::Metric => (temperature_c, wind_speed_kmh),
            Units::Imperial => (
                celsius_to_fahrenheit(temperature_c),
                wind_speed_kmh * KMH_TO_MPH,
            ),
        };

        Ok(Self {
            temperature: round1(temperature),
            units,
            condition,
            observed_at,
            source,
            wind_speed: round1(wind_speed),
            wind_direction,
            humidity,
        })
    }
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
