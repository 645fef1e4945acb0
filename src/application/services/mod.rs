//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (GeoIpLookup, WeatherLookup)
//! but are themselves concrete structs, not traits.

mod hello;
mod settings;
mod weather;

pub use hello::greet;
pub use settings::{render_config, ConfigLocations};
pub use weather::{map_forecast, map_location, WeatherOutcome, WeatherRequest, WeatherService};
