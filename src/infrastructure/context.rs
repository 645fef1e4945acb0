//! Application context
//!
//! Constructed once in `main` and passed by reference to everything that
//! needs configuration, logging or outbound clients. The configuration
//! snapshot is resolved on first access and frozen; logging is installed at
//! most once.

use std::sync::{Arc, Once, OnceLock};

use tracing::{debug, warn};

use crate::config::{
    bind_section, AppConfig, ConfigError, ConfigResolver, ConfigResult, ConfigSources, ConfigViolation, LiveConfig,
    Resolution,
};
use crate::infrastructure::http::{
    Endpoints, ErrorClassifier, GeoIpClient, HttpClient, HttpSettings, OpenMeteoClient, ENDPOINTS_SECTION,
    ENDPOINT_RULES,
};
use crate::infrastructure::logging;
use crate::infrastructure::traits::{GeoIpLookup, WeatherLookup};
use crate::infrastructure::InfraResult;

struct Snapshot {
    resolution: Resolution,
    endpoints: Endpoints,
    /// Reasons the `Endpoints` section fell back to defaults.
    endpoint_violations: Vec<ConfigViolation>,
}

pub struct AppContext {
    sources: ConfigSources,
    snapshot: OnceLock<Snapshot>,
    logging: Once,
    classifier: ErrorClassifier,
}

impl AppContext {
    pub fn new(sources: ConfigSources) -> Self {
        Self {
            sources,
            snapshot: OnceLock::new(),
            logging: Once::new(),
            classifier: ErrorClassifier::new(),
        }
    }

    /// Context for the running process.
    pub fn from_process() -> Self {
        Self::new(ConfigSources::from_process())
    }

    pub fn sources(&self) -> &ConfigSources {
        &self.sources
    }

    fn snapshot(&self) -> &Snapshot {
        self.snapshot.get_or_init(|| {
            let resolution = ConfigResolver::new(&self.sources).resolve_with_report();
            let (endpoints, endpoint_violations) =
                match bind_section(&resolution.view, ENDPOINTS_SECTION, &ENDPOINT_RULES) {
                    Ok(endpoints) => (endpoints, Vec::new()),
                    Err(ConfigError::Validation { violations, .. }) => (Endpoints::default(), violations),
                    Err(e) => (
                        Endpoints::default(),
                        vec![ConfigViolation::new(ENDPOINTS_SECTION, None, e.to_string())],
                    ),
                };
            Snapshot {
                resolution,
                endpoints,
                endpoint_violations,
            }
        })
    }

    /// Frozen startup snapshot. Never changes once read.
    pub fn config(&self) -> &AppConfig {
        &self.snapshot().resolution.config
    }

    /// Snapshot plus diagnostics.
    pub fn resolution(&self) -> &Resolution {
        &self.snapshot().resolution
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.snapshot().endpoints
    }

    /// Why [`Self::endpoints`] holds the defaults, if it does.
    pub fn endpoint_violations(&self) -> &[ConfigViolation] {
        &self.snapshot().endpoint_violations
    }

    /// Opt-in view that follows settings file changes. May disagree with
    /// [`Self::config`] after a reload.
    pub fn live_config(&self) -> ConfigResult<LiveConfig> {
        LiveConfig::watch(self.sources.clone())
    }

    /// Install logging from the snapshot, then report configuration
    /// violations. Later calls are no-ops.
    pub fn init_logging(&self) {
        self.logging.call_once(|| {
            let verbose = logging::verbose_requested(
                self.sources.env().get(logging::VERBOSE_VARIABLE).map(String::as_str),
            );
            logging::init(self.config().log_level, verbose);

            let resolution = self.resolution();
            for violation in &resolution.violations {
                warn!("configuration: {violation}");
            }
            for violation in self.endpoint_violations() {
                warn!("configuration: {violation}; using default endpoints");
            }
            debug!(
                environment = %resolution.environment_name,
                layers = ?resolution.layers,
                "configuration loaded"
            );
        });
    }

    pub fn classifier(&self) -> ErrorClassifier {
        self.classifier
    }

    /// Outbound client settings with the business timeout cap applied.
    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings::from_config(self.config())
    }

    pub fn geoip_client(&self) -> InfraResult<Arc<dyn GeoIpLookup>> {
        let http = HttpClient::new(&self.endpoints().geo_ip, &self.http_settings(), self.classifier)?;
        Ok(Arc::new(GeoIpClient::new(http)))
    }

    pub fn weather_client(&self) -> InfraResult<Arc<dyn WeatherLookup>> {
        let http = HttpClient::new(&self.endpoints().open_meteo, &self.http_settings(), self.classifier)?;
        Ok(Arc::new(OpenMeteoClient::new(http)))
    }
}
