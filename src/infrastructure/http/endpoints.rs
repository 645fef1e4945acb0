//! Base URLs of the outbound services, bound from the `Endpoints` section.

use crate::config::{BindSection, ConfigViolation, Rule, Section};

use super::geoip::DEFAULT_GEOIP_URL;
use super::weather::DEFAULT_OPEN_METEO_URL;

pub const ENDPOINTS_SECTION: &str = "Endpoints";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub geo_ip: String,
    pub open_meteo: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            geo_ip: DEFAULT_GEOIP_URL.to_string(),
            open_meteo: DEFAULT_OPEN_METEO_URL.to_string(),
        }
    }
}

impl BindSection for Endpoints {
    fn bind(&mut self, section: &Section<'_>, _violations: &mut Vec<ConfigViolation>) {
        section.bind_string("GeoIp", &mut self.geo_ip);
        section.bind_string("OpenMeteo", &mut self.open_meteo);
    }
}

fn http_url(field: &str, value: &str) -> Option<ConfigViolation> {
    let value = value.trim();
    let valid = value.starts_with("http://") || value.starts_with("https://");
    (!valid).then(|| {
        ConfigViolation::new(
            format!("{ENDPOINTS_SECTION}.{field}"),
            Some(value.to_string()),
            "must be an http:// or https:// URL",
        )
    })
}

fn geo_ip_url(e: &mut Endpoints) -> Option<ConfigViolation> {
    http_url("GeoIp", &e.geo_ip)
}

fn open_meteo_url(e: &mut Endpoints) -> Option<ConfigViolation> {
    http_url("OpenMeteo", &e.open_meteo)
}

pub const ENDPOINT_RULES: [Rule<Endpoints>; 2] = [geo_ip_url, open_meteo_url];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{bind_section, ConfigError, Layer, LayeredView};
    use std::collections::BTreeMap;

    fn view(env: &[(&str, &str)]) -> LayeredView {
        let env: BTreeMap<String, String> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LayeredView::from_layers([Layer::load_environment(&env).unwrap()])
    }

    #[test]
    fn given_no_section_when_binding_then_uses_public_services() {
        let endpoints: Endpoints = bind_section(&view(&[]), ENDPOINTS_SECTION, &ENDPOINT_RULES).unwrap();
        assert_eq!(endpoints, Endpoints::default());
    }

    #[test]
    fn given_override_when_binding_then_replaces_url() {
        let endpoints: Endpoints = bind_section(
            &view(&[("Endpoints__OpenMeteo", "http://127.0.0.1:8080")]),
            ENDPOINTS_SECTION,
            &ENDPOINT_RULES,
        )
        .unwrap();
        assert_eq!(endpoints.open_meteo, "http://127.0.0.1:8080");
        assert_eq!(endpoints.geo_ip, DEFAULT_GEOIP_URL);
    }

    #[test]
    fn given_non_http_urls_when_binding_then_reports_both() {
        let err = bind_section::<Endpoints>(
            &view(&[("Endpoints__GeoIp", "ftp://x"), ("Endpoints__OpenMeteo", " ")]),
            ENDPOINTS_SECTION,
            &ENDPOINT_RULES,
        )
        .unwrap_err();

        let ConfigError::Validation { violations, .. } = err else {
            panic!("expected validation error");
        };
        assert_eq!(violations.len(), 2);
    }
}
