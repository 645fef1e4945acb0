//! Layered key/value view
//!
//! Each source is parsed on its own with the `config` crate and normalised
//! into a [`Node`] tree. Layers are then merged in strict order, later layers
//! overwriting earlier ones key by key. Keys compare case-insensitively and
//! ignore `_`/`-`, so `HttpTimeoutSeconds`, `httptimeoutseconds` and
//! `http_timeout_seconds` address the same value.
//!
//! A key can hold a value or nested keys, not both. When the two meet, the
//! nested keys are kept and the value is reported as a violation.

use std::collections::BTreeMap;
use std::path::Path;

use config::{Config, Environment, File, FileFormat, Source, Value, ValueKind};
use tracing::{debug, instrument};

use super::binding::Section;
use super::sources::ConfigSources;
use super::{ConfigError, ConfigResult, ConfigViolation};

/// Nested configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Value(String),
    Table(BTreeMap<String, Node>),
}

/// One parsed source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    pub name: String,
    pub root: BTreeMap<String, Node>,
    /// Values dropped while normalising this layer.
    pub violations: Vec<ConfigViolation>,
}

impl Layer {
    /// Build a layer from raw `config` values.
    pub fn from_table(name: impl Into<String>, table: config::Map<String, Value>) -> Self {
        let mut violations = Vec::new();
        let root = normalize_table(table, "", &mut violations);
        Self {
            name: name.into(),
            root,
            violations,
        }
    }

    /// Every value this layer dropped.
    pub fn violations(&self) -> &[ConfigViolation] {
        &self.violations
    }

    /// Parse a settings file. Returns `Ok(None)` when the file does not exist.
    pub fn load_file(path: &Path, format: FileFormat) -> ConfigResult<Option<Self>> {
        if !path.is_file() {
            return Ok(None);
        }
        let load_err = |e: config::ConfigError| ConfigError::Load {
            path: path.to_path_buf(),
            message: e.to_string(),
        };
        let parsed = Config::builder()
            .add_source(File::new(&path.to_string_lossy(), format).required(true))
            .build()
            .map_err(load_err)?;
        let table = parsed.collect().map_err(load_err)?;
        Ok(Some(Self::from_table(path.display().to_string(), table)))
    }

    /// Parse environment variables, `__` separating nested keys.
    pub fn load_environment(env: &BTreeMap<String, String>) -> ConfigResult<Self> {
        let env_err = |e: config::ConfigError| ConfigError::Environment {
            message: e.to_string(),
        };
        let shadowed = shadowed_env_keys(env);
        let map: config::Map<String, String> = env
            .iter()
            .filter(|(k, _)| !shadowed.contains(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let parsed = Config::builder()
            .add_source(Environment::default().separator("__").source(Some(map)))
            .build()
            .map_err(env_err)?;
        let table = parsed.collect().map_err(env_err)?;

        let mut layer = Self::from_table("environment", table);
        layer.violations.extend(shadowed.into_iter().map(|key| {
            ConfigViolation::new(key.clone(), env.get(key).cloned(), "has nested keys, value ignored")
        }));
        Ok(layer)
    }
}

/// Variables that are also the parent of other variables (`App` next to
/// `App__HttpTimeoutSeconds`).
fn shadowed_env_keys(env: &BTreeMap<String, String>) -> Vec<&String> {
    let paths: Vec<Vec<String>> = env
        .keys()
        .map(|key| key.split("__").map(normalize_key).collect())
        .collect();
    env.keys()
        .zip(&paths)
        .filter(|(_, path)| {
            paths
                .iter()
                .any(|other| other.len() > path.len() && other.starts_with(path.as_slice()))
        })
        .map(|(key, _)| key)
        .collect()
}

/// Merged view over all layers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayeredView {
    root: BTreeMap<String, Node>,
    applied: Vec<String>,
    conflicts: Vec<ConfigViolation>,
}

impl LayeredView {
    /// Merge layers in the given order; later layers win.
    pub fn from_layers(layers: impl IntoIterator<Item = Layer>) -> Self {
        let mut view = Self::default();
        for layer in layers {
            view.push(layer);
        }
        view
    }

    /// Build the standard stack: base file, environment file, environment
    /// variables. Sources that fail to parse are skipped and reported.
    #[instrument(level = "debug", skip(sources), fields(dir = %sources.dir().display()))]
    pub fn build(sources: &ConfigSources, environment: &str) -> (Self, Vec<ConfigViolation>) {
        let mut view = Self::default();
        let mut violations = Vec::new();

        let files = sources
            .base_files()
            .into_iter()
            .chain(sources.environment_files(environment));
        for (path, format) in files {
            match Layer::load_file(&path, format) {
                Ok(Some(layer)) => view.push(layer),
                Ok(None) => debug!("skipping missing {}", path.display()),
                Err(e) => violations.push(ConfigViolation::new(
                    path.display().to_string(),
                    None,
                    format!("ignored: {e}"),
                )),
            }
        }

        match Layer::load_environment(sources.env()) {
            Ok(layer) => view.push(layer),
            Err(e) => violations.push(ConfigViolation::new(
                "environment",
                None,
                format!("ignored: {e}"),
            )),
        }

        violations.extend(view.conflicts.iter().cloned());
        (view, violations)
    }

    fn push(&mut self, layer: Layer) {
        debug!(layer = %layer.name, keys = layer.root.len(), "applying layer");
        self.conflicts.extend(layer.violations);
        merge(&mut self.root, layer.root, "", &mut self.conflicts);
        self.applied.push(layer.name);
    }

    /// Values dropped because they collided with nested keys.
    pub fn conflicts(&self) -> &[ConfigViolation] {
        &self.conflicts
    }

    /// Names of the layers that contributed, in application order.
    pub fn applied(&self) -> &[String] {
        &self.applied
    }

    /// Top-level (flat) keys.
    pub fn root(&self) -> Section<'_> {
        Section::new("", Some(&self.root))
    }

    /// A named top-level section.
    pub fn section(&self, name: &str) -> Section<'_> {
        self.root().section(name)
    }
}

/// Canonical key form used for lookups.
pub fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

fn child_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn merge(
    into: &mut BTreeMap<String, Node>,
    from: BTreeMap<String, Node>,
    path: &str,
    conflicts: &mut Vec<ConfigViolation>,
) {
    for (key, node) in from {
        let child = child_path(path, &key);
        match into.get_mut(&key) {
            Some(slot) => merge_node(slot, node, &child, conflicts),
            None => {
                into.insert(key, node);
            }
        }
    }
}

/// Later wins, except that a value never replaces nested keys.
fn merge_node(slot: &mut Node, incoming: Node, path: &str, conflicts: &mut Vec<ConfigViolation>) {
    match (slot, incoming) {
        (Node::Table(existing), Node::Table(incoming)) => merge(existing, incoming, path, conflicts),
        (Node::Table(_), Node::Value(value)) => conflicts.push(ConfigViolation::new(
            path,
            Some(value),
            "has nested keys, value ignored",
        )),
        (slot, incoming) => {
            if let (Node::Value(old), Node::Table(_)) = (&*slot, &incoming) {
                conflicts.push(ConfigViolation::new(
                    path,
                    Some(old.clone()),
                    "replaced by nested keys",
                ));
            }
            *slot = incoming;
        }
    }
}

fn normalize_table(
    table: config::Map<String, Value>,
    path: &str,
    conflicts: &mut Vec<ConfigViolation>,
) -> BTreeMap<String, Node> {
    // Sort by original spelling so duplicate normalised keys resolve the same way every run.
    let ordered: BTreeMap<String, Value> = table.into_iter().collect();
    let mut out = BTreeMap::new();
    for (key, value) in ordered {
        let key = normalize_key(&key);
        let child = child_path(path, &key);
        if let Some(node) = node_from_value(value, &child, conflicts) {
            match out.get_mut(&key) {
                Some(slot) => merge_node(slot, node, &child, conflicts),
                None => {
                    out.insert(key, node);
                }
            }
        }
    }
    out
}

fn node_from_value(value: Value, path: &str, conflicts: &mut Vec<ConfigViolation>) -> Option<Node> {
    match value.kind {
        ValueKind::Nil => None,
        ValueKind::Table(table) => Some(Node::Table(normalize_table(table, path, conflicts))),
        // Arrays address their elements by index, like any other table.
        ValueKind::Array(items) => Some(Node::Table(
            items
                .into_iter()
                .enumerate()
                .filter_map(|(i, item)| {
                    let index = i.to_string();
                    let node = node_from_value(item, &child_path(path, &index), conflicts)?;
                    Some((index, node))
                })
                .collect(),
        )),
        ValueKind::String(s) => Some(Node::Value(s)),
        other => Some(Node::Value(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(v: &str) -> Node {
        Node::Value(v.to_string())
    }

    fn layer(name: &str, entries: &[(&str, Node)]) -> Layer {
        Layer {
            name: name.to_string(),
            root: entries
                .iter()
                .map(|(k, v)| (normalize_key(k), v.clone()))
                .collect(),
            violations: Vec::new(),
        }
    }

    #[test]
    fn given_mixed_spellings_when_normalizing_then_keys_collapse() {
        assert_eq!(normalize_key("HttpTimeoutSeconds"), "httptimeoutseconds");
        assert_eq!(normalize_key("http_timeout_seconds"), "httptimeoutseconds");
        assert_eq!(normalize_key("HTTP-TIMEOUT-SECONDS"), "httptimeoutseconds");
    }

    #[test]
    fn given_colliding_keys_when_merging_then_later_layer_wins() {
        let view = LayeredView::from_layers([
            layer("base", &[("LogLevel", leaf("Debug"))]),
            layer("env", &[("loglevel", leaf("Warning"))]),
        ]);
        assert_eq!(view.root().get("LOG_LEVEL"), Some("Warning"));
        assert_eq!(view.applied(), ["base", "env"]);
    }

    #[test]
    fn given_nested_tables_when_merging_then_siblings_survive() {
        let base = layer(
            "base",
            &[(
                "App",
                Node::Table(BTreeMap::from([
                    ("environment".to_string(), leaf("Staging")),
                    ("loglevel".to_string(), leaf("Debug")),
                ])),
            )],
        );
        let overlay = layer(
            "overlay",
            &[(
                "app",
                Node::Table(BTreeMap::from([("loglevel".to_string(), leaf("Error"))])),
            )],
        );

        let view = LayeredView::from_layers([base, overlay]);
        let app = view.section("App");
        assert_eq!(app.get("Environment"), Some("Staging"));
        assert_eq!(app.get("LogLevel"), Some("Error"));
    }

    #[test]
    fn given_env_map_with_double_underscore_when_loading_then_nests() {
        let env = BTreeMap::from([
            ("App__HttpTimeoutSeconds".to_string(), "45".to_string()),
            ("LogLevel".to_string(), "Debug".to_string()),
        ]);
        let view = LayeredView::from_layers([Layer::load_environment(&env).unwrap()]);

        assert_eq!(view.section("app").get("httpTimeoutSeconds"), Some("45"));
        assert_eq!(view.root().get("loglevel"), Some("Debug"));
    }

    #[test]
    fn given_missing_file_when_loading_then_returns_none() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("appsettings.json");
        assert!(Layer::load_file(&missing, FileFormat::Json).unwrap().is_none());
    }

    #[test]
    fn given_malformed_file_when_loading_then_returns_load_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("appsettings.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = Layer::load_file(&path, FileFormat::Json).unwrap_err();
        assert!(matches!(err, ConfigError::Load { .. }));
    }

    #[test]
    fn given_env_value_and_nested_keys_when_loading_then_nested_keys_win() {
        let env = BTreeMap::from([
            ("APP".to_string(), "x".to_string()),
            ("App__HttpTimeoutSeconds".to_string(), "45".to_string()),
        ]);

        let layer = Layer::load_environment(&env).unwrap();

        assert_eq!(layer.violations().len(), 1, "{:?}", layer.violations());
        assert_eq!(layer.violations()[0].field, "APP");
        assert_eq!(layer.violations()[0].value.as_deref(), Some("x"));
        let view = LayeredView::from_layers([layer]);
        assert_eq!(view.section("App").get("HttpTimeoutSeconds"), Some("45"));
    }

    #[test]
    fn given_value_in_later_layer_when_merging_then_nested_keys_survive() {
        let base = layer(
            "base",
            &[(
                "App",
                Node::Table(BTreeMap::from([("loglevel".to_string(), leaf("Debug"))])),
            )],
        );
        let overlay = layer("overlay", &[("app", leaf("x"))]);

        let view = LayeredView::from_layers([base, overlay]);

        assert_eq!(view.section("App").get("LogLevel"), Some("Debug"));
        assert_eq!(view.conflicts().len(), 1);
        assert_eq!(view.conflicts()[0].field, "app");
        assert_eq!(view.conflicts()[0].reason, "has nested keys, value ignored");
    }

    #[test]
    fn given_nested_keys_in_later_layer_when_merging_then_replace_value_and_report() {
        let base = layer("base", &[("App", leaf("x"))]);
        let overlay = layer(
            "overlay",
            &[(
                "app",
                Node::Table(BTreeMap::from([("loglevel".to_string(), leaf("Error"))])),
            )],
        );

        let view = LayeredView::from_layers([base, overlay]);

        assert_eq!(view.section("App").get("LogLevel"), Some("Error"));
        assert_eq!(view.conflicts()[0].reason, "replaced by nested keys");
    }
}
