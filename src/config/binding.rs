//! Explicit section binding
//!
//! Typed configuration structures bind themselves from a [`Section`] through
//! [`BindSection`]; an ordered list of [`Rule`]s then validates (and may
//! repair) the bound value. Violations are aggregated, never short-circuited.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use super::layers::{normalize_key, LayeredView, Node};
use super::{ConfigError, ConfigResult, ConfigViolation};

/// Read view over one table of the layered configuration.
#[derive(Debug, Clone)]
pub struct Section<'a> {
    path: String,
    table: Option<&'a BTreeMap<String, Node>>,
}

impl<'a> Section<'a> {
    pub(crate) fn new(path: impl Into<String>, table: Option<&'a BTreeMap<String, Node>>) -> Self {
        Self {
            path: path.into(),
            table,
        }
    }

    /// Whether any source supplied this section.
    pub fn exists(&self) -> bool {
        self.table.is_some()
    }

    /// Dotted path of this section, empty for the root.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Scalar value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&'a str> {
        match self.table?.get(&normalize_key(key))? {
            Node::Value(v) => Some(v.as_str()),
            Node::Table(_) => None,
        }
    }

    /// Child section for `key`. Missing children yield an empty section.
    pub fn section(&self, key: &str) -> Section<'a> {
        let table = self.table.and_then(|t| match t.get(&normalize_key(key)) {
            Some(Node::Table(child)) => Some(child),
            _ => None,
        });
        Section::new(self.field(key), table)
    }

    /// Dotted field name for messages.
    pub fn field(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.path, key)
        }
    }

    /// Overwrite `target` when `key` is present.
    pub fn bind_string(&self, key: &str, target: &mut String) {
        if let Some(value) = self.get(key) {
            *target = value.to_string();
        }
    }

    /// Parse and overwrite `target` when `key` is present; an unparsable
    /// value leaves `target` untouched and records a violation.
    pub fn bind_parsed<T>(&self, key: &str, target: &mut T, violations: &mut Vec<ConfigViolation>)
    where
        T: FromStr,
        T::Err: Display,
    {
        if let Some(raw) = self.get(key) {
            match raw.trim().parse::<T>() {
                Ok(value) => *target = value,
                Err(e) => violations.push(ConfigViolation::new(
                    self.field(key),
                    Some(raw.to_string()),
                    format!("cannot parse: {e}"),
                )),
            }
        }
    }
}

/// A structure that binds its fields from a configuration section.
pub trait BindSection {
    /// Overwrite fields present in `section`; leave the rest untouched.
    fn bind(&mut self, section: &Section<'_>, violations: &mut Vec<ConfigViolation>);
}

/// Validation step evaluated after binding. May normalise the value in place;
/// returns a violation when the value was rejected or repaired.
pub type Rule<T> = fn(&mut T) -> Option<ConfigViolation>;

/// Evaluate `rules` in order, collecting every violation.
pub fn apply_rules<T>(value: &mut T, rules: &[Rule<T>]) -> Vec<ConfigViolation> {
    rules.iter().filter_map(|rule| rule(value)).collect()
}

/// Bind `T` from the named top-level section and validate it strictly.
///
/// Fields absent from every source keep their `Default` values. Any parse
/// failure or rule violation rejects the whole section, reporting all of
/// them.
pub fn bind_section<T>(view: &LayeredView, name: &str, rules: &[Rule<T>]) -> ConfigResult<T>
where
    T: BindSection + Default,
{
    let section = view.section(name);
    let mut value = T::default();
    let mut violations = Vec::new();
    value.bind(&section, &mut violations);
    violations.extend(apply_rules(&mut value, rules));

    if violations.is_empty() {
        Ok(value)
    } else {
        Err(ConfigError::Validation {
            section: name.to_string(),
            violations,
        })
    }
}
