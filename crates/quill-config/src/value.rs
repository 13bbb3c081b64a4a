/*
 * value.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Configuration tree values and dotted-path lookup.

use crate::error::{ConfigError, ConfigResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A node in a configuration tree.
///
/// Maps keep insertion order, so stringifying a subtree is deterministic.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// An explicit `null`.
    #[default]
    Null,

    /// A boolean value.
    Bool(bool),

    /// A numeric value.
    Number(serde_json::Number),

    /// A string value.
    String(String),

    /// An ordered sequence.
    List(Vec<ConfigValue>),

    /// A nested configuration object.
    Map(IndexMap<String, ConfigValue>),
}

impl ConfigValue {
    /// Create an empty map.
    pub fn map() -> Self {
        ConfigValue::Map(IndexMap::new())
    }

    /// Parse a JSON document into a configuration tree.
    pub fn from_json_str(text: &str) -> ConfigResult<Self> {
        serde_json::from_str(text).map_err(|e| ConfigError::Parse {
            format: "JSON",
            message: e.to_string(),
        })
    }

    /// Parse a YAML document into a configuration tree.
    pub fn from_yaml_str(text: &str) -> ConfigResult<Self> {
        serde_yaml::from_str(text).map_err(|e| ConfigError::Parse {
            format: "YAML",
            message: e.to_string(),
        })
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, ConfigValue>> {
        match self {
            ConfigValue::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_map(&self) -> bool {
        matches!(self, ConfigValue::Map(_))
    }

    /// Get a nested value by path segments.
    ///
    /// Map entries are addressed by key and list elements by their decimal
    /// index, so `["arrs", "0"]` reaches the first element of `arrs`.
    /// Returns `None` when any segment is missing; it never fails otherwise.
    pub fn lookup(&self, path: &[&str]) -> Option<&ConfigValue> {
        let Some((first, rest)) = path.split_first() else {
            return Some(self);
        };

        let child = match self {
            ConfigValue::Map(m) => m.get(*first),
            ConfigValue::List(items) => first.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }?;
        child.lookup(rest)
    }

    /// Get a nested value by dotted path (`nest.key`, `arrs.0`).
    pub fn lookup_dotted(&self, path: &str) -> Option<&ConfigValue> {
        let segments: Vec<&str> = path.split('.').collect();
        self.lookup(&segments)
    }

    /// Check if this value is "truthy" for section evaluation.
    ///
    /// `null`, `false`, `0`, the empty string and the empty list are falsy;
    /// everything else, including an empty map, is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            ConfigValue::Null => false,
            ConfigValue::Bool(b) => *b,
            ConfigValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            ConfigValue::String(s) => !s.is_empty(),
            ConfigValue::List(items) => !items.is_empty(),
            ConfigValue::Map(_) => true,
        }
    }

    /// Render this value as template output.
    ///
    /// - String: returned as-is
    /// - Number / Bool: their JSON form
    /// - Null: ""
    /// - List / Map: pretty JSON with 2-space indentation
    pub fn render(&self) -> String {
        match self {
            ConfigValue::Null => String::new(),
            ConfigValue::Bool(b) => b.to_string(),
            ConfigValue::Number(n) => n.to_string(),
            ConfigValue::String(s) => s.clone(),
            ConfigValue::List(_) | ConfigValue::Map(_) => {
                serde_json::to_string_pretty(self).unwrap_or_default()
            }
        }
    }
}

impl From<serde_json::Value> for ConfigValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => ConfigValue::Null,
            serde_json::Value::Bool(b) => ConfigValue::Bool(b),
            serde_json::Value::Number(n) => ConfigValue::Number(n),
            serde_json::Value::String(s) => ConfigValue::String(s),
            serde_json::Value::Array(items) => {
                ConfigValue::List(items.into_iter().map(ConfigValue::from).collect())
            }
            serde_json::Value::Object(entries) => ConfigValue::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, ConfigValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Number(value.into())
    }
}

impl From<IndexMap<String, ConfigValue>> for ConfigValue {
    fn from(value: IndexMap<String, ConfigValue>) -> Self {
        ConfigValue::Map(value)
    }
}
