/*
 * env.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Projection of a configuration tree onto environment variables.

use crate::value::ConfigValue;
use indexmap::IndexMap;

/// Prefixes every flattened key is published under.
pub const ENV_PREFIXES: [&str; 2] = ["quill_", "q_"];

/// Flatten `config` into environment variables.
///
/// Nested keys are joined with `_` (list elements by index), then every
/// flattened key is emitted twice, once per prefix in [`ENV_PREFIXES`]:
///
/// ```
/// use quill_config::{ConfigValue, to_environment};
///
/// let config = ConfigValue::from_json_str(r#"{ "nested": { "boo": 2 } }"#).unwrap();
/// let env = to_environment(&config);
/// assert_eq!(env.get("quill_nested_boo").map(String::as_str), Some("2"));
/// assert_eq!(env.get("q_nested_boo").map(String::as_str), Some("2"));
/// ```
pub fn to_environment(config: &ConfigValue) -> IndexMap<String, String> {
    let mut flat = Vec::new();
    flatten(config, None, &mut flat);

    let mut env = IndexMap::new();
    for (key, value) in flat {
        for prefix in ENV_PREFIXES {
            env.insert(format!("{prefix}{key}"), value.clone());
        }
    }
    env
}

fn flatten(value: &ConfigValue, prefix: Option<&str>, out: &mut Vec<(String, String)>) {
    let join = |key: &str| match prefix {
        Some(p) => format!("{p}_{key}"),
        None => key.to_string(),
    };

    match value {
        ConfigValue::Map(entries) => {
            for (key, child) in entries {
                flatten(child, Some(&join(key)), out);
            }
        }
        ConfigValue::List(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten(child, Some(&join(&index.to_string())), out);
            }
        }
        scalar => {
            // A bare scalar at the root has no name to publish under.
            if let Some(key) = prefix {
                out.push((key.to_string(), scalar.render()));
            }
        }
    }
}
