/*
 * merge.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Earliest-wins deep merging of configuration trees.
//!
//! Sources are given in precedence order: the first source wins scalar
//! conflicts. Internally the list is applied from last to first, so every
//! source overwrites what the sources after it contributed.
//!
//! - Map values merge key by key, recursively
//! - Scalars and lists replace whatever was there
//! - Non-map sources contribute nothing

use crate::value::ConfigValue;
use indexmap::IndexMap;

/// Merge `configs` into a single tree, earliest source winning.
///
/// ```
/// use quill_config::{ConfigValue, merge};
///
/// let merged = merge(&[
///     ConfigValue::from_json_str(r#"{ "foo": "bar" }"#).unwrap(),
///     ConfigValue::from_json_str(r#"{ "foo": "baz", "nested": { "a": 1 } }"#).unwrap(),
///     ConfigValue::from_json_str(r#"{ "nested": { "b": 2 } }"#).unwrap(),
/// ]);
/// assert_eq!(merged.lookup_dotted("foo"), Some(&ConfigValue::from("bar")));
/// assert_eq!(merged.lookup_dotted("nested.b"), Some(&ConfigValue::from(2)));
/// ```
pub fn merge(configs: &[ConfigValue]) -> ConfigValue {
    let mut target = IndexMap::new();
    for config in configs.iter().rev() {
        if let Some(source) = config.as_map() {
            merge_into(&mut target, source);
        }
    }
    ConfigValue::Map(target)
}

/// Apply `source` on top of `target`.
fn merge_into(target: &mut IndexMap<String, ConfigValue>, source: &IndexMap<String, ConfigValue>) {
    for (key, value) in source {
        match (target.get_mut(key), value) {
            (Some(ConfigValue::Map(existing)), ConfigValue::Map(incoming)) => {
                merge_into(existing, incoming);
            }
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Set `value` at `path` inside `target`, creating intermediate maps.
///
/// A non-map value sitting on the path is replaced by a map.
pub fn insert_path(target: &mut IndexMap<String, ConfigValue>, path: &[&str], value: ConfigValue) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };

    let mut current = target;
    for segment in parents {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(ConfigValue::map);
        if !entry.is_map() {
            *entry = ConfigValue::map();
        }
        let ConfigValue::Map(next) = entry else {
            return;
        };
        current = next;
    }
    current.insert(last.to_string(), value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn json(text: &str) -> ConfigValue {
        ConfigValue::from_json_str(text).unwrap()
    }

    #[test]
    fn test_earliest_scalar_wins() {
        let merged = merge(&[
            json(r#"{ "foo": "bar" }"#),
            json(r#"{ "foo": "baz", "nested": { "a": 1 } }"#),
            json(r#"{ "nested": { "b": 2 } }"#),
        ]);
        assert_eq!(
            merged,
            json(r#"{ "foo": "bar", "nested": { "a": 1, "b": 2 } }"#)
        );
    }

    #[test]
    fn test_nested_maps_merge_recursively() {
        let merged = merge(&[
            json(r#"{ "db": { "conn": { "host": "primary" } } }"#),
            json(r#"{ "db": { "conn": { "host": "fallback", "port": 5432 }, "pool": 4 } }"#),
        ]);
        assert_eq!(
            merged.lookup_dotted("db.conn.host"),
            Some(&ConfigValue::from("primary"))
        );
        assert_eq!(
            merged.lookup_dotted("db.conn.port"),
            Some(&ConfigValue::from(5432))
        );
        assert_eq!(merged.lookup_dotted("db.pool"), Some(&ConfigValue::from(4)));
    }

    #[test]
    fn test_lists_replace_wholesale() {
        let merged = merge(&[
            json(r#"{ "hosts": ["a"] }"#),
            json(r#"{ "hosts": ["b", "c"] }"#),
        ]);
        assert_eq!(merged, json(r#"{ "hosts": ["a"] }"#));
    }

    #[test]
    fn test_scalar_over_map_and_map_over_scalar() {
        let merged = merge(&[
            json(r#"{ "a": "flat", "b": { "deep": true } }"#),
            json(r#"{ "a": { "deep": true }, "b": "flat" }"#),
        ]);
        assert_eq!(merged.lookup_dotted("a"), Some(&ConfigValue::from("flat")));
        assert_eq!(merged.lookup_dotted("b.deep"), Some(&ConfigValue::Bool(true)));
    }

    #[test]
    fn test_empty_and_non_map_sources() {
        assert_eq!(merge(&[]), ConfigValue::map());
        assert_eq!(
            merge(&[ConfigValue::from("ignored"), json(r#"{ "k": 1 }"#)]),
            json(r#"{ "k": 1 }"#)
        );
    }

    #[test]
    fn test_insert_path_creates_parents() {
        let mut target = IndexMap::new();
        insert_path(&mut target, &["new", "nested"], ConfigValue::from("works"));
        insert_path(&mut target, &["new", "other"], ConfigValue::from("too"));
        insert_path(&mut target, &["foo"], ConfigValue::from("baz"));
        assert_eq!(
            ConfigValue::Map(target),
            json(r#"{ "new": { "nested": "works", "other": "too" }, "foo": "baz" }"#)
        );
    }

    #[test]
    fn test_insert_path_replaces_scalar_parent() {
        let mut target = IndexMap::new();
        insert_path(&mut target, &["a"], ConfigValue::from("x"));
        insert_path(&mut target, &["a", "b"], ConfigValue::from("y"));
        assert_eq!(ConfigValue::Map(target), json(r#"{ "a": { "b": "y" } }"#));
    }
}
