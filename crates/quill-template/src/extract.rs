/*
 * extract.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Key and environment-variable extraction.
//!
//! Extraction walks a template without substituting anything and sorts every
//! reference it finds into four buckets:
//!
//! - `required`: paths named by placeholders (after resolving nested refs)
//! - `fatal`: required paths missing from the supplied config
//! - `optional`: section names
//! - `warn`: optional names missing from the supplied config
//!
//! Without a config every reference is missing. Extraction never fails.

use crate::error::TemplateError;
use crate::matcher::{Token, TokenKind, envvar_tokens_line, tokenize_line};
use crate::resolve::{Context, IMPLICIT_ITERATOR, resolve_path};
use indexmap::IndexMap;
use quill_config::ConfigValue;
use std::fmt;
use std::str::FromStr;

/// Which reference syntax to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractKind {
    /// `{{ key }}` placeholders and sections.
    Keys,
    /// `$q_key` / `$quill_key` references.
    Envvars,
}

impl ExtractKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractKind::Keys => "keys",
            ExtractKind::Envvars => "envvars",
        }
    }
}

impl fmt::Display for ExtractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractKind {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keys" => Ok(ExtractKind::Keys),
            "envvars" => Ok(ExtractKind::Envvars),
            other => Err(TemplateError::InvalidExtractionType {
                kind: other.to_string(),
            }),
        }
    }
}

/// Where a key was first seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRecord {
    pub key: String,
    /// 1-based line number.
    pub line: usize,
    /// The full text of that line.
    pub text: String,
}

/// An insertion-ordered set of keys, each remembering where it was first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySet {
    records: IndexMap<String, KeyRecord>,
}

impl KeySet {
    /// Add a record unless its key is already present.
    ///
    /// Returns `true` if the key was new.
    pub fn insert(&mut self, record: KeyRecord) -> bool {
        if self.records.contains_key(&record.key) {
            return false;
        }
        self.records.insert(record.key.clone(), record);
        true
    }

    pub fn contains(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&KeyRecord> {
        self.records.get(key)
    }

    /// Keys in first-seen order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn records(&self) -> impl Iterator<Item = &KeyRecord> {
        self.records.values()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.records.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Add every record of `other` whose key is not yet present.
    pub fn extend(&mut self, other: &KeySet) {
        for record in other.records() {
            self.insert(record.clone());
        }
    }
}

/// The references a template needs, classified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionResult {
    pub required: KeySet,
    pub optional: KeySet,
    pub fatal: KeySet,
    pub warn: KeySet,
}

impl ExtractionResult {
    /// Union `other` into this result, keeping first-seen order.
    pub fn merge(&mut self, other: &ExtractionResult) {
        self.required.extend(&other.required);
        self.optional.extend(&other.optional);
        self.fatal.extend(&other.fatal);
        self.warn.extend(&other.warn);
    }

    /// True when nothing required is missing.
    pub fn is_satisfied(&self) -> bool {
        self.fatal.is_empty()
    }
}

/// Extract `kind` references from `template`, checking them against `config`.
pub fn extract(kind: ExtractKind, template: &str, config: Option<&ConfigValue>) -> ExtractionResult {
    let context = match config {
        Some(config) => Context::new(config),
        None => Context::empty(),
    };

    let mut result = ExtractionResult::default();
    for (index, text) in template.split('\n').enumerate() {
        let line = index + 1;
        let tokens = match kind {
            ExtractKind::Keys => tokenize_line(text, line),
            ExtractKind::Envvars => envvar_tokens_line(text, line),
        };
        for token in tokens {
            classify(&token, text, &context, &mut result);
        }
    }
    result
}

/// Extract `{{ key }}` references.
///
/// ```
/// use quill_template::keys;
///
/// let found = keys("{{ foo }}\n{{#extras}}x{{/extras}}", None);
/// assert_eq!(found.required.to_vec(), vec!["foo"]);
/// assert_eq!(found.warn.to_vec(), vec!["extras"]);
/// ```
pub fn keys(template: &str, config: Option<&ConfigValue>) -> ExtractionResult {
    extract(ExtractKind::Keys, template, config)
}

/// Extract `$q_key` / `$quill_key` references.
pub fn envvars(template: &str, config: Option<&ConfigValue>) -> ExtractionResult {
    extract(ExtractKind::Envvars, template, config)
}

fn classify(token: &Token, text: &str, context: &Context<'_>, result: &mut ExtractionResult) {
    let record = |key: &str| KeyRecord {
        key: key.to_string(),
        line: token.line,
        text: text.to_string(),
    };

    match token.kind {
        TokenKind::SectionOpen | TokenKind::SectionInvert => {
            let name = token.path.raw.as_str();
            result.optional.insert(record(name));
            if context.lookup(name).is_none() {
                result.warn.insert(record(name));
            }
        }
        TokenKind::SectionClose => {}
        TokenKind::Name | TokenKind::NameRef | TokenKind::Ampersand | TokenKind::EnvVar => {
            if token.path.raw == IMPLICIT_ITERATOR {
                return;
            }
            match resolve_path(&token.path, context) {
                Ok(path) => {
                    result.required.insert(record(&path));
                    if context.lookup(&path).is_none() {
                        result.fatal.insert(record(&path));
                    }
                }
                // An inner reference is missing: both it and the unresolved
                // outer path are required and fatal.
                Err(TemplateError::MissingConfigValue { path, .. }) => {
                    for key in [path.as_str(), token.path.raw.as_str()] {
                        result.required.insert(record(key));
                        result.fatal.insert(record(key));
                    }
                }
                // Resolution only reports missing values.
                Err(
                    TemplateError::InvalidExtractionType { .. }
                    | TemplateError::Parse { .. }
                    | TemplateError::Io { .. },
                ) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config() -> ConfigValue {
        ConfigValue::from_json_str(
            r#"{
                "foo": { "bar": "x", "baz": "y" },
                "bar": "baz",
                "arrs": ["a"],
                "nest": { "key": "v" },
                "ref": "key",
                "key": "missing-key"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_keys_without_config_are_all_fatal() {
        let template = [
            "{{ foo }}",
            "{{ bar.0 }}",
            "",
            "{{ baz.nested.x }}",
            "{{ foo.bar }}",
            "{{ foo.bar_baz }}",
            "{{ foo.bar-baz }}",
            "{{ foo.{{ bar }} }}",
            "{{ {{ bar }} }}",
            "{{ foo }} = {{ bar }}",
        ]
        .join("\n");

        let result = keys(&template, None);

        let expected = vec![
            "foo",
            "bar.0",
            "baz.nested.x",
            "foo.bar",
            "foo.bar_baz",
            "foo.bar-baz",
            "bar",
            "foo.{{ bar }}",
            "{{ bar }}",
        ];
        assert_eq!(result.required.to_vec(), expected);
        assert_eq!(result.fatal.to_vec(), expected);
        assert!(result.optional.is_empty());
        assert!(result.warn.is_empty());
    }

    #[test]
    fn test_keys_with_config() {
        let template = "{{ foo.bar }}\n{{ foo.{{ bar }} }}\n{{ nest.{{ ref }} }}\n{{ nope }}";
        let result = keys(template, Some(&config()));

        assert_eq!(
            result.required.to_vec(),
            vec!["foo.bar", "foo.baz", "nest.key", "nope"]
        );
        assert_eq!(result.fatal.to_vec(), vec!["nope"]);
    }

    #[test]
    fn test_nested_reference_resolving_to_missing_path() {
        let result = keys("{{ foo.{{ key }} }}", Some(&config()));
        assert_eq!(result.required.to_vec(), vec!["foo.missing-key"]);
        assert_eq!(result.fatal.to_vec(), vec!["foo.missing-key"]);
    }

    #[test]
    fn test_missing_inner_reference_with_config() {
        let result = keys("{{ nest.{{ bad-ref }} }}", Some(&config()));
        assert_eq!(result.required.to_vec(), vec!["bad-ref", "nest.{{ bad-ref }}"]);
        assert_eq!(result.fatal.to_vec(), vec!["bad-ref", "nest.{{ bad-ref }}"]);
    }

    #[test]
    fn test_sections_are_optional() {
        let template = "{{#arrs}}{{.}} {{/arrs}}\n{{^missing}}MISSING!{{/missing}}";

        let result = keys(template, Some(&config()));
        assert_eq!(result.optional.to_vec(), vec!["arrs", "missing"]);
        assert_eq!(result.warn.to_vec(), vec!["missing"]);
        assert!(result.required.is_empty());

        let result = keys(template, None);
        assert_eq!(result.warn.to_vec(), vec!["arrs", "missing"]);
    }

    #[test]
    fn test_records_keep_first_line() {
        let result = keys("a {{ foo }}\n{{ foo }} again", None);
        let record = result.required.get("foo").unwrap();
        assert_eq!(record.line, 1);
        assert_eq!(record.text, "a {{ foo }}");
        assert_eq!(result.required.len(), 1);
    }

    #[test]
    fn test_envvars_lines() {
        let result = envvars(&["$q_foo", "$quill_bar_0"].join("\n"), None);
        assert_eq!(result.required.to_vec(), vec!["foo", "bar.0"]);
        assert_eq!(result.required.get("foo").unwrap().line, 1);
        assert_eq!(result.required.get("bar.0").unwrap().line, 2);
    }

    #[test]
    fn test_envvars() {
        let template = [
            "$q_foo",
            "$quill_bar_0",
            "",
            "$q_baz_nested_x",
            "$quill_foo_bar",
            "$q_foo_bar-baz",
            "$q_foo = $quill_bar",
        ]
        .join("\n");

        let result = envvars(&template, None);
        let expected = vec!["foo", "bar.0", "baz.nested.x", "foo.bar", "foo.bar-baz", "bar"];
        assert_eq!(result.required.to_vec(), expected);
        assert_eq!(result.fatal.to_vec(), expected);
        assert!(result.optional.is_empty());
    }

    #[test]
    fn test_envvars_with_config() {
        let result = envvars("$q_foo_bar $q_arrs_0 $q_foo_qux", Some(&config()));
        assert_eq!(result.required.to_vec(), vec!["foo.bar", "arrs.0", "foo.qux"]);
        assert_eq!(result.fatal.to_vec(), vec!["foo.qux"]);
    }

    #[test]
    fn test_envvars_ignore_placeholders_and_sections() {
        let result = envvars("{{#a}}{{ b }}{{/a}}", None);
        assert_eq!(result, ExtractionResult::default());
    }

    #[test]
    fn test_extract_kind_parse() {
        assert_eq!("keys".parse::<ExtractKind>().unwrap(), ExtractKind::Keys);
        assert_eq!("envvars".parse::<ExtractKind>().unwrap(), ExtractKind::Envvars);
        let err = "both".parse::<ExtractKind>().unwrap_err();
        assert!(matches!(err, TemplateError::InvalidExtractionType { ref kind } if kind == "both"));
    }

    #[test]
    fn test_merge_results() {
        let mut all = keys("{{ a }}\n{{#s}}{{/s}}", None);
        all.merge(&keys("{{ b }}\n{{ a }}", None));
        assert_eq!(all.required.to_vec(), vec!["a", "b"]);
        assert_eq!(all.optional.to_vec(), vec!["s"]);
        assert!(!all.is_satisfied());
    }
}
