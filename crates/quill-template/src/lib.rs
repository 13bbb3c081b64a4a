/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Configuration templating for quill.
//!
//! This crate renders configuration templates against a merged
//! [`ConfigValue`] and extracts the references a template needs, so missing
//! configuration can be reported before anything is deployed. It supports:
//!
//! - Placeholders: `{{ key.path }}`, `{{& key.path }}`
//! - Nested references: `{{ nest.{{ ref }} }}` looks up `ref` first and uses
//!   its value as part of the outer path
//! - Sections: `{{#name}}...{{/name}}` (truthy, repeated per list element)
//!   and `{{^name}}...{{/name}}` (missing or falsy), with `{{.}}` for the
//!   current element
//! - Environment-variable references: `$q_key_path`, `$quill_key_path`
//!
//! # Example
//!
//! ```
//! use quill_template::{ConfigValue, keys, render};
//!
//! let config = ConfigValue::from_json_str(r#"{ "foo": "lvalue" }"#).unwrap();
//! assert_eq!(render("{{^missing}}MISSING!{{/missing}} {{foo}}", &config).unwrap(), "MISSING! lvalue");
//!
//! let found = keys("{{ foo }} {{ bar }}", Some(&config));
//! assert_eq!(found.fatal.to_vec(), vec!["bar"]);
//! ```

pub mod error;
pub mod extract;
pub mod files;
pub mod matcher;
pub mod resolve;
pub mod template;
pub mod walk;

// Re-export main types at crate root
pub use error::{TemplateError, TemplateResult};
pub use extract::{ExtractKind, ExtractionResult, KeyRecord, KeySet, envvars, extract, keys};
pub use files::{RenderOptions, extract_dir, extract_file, extract_list, render_dir, render_file};
pub use matcher::{MAX_NESTING_DEPTH, PathExpr, PathPart, Token, TokenKind, envvar_tokens, tokenize};
pub use resolve::Context;
pub use template::{Node, Section, Template, render};
pub use walk::{EntryKind, Walk, WalkEntry, walk};

pub use quill_config::ConfigValue;
