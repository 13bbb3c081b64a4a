/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Configuration trees for quill templates.
//!
//! This crate builds the configuration a template is rendered against:
//!
//! - [`ConfigValue`]: a typed, ordered configuration tree with dotted-path lookup
//! - [`merge`]: earliest-wins deep merge of layers
//! - [`get_config`]: resolve `before` layers, `key=value` pairs, named remotes
//!   and `after` layers through a [`ConfigClient`]
//! - [`to_environment`]: project a tree onto `quill_*` / `q_*` variables
//!
//! # Example
//!
//! ```
//! use quill_config::{ConfigOptions, ConfigValue, MemoryClient, get_config};
//!
//! # futures::executor::block_on(async {
//! let client = MemoryClient::with_configs([(
//!     "first",
//!     ConfigValue::from_json_str(r#"{ "foo": "bar" }"#).unwrap(),
//! )]);
//! let options = ConfigOptions {
//!     remotes: vec!["first".to_string(), "foo=baz".to_string()],
//!     ..Default::default()
//! };
//!
//! let config = get_config(&client, &options).await.unwrap();
//! assert_eq!(config.lookup_dotted("foo"), Some(&ConfigValue::from("baz")));
//! # });
//! ```

mod env;
mod error;
mod load;
mod merge;
mod remote;
mod value;

pub use env::{ENV_PREFIXES, to_environment};
pub use error::{ConfigError, ConfigResult, RemoteError};
pub use load::load_config_file;
pub use merge::{insert_path, merge};
pub use remote::{
    ConfigClient, ConfigOptions, MemoryClient, RemoteConfig, RemoteSpec, fetch, get_config,
    get_env,
};
pub use value::ConfigValue;

// Re-export for convenience
pub use indexmap::IndexMap;
