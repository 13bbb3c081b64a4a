/*
 * remote.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Resolution of a full configuration from local layers and named remotes.
//!
//! The final tree is the earliest-wins [`merge`] of, in order:
//!
//! 1. `before` layers
//! 2. `key=value` pairs given among the remote specs
//! 3. named remotes, in the order they were listed
//! 4. `after` layers
//!
//! Remotes are fetched concurrently (bounded by
//! [`ConfigOptions::concurrency`]) but their results are always merged in
//! listing order, since the merge is order-sensitive.

use crate::env::to_environment;
use crate::error::{ConfigError, ConfigResult, RemoteError};
use crate::merge::{insert_path, merge};
use crate::value::ConfigValue;
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt, stream};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// A named config as returned by a config service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub name: String,

    /// The configuration tree merged into the result.
    #[serde(default)]
    pub settings: ConfigValue,
}

/// Trait for fetching named configs from a config service.
///
/// Retries, timeouts and authentication belong to the implementation; the
/// resolver calls `get` once per distinct name and aborts on the first error.
#[async_trait]
pub trait ConfigClient: Send + Sync {
    /// Fetch the config called `name`.
    async fn get(&self, name: &str) -> Result<RemoteConfig, RemoteError>;
}

/// Client that serves configs from an in-memory map.
///
/// Useful for testing and for embedding applications that already hold
/// their named configs.
#[derive(Debug, Clone, Default)]
pub struct MemoryClient {
    configs: HashMap<String, ConfigValue>,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named config to the client.
    pub fn add(&mut self, name: impl Into<String>, settings: ConfigValue) -> &mut Self {
        self.configs.insert(name.into(), settings);
        self
    }

    /// Create a client serving the given configs.
    pub fn with_configs(
        configs: impl IntoIterator<Item = (impl Into<String>, ConfigValue)>,
    ) -> Self {
        let mut client = Self::new();
        for (name, settings) in configs {
            client.add(name, settings);
        }
        client
    }
}

#[async_trait]
impl ConfigClient for MemoryClient {
    async fn get(&self, name: &str) -> Result<RemoteConfig, RemoteError> {
        match self.configs.get(name) {
            Some(settings) => Ok(RemoteConfig {
                name: name.to_string(),
                settings: settings.clone(),
            }),
            None => Err(format!("no config named '{name}'").into()),
        }
    }
}

/// One entry of [`ConfigOptions::remotes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteSpec {
    /// `key=value`, where `key` may be nested with `.` or `:`
    /// (`nested:merge=works`).
    Pair { path: Vec<String>, value: String },

    /// The name of a config to fetch.
    Named(String),
}

impl RemoteSpec {
    pub fn parse(spec: &str) -> Self {
        match spec.split_once('=') {
            Some((key, value)) => RemoteSpec::Pair {
                path: key.split(['.', ':']).map(str::to_string).collect(),
                value: value.to_string(),
            },
            None => RemoteSpec::Named(spec.to_string()),
        }
    }
}

/// Options for [`get_config`].
#[derive(Debug, Clone)]
pub struct ConfigOptions {
    /// Layers that take precedence over everything else.
    pub before: Vec<ConfigValue>,

    /// Remote names and `key=value` pairs.
    pub remotes: Vec<String>,

    /// Layers that only fill in what nothing else provides.
    pub after: Vec<ConfigValue>,

    /// Maximum number of remote fetches in flight (default: 4).
    pub concurrency: usize,
}

impl Default for ConfigOptions {
    fn default() -> Self {
        Self {
            before: Vec::new(),
            remotes: Vec::new(),
            after: Vec::new(),
            concurrency: 4,
        }
    }
}

/// Resolve the fully merged configuration described by `options`.
pub async fn get_config<C>(client: &C, options: &ConfigOptions) -> ConfigResult<ConfigValue>
where
    C: ConfigClient + ?Sized,
{
    let mut pairs = IndexMap::new();
    let mut names: Vec<String> = Vec::new();

    for spec in options.remotes.iter().filter(|s| !s.is_empty()) {
        match RemoteSpec::parse(spec) {
            RemoteSpec::Pair { path, value } => {
                let segments: Vec<&str> = path.iter().map(String::as_str).collect();
                insert_path(&mut pairs, &segments, ConfigValue::String(value));
            }
            RemoteSpec::Named(name) => {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
    }

    let fetched = fetch(client, &names, options.concurrency).await?;

    let mut layers =
        Vec::with_capacity(options.before.len() + 1 + fetched.len() + options.after.len());
    layers.extend(options.before.iter().cloned());
    layers.push(ConfigValue::Map(pairs));
    layers.extend(fetched);
    layers.extend(options.after.iter().cloned());

    debug!(layers = layers.len(), remotes = names.len(), "Merging config layers");
    Ok(merge(&layers))
}

/// Resolve the configuration described by `options` as environment variables.
pub async fn get_env<C>(client: &C, options: &ConfigOptions) -> ConfigResult<IndexMap<String, String>>
where
    C: ConfigClient + ?Sized,
{
    let config = get_config(client, options).await?;
    Ok(to_environment(&config))
}

/// Fetch the settings of every name, returned in the order of `names`.
pub async fn fetch<C>(client: &C, names: &[String], concurrency: usize) -> ConfigResult<Vec<ConfigValue>>
where
    C: ConfigClient + ?Sized,
{
    stream::iter(names)
        .map(|name| async move {
            debug!(remote = %name, "Fetching remote config");
            client
                .get(name)
                .await
                .map(|remote| remote.settings)
                .map_err(|source| ConfigError::RemoteFetch {
                    name: name.clone(),
                    source,
                })
        })
        .buffered(concurrency.max(1))
        .try_collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pair() {
        assert_eq!(
            RemoteSpec::parse("foo=baz"),
            RemoteSpec::Pair {
                path: vec!["foo".to_string()],
                value: "baz".to_string()
            }
        );
        assert_eq!(
            RemoteSpec::parse("nested:merge=works"),
            RemoteSpec::Pair {
                path: vec!["nested".to_string(), "merge".to_string()],
                value: "works".to_string()
            }
        );
        assert_eq!(
            RemoteSpec::parse("a.b=x=y"),
            RemoteSpec::Pair {
                path: vec!["a".to_string(), "b".to_string()],
                value: "x=y".to_string()
            }
        );
    }

    #[test]
    fn test_parse_named() {
        assert_eq!(
            RemoteSpec::parse("first"),
            RemoteSpec::Named("first".to_string())
        );
    }

    #[test]
    fn test_default_options() {
        let options = ConfigOptions::default();
        assert_eq!(options.concurrency, 4);
        assert!(options.remotes.is_empty());
    }
}
