/*
 * load.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Loading configuration layers from files.

use crate::error::{ConfigError, ConfigResult};
use crate::value::ConfigValue;
use std::path::Path;

/// Load a config file, choosing the format from its extension.
///
/// `.json` files are parsed as JSON; `.yaml` and `.yml` as YAML.
pub fn load_config_file(path: &Path) -> ConfigResult<ConfigValue> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => ConfigValue::from_json_str(&text),
        Some("yaml" | "yml") => ConfigValue::from_yaml_str(&text),
        _ => Err(ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}
