/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for loading, merging and fetching configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Error returned by a [`ConfigClient`](crate::ConfigClient) implementation.
///
/// Clients own their failure modes (HTTP, auth, decoding); the resolver only
/// carries the error through.
pub type RemoteError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while building a configuration tree.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A named remote config could not be fetched.
    #[error("Failed to fetch remote config '{name}': {source}")]
    RemoteFetch {
        name: String,
        #[source]
        source: RemoteError,
    },

    /// A config document could not be parsed.
    #[error("Invalid {format} config: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    /// The file extension does not name a supported config format.
    #[error("Unsupported config format: {}", .path.display())]
    UnsupportedFormat { path: PathBuf },

    /// I/O error reading a config file.
    #[error("I/O error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
