/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for template parsing, rendering and extraction.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during template operations.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// A placeholder (or a reference inside one) did not resolve.
    #[error("Missing configuration value: {path}{}", in_file(.file))]
    MissingConfigValue {
        /// The path that failed lookup, after inner references were substituted.
        path: String,
        /// The template file being rendered, when known.
        file: Option<PathBuf>,
    },

    /// Extraction was asked for something other than keys or envvars.
    #[error("Type must be `keys` or `envvars`, got `{kind}`")]
    InvalidExtractionType { kind: String },

    /// Malformed section structure.
    #[error("Parse error on line {line}: {message}{}", in_file(.file))]
    Parse {
        message: String,
        line: usize,
        /// The template file being parsed, when known.
        file: Option<PathBuf>,
    },

    /// I/O error reading or writing a template.
    #[error("I/O error for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TemplateError {
    pub(crate) fn missing(path: impl Into<String>) -> Self {
        TemplateError::MissingConfigValue {
            path: path.into(),
            file: None,
        }
    }

    pub(crate) fn parse(message: String, line: usize) -> Self {
        TemplateError::Parse {
            message,
            line,
            file: None,
        }
    }

    /// Attach the template file a missing value or parse error was found in.
    pub fn with_file(self, path: &Path) -> Self {
        match self {
            TemplateError::MissingConfigValue { path: key, .. } => {
                TemplateError::MissingConfigValue {
                    path: key,
                    file: Some(path.to_path_buf()),
                }
            }
            TemplateError::Parse { message, line, .. } => TemplateError::Parse {
                message,
                line,
                file: Some(path.to_path_buf()),
            },
            other => other,
        }
    }
}

fn in_file(file: &Option<PathBuf>) -> String {
    match file {
        Some(path) => format!(" in {}", path.display()),
        None => String::new(),
    }
}

/// Result type for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;
