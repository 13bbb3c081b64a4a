/*
 * files.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Rendering and extraction over files and directory trees.
//!
//! A root that does not exist is "nothing to do": directory rendering and
//! extraction return empty results for it. Any other failure aborts the
//! whole batch at the first error.

use crate::error::{TemplateError, TemplateResult};
use crate::extract::{ExtractKind, ExtractionResult, extract};
use crate::template::render;
use crate::walk::{EntryKind, walk};
use indexmap::IndexMap;
use quill_config::ConfigValue;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Options for rendering files in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Best-effort mode: a file that fails to render is left untouched
    /// instead of failing the operation.
    pub force: bool,

    /// Re-serialize rendered `.json` files as pretty-printed JSON.
    pub pretty: bool,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> TemplateError + '_ {
    move |source| TemplateError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Whether `path` exists, treating only `NotFound` as absence.
fn stat(path: &Path) -> TemplateResult<Option<fs::Metadata>> {
    match fs::metadata(path) {
        Ok(metadata) => Ok(Some(metadata)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_error(path)(err)),
    }
}

/// Render the template at `path` and write the result back to `path`.
///
/// Returns `true` if the file was rewritten, `false` if it was left as it
/// was: a forced render failed, or the file is not UTF-8 text.
pub fn render_file(path: &Path, config: &ConfigValue, options: &RenderOptions) -> TemplateResult<bool> {
    let bytes = fs::read(path).map_err(io_error(path))?;
    let Ok(source) = String::from_utf8(bytes) else {
        debug!(path = %path.display(), "Skipping non-UTF-8 file");
        return Ok(false);
    };

    let rendered = match render(&source, config) {
        Ok(rendered) => rendered,
        Err(err) if options.force => {
            warn!(path = %path.display(), error = %err, "Render failed, leaving file untouched");
            return Ok(false);
        }
        Err(err) => return Err(err.with_file(path)),
    };

    let output = if options.pretty && is_json(path) {
        prettify_json(path, rendered)
    } else {
        rendered
    };

    fs::write(path, output).map_err(io_error(path))?;
    debug!(path = %path.display(), "Rendered template");
    Ok(true)
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

fn prettify_json(path: &Path, rendered: String) -> String {
    match serde_json::from_str::<ConfigValue>(&rendered)
        .and_then(|value| serde_json::to_string_pretty(&value))
    {
        Ok(pretty) => pretty + "\n",
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Rendered JSON does not parse, writing as-is");
            rendered
        }
    }
}

/// Render every file below `dir` in place.
///
/// Returns the paths (relative to `dir`) of the files that were rewritten.
/// A missing `dir` renders nothing.
pub fn render_dir(dir: &Path, config: &ConfigValue, options: &RenderOptions) -> TemplateResult<Vec<PathBuf>> {
    if stat(dir)?.is_none() {
        debug!(dir = %dir.display(), "Template directory does not exist, nothing to render");
        return Ok(Vec::new());
    }

    let mut rendered = Vec::new();
    for entry in walk(dir) {
        let entry = entry?;
        if entry.kind == EntryKind::File && render_file(&entry.path, config, options)? {
            rendered.push(entry.relative_path);
        }
    }
    Ok(rendered)
}

/// Extract references from the file at `path`.
///
/// Invalid UTF-8 is decoded lossily, so binary files contribute nothing
/// rather than failing the batch.
pub fn extract_file(kind: ExtractKind, path: &Path, config: Option<&ConfigValue>) -> TemplateResult<ExtractionResult> {
    let bytes = fs::read(path).map_err(io_error(path))?;
    Ok(extract(kind, &String::from_utf8_lossy(&bytes), config))
}

/// Extract references from every file below `dir`, keyed by relative path.
///
/// A missing `dir` yields an empty map.
pub fn extract_dir(
    kind: ExtractKind,
    dir: &Path,
    config: Option<&ConfigValue>,
) -> TemplateResult<IndexMap<PathBuf, ExtractionResult>> {
    let mut results = IndexMap::new();
    if stat(dir)?.is_none() {
        return Ok(results);
    }

    for entry in walk(dir) {
        let entry = entry?;
        if entry.kind == EntryKind::File {
            let result = extract_file(kind, &entry.path, config)?;
            results.insert(entry.relative_path, result);
        }
    }
    Ok(results)
}

/// Extract references from a file, or from every file below a directory,
/// flattened into one deduplicated result.
///
/// A missing `path` yields an empty result.
pub fn extract_list(kind: ExtractKind, path: &Path, config: Option<&ConfigValue>) -> TemplateResult<ExtractionResult> {
    let Some(metadata) = stat(path)? else {
        return Ok(ExtractionResult::default());
    };

    if metadata.is_file() {
        return extract_file(kind, path, config);
    }

    let mut all = ExtractionResult::default();
    for result in extract_dir(kind, path, config)?.values() {
        all.merge(result);
    }
    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config() -> ConfigValue {
        ConfigValue::from_json_str(r#"{ "foo": "lvalue", "nest": { "a": 1 } }"#).unwrap()
    }

    #[test]
    fn test_render_file_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.conf");
        fs::write(&path, "value = {{ foo }}\n").unwrap();

        assert!(render_file(&path, &config(), &RenderOptions::default()).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "value = lvalue\n");
    }

    #[test]
    fn test_render_file_error_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.conf");
        fs::write(&path, "{{ nope }}").unwrap();

        let err = render_file(&path, &config(), &RenderOptions::default()).unwrap_err();
        match &err {
            TemplateError::MissingConfigValue { path: key, file } => {
                assert_eq!(key, "nope");
                assert_eq!(file.as_deref(), Some(path.as_path()));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().ends_with("app.conf"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{{ nope }}");
    }

    #[test]
    fn test_forced_render_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.conf");
        fs::write(&path, "{{ foo }} {{ nope }}").unwrap();

        let options = RenderOptions {
            force: true,
            ..Default::default()
        };
        assert!(!render_file(&path, &config(), &options).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{{ foo }} {{ nope }}");
    }

    #[test]
    fn test_parse_error_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.conf");
        fs::write(&path, "{{#a}}\nbody").unwrap();

        for options in [RenderOptions::default(), RenderOptions { pretty: true, ..Default::default() }] {
            let err = render_file(&path, &config(), &options).unwrap_err();
            match &err {
                TemplateError::Parse { line, file, .. } => {
                    assert_eq!(*line, 1);
                    assert_eq!(file.as_deref(), Some(path.as_path()));
                }
                other => panic!("unexpected error: {other}"),
            }
            assert!(err.to_string().contains("broken.conf"), "{err}");
        }

        let err = render_dir(dir.path(), &config(), &RenderOptions::default()).unwrap_err();
        assert!(err.to_string().ends_with("broken.conf"), "{err}");
    }

    #[test]
    fn test_non_utf8_file_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        let bytes = [0x89, b'P', b'N', b'G', 0xff];
        fs::write(&path, bytes).unwrap();

        assert!(!render_file(&path, &config(), &RenderOptions::default()).unwrap());
        assert_eq!(fs::read(&path).unwrap(), bytes);
        assert!(extract_file(ExtractKind::Keys, &path, None).unwrap().required.is_empty());
    }

    #[test]
    fn test_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"name": "{{ foo }}", "nested": {{ nest }}}"#).unwrap();

        let options = RenderOptions {
            pretty: true,
            ..Default::default()
        };
        render_file(&path, &config(), &options).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "{\n  \"name\": \"lvalue\",\n  \"nested\": {\n    \"a\": 1\n  }\n}\n"
        );
    }

    #[test]
    fn test_missing_roots_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        let absent = dir.path().join("absent");

        assert!(render_dir(&absent, &config(), &RenderOptions::default()).unwrap().is_empty());
        assert!(extract_dir(ExtractKind::Keys, &absent, None).unwrap().is_empty());
        assert_eq!(
            extract_list(ExtractKind::Keys, &absent, None).unwrap(),
            ExtractionResult::default()
        );
    }

    #[test]
    fn test_extract_file_missing_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            extract_file(ExtractKind::Keys, &dir.path().join("absent"), None),
            Err(TemplateError::Io { .. })
        ));
    }
}
