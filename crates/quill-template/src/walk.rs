/*
 * walk.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Depth-first traversal of template directories.

use crate::error::{TemplateError, TemplateResult};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Type of a visited entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

/// An entry below the walk root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    /// Full path of the entry.
    pub path: PathBuf,
    /// Path relative to the walk root.
    pub relative_path: PathBuf,
    pub kind: EntryKind,
}

/// Lazy depth-first iterator over everything below a root directory.
///
/// Entries within a directory come in file-name order, and a directory is
/// yielded before its contents, so repeated walks of an unchanged tree
/// produce the same sequence.
pub struct Walk {
    root: PathBuf,
    inner: walkdir::IntoIter,
}

/// Walk everything below `root` (the root itself is not yielded).
pub fn walk(root: &Path) -> Walk {
    Walk {
        root: root.to_path_buf(),
        inner: WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter(),
    }
}

impl Iterator for Walk {
    type Item = TemplateResult<WalkEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = match self.inner.next()? {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().unwrap_or(self.root.as_path()).to_path_buf();
                return Some(Err(TemplateError::Io {
                    path,
                    source: err.into(),
                }));
            }
        };

        let kind = if entry.file_type().is_dir() {
            EntryKind::Dir
        } else {
            EntryKind::File
        };
        let relative_path = entry
            .path()
            .strip_prefix(&self.root)
            .unwrap_or(entry.path())
            .to_path_buf();

        debug!(path = %relative_path.display(), ?kind, "Visited entry");
        Some(Ok(WalkEntry {
            path: entry.into_path(),
            relative_path,
            kind,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn test_walk_order_and_kinds() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b/inner")).unwrap();
        fs::write(dir.path().join("c.txt"), "").unwrap();
        fs::write(dir.path().join("a.txt"), "").unwrap();
        fs::write(dir.path().join("b/inner/z.conf"), "").unwrap();
        fs::write(dir.path().join("b/y.conf"), "").unwrap();

        let entries: Vec<(String, EntryKind)> = walk(dir.path())
            .map(|e| {
                let e = e.unwrap();
                (e.relative_path.to_string_lossy().replace('\\', "/"), e.kind)
            })
            .collect();

        assert_eq!(
            entries,
            vec![
                ("a.txt".to_string(), EntryKind::File),
                ("b".to_string(), EntryKind::Dir),
                ("b/inner".to_string(), EntryKind::Dir),
                ("b/inner/z.conf".to_string(), EntryKind::File),
                ("b/y.conf".to_string(), EntryKind::File),
                ("c.txt".to_string(), EntryKind::File),
            ]
        );
    }

    #[test]
    fn test_walk_is_restartable() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("one"), "").unwrap();
        let first: Vec<_> = walk(dir.path()).map(Result::unwrap).collect();
        let second: Vec<_> = walk(dir.path()).map(Result::unwrap).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_walk_missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut walker = walk(&dir.path().join("absent"));
        assert!(matches!(walker.next(), Some(Err(TemplateError::Io { .. }))));
    }
}
