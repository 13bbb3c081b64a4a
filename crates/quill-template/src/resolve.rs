/*
 * resolve.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Reference resolution against a configuration tree.
//!
//! A [`PathExpr`] is resolved bottom-up: every nested reference is looked up
//! first and its rendered value spliced into the enclosing path, then the
//! resulting dotted path is looked up. `{{ nest.{{ ref }} }}` with
//! `ref = "key"` becomes a lookup of `nest.key`.

use crate::error::{TemplateError, TemplateResult};
use crate::matcher::{PathExpr, PathPart};
use quill_config::ConfigValue;

/// The implicit-iterator name: the current context value itself.
pub const IMPLICIT_ITERATOR: &str = ".";

/// A stack of values names are looked up in, innermost last.
///
/// Sections push the value they iterate over; a name resolves in the
/// innermost frame whose value has the name's first segment.
#[derive(Debug, Clone, Default)]
pub struct Context<'a> {
    frames: Vec<&'a ConfigValue>,
}

impl<'a> Context<'a> {
    /// A context whose only frame is `root`.
    pub fn new(root: &'a ConfigValue) -> Self {
        Context { frames: vec![root] }
    }

    /// A context in which nothing resolves.
    pub fn empty() -> Self {
        Context::default()
    }

    pub fn push(&mut self, value: &'a ConfigValue) {
        self.frames.push(value);
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    /// Look up a dotted path.
    pub fn lookup(&self, path: &str) -> Option<&'a ConfigValue> {
        if path == IMPLICIT_ITERATOR {
            return self.frames.last().copied();
        }

        let segments: Vec<&str> = path.split('.').collect();
        let first = *segments.first()?;
        self.frames
            .iter()
            .rev()
            .copied()
            .find(|frame| frame.lookup(&[first]).is_some())
            .and_then(|frame| frame.lookup(&segments))
    }
}

/// Resolve the nested references in `expr`, producing the final dotted path.
///
/// Fails with [`TemplateError::MissingConfigValue`] naming the innermost
/// reference that did not resolve. The returned path itself is not looked up.
pub fn resolve_path(expr: &PathExpr, context: &Context<'_>) -> TemplateResult<String> {
    let mut path = String::new();
    for part in &expr.parts {
        match part {
            PathPart::Text(text) => path.push_str(text),
            PathPart::Ref(inner) => {
                let value = resolve_value(inner, context)?;
                path.push_str(&value.render());
            }
        }
    }
    Ok(path.trim().to_string())
}

/// Resolve `expr` and look up the resulting path.
pub fn resolve_value<'a>(expr: &PathExpr, context: &Context<'a>) -> TemplateResult<&'a ConfigValue> {
    let path = resolve_path(expr, context)?;
    context
        .lookup(&path)
        .ok_or_else(|| TemplateError::missing(path))
}
