/*
 * matcher.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Lexical discovery of placeholder and environment-variable references.
//!
//! Two surface syntaxes are recognized:
//!
//! - Placeholders: `{{ key.path }}`, optionally prefixed by a sigil
//!   (`{{#section}}`, `{{^inverted}}`, `{{/section}}`, `{{& literal}}`).
//!   A placeholder path may itself contain placeholders
//!   (`{{ nest.{{ ref }} }}`); those are kept as a [`PathExpr`] tree and
//!   resolved later, never here.
//! - Environment variables: `$q_key_path` / `$quill_key_path`, where every
//!   `_` separates path segments.
//!
//! Everything here is a pure function of its input.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::ops::Range;

/// Deepest allowed placeholder-inside-placeholder nesting.
///
/// A placeholder nested deeper than this is not recognized and stays
/// literal text.
pub const MAX_NESTING_DEPTH: usize = 8;

static ENVVAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$(q|quill)_([_\-.a-zA-Z0-9]+)").expect("valid envvar pattern"));

/// What a token does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `{{ path }}`
    Name,
    /// `{{ path.{{ ref }} }}`: a name whose path contains references.
    NameRef,
    /// `{{& path }}`
    Ampersand,
    /// `{{#name}}`
    SectionOpen,
    /// `{{^name}}`
    SectionInvert,
    /// `{{/name}}`
    SectionClose,
    /// `$q_path` or `$quill_path`
    EnvVar,
}

/// One piece of a placeholder path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPart {
    Text(String),
    Ref(PathExpr),
}

/// A placeholder path, possibly containing nested references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr {
    /// The path as written, with surrounding whitespace trimmed.
    pub raw: String,
    pub parts: Vec<PathPart>,
}

impl PathExpr {
    /// A path with no nested references.
    pub fn literal(text: impl Into<String>) -> Self {
        let text = text.into();
        PathExpr {
            raw: text.trim().to_string(),
            parts: vec![PathPart::Text(text)],
        }
    }

    pub fn is_nested(&self) -> bool {
        self.parts.iter().any(|p| matches!(p, PathPart::Ref(_)))
    }

    /// Nesting depth: 0 for a plain path.
    pub fn depth(&self) -> usize {
        self.parts
            .iter()
            .map(|p| match p {
                PathPart::Text(_) => 0,
                PathPart::Ref(inner) => inner.depth() + 1,
            })
            .max()
            .unwrap_or(0)
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A reference discovered in template text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub path: PathExpr,
    /// 1-based line the token starts on.
    pub line: usize,
    /// The matched source text, verbatim.
    pub text: String,
    /// Byte range of `text` in the tokenized input.
    pub span: Range<usize>,
}

/// Find every placeholder token in `source`, in order.
///
/// Sections may span lines, so this runs over a whole document; a single
/// placeholder never spans lines.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut line = 1;
    let mut counted = 0;

    while let Some(found) = source[pos..].find("{{") {
        let start = pos + found;
        match scan_placeholder(source, start, 0) {
            Some(scan) => {
                line += source[counted..start].matches('\n').count();
                counted = start;
                tokens.push(Token {
                    kind: scan.kind(),
                    path: scan.path,
                    line,
                    text: source[start..scan.end].to_string(),
                    span: start..scan.end,
                });
                pos = scan.end;
            }
            // Not a placeholder; the second brace may still open one.
            None => pos = start + 1,
        }
    }

    tokens
}

/// Find every placeholder token in one line of text.
pub fn tokenize_line(text: &str, line: usize) -> Vec<Token> {
    let mut tokens = tokenize(text);
    for token in &mut tokens {
        token.line = line;
    }
    tokens
}

/// Find every `$q_` / `$quill_` reference in `source`, in order.
///
/// Underscores in the name are always path separators, so `$q_foo_bar`
/// refers to `foo.bar`; a key containing `_` cannot be referenced this way.
pub fn envvar_tokens(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut counted = 0;

    for captures in ENVVAR.captures_iter(source) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(2)) else {
            continue;
        };
        line += source[counted..whole.start()].matches('\n').count();
        counted = whole.start();

        tokens.push(Token {
            kind: TokenKind::EnvVar,
            path: PathExpr::literal(name.as_str().replace('_', ".")),
            line,
            text: whole.as_str().to_string(),
            span: whole.range(),
        });
    }

    tokens
}

/// Find every envvar reference in one line of text.
pub fn envvar_tokens_line(text: &str, line: usize) -> Vec<Token> {
    let mut tokens = envvar_tokens(text);
    for token in &mut tokens {
        token.line = line;
    }
    tokens
}

struct Scan {
    sigil: Option<u8>,
    path: PathExpr,
    end: usize,
}

impl Scan {
    fn kind(&self) -> TokenKind {
        match self.sigil {
            Some(b'#') => TokenKind::SectionOpen,
            Some(b'^') => TokenKind::SectionInvert,
            Some(b'/') => TokenKind::SectionClose,
            Some(b'&') => TokenKind::Ampersand,
            _ if self.path.is_nested() => TokenKind::NameRef,
            _ => TokenKind::Name,
        }
    }
}

fn is_path_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_' | b' ' | b'\t')
}

fn opens_at(bytes: &[u8], pos: usize) -> bool {
    bytes.get(pos) == Some(&b'{') && bytes.get(pos + 1) == Some(&b'{')
}

fn closes_at(bytes: &[u8], pos: usize) -> bool {
    bytes.get(pos) == Some(&b'}') && bytes.get(pos + 1) == Some(&b'}')
}

/// Scan one placeholder whose `{{` starts at `start`.
///
/// Returns `None` when the text there is not a well-formed placeholder.
fn scan_placeholder(source: &str, start: usize, depth: usize) -> Option<Scan> {
    let bytes = source.as_bytes();
    let mut pos = start + 2;

    while matches!(bytes.get(pos), Some(b' ' | b'\t')) {
        pos += 1;
    }

    // Sigils only make sense on the outermost placeholder.
    let sigil = match bytes.get(pos) {
        Some(&b @ (b'#' | b'^' | b'/' | b'&')) if depth == 0 => {
            pos += 1;
            while matches!(bytes.get(pos), Some(b' ' | b'\t')) {
                pos += 1;
            }
            Some(b)
        }
        _ => None,
    };

    let path_start = pos;
    let mut text_start = pos;
    let mut parts = Vec::new();

    let path_end = loop {
        if opens_at(bytes, pos) {
            if depth + 1 >= MAX_NESTING_DEPTH {
                return None;
            }
            let inner = scan_placeholder(source, pos, depth + 1)?;
            if pos > text_start {
                parts.push(PathPart::Text(source[text_start..pos].to_string()));
            }
            parts.push(PathPart::Ref(inner.path));
            pos = inner.end;
            text_start = pos;
        } else if closes_at(bytes, pos) {
            break pos;
        } else if bytes.get(pos).copied().is_some_and(is_path_byte) {
            pos += 1;
        } else {
            return None;
        }
    };

    if path_end > text_start {
        parts.push(PathPart::Text(source[text_start..path_end].to_string()));
    }

    let raw = source[path_start..path_end].trim();
    if raw.is_empty() {
        return None;
    }

    let path = PathExpr {
        raw: raw.to_string(),
        parts,
    };

    // Section names are plain paths.
    if matches!(sigil, Some(b'#' | b'^' | b'/')) && path.is_nested() {
        return None;
    }

    Some(Scan {
        sigil,
        path,
        end: path_end + 2,
    })
}
