/*
 * template.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template parsing and rendering.
//!
//! Rendering happens in three steps:
//!
//! 1. [`Template::parse`] turns the document into literal text, variables
//!    and section blocks.
//! 2. [`Template::verify`] resolves every variable outside a section against
//!    the configuration, so a missing value fails before any output exists.
//! 3. Substitution walks the tree. Variables inside a section body resolve
//!    against the section's context when (and only if) the body is rendered.

use crate::error::{TemplateError, TemplateResult};
use crate::matcher::{Token, TokenKind, tokenize};
use crate::resolve::{Context, resolve_value};
use quill_config::ConfigValue;

/// A node in a parsed template.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text to be output as-is.
    Text(String),

    /// `{{ path }}`, `{{& path }}` or `{{ path.{{ ref }} }}`.
    Variable(Token),

    /// `{{#name}}...{{/name}}` or `{{^name}}...{{/name}}`.
    Section(Section),
}

/// A section block.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    /// The opening token.
    pub token: Token,
    /// True for `{{^name}}`: render only when `name` is missing or falsy.
    pub inverted: bool,
    pub body: Vec<Node>,
}

impl Section {
    pub fn name(&self) -> &str {
        &self.token.path.raw
    }
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub nodes: Vec<Node>,
}

struct OpenSection {
    token: Token,
    inverted: bool,
    body: Vec<Node>,
}

fn current<'a>(stack: &'a mut [OpenSection], root: &'a mut Vec<Node>) -> &'a mut Vec<Node> {
    match stack.last_mut() {
        Some(open) => &mut open.body,
        None => root,
    }
}

impl Template {
    /// Parse a template from source text.
    ///
    /// Fails only on malformed sections (unclosed, unopened or mismatched).
    pub fn parse(source: &str) -> TemplateResult<Self> {
        let mut root = Vec::new();
        let mut stack: Vec<OpenSection> = Vec::new();
        let mut cursor = 0;

        for token in tokenize(source) {
            if token.span.start > cursor {
                current(&mut stack, &mut root)
                    .push(Node::Text(source[cursor..token.span.start].to_string()));
            }
            cursor = token.span.end;

            match token.kind {
                TokenKind::SectionOpen | TokenKind::SectionInvert => {
                    let inverted = token.kind == TokenKind::SectionInvert;
                    stack.push(OpenSection {
                        token,
                        inverted,
                        body: Vec::new(),
                    });
                }
                TokenKind::SectionClose => {
                    let Some(open) = stack.pop() else {
                        return Err(TemplateError::parse(
                            format!("Unopened section \"{}\"", token.path.raw),
                            token.line,
                        ));
                    };
                    if open.token.path.raw != token.path.raw {
                        return Err(TemplateError::parse(
                            format!(
                                "Unclosed section \"{}\" (found \"{}\")",
                                open.token.path.raw, token.path.raw
                            ),
                            token.line,
                        ));
                    }
                    current(&mut stack, &mut root).push(Node::Section(Section {
                        token: open.token,
                        inverted: open.inverted,
                        body: open.body,
                    }));
                }
                _ => current(&mut stack, &mut root).push(Node::Variable(token)),
            }
        }

        if let Some(open) = stack.pop() {
            return Err(TemplateError::parse(
                format!("Unclosed section \"{}\"", open.token.path.raw),
                open.token.line,
            ));
        }

        if cursor < source.len() {
            root.push(Node::Text(source[cursor..].to_string()));
        }

        Ok(Template { nodes: root })
    }

    /// Check that every variable outside a section resolves in `config`.
    ///
    /// Nested references are resolved first; the error names the inner path
    /// when an inner reference is missing, otherwise the resolved outer path.
    pub fn verify(&self, config: &ConfigValue) -> TemplateResult<()> {
        let context = Context::new(config);
        for node in &self.nodes {
            if let Node::Variable(token) = node {
                resolve_value(&token.path, &context)?;
            }
        }
        Ok(())
    }

    /// Render this template against `config`.
    pub fn render(&self, config: &ConfigValue) -> TemplateResult<String> {
        self.verify(config)?;

        let mut context = Context::new(config);
        let mut output = String::new();
        evaluate(&self.nodes, &mut context, &mut output)?;
        Ok(output)
    }
}

/// Parse and render `source` against `config`.
///
/// ```
/// use quill_template::{ConfigValue, render};
///
/// let config = ConfigValue::from_json_str(r#"{ "nest": { "key": "nest.key" }, "ref": "key" }"#).unwrap();
/// assert_eq!(render("{{ nest.{{ ref }} }}", &config).unwrap(), "nest.key");
/// ```
pub fn render(source: &str, config: &ConfigValue) -> TemplateResult<String> {
    Template::parse(source)?.render(config)
}

fn evaluate<'a>(
    nodes: &[Node],
    context: &mut Context<'a>,
    output: &mut String,
) -> TemplateResult<()> {
    for node in nodes {
        match node {
            Node::Text(text) => output.push_str(text),

            Node::Variable(token) => {
                let value = resolve_value(&token.path, context)?;
                output.push_str(&value.render());
            }

            Node::Section(section) => evaluate_section(section, context, output)?,
        }
    }
    Ok(())
}

fn evaluate_section<'a>(
    section: &Section,
    context: &mut Context<'a>,
    output: &mut String,
) -> TemplateResult<()> {
    let value = context.lookup(section.name());
    let truthy = value.is_some_and(ConfigValue::is_truthy);

    if section.inverted {
        if !truthy {
            evaluate(&section.body, context, output)?;
        }
        return Ok(());
    }

    let Some(value) = value.filter(|_| truthy) else {
        return Ok(());
    };

    let items: Vec<&'a ConfigValue> = match value {
        ConfigValue::List(items) => items.iter().collect(),
        other => vec![other],
    };

    for item in items {
        context.push(item);
        let result = evaluate(&section.body, context, output);
        context.pop();
        result?;
    }
    Ok(())
}
