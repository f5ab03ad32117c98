//! Template rendering for subjects and bodies
//!
//! Templates are plain text with `{{ .KEY }}` actions that are resolved against an
//! [`EnvironmentTable`]. Keys missing from the table render as [`MISSING_VALUE`]
//! instead of failing, while malformed actions are rejected when the template is parsed.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::domain::notifications::environment::EnvironmentTable;

lazy_static! {
    static ref KEY_CHAIN_REGEX: Regex =
        Regex::new(r"^(\.[A-Za-z_][A-Za-z0-9_]*)+$").unwrap();
}

/// Rendered in place of a key that is not in the table
pub const MISSING_VALUE: &str = "<no value>";

const LEFT_DELIMITER: &str = "{{";
const RIGHT_DELIMITER: &str = "}}";

/// A template that could not be parsed
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// `{{` without a matching `}}`
    #[error("template: {line}: unclosed action")]
    UnclosedAction {
        /// Line the action starts on
        line: usize,
    },

    /// `{{ }}`
    #[error("template: {line}: missing value for command")]
    EmptyAction {
        /// Line the action starts on
        line: usize,
    },

    /// Anything other than a dotted key inside an action
    #[error("template: {line}: unexpected {action:?} in command")]
    InvalidAction {
        /// Line the action starts on
        line: usize,

        /// The offending action text
        action: String,
    },
}

/// A template that parsed but could not be executed
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    /// A field was accessed on a table value
    #[error("template: {line}: can't evaluate field {field} in type string")]
    NoSuchField {
        /// Line the action starts on
        line: usize,

        /// The field that was accessed
        field: String,
    },
}

/// Any template failure
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    /// The template could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The template could not be executed
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// How substituted values are written into the output
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Escape {
    /// Values are written as they are
    #[default]
    None,

    /// Values are HTML-escaped
    Html,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Node {
    Text(String),
    Lookup { line: usize, path: Vec<String> },
}

/// A parsed template
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    /// Parses `source` into a template.
    ///
    /// # Errors
    /// Returns a [`ParseError`] for unclosed, empty or malformed actions.
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        let mut nodes = Vec::new();
        let mut rest = source;
        let mut offset = 0;
        let mut trim_next = false;

        while let Some(start) = rest.find(LEFT_DELIMITER) {
            let line = line_of(source, offset + start);
            let mut text = &rest[..start];
            let mut action = &rest[start + LEFT_DELIMITER.len()..];

            if trim_next {
                text = text.trim_start();
            }

            if let Some(trimmed) = strip_trim_marker(action) {
                text = text.trim_end();
                action = trimmed;
            }

            push_text(&mut nodes, text);

            let end = action
                .find(RIGHT_DELIMITER)
                .ok_or(ParseError::UnclosedAction { line })?;

            let mut inner = &action[..end];
            trim_next = false;

            if let Some(trimmed) = strip_trailing_trim_marker(inner) {
                inner = trimmed;
                trim_next = true;
            }

            if let Some(node) = parse_action(inner.trim(), line)? {
                nodes.push(node);
            }

            let consumed = rest.len() - action.len() + end + RIGHT_DELIMITER.len();
            offset += consumed;
            rest = &rest[consumed..];
        }

        push_text(
            &mut nodes,
            if trim_next { rest.trim_start() } else { rest },
        );

        Ok(Self { nodes })
    }

    /// Executes the template against `table`.
    ///
    /// # Errors
    /// Returns a [`RenderError`] when a field is accessed on a value.
    pub fn render(&self, table: &EnvironmentTable, escape: Escape) -> Result<String, RenderError> {
        let mut output = String::new();

        for node in &self.nodes {
            match node {
                Node::Text(text) => output.push_str(text),
                Node::Lookup { line, path } => {
                    let value = match (table.get(&path[0]), path.get(1)) {
                        (Some(_), Some(field)) => {
                            return Err(RenderError::NoSuchField {
                                line: *line,
                                field: field.clone(),
                            });
                        }
                        (Some(value), None) => value,
                        (None, _) => MISSING_VALUE,
                    };

                    match escape {
                        Escape::None => output.push_str(value),
                        Escape::Html => {
                            output.push_str(&html_escape::encode_quoted_attribute(value))
                        }
                    }
                }
            }
        }

        Ok(output)
    }
}

/// Parses and renders `source` in one step
pub fn render(
    source: &str,
    table: &EnvironmentTable,
    escape: Escape,
) -> Result<String, TemplateError> {
    Ok(Template::parse(source)?.render(table, escape)?)
}

fn line_of(source: &str, position: usize) -> usize {
    source[..position].matches('\n').count() + 1
}

fn push_text(nodes: &mut Vec<Node>, text: &str) {
    if !text.is_empty() {
        nodes.push(Node::Text(text.to_string()));
    }
}

fn strip_trim_marker(action: &str) -> Option<&str> {
    let stripped = action.strip_prefix('-')?;

    stripped
        .starts_with(|c: char| c.is_ascii_whitespace())
        .then_some(stripped)
}

fn strip_trailing_trim_marker(inner: &str) -> Option<&str> {
    let stripped = inner.strip_suffix('-')?;

    stripped
        .ends_with(|c: char| c.is_ascii_whitespace())
        .then_some(stripped)
}

fn parse_action(action: &str, line: usize) -> Result<Option<Node>, ParseError> {
    if action.is_empty() {
        return Err(ParseError::EmptyAction { line });
    }

    if action.starts_with("/*") && action.ends_with("*/") && action.len() >= 4 {
        return Ok(None);
    }

    if !KEY_CHAIN_REGEX.is_match(action) {
        return Err(ParseError::InvalidAction {
            line,
            action: action.to_string(),
        });
    }

    let path = action[1..].split('.').map(str::to_string).collect();

    Ok(Some(Node::Lookup { line, path }))
}
