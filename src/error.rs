//! Error types and the diagnostic line formatter shared by the grammar
//! compiler and the matching engine.

use std::{error::Error, fmt::Display};

/// Error raised while compiling a grammar or binding actions. A parser in
/// this state is unusable, so callers cannot meaningfully continue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl Error for ConfigError {}

/// Error returned by [`Parser::parse`](crate::Parser::parse).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// An action function referenced by the grammar is missing. Only seen
    /// when binding was deferred to the first parse.
    Config(ConfigError),
    /// The input did not match; carries the formatted diagnostic.
    NoMatch(String),
}

impl Display for MatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchError::Config(error) => error.fmt(f),
            MatchError::NoMatch(message) => f.write_str(message),
        }
    }
}

impl Error for MatchError {}

/// Render `message` against `source` as a three-line diagnostic with a
/// caret pointing at the byte position `pos`:
///
/// ```text
/// <message>, line <N>:
///     <line text>
///     <spaces>^
/// ```
pub fn format_line(message: &str, source: &str, pos: usize) -> String {
    let mut line_start = 0;
    let mut line_number = 1;
    for (index, c) in source.char_indices() {
        if index >= pos {
            break;
        }
        if c == '\n' {
            line_start = index + 1;
            line_number += 1;
        }
    }
    let line = source[line_start..].lines().next().unwrap_or("");
    let column = pos - line_start;
    format!(
        "{message}, line {line_number}:\n    {line}\n    {}^",
        " ".repeat(column)
    )
}
