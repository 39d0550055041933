//! Lexer for the grammar DSL.
//!
//! Turns a grammar description into a flat stream of [`Token`]s via one
//! combined pattern tried at the cursor. The lexer latches its first error:
//! after [`Lexer::error`] has been called, [`Lexer::next`] returns
//! [`TokenKind::Eof`] forever and [`Lexer::message`] renders the recorded
//! failure against the grammar source.

mod token;

pub use token::*;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::format_line;

static TOKEN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\A(?:",
        r"(?P<ws>\s+)",
        r"|(?P<symbol>[a-z][a-zA-Z0-9]*)",
        r"|(?P<text>'(?:\\.|[^'\\])*')",
        r"|(?P<regex>/(?:\\.|[^/\\])*/)",
        r"|(?P<description><[^>]*>)",
        r")",
    ))
    .expect("token pattern is valid")
});

pub struct Lexer<'a> {
    input: &'a str,
    cursor: usize,
    pushed_back: Vec<Token>,
    error: Option<(String, usize)>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            cursor: 0,
            pushed_back: Vec::new(),
            error: None,
        }
    }

    /// The next token. Returns EOF forever once an error is latched.
    pub fn next(&mut self) -> Token {
        if self.error.is_some() {
            return self.eof();
        }
        if let Some(token) = self.pushed_back.pop() {
            return token;
        }
        loop {
            let rest = &self.input[self.cursor..];
            let Some(c) = rest.chars().next() else {
                return self.eof();
            };
            let Some(captures) = TOKEN_PATTERN.captures(rest) else {
                let token = Token {
                    kind: TokenKind::Char,
                    text: c.to_string(),
                    pos: self.cursor,
                };
                self.cursor += c.len_utf8();
                return token;
            };
            let pos = self.cursor;
            self.cursor += captures[0].len();
            if captures.name("ws").is_some() {
                continue;
            }
            if let Some(found) = captures.name("symbol") {
                return Token {
                    kind: TokenKind::Symbol,
                    text: found.as_str().to_string(),
                    pos,
                };
            }
            if let Some(found) = captures.name("text") {
                let inner = &found.as_str()[1..found.as_str().len() - 1];
                return Token {
                    kind: TokenKind::Text,
                    text: unescape_text(inner),
                    pos,
                };
            }
            if let Some(found) = captures.name("regex") {
                let inner = &found.as_str()[1..found.as_str().len() - 1];
                return Token {
                    kind: TokenKind::Regex,
                    text: convert_groups(inner),
                    pos,
                };
            }
            if let Some(found) = captures.name("description") {
                let inner = &found.as_str()[1..found.as_str().len() - 1];
                return Token {
                    kind: TokenKind::Description,
                    text: inner.to_string(),
                    pos,
                };
            }
            unreachable!("token pattern matched without a named group");
        }
    }

    /// Push a token back onto the stream; replayed LIFO before new input.
    pub fn push_back(&mut self, token: Token) {
        self.pushed_back.push(token);
    }

    /// Look at the next token without consuming it.
    pub fn peek(&mut self) -> Token {
        let token = self.next();
        self.push_back(token.clone());
        token
    }

    /// Latch an error at `token`'s position. The first error wins; later
    /// ones are ignored.
    pub fn error(&mut self, reason: impl Into<String>, token: &Token) {
        if self.error.is_none() {
            self.error = Some((reason.into(), token.pos));
        }
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// The latched error rendered against the grammar source.
    pub fn message(&self) -> Option<String> {
        self.error
            .as_ref()
            .map(|(reason, pos)| format_line(reason, self.input, *pos))
    }

    fn eof(&self) -> Token {
        Token {
            kind: TokenKind::Eof,
            text: String::new(),
            pos: self.input.len(),
        }
    }
}

/// Process the backslash escapes of a TEXT literal: `\'` and the standard
/// `\b \f \t \v \r \n`; any other `\X` yields literal `X`.
fn unescape_text(raw: &str) -> String {
    let mut text = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            text.push(c);
            continue;
        }
        match chars.next() {
            Some('b') => text.push('\u{8}'),
            Some('f') => text.push('\u{c}'),
            Some('t') => text.push('\t'),
            Some('v') => text.push('\u{b}'),
            Some('r') => text.push('\r'),
            Some('n') => text.push('\n'),
            Some(other) => text.push(other),
            None => text.push('\\'),
        }
    }
    text
}

/// Rewrite a REGEX token's pattern: `\/` loses its delimiter escape and
/// capturing `(` becomes `(?:`. The engine never uses submatches, so
/// avoiding capture groups is free. Escaped parens, `(?…` groups, and
/// character classes are left alone.
fn convert_groups(raw: &str) -> String {
    let mut pattern = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    let mut in_class = false;
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('/') => pattern.push('/'),
                Some(escaped) => {
                    pattern.push('\\');
                    pattern.push(escaped);
                }
                None => pattern.push('\\'),
            },
            '[' if !in_class => {
                in_class = true;
                pattern.push(c);
            }
            ']' if in_class => {
                in_class = false;
                pattern.push(c);
            }
            '(' if !in_class && chars.peek() != Some(&'?') => pattern.push_str("(?:"),
            _ => pattern.push(c),
        }
    }
    pattern
}
