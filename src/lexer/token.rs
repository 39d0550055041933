/// The token kinds of the grammar DSL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Eof,
    /// A lowercase rule name, `[a-z][a-zA-Z0-9]*`.
    Symbol,
    /// A single-quoted literal; `text` holds the escape-processed content.
    Text,
    /// A `/…/` pattern; `text` holds the pattern source with capturing
    /// groups converted to non-capturing ones.
    Regex,
    /// A `<…>` annotation; `text` holds the inner text.
    Description,
    /// Any other single character, used for the DSL's punctuation.
    Char,
}

/// A token of the grammar DSL, positioned by byte offset in the grammar
/// source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub pos: usize,
}

impl Token {
    /// Whether this is the punctuation character `c`.
    pub fn is_char(&self, c: char) -> bool {
        self.kind == TokenKind::Char && self.text.chars().next() == Some(c)
    }
}
