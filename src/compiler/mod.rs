//! Compiler for the grammar DSL.
//!
//! Parses a grammar description into a [`Grammar`] by recursive descent
//! over the token stream, then runs the static validation pass. Failures
//! latch a single error on the lexer and are returned as a formatted
//! [`ConfigError`]; no grammar is produced.

mod validate;

use std::collections::HashMap;

use log::debug;
use regex::Regex;

use crate::{
    error::ConfigError,
    grammar::{Grammar, Item, Matcher, Rule, RuleId, DEFAULT_WHITESPACE},
    lexer::{Lexer, Token, TokenKind},
};

/// Compile and validate a grammar description.
pub fn compile(source: &str) -> Result<Grammar, ConfigError> {
    let mut compiler = Compiler::new(source);
    compiler.grammar();
    compiler.finish()
}

/// Compile a pattern anchored at the cursor, the way every terminal and
/// whitespace regex in a grammar is used.
pub(crate) fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"\A(?:{pattern})"))
}

struct Compiler<'a> {
    lexer: Lexer<'a>,
    rules: Vec<Rule>,
    index: HashMap<String, RuleId>,
    start: Option<RuleId>,
    whitespace: Regex,
    /// Whitespace flag of the rule currently being parsed, stamped onto
    /// its terminals.
    skip_ws: bool,
}

impl<'a> Compiler<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            lexer: Lexer::new(source),
            rules: Vec::new(),
            index: HashMap::new(),
            start: None,
            whitespace: compile_pattern(DEFAULT_WHITESPACE)
                .expect("default whitespace pattern is valid"),
            skip_ws: true,
        }
    }

    /// grammar := ('whitespace' REGEX)? rule+
    fn grammar(&mut self) {
        self.preamble();
        let mut any = false;
        loop {
            let token = self.lexer.next();
            match token.kind {
                TokenKind::Eof => break,
                TokenKind::Symbol => {
                    self.rule(token);
                    any = true;
                }
                _ => {
                    self.lexer.error("expected rule name", &token);
                    break;
                }
            }
        }
        if !any && !self.lexer.has_error() {
            let token = self.lexer.peek();
            self.lexer.error("empty grammar", &token);
        }
    }

    fn preamble(&mut self) {
        let token = self.lexer.next();
        if token.kind != TokenKind::Symbol || token.text != "whitespace" {
            self.lexer.push_back(token);
            return;
        }
        let pattern = self.lexer.next();
        if pattern.kind != TokenKind::Regex {
            self.lexer
                .error("expected regular expression after 'whitespace'", &pattern);
            return;
        }
        match compile_pattern(&pattern.text) {
            Ok(whitespace) => self.whitespace = whitespace,
            Err(_) => self.lexer.error("invalid regular expression", &pattern),
        }
    }

    /// rule := SYMBOL DESCRIPTION? '.'? '=' choice
    fn rule(&mut self, head: Token) {
        let id = self.rule_id(&head.text);
        let mut description = None;
        let mut token = self.lexer.next();
        if token.kind == TokenKind::Description {
            description = Some(token.text);
            token = self.lexer.next();
        }
        let skip_ws = if token.is_char('.') {
            token = self.lexer.next();
            false
        } else {
            true
        };
        if !token.is_char('=') {
            self.lexer.error("expected '='", &token);
            return;
        }
        if self.rules[id].body.is_some() {
            self.lexer
                .error(format!("rule '{}' is already defined", head.text), &head);
            return;
        }
        self.skip_ws = skip_ws;
        let body = self.choice();
        let rule = &mut self.rules[id];
        rule.description = description;
        rule.skip_ws = skip_ws;
        rule.body = body;
        if self.start.is_none() {
            self.start = Some(id);
        }
    }

    /// choice := sequence ('|' sequence)*
    fn choice(&mut self) -> Option<Matcher> {
        let first = self.sequence()?;
        let mut alternatives = vec![first];
        loop {
            let token = self.lexer.next();
            if !token.is_char('|') {
                self.lexer.push_back(token);
                break;
            }
            alternatives.push(self.sequence()?);
        }
        if alternatives.len() == 1 {
            alternatives.pop()
        } else {
            Some(Matcher::Choice { alternatives })
        }
    }

    /// sequence := item+ ('%' SYMBOL)?
    fn sequence(&mut self) -> Option<Matcher> {
        let mut items = Vec::new();
        while let Some(item) = self.item() {
            items.push(item);
        }
        if self.lexer.has_error() {
            return None;
        }
        if items.is_empty() {
            let token = self.lexer.peek();
            self.lexer.error("empty sequence", &token);
            return None;
        }
        let mut replacement = None;
        let token = self.lexer.next();
        if token.is_char('%') {
            let name = self.lexer.next();
            if name.kind != TokenKind::Symbol {
                self.lexer
                    .error("expected replacement name after '%'", &name);
                return None;
            }
            replacement = Some(name.text);
        } else {
            self.lexer.push_back(token);
        }
        Some(Matcher::Sequence { items, replacement })
    }

    /// item := ('!' | '-')? matcher ('*' | '+' | '?')? (':' SYMBOL)?
    ///
    /// Returns `None` at the end of the sequence (the terminating token is
    /// pushed back) and on a latched error.
    fn item(&mut self) -> Option<Item> {
        let mut token = self.lexer.next();
        let forced = if token.is_char('!') {
            Some(true)
        } else if token.is_char('-') {
            Some(false)
        } else {
            None
        };
        if forced.is_some() {
            token = self.lexer.next();
        }
        let mut matcher = match token.kind {
            TokenKind::Text => Matcher::Text {
                literal: token.text,
                skip_ws: self.skip_ws,
            },
            TokenKind::Regex => match compile_pattern(&token.text) {
                Ok(pattern) => Matcher::Regex {
                    pattern,
                    source: token.text,
                    skip_ws: self.skip_ws,
                },
                Err(_) => {
                    self.lexer.error("invalid regular expression", &token);
                    return None;
                }
            },
            TokenKind::Symbol => {
                // an unprefixed symbol followed by '=', '.' or a
                // description heads the next rule
                if forced.is_none() {
                    let lookahead = self.lexer.peek();
                    if lookahead.is_char('=')
                        || lookahead.is_char('.')
                        || lookahead.kind == TokenKind::Description
                    {
                        self.lexer.push_back(token);
                        return None;
                    }
                }
                Matcher::Symbol {
                    rule: self.rule_id(&token.text),
                }
            }
            TokenKind::Char if token.is_char('(') => {
                let inner = self.choice()?;
                let close = self.lexer.next();
                if !close.is_char(')') {
                    self.lexer.error("expected ')'", &close);
                    return None;
                }
                inner
            }
            _ => {
                self.lexer.push_back(token);
                return None;
            }
        };
        let suffix = self.lexer.next();
        if suffix.is_char('*') {
            matcher = Matcher::Repeat {
                base: Box::new(matcher),
                zero_ok: true,
                multiple_ok: true,
            };
        } else if suffix.is_char('+') {
            matcher = Matcher::Repeat {
                base: Box::new(matcher),
                zero_ok: false,
                multiple_ok: true,
            };
        } else if suffix.is_char('?') {
            matcher = Matcher::Repeat {
                base: Box::new(matcher),
                zero_ok: true,
                multiple_ok: false,
            };
        } else {
            self.lexer.push_back(suffix);
        }
        let colon = self.lexer.next();
        if colon.is_char(':') {
            let name = self.lexer.next();
            if name.kind != TokenKind::Symbol {
                self.lexer.error("expected predicate name after ':'", &name);
                return None;
            }
            matcher = Matcher::Predicate {
                base: Box::new(matcher),
                name: name.text,
            };
        } else {
            self.lexer.push_back(colon);
        }
        let keep = forced.unwrap_or_else(|| matcher.keep());
        Some(Item { matcher, keep })
    }

    /// Look a rule up by name, creating an undefined placeholder on first
    /// reference.
    fn rule_id(&mut self, name: &str) -> RuleId {
        if let Some(id) = self.index.get(name) {
            return *id;
        }
        let id = self.rules.len();
        self.rules.push(Rule {
            name: name.to_string(),
            description: None,
            skip_ws: true,
            body: None,
        });
        self.index.insert(name.to_string(), id);
        id
    }

    fn finish(self) -> Result<Grammar, ConfigError> {
        if let Some(message) = self.lexer.message() {
            return Err(ConfigError::new(message));
        }
        let grammar = Grammar::new(self.rules, self.start.unwrap_or(0), self.whitespace);
        validate::validate(&grammar)?;
        debug!("compiled grammar with {} rules", grammar.rules().len());
        Ok(grammar)
    }
}
