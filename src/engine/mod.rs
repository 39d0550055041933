//! The matching engine's per-call state: cursor, whitespace skipping, and
//! the furthest-failure record that error messages are built from.

use log::trace;

use crate::{
    actions::{Actions, FormatLine},
    error::format_line,
    grammar::{Grammar, Matcher},
    value::Value,
};

/// One entry of the expectation list kept at the furthest failure position.
pub(crate) enum Expectation {
    /// A literal terminal, rendered in single quotes.
    Literal(String),
    /// A regex terminal, rendered as its pattern source.
    Pattern(String),
    /// A rule description or a predicate's expectation text.
    Described(String),
    /// A rich failure that renders itself through the line formatter.
    Rich(Box<dyn Fn(FormatLine) -> String>),
}

impl Expectation {
    fn render(&self) -> Option<String> {
        match self {
            Expectation::Literal(text) => Some(format!("'{text}'")),
            Expectation::Pattern(source) => Some(format!("/{source}/")),
            Expectation::Described(text) => Some(text.clone()),
            Expectation::Rich(_) => None,
        }
    }
}

/// Scratch state for one match call.
pub(crate) struct MatchState<'a, V> {
    grammar: &'a Grammar,
    actions: &'a Actions<V>,
    input: &'a str,
    cursor: usize,
    furthest: usize,
    expectations: Vec<Expectation>,
}

impl<'a, V> MatchState<'a, V> {
    pub fn new(grammar: &'a Grammar, actions: &'a Actions<V>, input: &'a str) -> Self {
        Self {
            grammar,
            actions,
            input,
            cursor: 0,
            furthest: 0,
            expectations: Vec::new(),
        }
    }

    pub fn grammar(&self) -> &'a Grammar {
        self.grammar
    }

    pub fn actions(&self) -> &'a Actions<V> {
        self.actions
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_cursor(&mut self, to: usize) {
        self.cursor = to;
    }

    /// The input from the cursor onwards.
    pub fn rest(&self) -> &'a str {
        &self.input[self.cursor..]
    }

    pub fn at_end(&self) -> bool {
        self.cursor == self.input.len()
    }

    /// Skip whitespace at the cursor, if any.
    pub fn skip_whitespace(&mut self) {
        if let Some(found) = self.grammar.whitespace().find(self.rest()) {
            self.cursor += found.end();
        }
    }

    pub fn expectation_count(&self) -> usize {
        self.expectations.len()
    }

    /// Record a failed expectation at the cursor. A position beyond the
    /// current furthest failure replaces the list, the same position
    /// appends (after truncating to `keep`, when supplied), and earlier
    /// positions are ignored.
    pub fn record(&mut self, what: Expectation, keep: Option<usize>) {
        if self.cursor > self.furthest {
            self.furthest = self.cursor;
            self.expectations.clear();
            self.expectations.push(what);
        } else if self.cursor == self.furthest {
            if let Some(keep) = keep {
                self.expectations.truncate(keep);
            }
            self.expectations.push(what);
        }
    }

    /// The formatted diagnostic for the current failure record.
    pub fn failure_message(&self) -> String {
        let line = |message: &str, pos: usize| format_line(message, self.input, pos);
        for expectation in &self.expectations {
            if let Expectation::Rich(render) = expectation {
                return render(&line);
            }
        }
        let mut texts = self
            .expectations
            .iter()
            .filter_map(|expectation| expectation.render())
            .collect::<Vec<_>>();
        texts.sort();
        texts.dedup();
        line(&format!("expected {}", join_or(&texts)), self.furthest)
    }
}

/// Join expectation texts with comma plus "or": `X`, `X or Y`,
/// `X, Y, or Z`.
fn join_or(texts: &[String]) -> String {
    match texts {
        [] => String::new(),
        [one] => one.clone(),
        [first, second] => format!("{first} or {second}"),
        [head @ .., tail] => format!("{}, or {tail}", head.join(", ")),
    }
}

/// Run `grammar` against `input` from the start rule, enforcing that the
/// whole input is consumed.
pub(crate) fn run<V>(
    grammar: &Grammar,
    actions: &Actions<V>,
    input: &str,
) -> Result<Value<V>, String> {
    trace!(
        "matching {} bytes against rule '{}'",
        input.len(),
        grammar.rule(grammar.start()).name
    );
    let mut state = MatchState::new(grammar, actions, input);
    let root = Matcher::Symbol {
        rule: grammar.start(),
    };
    match root.match_at(&mut state, &[]) {
        Some(value) if state.at_end() => Ok(value),
        Some(_) => {
            state.record(Expectation::Described("end of input".into()), None);
            Err(state.failure_message())
        }
        None => Err(state.failure_message()),
    }
}
