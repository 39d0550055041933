//! Matcher graph nodes and their matching behaviour.
//!
//! The seven variants form a closed set, so the matching contract and the
//! static-analysis queries are plain `match` dispatch instead of a trait
//! hierarchy.

use std::collections::BTreeSet;

use crate::{
    actions::Verdict,
    engine::{Expectation, MatchState},
    value::{Token, Value},
};

use super::{Grammar, RuleId};

/// A node of the compiled matcher graph.
#[derive(Debug)]
pub enum Matcher {
    /// Matches a literal string at the cursor.
    Text { literal: String, skip_ws: bool },
    /// Matches a regular expression anchored at the cursor.
    Regex {
        pattern: regex::Regex,
        source: String,
        skip_ws: bool,
    },
    /// Delegates to the body of the referenced rule.
    Symbol { rule: RuleId },
    /// Matches every item in order; kept item values feed the replacement.
    Sequence {
        items: Vec<Item>,
        replacement: Option<String>,
    },
    /// Tries each alternative at the same cursor; the first match wins.
    Choice { alternatives: Vec<Matcher> },
    /// `*`, `+` and `?`, encoded by the two flags.
    Repeat {
        base: Box<Matcher>,
        zero_ok: bool,
        multiple_ok: bool,
    },
    /// Matches the base, then lets the named predicate veto the result.
    Predicate { base: Box<Matcher>, name: String },
}

/// A sequence element: a matcher plus the decision whether its value flows
/// into the sequence's value list.
#[derive(Debug)]
pub struct Item {
    pub matcher: Matcher,
    pub keep: bool,
}

impl Matcher {
    /// Whether values of this matcher are kept by default. Literal text is
    /// usually structural, everything else carries data.
    pub fn keep(&self) -> bool {
        !matches!(self, Matcher::Text { .. })
    }

    /// Run this matcher against the input. `prior` holds the values the
    /// enclosing sequence has kept so far; predicates get to see it.
    /// `None` is the no-match sentinel. Cursor restore on failure is the
    /// sequence's responsibility; choice and repeat restore before each
    /// attempt.
    pub(crate) fn match_at<V>(
        &self,
        state: &mut MatchState<'_, V>,
        prior: &[Value<V>],
    ) -> Option<Value<V>> {
        match self {
            Matcher::Text { literal, skip_ws } => {
                let start = state.cursor();
                if !state.rest().starts_with(literal.as_str()) {
                    state.record(Expectation::Literal(literal.clone()), None);
                    return None;
                }
                state.set_cursor(start + literal.len());
                if *skip_ws {
                    state.skip_whitespace();
                }
                Some(Value::Token(Token {
                    text: literal.clone(),
                    pos: start,
                }))
            }
            Matcher::Regex {
                pattern,
                source,
                skip_ws,
            } => {
                let start = state.cursor();
                let Some(found) = pattern.find(state.rest()) else {
                    state.record(Expectation::Pattern(source.clone()), None);
                    return None;
                };
                let text = found.as_str().to_string();
                state.set_cursor(start + found.end());
                if *skip_ws {
                    state.skip_whitespace();
                }
                Some(Value::Token(Token { text, pos: start }))
            }
            Matcher::Symbol { rule } => {
                let rule = state.grammar().rule(*rule);
                let snapshot = rule
                    .description
                    .as_ref()
                    .map(|_| state.expectation_count());
                if rule.skip_ws {
                    state.skip_whitespace();
                }
                let Some(body) = rule.body.as_ref() else {
                    return None;
                };
                let result = body.match_at(state, &[]);
                if result.is_none() {
                    if let (Some(description), Some(snapshot)) = (&rule.description, snapshot) {
                        state.record(
                            Expectation::Described(description.clone()),
                            Some(snapshot),
                        );
                    }
                }
                result
            }
            Matcher::Sequence { items, replacement } => {
                let start = state.cursor();
                let mut kept = Vec::new();
                for item in items {
                    match item.matcher.match_at(state, &kept) {
                        Some(value) => {
                            if item.keep {
                                kept.push(value);
                            }
                        }
                        None => {
                            state.set_cursor(start);
                            return None;
                        }
                    }
                }
                let value = if let Some(name) = replacement {
                    match state.actions().get_replacement(name) {
                        Some(replace) => replace(kept),
                        // bindings are validated before the engine runs
                        None => Value::List(kept),
                    }
                } else if kept.len() == 1 {
                    kept.remove(0)
                } else {
                    Value::List(kept)
                };
                Some(value)
            }
            Matcher::Choice { alternatives } => {
                let start = state.cursor();
                for alternative in alternatives {
                    state.set_cursor(start);
                    if let Some(value) = alternative.match_at(state, prior) {
                        return Some(value);
                    }
                }
                state.set_cursor(start);
                None
            }
            Matcher::Repeat {
                base,
                zero_ok,
                multiple_ok,
            } => {
                let start = state.cursor();
                let mut values = Vec::new();
                loop {
                    // stop at end of input once the repetition is already
                    // satisfied; terminates zero-length loops at EOF even
                    // though the validator rejects nullable bases
                    if state.at_end() && (*zero_ok || !values.is_empty()) {
                        break;
                    }
                    let attempt = state.cursor();
                    match base.match_at(state, prior) {
                        Some(value) => values.push(value),
                        None => {
                            state.set_cursor(attempt);
                            break;
                        }
                    }
                    if !*multiple_ok {
                        break;
                    }
                }
                if !*zero_ok && values.is_empty() {
                    state.set_cursor(start);
                    return None;
                }
                Some(Value::List(values))
            }
            Matcher::Predicate { base, name } => {
                let start = state.cursor();
                let value = base.match_at(state, prior)?;
                let Some(predicate) = state.actions().get_predicate(name) else {
                    // bindings are validated before the engine runs
                    return Some(value);
                };
                match predicate(&value, prior) {
                    Verdict::Accept => Some(value),
                    Verdict::Expected(text) => {
                        state.record(Expectation::Described(text), None);
                        state.set_cursor(start);
                        None
                    }
                    Verdict::Report(render) => {
                        state.record(Expectation::Rich(render), None);
                        state.set_cursor(start);
                        None
                    }
                }
            }
        }
    }

    /// Collect every replacement and predicate name reachable from this
    /// matcher.
    pub(crate) fn collect_actions(
        &self,
        replacements: &mut BTreeSet<String>,
        predicates: &mut BTreeSet<String>,
    ) {
        match self {
            Matcher::Text { .. } | Matcher::Regex { .. } | Matcher::Symbol { .. } => {}
            Matcher::Sequence { items, replacement } => {
                if let Some(name) = replacement {
                    replacements.insert(name.clone());
                }
                for item in items {
                    item.matcher.collect_actions(replacements, predicates);
                }
            }
            Matcher::Choice { alternatives } => {
                for alternative in alternatives {
                    alternative.collect_actions(replacements, predicates);
                }
            }
            Matcher::Repeat { base, .. } => base.collect_actions(replacements, predicates),
            Matcher::Predicate { base, name } => {
                predicates.insert(name.clone());
                base.collect_actions(replacements, predicates);
            }
        }
    }

    /// Compact one-line rendering of this matcher, mainly for tests.
    pub fn dump(&self, grammar: &Grammar) -> String {
        match self {
            Matcher::Text { literal, .. } => format!("'{literal}'"),
            Matcher::Regex { source, .. } => format!("/{source}/"),
            Matcher::Symbol { rule } => grammar.rule(*rule).name.clone(),
            Matcher::Sequence { items, replacement } => {
                let mut parts = items
                    .iter()
                    .map(|item| {
                        let rendered = item.matcher.dump(grammar);
                        if item.keep == item.matcher.keep() {
                            rendered
                        } else if item.keep {
                            format!("!{rendered}")
                        } else {
                            format!("-{rendered}")
                        }
                    })
                    .collect::<Vec<_>>();
                if let Some(name) = replacement {
                    parts.push(format!("%{name}"));
                }
                format!("({})", parts.join(" "))
            }
            Matcher::Choice { alternatives } => {
                let parts = alternatives
                    .iter()
                    .map(|alternative| alternative.dump(grammar))
                    .collect::<Vec<_>>();
                format!("({})", parts.join(" | "))
            }
            Matcher::Repeat {
                base,
                zero_ok,
                multiple_ok,
            } => {
                let suffix = match (zero_ok, multiple_ok) {
                    (true, true) => "*",
                    (false, true) => "+",
                    (true, false) => "?",
                    (false, false) => "",
                };
                format!("{}{suffix}", base.dump(grammar))
            }
            Matcher::Predicate { base, name } => format!("{}:{name}", base.dump(grammar)),
        }
    }
}
