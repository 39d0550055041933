//! The compiled grammar: an arena of rules, the start rule, and the
//! whitespace policy shared by all whitespace-skipping terminals.

mod matcher;

pub use matcher::*;

use std::collections::BTreeSet;

use regex::Regex;

/// Index of a rule in the grammar's arena. Symbol matchers store this
/// instead of a reference, which keeps the rule/symbol cycle out of the
/// ownership graph.
pub type RuleId = usize;

/// Default whitespace pattern, replaceable by the `whitespace /…/`
/// preamble.
pub const DEFAULT_WHITESPACE: &str = r"\s+";

/// A named rule. Created with an empty body on first reference; the
/// validator rejects grammars where any referenced rule is never defined.
#[derive(Debug)]
pub struct Rule {
    pub name: String,
    /// Expectation text used in error messages instead of the rule's inner
    /// terminals.
    pub description: Option<String>,
    /// Whether terminals of this rule absorb trailing whitespace (`=` head)
    /// or are strictly adjacent (`.=` head).
    pub skip_ws: bool,
    pub body: Option<Matcher>,
}

#[derive(Debug)]
pub struct Grammar {
    rules: Vec<Rule>,
    start: RuleId,
    whitespace: Regex,
}

impl Grammar {
    pub(crate) fn new(rules: Vec<Rule>, start: RuleId, whitespace: Regex) -> Self {
        Self {
            rules,
            start,
            whitespace,
        }
    }

    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id]
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// The first rule defined in the grammar source.
    pub fn start(&self) -> RuleId {
        self.start
    }

    /// The whitespace pattern, compiled anchored at the cursor.
    pub fn whitespace(&self) -> &Regex {
        &self.whitespace
    }

    /// All replacement and predicate names referenced anywhere in the
    /// grammar, for binding validation.
    pub(crate) fn referenced_actions(&self) -> (BTreeSet<String>, BTreeSet<String>) {
        let mut replacements = BTreeSet::new();
        let mut predicates = BTreeSet::new();
        for rule in &self.rules {
            if let Some(body) = &rule.body {
                body.collect_actions(&mut replacements, &mut predicates);
            }
        }
        (replacements, predicates)
    }
}
