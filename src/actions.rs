//! The contract between a grammar and its host application: replacement
//! functions transform a sequence's kept values, predicates get a veto over
//! an otherwise successful match.

use std::collections::HashMap;

use crate::value::Value;

/// Signature of the line formatter handed to a rich verdict: renders a
/// message and a byte position into the engine's three-line diagnostic.
pub type FormatLine<'a> = &'a dyn Fn(&str, usize) -> String;

/// A replacement function, receiving the kept values of its sequence.
pub type Replacement<V> = Box<dyn Fn(Vec<Value<V>>) -> Value<V>>;

/// A predicate function, receiving the matched value and the values already
/// kept by the enclosing sequence.
pub type Predicate<V> = Box<dyn Fn(&Value<V>, &[Value<V>]) -> Verdict>;

/// What a predicate decided.
pub enum Verdict {
    /// The match stands.
    Accept,
    /// Reject, recording the text as an expectation (merged and
    /// deduplicated with whatever else failed at that position).
    Expected(String),
    /// Reject with a self-rendering failure; its message replaces the
    /// expectation list entirely.
    Report(Box<dyn Fn(FormatLine) -> String>),
}

impl Verdict {
    /// Convenience constructor for [`Verdict::Report`].
    pub fn report(render: impl Fn(FormatLine) -> String + 'static) -> Self {
        Verdict::Report(Box::new(render))
    }
}

impl std::fmt::Debug for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Accept => f.write_str("Accept"),
            Verdict::Expected(text) => f.debug_tuple("Expected").field(text).finish(),
            Verdict::Report(_) => f.write_str("Report(..)"),
        }
    }
}

/// The named action tables a host supplies alongside its grammar.
///
/// Sequence replacements are looked up by their `%name`, predicates by
/// their `:name`. Binding validates that every name referenced by the
/// grammar resolves before any input is matched.
pub struct Actions<V> {
    replacements: HashMap<String, Replacement<V>>,
    predicates: HashMap<String, Predicate<V>>,
}

impl<V> Default for Actions<V> {
    fn default() -> Self {
        Self {
            replacements: HashMap::new(),
            predicates: HashMap::new(),
        }
    }
}

impl<V> Actions<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a replacement function under `name`.
    pub fn replacement(
        mut self,
        name: impl Into<String>,
        replace: impl Fn(Vec<Value<V>>) -> Value<V> + 'static,
    ) -> Self {
        self.replacements.insert(name.into(), Box::new(replace));
        self
    }

    /// Register a predicate function under `name`.
    pub fn predicate(
        mut self,
        name: impl Into<String>,
        predicate: impl Fn(&Value<V>, &[Value<V>]) -> Verdict + 'static,
    ) -> Self {
        self.predicates.insert(name.into(), Box::new(predicate));
        self
    }

    pub(crate) fn get_replacement(&self, name: &str) -> Option<&Replacement<V>> {
        self.replacements.get(name)
    }

    pub(crate) fn get_predicate(&self, name: &str) -> Option<&Predicate<V>> {
        self.predicates.get(name)
    }

    /// Merge `other` into this table; same-name entries are replaced.
    pub(crate) fn merge(&mut self, other: Actions<V>) {
        self.replacements.extend(other.replacements);
        self.predicates.extend(other.predicates);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_registers_and_merge_replaces() {
        let mut actions: Actions<i64> = Actions::new()
            .replacement("first", |_| Value::Custom(1))
            .predicate("always", |_, _| Verdict::Accept);

        assert!(actions.get_replacement("first").is_some());
        assert!(actions.get_predicate("always").is_some());
        assert!(actions.get_replacement("missing").is_none());

        actions.merge(Actions::new().replacement("first", |_| Value::Custom(2)));
        let replaced = actions.get_replacement("first").map(|f| f(vec![]));
        assert_eq!(Some(Value::Custom(2)), replaced);
    }
}
