//! Static validation of a compiled grammar.
//!
//! Rejects undefined symbols, left recursion, and repetitions over
//! matchers that can succeed without consuming input. Runs once per
//! grammar, before any input is matched; no input is required.

use std::collections::HashSet;

use crate::{
    error::ConfigError,
    grammar::{Grammar, Matcher, RuleId},
};

/// Whether a rule can succeed without consuming input. `Unknown` marks
/// rules still undecided during the fixpoint iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Nullability {
    Unknown,
    No,
    Yes,
}

pub(crate) fn validate(grammar: &Grammar) -> Result<(), ConfigError> {
    check_undefined(grammar)?;
    let nullability = compute_nullability(grammar);
    check_left_recursion(grammar, &nullability)?;
    check_nullable_repeats(grammar, &nullability)?;
    Ok(())
}

fn check_undefined(grammar: &Grammar) -> Result<(), ConfigError> {
    let undefined = grammar
        .rules()
        .iter()
        .filter(|rule| rule.body.is_none())
        .map(|rule| rule.name.clone())
        .collect::<Vec<_>>();
    match undefined.as_slice() {
        [] => Ok(()),
        [name] => Err(ConfigError::new(format!("rule {name} is not defined"))),
        names => Err(ConfigError::new(format!(
            "rules {} are not defined",
            join_and(names)
        ))),
    }
}

/// Per-rule nullability, iterated to fixpoint. Rules still undecided after
/// the fixpoint sit on cycles without a base case and are treated as
/// nullable.
fn compute_nullability(grammar: &Grammar) -> Vec<Nullability> {
    let mut nullability = vec![Nullability::Unknown; grammar.rules().len()];
    loop {
        let mut progress = false;
        for (id, rule) in grammar.rules().iter().enumerate() {
            if nullability[id] != Nullability::Unknown {
                continue;
            }
            let Some(body) = rule.body.as_ref() else {
                continue;
            };
            let computed = body.nullability(&nullability);
            if computed != Nullability::Unknown {
                nullability[id] = computed;
                progress = true;
            }
        }
        if !progress {
            break;
        }
    }
    for entry in &mut nullability {
        if *entry == Nullability::Unknown {
            *entry = Nullability::Yes;
        }
    }
    nullability
}

fn check_left_recursion(
    grammar: &Grammar,
    nullability: &[Nullability],
) -> Result<(), ConfigError> {
    let mut recursive: Vec<RuleId> = Vec::new();
    let mut checked = HashSet::new();
    for target in 0..grammar.rules().len() {
        if checked.contains(&target) {
            continue;
        }
        let Some(body) = grammar.rules()[target].body.as_ref() else {
            continue;
        };
        let mut visiting = vec![target];
        let mut seen = HashSet::from([target]);
        if body.reaches_left(target, grammar, nullability, &mut visiting, &mut seen) {
            for id in &visiting {
                checked.insert(*id);
                if !recursive.contains(id) {
                    recursive.push(*id);
                }
            }
        } else {
            checked.insert(target);
        }
    }
    if recursive.is_empty() {
        return Ok(());
    }
    recursive.sort_unstable();
    let names = recursive
        .iter()
        .map(|id| grammar.rule(*id).name.clone())
        .collect::<Vec<_>>();
    match names.as_slice() {
        [name] => Err(ConfigError::new(format!("rule {name} is left recursive"))),
        names => Err(ConfigError::new(format!(
            "rules {} are left recursive",
            join_and(names)
        ))),
    }
}

fn check_nullable_repeats(
    grammar: &Grammar,
    nullability: &[Nullability],
) -> Result<(), ConfigError> {
    let offending = grammar
        .rules()
        .iter()
        .filter(|rule| {
            rule.body
                .as_ref()
                .is_some_and(|body| body.has_nullable_repeat(nullability))
        })
        .map(|rule| rule.name.clone())
        .collect::<Vec<_>>();
    match offending.as_slice() {
        [] => Ok(()),
        [name] => Err(ConfigError::new(format!(
            "rule {name} repeats a matcher that can match an empty string"
        ))),
        names => Err(ConfigError::new(format!(
            "rules {} repeat matchers that can match an empty string",
            join_and(names)
        ))),
    }
}

/// Join names with comma plus "and": `X`, `X and Y`, `X, Y, and Z`.
fn join_and(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [one] => one.clone(),
        [first, second] => format!("{first} and {second}"),
        [head @ .., tail] => format!("{}, and {tail}", head.join(", ")),
    }
}

impl Matcher {
    /// Nullability of this matcher given the current per-rule state.
    pub(crate) fn nullability(&self, rules: &[Nullability]) -> Nullability {
        match self {
            Matcher::Text { .. } => Nullability::No,
            Matcher::Regex { pattern, .. } => {
                if pattern.find("").is_some() {
                    Nullability::Yes
                } else {
                    Nullability::No
                }
            }
            Matcher::Symbol { rule } => rules[*rule],
            Matcher::Sequence { items, .. } => {
                let mut result = Nullability::Yes;
                for item in items {
                    match item.matcher.nullability(rules) {
                        Nullability::No => return Nullability::No,
                        Nullability::Unknown => result = Nullability::Unknown,
                        Nullability::Yes => {}
                    }
                }
                result
            }
            Matcher::Choice { alternatives } => {
                let mut result = Nullability::No;
                for alternative in alternatives {
                    match alternative.nullability(rules) {
                        Nullability::Yes => return Nullability::Yes,
                        Nullability::Unknown => result = Nullability::Unknown,
                        Nullability::No => {}
                    }
                }
                result
            }
            Matcher::Repeat { base, zero_ok, .. } => {
                if *zero_ok {
                    Nullability::Yes
                } else {
                    base.nullability(rules)
                }
            }
            Matcher::Predicate { base, .. } => base.nullability(rules),
        }
    }

    /// Walk the leftmost positions of this matcher looking for a reference
    /// back to `target`. A sequence exposes its first item, plus each
    /// following item while the items before it are nullable. On a hit the
    /// `visiting` stack holds the whole left-recursive chain.
    fn reaches_left(
        &self,
        target: RuleId,
        grammar: &Grammar,
        nullability: &[Nullability],
        visiting: &mut Vec<RuleId>,
        seen: &mut HashSet<RuleId>,
    ) -> bool {
        match self {
            Matcher::Text { .. } | Matcher::Regex { .. } => false,
            Matcher::Symbol { rule } => {
                if *rule == target {
                    return true;
                }
                if !seen.insert(*rule) {
                    return false;
                }
                let Some(body) = grammar.rule(*rule).body.as_ref() else {
                    return false;
                };
                visiting.push(*rule);
                let found = body.reaches_left(target, grammar, nullability, visiting, seen);
                if !found {
                    visiting.pop();
                }
                found
            }
            Matcher::Sequence { items, .. } => {
                for item in items {
                    if item
                        .matcher
                        .reaches_left(target, grammar, nullability, visiting, seen)
                    {
                        return true;
                    }
                    if item.matcher.nullability(nullability) == Nullability::No {
                        break;
                    }
                }
                false
            }
            Matcher::Choice { alternatives } => alternatives.iter().any(|alternative| {
                alternative.reaches_left(target, grammar, nullability, visiting, seen)
            }),
            Matcher::Repeat { base, .. } => {
                base.reaches_left(target, grammar, nullability, visiting, seen)
            }
            Matcher::Predicate { base, .. } => {
                base.reaches_left(target, grammar, nullability, visiting, seen)
            }
        }
    }

    /// Whether this matcher contains a repetition whose base is not
    /// definitely non-nullable. Symbol references are not followed; every
    /// rule body is checked on its own.
    fn has_nullable_repeat(&self, rules: &[Nullability]) -> bool {
        match self {
            Matcher::Text { .. } | Matcher::Regex { .. } | Matcher::Symbol { .. } => false,
            Matcher::Sequence { items, .. } => items
                .iter()
                .any(|item| item.matcher.has_nullable_repeat(rules)),
            Matcher::Choice { alternatives } => alternatives
                .iter()
                .any(|alternative| alternative.has_nullable_repeat(rules)),
            Matcher::Repeat { base, .. } => {
                base.nullability(rules) != Nullability::No || base.has_nullable_repeat(rules)
            }
            Matcher::Predicate { base, .. } => base.has_nullable_repeat(rules),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::compiler::compile;

    fn message(source: &str) -> String {
        compile(source).expect_err("validation fails").to_string()
    }

    #[test]
    fn test_undefined_rule() {
        assert_eq!("rule part is not defined", message("main = part 'x'"));
    }

    #[test]
    fn test_undefined_rules_oxford_join() {
        assert_eq!(
            "rules two, three, and four are not defined",
            message("main = two three four")
        );
    }

    #[test]
    fn test_direct_left_recursion() {
        assert_eq!("rule main is left recursive", message("main = main 'x'"));
    }

    #[test]
    fn test_left_recursion_behind_nullable_prefix() {
        // the first item can match nothing, so the recursion is still
        // leftmost
        assert_eq!(
            "rule main is left recursive",
            message("main = 'x'? main 'y'")
        );
    }

    #[test]
    fn test_left_recursion_through_repeat_group() {
        assert_eq!(
            "rule main is left recursive",
            message(r"main = (main '+')* sub sub = /\d+/")
        );
    }

    #[test]
    fn test_mutual_left_recursion_lists_cycle() {
        assert_eq!(
            "rules a, b, and c are left recursive",
            message("a = b 'x' b = c 'y' c = a 'z'")
        );
    }

    #[test]
    fn test_consuming_prefix_is_not_left_recursion() {
        assert!(compile("main = 'x' main | 'y'").is_ok());
    }

    #[test]
    fn test_nullable_repeat_rejected() {
        assert_eq!(
            "rule main repeats a matcher that can match an empty string",
            message("main = ('x'?)* 'y'")
        );
    }

    #[test]
    fn test_nullable_regex_repeat_rejected() {
        assert_eq!(
            "rule main repeats a matcher that can match an empty string",
            message("main = /x*/+ 'y'")
        );
    }

    #[test]
    fn test_nullable_rule_repeat_rejected() {
        assert_eq!(
            "rule main repeats a matcher that can match an empty string",
            message("main = blank* 'y' blank = 'b'?")
        );
    }

    #[test]
    fn test_plus_over_consuming_base_accepted() {
        assert!(compile("main = word+ word = /[a-z]+/").is_ok());
    }

    #[test]
    fn test_undecided_cycle_is_left_recursive() {
        // a and b only reference each other, so the fixpoint cannot decide
        // them; the undecided prefix counts as nullable, which lets the
        // walk continue into the recursion on main as well
        assert_eq!(
            "rules main, a, and b are left recursive",
            message("main = a main 'x' a = b b = a")
        );
    }
}
