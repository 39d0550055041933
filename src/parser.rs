//! The public facade: compile a grammar, bind actions, run matches.

use crate::{
    actions::Actions,
    compiler,
    engine,
    error::{format_line, ConfigError, MatchError},
    grammar::Grammar,
    value::Value,
};

/// A compiled grammar together with its bound actions.
///
/// `parse` and `actions` take `&mut self`: a parser is a single-threaded
/// object, and the mutable receiver also covers the retained copy of the
/// most recent input that [`Parser::error`] formats against.
pub struct Parser<V = ()> {
    grammar: Grammar,
    actions: Actions<V>,
    bound: bool,
    last_input: Option<String>,
}

impl<V> std::fmt::Debug for Parser<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("grammar", &self.grammar)
            .field("bound", &self.bound)
            .field("last_input", &self.last_input)
            .finish()
    }
}

impl<V> Parser<V> {
    /// Compile `grammar` without any actions. Binding is validated lazily
    /// on the first parse, so only grammars whose sequences need no named
    /// functions will work without a later [`Parser::actions`] call.
    pub fn new(grammar: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            grammar: compiler::compile(grammar)?,
            actions: Actions::new(),
            bound: false,
            last_input: None,
        })
    }

    /// Compile `grammar` and bind `actions`, validating that every
    /// referenced action name resolves.
    pub fn with_actions(grammar: &str, actions: Actions<V>) -> Result<Self, ConfigError> {
        let mut parser = Self::new(grammar)?;
        parser.actions(actions)?;
        Ok(parser)
    }

    /// Merge `actions` into the current bindings and re-validate.
    pub fn actions(&mut self, actions: Actions<V>) -> Result<(), ConfigError> {
        self.actions.merge(actions);
        self.validate_bindings()?;
        self.bound = true;
        Ok(())
    }

    /// Match `input` against the grammar. On failure the diagnostic points
    /// at the furthest position any matcher reached.
    pub fn parse(&mut self, input: &str) -> Result<Value<V>, MatchError> {
        if !self.bound {
            self.validate_bindings().map_err(MatchError::Config)?;
            self.bound = true;
        }
        self.last_input = Some(input.to_string());
        engine::run(&self.grammar, &self.actions, input).map_err(MatchError::NoMatch)
    }

    /// Format an application-level diagnostic against the most recently
    /// parsed input. Before any parse there is nothing to point into, so
    /// the message is returned bare.
    pub fn error(&self, message: &str, pos: usize) -> String {
        match &self.last_input {
            Some(input) => format_line(message, input, pos),
            None => message.to_string(),
        }
    }

    fn validate_bindings(&self) -> Result<(), ConfigError> {
        let (replacements, predicates) = self.grammar.referenced_actions();
        for name in replacements {
            if self.actions.get_replacement(&name).is_none() {
                return Err(ConfigError::new(format!(
                    "missing replacement function '{name}'"
                )));
            }
        }
        for name in predicates {
            if self.actions.get_predicate(&name).is_none() {
                return Err(ConfigError::new(format!(
                    "missing predicate function '{name}'"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        actions::Verdict,
        value::{Token, Value},
    };

    fn token(text: &str, pos: usize) -> Value<i64> {
        Value::Token(Token {
            text: text.into(),
            pos,
        })
    }

    #[test]
    fn test_choice_of_literals() {
        let mut parser: Parser = Parser::new("main .= !'one' | 'two'").unwrap();
        assert_eq!(
            Ok(Value::Token(Token {
                text: "one".into(),
                pos: 0
            })),
            parser.parse("one")
        );
        // 'two' is not kept, so the sequence value is an empty list
        assert_eq!(Ok(Value::List(vec![])), parser.parse("two"));
        let error = parser.parse("three").expect_err("no alternative matches");
        assert!(
            error
                .to_string()
                .starts_with("expected 'one' or 'two', line 1"),
            "unexpected message: {error}"
        );
    }

    #[test]
    fn test_whitespace_absorbed_between_terminals() {
        let mut parser: Parser<i64> = Parser::new("main = !'one' !'two'").unwrap();
        assert_eq!(
            Ok(Value::List(vec![token("one", 0), token("two", 7)])),
            parser.parse("one    two")
        );
    }

    #[test]
    fn test_strict_rule_rejects_whitespace() {
        let mut parser: Parser = Parser::new("main .= 'one' 'two'").unwrap();
        assert!(parser.parse("onetwo").is_ok());
        assert!(parser.parse("one two").is_err());
    }

    #[test]
    fn test_replacement_builds_custom_value() {
        let mut parser = Parser::with_actions(
            "main = number number <a number> = /[0-9]+/ %number",
            Actions::new().replacement("number", |values: Vec<Value<i64>>| {
                Value::Custom(
                    values[0]
                        .text()
                        .and_then(|text| text.parse().ok())
                        .unwrap_or(0),
                )
            }),
        )
        .unwrap();
        assert_eq!(Ok(Value::Custom(250)), parser.parse("250"));
    }

    #[test]
    fn test_predicate_vetoes_match() {
        let actions = Actions::<()>::new().predicate("palindrome", |value, _| {
            let text = value.text().unwrap_or("");
            if text.chars().rev().collect::<String>() == text {
                Verdict::Accept
            } else {
                Verdict::Expected("a palindrome".into())
            }
        });
        let mut parser = Parser::with_actions(
            "main = pal pal = word:palindrome word <a word> = /[a-z]+/",
            actions,
        )
        .unwrap();

        assert!(parser.parse("ablewasiereisawelba").is_ok());
        let error = parser.parse("hello").expect_err("not a palindrome");
        assert!(
            error.to_string().starts_with("expected a palindrome"),
            "unexpected message: {error}"
        );
    }

    #[test]
    fn test_trailing_input_is_reported() {
        let mut parser: Parser = Parser::new("main = 'hello' name name <a name> = /[a-z]+/")
            .unwrap();
        let error = parser.parse("hello abc.").expect_err("trailing dot");
        assert!(
            error.to_string().starts_with("expected end of input"),
            "unexpected message: {error}"
        );
    }

    #[test]
    fn test_description_replaces_inner_expectations() {
        let mut parser: Parser = Parser::new("main = number number <a number> = /[0-9]+/").unwrap();
        let error = parser.parse("abc").expect_err("not a number");
        let message = error.to_string();
        assert!(
            message.starts_with("expected a number"),
            "unexpected message: {message}"
        );
        assert!(!message.contains("[0-9]"));
    }

    #[test]
    fn test_plus_at_start_of_empty_input() {
        let mut parser: Parser = Parser::new("main .= 'a'+").unwrap();
        let error = parser.parse("").expect_err("nothing to repeat");
        assert!(
            error.to_string().starts_with("expected 'a'"),
            "unexpected message: {error}"
        );
    }

    #[test]
    fn test_missing_replacement_is_a_config_error() {
        let error = Parser::<i64>::with_actions("main = 'a' %build", Actions::new())
            .expect_err("nothing bound");
        assert_eq!("missing replacement function 'build'", error.to_string());
    }

    #[test]
    fn test_missing_predicate_surfaces_on_lazy_first_parse() {
        let mut parser: Parser = Parser::new("main = 'a':check").unwrap();
        let error = parser.parse("a").expect_err("predicate never bound");
        assert_eq!(
            MatchError::Config(ConfigError::new("missing predicate function 'check'")),
            error
        );
    }

    #[test]
    fn test_rebinding_actions_in_place() {
        let mut parser = Parser::with_actions(
            "main = /[a-z]+/ %tag",
            Actions::new().replacement("tag", |_| Value::Custom(1)),
        )
        .unwrap();
        assert_eq!(Ok(Value::Custom(1)), parser.parse("abc"));
        parser
            .actions(Actions::new().replacement("tag", |_| Value::Custom(2)))
            .unwrap();
        assert_eq!(Ok(Value::Custom(2)), parser.parse("abc"));
    }

    #[test]
    fn test_rich_verdict_renders_itself() {
        let actions = Actions::<()>::new().predicate("even", |value, _| {
            let pos = value.pos().unwrap_or(0);
            let length = value.text().map(str::len).unwrap_or(0);
            if length % 2 == 0 {
                Verdict::Accept
            } else {
                Verdict::report(move |line| line("odd number of letters", pos))
            }
        });
        let mut parser =
            Parser::with_actions("main .= /[a-z]+/:even", actions).unwrap();
        assert!(parser.parse("abba").is_ok());
        let error = parser.parse("abc").expect_err("three letters");
        assert_eq!(
            "odd number of letters, line 1:\n    abc\n    ^",
            error.to_string()
        );
    }

    #[test]
    fn test_application_error_formatting() {
        let mut parser: Parser = Parser::new("main = /[a-z]+/").unwrap();
        assert_eq!("lonely message", parser.error("lonely message", 3));
        parser.parse("hello").unwrap();
        assert_eq!(
            "not a verb, line 1:\n    hello\n     ^",
            parser.error("not a verb", 1)
        );
    }

    #[test]
    fn test_error_shape_is_stable() {
        let mut parser: Parser = Parser::new("main = 'a' 'b' 'c'").unwrap();
        let error = parser.parse("a b x").expect_err("x is wrong").to_string();
        let lines = error.split('\n').collect::<Vec<_>>();
        assert_eq!(3, lines.len());
        assert!(lines[0].ends_with(", line 1:"));
        assert!(lines[1].starts_with("    "));
        assert!(lines[2].ends_with('^'));
    }
}
