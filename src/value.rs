//! Values produced by a match: terminal tokens, collected lists, and
//! whatever the host's replacement functions build out of them.

use serde::{Deserialize, Serialize};

/// A piece of matched input: the text a terminal consumed and the byte
/// position it started at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub pos: usize,
}

/// The result of running a matcher against the input.
///
/// Terminals produce [`Token`]s, sequences and repetitions produce lists,
/// and replacement functions may produce whatever the host application
/// works with via [`Value::Custom`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value<V> {
    Token(Token),
    List(Vec<Value<V>>),
    Custom(V),
}

impl<V> Value<V> {
    /// The matched text, if this value came from a terminal.
    pub fn text(&self) -> Option<&str> {
        match self {
            Value::Token(token) => Some(&token.text),
            _ => None,
        }
    }

    /// The byte position of the terminal this value came from.
    pub fn pos(&self) -> Option<usize> {
        match self {
            Value::Token(token) => Some(token.pos),
            _ => None,
        }
    }

    /// The collected values, if this value is a list.
    pub fn items(&self) -> Option<&[Value<V>]> {
        match self {
            Value::List(values) => Some(values),
            _ => None,
        }
    }

    /// The host-supplied value, if a replacement produced one.
    pub fn custom(&self) -> Option<&V> {
        match self {
            Value::Custom(value) => Some(value),
            _ => None,
        }
    }
}
