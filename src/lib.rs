//! matchbook — a compact PEG parser generator.
//!
//! A grammar is written in a small textual DSL, compiled into a matcher
//! graph, and run against input strings with backtracking, user-supplied
//! replacement functions, and validation predicates:
//!
//! ```
//! use matchbook::{Actions, Parser, Value};
//!
//! let mut parser = Parser::with_actions(
//!     "main = number
//!      number <a number> = /[0-9]+/ %number",
//!     Actions::new().replacement("number", |values: Vec<Value<i64>>| {
//!         Value::Custom(values[0].text().and_then(|t| t.parse().ok()).unwrap_or(0))
//!     }),
//! )
//! .unwrap();
//!
//! assert_eq!(Ok(Value::Custom(250)), parser.parse("250"));
//! assert!(parser.parse("abc").is_err());
//! ```

mod engine;

pub mod actions;
pub mod compiler;
pub mod error;
pub mod grammar;
pub mod lexer;
pub mod parser;
pub mod value;

pub use actions::{Actions, FormatLine, Verdict};
pub use error::{ConfigError, MatchError};
pub use parser::Parser;
pub use value::{Token, Value};
