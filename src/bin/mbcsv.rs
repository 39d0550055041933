//! mbcsv — parse a CSV file with a matchbook grammar and print the rows as
//! JSON.

use std::fs;

use anyhow::Context;
use clap::Parser as CliParser;
use colored::Colorize;
use log::error;
use matchbook::{Actions, Parser, Value};
use serde_json::Value as Json;

/// Struct containing the CLI configuration for mbcsv.
#[derive(CliParser, Debug)]
#[command(version, about)]
struct Cli {
    /// The CSV file to read.
    file: std::path::PathBuf,

    /// Log internal compiler and engine output.
    #[arg(short, long)]
    verbose: bool,
}

const GRAMMAR: &str = r#"
main .= record (-/\r?\n/ record)* -/\r?\n/? %rows
record <a record> .= field (',' field)* %record
field <a field> .= quoted | bare
quoted .= /"(?:[^"]|"")*"/ %quoted
bare .= /[^,"\r\n]*/ %bare
"#;

fn actions() -> Actions<Json> {
    Actions::new()
        .replacement("bare", |values: Vec<Value<Json>>| {
            let text = values[0].text().unwrap_or_default();
            Value::Custom(Json::String(text.to_string()))
        })
        .replacement("quoted", |values| {
            let raw = values[0].text().unwrap_or_default();
            let inner = &raw[1..raw.len() - 1];
            Value::Custom(Json::String(inner.replace("\"\"", "\"")))
        })
        .replacement("record", |values| {
            Value::Custom(Json::Array(flatten(values)))
        })
        .replacement("rows", |values| {
            let mut rows = flatten(values);
            // a trailing newline produces one empty record; drop it
            if rows.last() == Some(&Json::Array(vec![Json::String(String::new())])) {
                rows.pop();
            }
            Value::Custom(Json::Array(rows))
        })
}

/// Collect the custom values of a kept-value tree into one flat list.
fn flatten(values: Vec<Value<Json>>) -> Vec<Json> {
    let mut flat = Vec::new();
    for value in values {
        match value {
            Value::Custom(json) => flat.push(json),
            Value::List(rest) => flat.extend(flatten(rest)),
            Value::Token(token) => flat.push(Json::String(token.text)),
        }
    }
    flat
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let level = if args.verbose {
        log::Level::Debug
    } else {
        log::Level::Warn
    };
    simple_logger::init_with_level(level).unwrap();

    let content = fs::read_to_string(&args.file)
        .with_context(|| format!("could not read '{}'", args.file.display()))?;

    let mut parser = Parser::with_actions(GRAMMAR, actions())?;

    match parser.parse(&content) {
        Ok(Value::Custom(rows)) => println!("{}", serde_json::to_string_pretty(&rows)?),
        Ok(other) => error!("unexpected parse result: {other:?}"),
        Err(failure) => {
            eprintln!("{}", failure.to_string().red());
            std::process::exit(1);
        }
    }

    Ok(())
}
