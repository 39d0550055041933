//! The CSV demo grammar driven through the public API, mirroring what the
//! mbcsv binary does.

use matchbook::{Actions, Parser, Value};
use serde_json::{json, Value as Json};

const GRAMMAR: &str = r#"
main .= record (-/\r?\n/ record)* -/\r?\n/? %rows
record <a record> .= field (',' field)* %record
field <a field> .= quoted | bare
quoted .= /"(?:[^"]|"")*"/ %quoted
bare .= /[^,"\r\n]*/ %bare
"#;

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

fn csv_parser() -> Parser<Json> {
    let actions = Actions::new()
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
            if rows.last() == Some(&Json::Array(vec![Json::String(String::new())])) {
                rows.pop();
            }
            Value::Custom(Json::Array(rows))
        });
    Parser::with_actions(GRAMMAR, actions).expect("the CSV grammar compiles")
}

fn rows(parser: &mut Parser<Json>, input: &str) -> Json {
    match parser.parse(input).expect("input parses") {
        Value::Custom(rows) => rows,
        other => panic!("expected a custom value, got {other:?}"),
    }
}

#[test]
fn test_single_record() {
    let mut parser = csv_parser();
    assert_eq!(json!([["a", "b", "c"]]), rows(&mut parser, "a,b,c"));
}

#[test]
fn test_multiple_records_with_trailing_newline() {
    let mut parser = csv_parser();
    assert_eq!(
        json!([["a", "b"], ["c", "d"]]),
        rows(&mut parser, "a,b\nc,d\n")
    );
}

#[test]
fn test_crlf_line_endings() {
    let mut parser = csv_parser();
    assert_eq!(
        json!([["a", "b"], ["c", "d"]]),
        rows(&mut parser, "a,b\r\nc,d\r\n")
    );
}

#[test]
fn test_quoted_fields_preserve_commas_and_quotes() {
    let mut parser = csv_parser();
    assert_eq!(
        json!([["say \"hi\"", "a,b", "plain"]]),
        rows(&mut parser, r#""say ""hi""","a,b",plain"#)
    );
}

#[test]
fn test_empty_fields() {
    let mut parser = csv_parser();
    assert_eq!(json!([["", "", ""]]), rows(&mut parser, ",,"));
}

#[test]
fn test_whitespace_is_data_not_noise() {
    // the grammar uses strict rules, so spaces stay inside fields
    let mut parser = csv_parser();
    assert_eq!(json!([[" a ", "b"]]), rows(&mut parser, " a ,b"));
}

#[test]
fn test_unterminated_quote_is_an_error() {
    let mut parser = csv_parser();
    let error = parser.parse("\"unterminated").expect_err("bad quoting");
    assert!(
        error.to_string().starts_with("expected"),
        "unexpected message: {error}"
    );
}
