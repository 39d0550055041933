//! mbcalc — evaluate arithmetic expressions with a matchbook grammar.

use clap::Parser as CliParser;
use colored::Colorize;
use matchbook::{Actions, Parser, Value, Verdict};

/// Struct containing the CLI configuration for mbcalc.
#[derive(CliParser, Debug)]
#[command(version, about)]
struct Cli {
    /// The expression to evaluate, e.g. "1 + 2 * (3 - 4)".
    expression: String,

    /// Log internal compiler and engine output.
    #[arg(short, long)]
    verbose: bool,
}

const GRAMMAR: &str = r"
main = sum
sum <a sum> = product (addop product)* %fold
product <a product> = term (mulop term:nonzero)* %fold
addop = !'+' | !'-'
mulop = !'*' | !'/'
term = number | '(' sum ')'
number <a number> = /-?[0-9]+(\.[0-9]+)?/ %number
";

fn actions() -> Actions<f64> {
    Actions::new()
        .replacement("number", |values: Vec<Value<f64>>| {
            Value::Custom(
                values[0]
                    .text()
                    .and_then(|text| text.parse().ok())
                    .unwrap_or(0.0),
            )
        })
        .replacement("fold", fold)
        .predicate("nonzero", |value, prior| {
            let dividing = prior.last().and_then(|kept| kept.text()) == Some("/");
            if dividing && value.custom() == Some(&0.0) {
                Verdict::Expected("a non-zero divisor".into())
            } else {
                Verdict::Accept
            }
        })
}

/// Left-fold `first (op operand)*` into a single number.
fn fold(values: Vec<Value<f64>>) -> Value<f64> {
    let mut parts = values.into_iter();
    let mut total = unwrap_number(parts.next());
    if let Some(Value::List(pairs)) = parts.next() {
        for pair in pairs {
            let Value::List(pair) = pair else { continue };
            let mut pair = pair.into_iter();
            let operator = pair.next();
            let operand = unwrap_number(pair.next());
            match operator.as_ref().and_then(|value| value.text()) {
                Some("+") => total += operand,
                Some("-") => total -= operand,
                Some("*") => total *= operand,
                Some("/") => total /= operand,
                _ => {}
            }
        }
    }
    Value::Custom(total)
}

fn unwrap_number(value: Option<Value<f64>>) -> f64 {
    match value {
        Some(Value::Custom(number)) => number,
        _ => 0.0,
    }
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let level = if args.verbose {
        log::Level::Debug
    } else {
        log::Level::Warn
    };
    simple_logger::init_with_level(level).unwrap();

    let mut parser = Parser::with_actions(GRAMMAR, actions())?;

    match parser.parse(&args.expression) {
        Ok(Value::Custom(result)) => println!("{result}"),
        Ok(other) => println!("{other:?}"),
        Err(failure) => {
            eprintln!("{}", failure.to_string().red());
            std::process::exit(1);
        }
    }

    Ok(())
}
