use optline::{prelude::*, CommandLineParser, GeneralParser, Opt, ParseError, Parsed, Value};

#[derive(Debug, PartialEq, Eq)]
pub struct Params {
    loud: bool,
    times: i64,
    names: Vec<String>,
}

fn main() {
    let params = parse();

    for _ in 0..params.times {
        for name in &params.names {
            let greeting = format!("Hello, {name}!");

            if params.loud {
                println!("{}", greeting.to_uppercase());
            } else {
                println!("{greeting}");
            }
        }
    }
}

// Configure and execute the parser against `env::args`.
fn parse() -> Params {
    parse_tokens(|parser: GeneralParser| Ok(parser.parse()))
        .unwrap_or_else(|_| unreachable!("parse exits on error"))
}

// Unit-testable function to configure the parser and execute it against the specified tokens.
fn parse_tokens(
    parse_fn: impl FnOnce(GeneralParser) -> Result<Parsed, ParseError>,
) -> Result<Params, ParseError> {
    let parser = CommandLineParser::new("greeter")
        .about("Greet everyone by name.")
        .add(
            Opt::boolean("loud")
                .short('l')
                .description("Shout the greeting."),
        )
        .add(
            Opt::flag("times")
                .short('t')
                .range(1, 5)
                .description("How many times to greet."),
        )
        .build();

    let Parsed { arguments, state } = parse_fn(parser)?;

    Ok(Params {
        loud: state.get("loud").and_then(Value::as_bool).unwrap_or(false),
        times: state.get("times").and_then(Value::as_integer).unwrap_or(1),
        names: arguments,
    })
}
