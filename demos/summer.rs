use optline::{prelude::*, integer, CommandLineParser, Opt, Value};

fn main() {
    let parser = CommandLineParser::new("summer")
        .about("Sum the items.")
        .add(
            Opt::flag("items")
                .short('i')
                .args("<item>...")
                .kind(integer())
                .description("The items to sum."),
        )
        .build();

    let parsed = parser.parse();
    let sum: i64 = match parsed.state.get("items") {
        Some(Value::List(items)) => items.iter().filter_map(Value::as_integer).sum(),
        _ => 0,
    };
    println!("Sum: {sum}");
}
