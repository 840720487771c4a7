use std::sync::{Arc, Mutex};

use optline::{prelude::*, Arguments, Command, CommandLineParser, Opt, Value};

fn main() {
    let log: Arc<Mutex<Vec<String>>> = Arc::default();
    let install_log = log.clone();

    let parser = CommandLineParser::new("packager")
        .about("Install or remove packages.")
        .add(
            Opt::switch("verbose")
                .short('v')
                .description("Report every step."),
        )
        .add(
            Opt::flag("jobs")
                .short('j')
                .kind_named("integer")
                .default(1)
                .group("Performance")
                .description("How many packages to fetch at once."),
        )
        .command(
            Command::new("install")
                .args("<package> [<version>]")
                .description("Install a package.")
                .callback(move |arguments: &Arguments| {
                    let package = arguments.get("package").map(Value::to_string);
                    let version = match arguments.get("version") {
                        Some(Value::Null) | None => "latest".to_string(),
                        Some(version) => version.to_string(),
                    };

                    if let Some(package) = package {
                        if let Ok(mut log) = install_log.lock() {
                            log.push(format!("install {package}@{version}"));
                        }
                    }
                })
                .declare(|scope| {
                    scope.add(
                        Opt::switch("force")
                            .short('f')
                            .description("Reinstall over an existing package."),
                    )
                }),
        )
        .command(
            Command::new("remove")
                .args("<package>...")
                .description("Remove packages."),
        )
        .build();

    let parsed = parser.parse();

    if let Some(remove) = parsed.state.command("remove") {
        // One value per argument slot; the splat slot holds every package.
        if let Some([Value::List(packages)]) = remove.get("args").and_then(Value::as_list) {
            let packages: Vec<String> = packages.iter().map(ToString::to_string).collect();
            println!("remove {}", packages.join(" "));
        }
    }

    if let Ok(log) = log.lock() {
        for line in log.iter() {
            println!("{line}");
        }
    }

    if parsed.state.get("verbose") == Some(&Value::Bool(true)) {
        println!("state: {}", parsed.state);
    }
}
