use terminal_size::{terminal_size, Width};

use crate::matcher::{CommandNode, OptionNode, Registry};
use crate::parser::interface::{chunk, ColumnRenderer, UserInterface};
use crate::signature::{ArgumentSignature, ArgumentSlot};

// With an unknown terminal width, keep the description column narrow.
const DEFAULT_DESCRIPTION_WIDTH: usize = 17;
const PADDING_WIDTH: usize = 3;
const MAIN_INDENT: usize = 1;

pub(crate) struct Printer {
    program: String,
    about: Option<String>,
    terminal_width: Option<usize>,
}

struct Row {
    left: String,
    description: String,
}

impl Printer {
    #[cfg(test)]
    pub(crate) fn empty() -> Self {
        Self::new("program", None, None)
    }

    /// A printer sized to the current terminal, unless `width` is given.
    pub(crate) fn terminal(
        program: impl Into<String>,
        about: Option<String>,
        width: Option<usize>,
    ) -> Self {
        let terminal_width = width.or_else(|| match terminal_size() {
            Some((Width(terminal_width), _)) => Some(terminal_width as usize),
            None => None,
        });

        Self::new(program, about, terminal_width)
    }

    pub(crate) fn new(
        program: impl Into<String>,
        about: Option<String>,
        terminal_width: Option<usize>,
    ) -> Self {
        Self {
            program: program.into(),
            about,
            terminal_width,
        }
    }

    pub(crate) fn print_help(
        &self,
        registry: &Registry,
        user_interface: &(impl UserInterface + ?Sized),
    ) {
        for line in self.render(registry) {
            user_interface.print(line);
        }
    }

    /// Help for an invoked command: its own options, arguments and nested commands.
    pub(crate) fn print_command_help(
        &self,
        command: &CommandNode,
        registry: &Registry,
        user_interface: &(impl UserInterface + ?Sized),
    ) {
        for line in self.render_command(command, registry) {
            user_interface.print(line);
        }
    }

    pub(crate) fn render(&self, registry: &Registry) -> Vec<String> {
        self.render_scope(self.program.clone(), self.about.as_deref(), registry, None)
    }

    pub(crate) fn render_command(&self, command: &CommandNode, registry: &Registry) -> Vec<String> {
        self.render_scope(
            format!("{} {}", self.program, command.name),
            command.description.as_deref(),
            registry,
            Some(&command.signature),
        )
    }

    fn render_scope(
        &self,
        invocation: String,
        about: Option<&str>,
        registry: &Registry,
        signature: Option<&ArgumentSignature>,
    ) -> Vec<String> {
        let mut options: Vec<&OptionNode> = registry.options().iter().collect();
        // Stable, so declaration order holds within each placement.
        options.sort_by_key(|option| option.placement);

        let mut summary = vec![format!("usage: {invocation}")];
        summary.extend(options.iter().map(|option| format!("[{}]", usage(option))));

        if let Some(signature) = signature.filter(|signature| !signature.is_empty()) {
            summary.push(signature.to_string());
        }

        if !registry.commands().is_empty() {
            summary.push("<command>".to_string());
        }

        let mut sections: Vec<(String, Vec<Row>)> = Vec::default();
        let ungrouped: Vec<Row> = options
            .iter()
            .filter(|option| option.group.is_none())
            .map(|option| option_row(option))
            .collect();

        if !ungrouped.is_empty() {
            sections.push(("options".to_string(), ungrouped));
        }

        for option in options.iter().filter(|option| option.group.is_some()) {
            let group = option.group.clone().unwrap_or_default();

            match sections.iter_mut().find(|(name, _)| name == &group) {
                Some((_, rows)) => rows.push(option_row(option)),
                None => sections.push((group, vec![option_row(option)])),
            }
        }

        if !registry.commands().is_empty() {
            sections.push((
                "commands".to_string(),
                registry.commands().iter().map(command_row).collect(),
            ));
        }

        let rows = sections.iter().flat_map(|(_, rows)| rows.iter());
        let (left_width, description_width) = rows.fold((0, 0), |(left, description), row| {
            (
                std::cmp::max(left, row.left.chars().count()),
                std::cmp::max(description, row.description.chars().count() + MAIN_INDENT),
            )
        });

        let column_renderer = match self.terminal_width {
            Some(total) => {
                ColumnRenderer::guided(PADDING_WIDTH, left_width, description_width, total)
            }
            None => ColumnRenderer::new(
                PADDING_WIDTH,
                left_width,
                std::cmp::min(description_width, DEFAULT_DESCRIPTION_WIDTH),
            ),
        };

        let mut lines = vec![summary.join(" ")];

        if let Some(about) = about {
            lines.push(String::default());
            lines.extend(chunk(about, column_renderer.width()));
        }

        for (heading, rows) in &sections {
            lines.push(String::default());
            lines.push(format!("{heading}:"));

            for row in rows {
                lines.extend(column_renderer.render(MAIN_INDENT, &row.left, &row.description));
            }
        }

        lines
    }
}

fn long_flag(option: &OptionNode) -> Option<String> {
    option.long.as_ref().map(|long| {
        if option.is_negatable() {
            format!("--[no-]{long}")
        } else {
            format!("--{long}")
        }
    })
}

fn with_grammar(option: &OptionNode, flag: String) -> String {
    if option.takes_arguments() {
        format!("{flag} {}", option.signature)
    } else {
        flag
    }
}

fn usage(option: &OptionNode) -> String {
    let flag = match option.short {
        Some(short) => format!("-{short}"),
        None => long_flag(option)
            .unwrap_or_else(|| unreachable!("internal error - an option must have a long or short name")),
    };

    with_grammar(option, flag)
}

fn option_row(option: &OptionNode) -> Row {
    let flags = match (option.short, long_flag(option)) {
        (Some(short), Some(long)) => format!("-{short}, {long}"),
        (Some(short), None) => format!("-{short}"),
        (None, Some(long)) => long,
        (None, None) => unreachable!("internal error - an option must have a long or short name"),
    };

    Row {
        left: with_grammar(option, flags),
        description: describe(option.description.as_deref(), option.signature.slots()),
    }
}

fn command_row(command: &CommandNode) -> Row {
    let left = if command.signature.is_empty() {
        command.name.clone()
    } else {
        format!("{} {}", command.name, command.signature)
    };

    Row {
        left,
        description: describe(command.description.as_deref(), command.signature.slots()),
    }
}

// A single argument restricted to an allowed set lists the set ahead of the description.
fn describe(description: Option<&str>, slots: &[ArgumentSlot]) -> String {
    let within = match slots {
        [slot] => slot.within_ref().map(ToString::to_string),
        _ => None,
    };

    match (within, description) {
        (Some(within), Some(description)) => format!("{within} {description}"),
        (Some(within), None) => within,
        (None, Some(description)) => description.to_string(),
        (None, None) => String::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Command, CommandScope, Opt, TypeRegistry};
    use crate::constant::{HELP_MESSAGE, HELP_NAME, HELP_SHORT};
    use crate::parser::util::InMemoryInterface;
    use crate::prelude::*;
    use crate::test::assert_contains;
    use std::sync::Arc;

    fn scope() -> CommandScope {
        CommandScope::new(Arc::new(TypeRegistry::default()))
    }

    fn help() -> Opt {
        Opt::switch(HELP_NAME)
            .short(HELP_SHORT)
            .head()
            .description(HELP_MESSAGE)
    }

    #[test]
    fn print_help_empty() {
        let printer = Printer::empty();
        let interface = InMemoryInterface::default();
        printer.print_help(&Registry::default(), &interface);

        assert_eq!(interface.consume_message(), "usage: program");
    }

    #[test]
    fn print_help() {
        let registry = scope()
            .add(Opt::switch("verbose").short('v').description("Print more."))
            .add(Opt::boolean("colour").group("Output"))
            .add(
                Opt::flag("size")
                    .args("<width> [<height>]")
                    .description("The size."),
            )
            .add(help())
            .command(Command::new("build").args("[<target>]").description("Build it."))
            .build()
            .unwrap();
        let printer = Printer::new("program", Some("A program.".to_string()), Some(80));
        let interface = InMemoryInterface::default();
        printer.print_help(&registry, &interface);

        assert_eq!(
            interface.consume_message(),
            r#"usage: program [-h] [-v] [--[no-]colour] [--size <width> [<height>]] <command>

A program.

options:
 -h, --help                  Show this help message and exit.
 -v, --verbose               Print more.
 --size <width> [<height>]   The size.

Output:
 --[no-]colour

commands:
 build [<target>]            Build it."#
        );
    }

    #[test]
    fn print_command_help() {
        let command = Command::new("build")
            .args("[<target>]")
            .description("Build it.")
            .declare(|scope| {
                scope
                    .add(Opt::switch("release").short('r').description("Optimize."))
                    .command(Command::new("docs").description("Build the docs."))
            })
            .compile(Arc::new(TypeRegistry::default()))
            .unwrap();
        let printer = Printer::new("program", Some("A program.".to_string()), Some(80));
        let interface = InMemoryInterface::default();
        printer.print_command_help(&command, command.registry().unwrap(), &interface);

        assert_eq!(
            interface.consume_message(),
            r#"usage: program build [-r] [<target>] <command>

Build it.

options:
 -r, --release   Optimize.

commands:
 docs            Build the docs."#
        );
    }

    #[test]
    fn render_command_without_scope() {
        let command = Command::new("status")
            .compile(Arc::new(TypeRegistry::default()))
            .unwrap();
        let lines = Printer::empty().render_command(&command, command.registry().unwrap());

        assert_eq!(lines, vec!["usage: program status"]);
    }

    #[test]
    fn print_help_placement() {
        let registry = scope()
            .add(Opt::switch("last").tail())
            .add(Opt::switch("middle"))
            .add(Opt::switch("first").head())
            .build()
            .unwrap();
        let lines = Printer::new("program", None, Some(80)).render(&registry);

        assert_eq!(lines[0], "usage: program [--first] [--middle] [--last]");
        assert_eq!(&lines[3..], &[" --first", " --middle", " --last"]);
    }

    #[test]
    fn print_help_groups() {
        let registry = scope()
            .add(Opt::switch("a").group("One"))
            .add(Opt::switch("b").group("Two"))
            .add(Opt::switch("c").group("One"))
            .build()
            .unwrap();
        let lines = Printer::new("program", None, Some(80)).render(&registry);

        assert_eq!(
            &lines[1..],
            &["", "One:", " -a", " -c", "", "Two:", " -b"]
        );
    }

    #[test]
    fn print_help_choices() {
        let registry = scope()
            .add(
                Opt::flag("mode")
                    .choices(vec!["fast", "slow"])
                    .description("How to run."),
            )
            .build()
            .unwrap();
        let lines = Printer::new("program", None, Some(80)).render(&registry);

        assert_contains!(lines[3], "{fast, slow} How to run.");
    }

    #[test]
    fn print_help_narrow() {
        let registry = scope().add(help()).build().unwrap();
        let lines = Printer::new("program", None, None).render(&registry);

        assert_eq!(
            &lines[3..],
            &[
                " -h, --help   Show this help",
                "              message and exit.",
            ]
        );
    }
}
