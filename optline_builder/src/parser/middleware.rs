use std::env;

use crate::constant::HELP_NAME;
use crate::matcher::{Matcher, Node, Registry};
use crate::model::{Parsed, State, Value};
use crate::parser::base::ParseError;
use crate::parser::interface::{ErrorContext, UserInterface};
use crate::parser::printer::Printer;

/// The configured command line parser.
/// Built via [`CommandLineParser::build_parser`](./struct.CommandLineParser.html#method.build_parser) or [`CommandLineParser::build`](./struct.CommandLineParser.html#method.build).
///
/// The parser holds no parse state between calls, so it may be used for any number of parses.
pub struct GeneralParser {
    registry: Registry,
    printer: Printer,
    strict: bool,
    help: bool,
    user_interface: Box<dyn UserInterface>,
}

impl GeneralParser {
    pub(crate) fn new(
        registry: Registry,
        printer: Printer,
        strict: bool,
        help: bool,
        user_interface: Box<dyn UserInterface>,
    ) -> Self {
        Self {
            registry,
            printer,
            strict,
            help,
            user_interface,
        }
    }

    /// Match the input tokens against the declared options and commands.
    ///
    /// Returns the leftover (unmatched) arguments and the state written by the options and commands.
    /// Nothing is printed, and help is not handled: an auto-declared help switch shows up as `state["help"]`.
    pub fn parse_tokens(&self, tokens: &[&str]) -> Result<Parsed, ParseError> {
        self.parse_with(tokens, State::default())
    }

    /// Match the input tokens, writing into (and returning) an initial `state`.
    pub fn parse_with(&self, tokens: &[&str], state: State) -> Result<Parsed, ParseError> {
        let tokens: Vec<String> = tokens.iter().map(ToString::to_string).collect();
        Matcher::new(&self.registry, self.strict)
            .run(&tokens, state)
            .map_err(|(_, error)| error)
    }

    /// The help message.
    pub fn help(&self) -> String {
        self.printer.render(&self.registry).join("\n")
    }

    /// Run the command line parser against the Cli [`env::args`].
    ///
    /// If the parser encounters an error (ex: a missing argument, an undeclared option in strict mode), it prints the error and exits with error code `1` (via `std::process::exit`).
    ///
    /// If the help switch (`-h` or `--help`) is encountered, the parser displays the help message and exits with error code `0`.
    /// After a command word (ex: `program build --help`), the help describes that command's own options, arguments and nested commands.
    /// Help takes precedence over any error in the same input.
    pub fn parse(&self) -> Parsed {
        let command_input: Vec<String> = env::args().skip(1).collect();

        match self.invoke(
            command_input
                .iter()
                .map(AsRef::as_ref)
                .collect::<Vec<&str>>()
                .as_slice(),
            &*self.user_interface,
        ) {
            Ok(parsed) => parsed,
            Err(exit_code) => {
                std::process::exit(exit_code);
            }
        }
    }

    fn invoke(
        &self,
        tokens: &[&str],
        user_interface: &(impl UserInterface + ?Sized),
    ) -> Result<Parsed, i32> {
        let owned: Vec<String> = tokens.iter().map(ToString::to_string).collect();

        match Matcher::new(&self.registry, self.strict).walk(&owned, State::default()) {
            Ok((parsed, command)) => {
                if self.help && parsed.state.get(HELP_NAME) == Some(&Value::Bool(true)) {
                    // A command which ran has already materialized its scope.
                    match command.map(|command| (command, command.registry())) {
                        Some((command, Ok(registry))) => {
                            self.printer
                                .print_command_help(command, registry, user_interface);
                        }
                        _ => self.printer.print_help(&self.registry, user_interface),
                    }
                    return Err(0);
                }

                Ok(parsed)
            }
            Err((offset, error)) => {
                if self.help_requested(tokens) {
                    self.printer.print_help(&self.registry, user_interface);
                    return Err(0);
                }

                let exit_code = error.exit_code();
                user_interface.print_error(error);
                user_interface.print_error_context(ErrorContext::new(offset, &owned));
                Err(exit_code)
            }
        }
    }

    // Whether the literal help switch appears, regardless of how the rest of the input failed.
    fn help_requested(&self, tokens: &[&str]) -> bool {
        if !self.help {
            return false;
        }

        tokens.iter().any(|token| {
            matches!(self.registry.find(token), Some(Node::Option(option)) if option.name == HELP_NAME)
        })
    }
}
