use std::sync::Arc;

use crate::api::{Command, Opt, TypeRef, TypeRegistry};
use crate::constant::{HELP_MESSAGE, HELP_NAME, HELP_SHORT};
use crate::matcher::{OptionNode, Registry};
use crate::parser::{ConfigError, ConsoleInterface, GeneralParser, UserInterface};
use crate::parser::Printer;
use crate::prelude::Declare;

// The parse-wide switches of a command line parser.
struct Settings {
    about: Option<String>,
    strict: bool,
    help: bool,
    width: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            about: None,
            strict: false,
            help: true,
            width: None,
        }
    }
}

/// The root command line parser.
///
/// ### Example
/// ```
/// # use optline_builder as optline;
/// use optline::CommandLineParser;
///
/// let parser = CommandLineParser::new("program")
///     // Configure with CommandLineParser::add and CommandLineParser::command.
///     .build();
/// parser.parse_tokens(empty::slice()).unwrap();
/// ```
pub struct CommandLineParser {
    program: String,
    settings: Settings,
    types: TypeRegistry,
    options: Vec<Opt>,
    commands: Vec<Command>,
}

impl CommandLineParser {
    /// Create a command line parser.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            settings: Settings::default(),
            types: TypeRegistry::default(),
            options: Vec::default(),
            commands: Vec::default(),
        }
    }

    /// Document the about message for this command line parser.
    /// If repeated, only the final about message will apply.
    ///
    /// An about message documents the command line parser in full sentence/paragraph format.
    /// We recommend allowing `optline` to format this field (ex: it is not recommended to use line breaks `'\n'`).
    pub fn about(mut self, description: impl Into<String>) -> Self {
        self.settings.about.replace(description.into());
        self
    }

    /// Reject option-shaped tokens (ex: `--unknown`, `-x`) that do not refer to a declared option.
    /// By default (`false`), such tokens are kept as leftover arguments.
    ///
    /// ### Example
    /// ```
    /// # use optline_builder as optline;
    /// use optline::{CommandLineParser, ParseError};
    ///
    /// let lenient = CommandLineParser::new("program").build();
    /// assert_eq!(lenient.parse_tokens(&["--unknown"]).unwrap().arguments, vec!["--unknown"]);
    ///
    /// let strict = CommandLineParser::new("program").strict(true).build();
    /// assert_eq!(
    ///     strict.parse_tokens(&["--unknown"]).unwrap_err(),
    ///     ParseError::MissingOption("--unknown".to_string())
    /// );
    /// ```
    pub fn strict(mut self, strict: bool) -> Self {
        self.settings.strict = strict;
        self
    }

    /// Whether to declare the `-h/--help` switch (default `true`).
    /// The switch is not declared over an option the program already named `help`, and `-h` is left to any option which claims it.
    pub fn help(mut self, help: bool) -> Self {
        self.settings.help = help;
        self
    }

    /// Render help for a terminal of `width` columns, instead of detecting the width.
    pub fn width(mut self, width: usize) -> Self {
        self.settings.width.replace(width);
        self
    }

    /// Use `types` to resolve type names (ex: [`Declare::kind_named`](./prelude/trait.Declare.html#method.kind_named)).
    /// Replaces any types registered so far.
    pub fn types(mut self, types: TypeRegistry) -> Self {
        self.types = types;
        self
    }

    /// Register a custom type under `name`, alongside the built-in types.
    ///
    /// ### Example
    /// ```
    /// # use optline_builder as optline;
    /// use optline::{prelude::*, CommandLineParser, Opt, PatternType, Value};
    /// use regex::Regex;
    /// use std::sync::Arc;
    ///
    /// let hex = PatternType::new(Regex::new("^0x[0-9a-f]+$").unwrap());
    /// let parser = CommandLineParser::new("program")
    ///     .register_type("hex", Arc::new(hex))
    ///     .add(Opt::flag("address").kind_named("hex"))
    ///     .build();
    ///
    /// let state = parser.parse_tokens(&["--address", "0xff"]).unwrap().state;
    /// assert_eq!(state.get("address"), Some(&Value::from("0xff")));
    /// assert!(parser.parse_tokens(&["--address", "ff"]).is_err());
    /// ```
    pub fn register_type(mut self, name: impl AsRef<str>, type_ref: TypeRef) -> Self {
        self.types.register(name, type_ref);
        self
    }

    /// Add an option to the command line parser.
    /// The order of options only affects the help message.
    pub fn add(mut self, option: Opt) -> Self {
        self.options.push(option);
        self
    }

    /// Add a command to the command line parser.
    /// At most one command runs per parse: the first command word encountered.
    pub fn command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    fn build_with_interface(
        self,
        user_interface: Box<dyn UserInterface>,
    ) -> Result<GeneralParser, ConfigError> {
        let CommandLineParser {
            program,
            settings,
            types,
            options,
            commands,
        } = self;
        let types = Arc::new(types);
        let mut options = options
            .into_iter()
            .map(|option| option.compile(&types))
            .collect::<Result<Vec<_>, ConfigError>>()?;

        if settings.help {
            if let Some(help) = help_switch(&options, &types)? {
                options.insert(0, help);
            }
        }

        let commands = commands
            .into_iter()
            .map(|command| command.compile(types.clone()))
            .collect::<Result<Vec<_>, ConfigError>>()?;
        let registry = Registry::new(options, commands)?;
        let printer = Printer::terminal(program, settings.about, settings.width);

        Ok(GeneralParser::new(
            registry,
            printer,
            settings.strict,
            settings.help,
            user_interface,
        ))
    }

    /// Build the command line parser as a Result.
    /// This finalizes the configuration and checks for errors (ex: a repeated option name).
    ///
    /// Errors in a command's declaration block are only found once that command is invoked.
    pub fn build_parser(self) -> Result<GeneralParser, ConfigError> {
        self.build_with_interface(Box::new(ConsoleInterface::default()))
    }

    /// Build the command line parser.
    /// This finalizes the configuration and checks for errors (ex: a repeated option name).
    /// If an error is encountered, exits with error code `1` (via [`std::process::exit`]).
    pub fn build(self) -> GeneralParser {
        match self.build_parser() {
            Ok(gp) => gp,
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
    }
}

// The help switch, unless the program has already taken its name.
fn help_switch(
    options: &[OptionNode],
    types: &TypeRegistry,
) -> Result<Option<OptionNode>, ConfigError> {
    let taken = options
        .iter()
        .any(|option| option.name == HELP_NAME || option.long.as_deref() == Some(HELP_NAME));

    if taken {
        return Ok(None);
    }

    let mut help = Opt::switch(HELP_NAME).head().description(HELP_MESSAGE);

    if !options.iter().any(|option| option.short == Some(HELP_SHORT)) {
        help = help.short(HELP_SHORT);
    }

    help.compile(types).map(Some)
}
