use std::sync::Arc;

use crate::api::{Opt, ParameterSpec, TypeRegistry};
use crate::matcher::{CommandNode, DeclareBlock, Registry};
use crate::parser::ConfigError;
use crate::prelude::Declare;

/// A sub-command for the command line parser.
/// Used with [`CommandLineParser::command`](./struct.CommandLineParser.html#method.command).
///
/// A command's own options are declared in a block which only runs once the command is invoked.
/// At most one command runs per parse.
/// Its options and arguments are written into a nested state under the command's name (arguments under `args`).
///
/// ### Example
/// ```
/// # use optline_builder as optline;
/// use optline::{prelude::*, Command, CommandLineParser, Opt, Value};
///
/// let parser = CommandLineParser::new("program")
///     .command(
///         Command::new("build")
///             .args("[<target>]")
///             .declare(|scope| scope.add(Opt::switch("release"))),
///     )
///     .build_parser()
///     .unwrap();
///
/// let state = parser.parse_tokens(&["build", "--release", "app"]).unwrap().state;
/// let build = state.command("build").unwrap();
/// assert_eq!(build.get("release"), Some(&Value::Bool(true)));
/// assert_eq!(build.get("args"), Some(&Value::List(vec![Value::from("app")])));
/// ```
pub struct Command {
    name: String,
    block: Option<DeclareBlock>,
    spec: ParameterSpec,
}

impl Command {
    /// Create a command, invoked by the bare word `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            block: None,
            spec: ParameterSpec::default(),
        }
    }

    /// Set the declaration block for the command's own options.
    /// If repeated, only the final block applies.
    pub fn declare(
        mut self,
        block: impl Fn(CommandScope) -> CommandScope + Send + Sync + 'static,
    ) -> Self {
        self.block.replace(Box::new(block));
        self
    }

    pub(crate) fn compile(self, types: Arc<TypeRegistry>) -> Result<CommandNode, ConfigError> {
        let Command { name, block, spec } = self;

        if name.is_empty() || name.starts_with('-') || name.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidDeclaration(format!(
                "invalid command name '{name}'."
            )));
        }

        let signature = spec.signature(&name, None, &types)?;

        Ok(CommandNode::new(
            name,
            signature,
            spec.callback,
            spec.description,
            block,
            types,
        ))
    }
}

impl Declare for Command {
    fn spec(&mut self) -> &mut ParameterSpec {
        &mut self.spec
    }
}

/// The declarations of a command, handed to its [`Command::declare`] block.
pub struct CommandScope {
    types: Arc<TypeRegistry>,
    options: Vec<Opt>,
    commands: Vec<Command>,
}

impl CommandScope {
    pub(crate) fn new(types: Arc<TypeRegistry>) -> Self {
        Self {
            types,
            options: Vec::default(),
            commands: Vec::default(),
        }
    }

    /// *Available using 'unit_test' crate feature only.*</br></br>
    /// Build a [`CommandScope`] for use in testing.
    ///
    /// ### Example
    /// ```
    /// # use optline_builder as optline;
    /// use optline::{prelude::*, integer, CommandScope, Opt, Value};
    ///
    /// // Function under test.
    /// // We want to make sure the declaration block is wired up correctly.
    /// pub fn declare_build(scope: CommandScope) -> CommandScope {
    ///     scope.add(Opt::flag("jobs").short('j').kind(integer()))
    /// }
    ///
    /// let parser = declare_build(CommandScope::test_dummy()).build_parser().unwrap();
    /// let state = parser.parse_tokens(&["-j", "4"]).unwrap().state;
    /// assert_eq!(state.get("jobs"), Some(&Value::Integer(4)));
    /// ```
    #[cfg(feature = "unit_test")]
    pub fn test_dummy() -> Self {
        Self::new(Arc::new(TypeRegistry::default()))
    }

    /// *Available using 'unit_test' crate feature only.*</br></br>
    /// Build a [`GeneralParser`](./struct.GeneralParser.html) over the declarations, for testing.
    /// See [`CommandScope::test_dummy`] for an example.
    #[cfg(feature = "unit_test")]
    pub fn build_parser(self) -> Result<crate::parser::GeneralParser, ConfigError> {
        use crate::parser::{ConsoleInterface, GeneralParser, Printer};

        Ok(GeneralParser::new(
            self.build()?,
            Printer::terminal("test-dummy", None, None),
            false,
            false,
            Box::new(ConsoleInterface::default()),
        ))
    }

    /// Add an option to the command.
    pub fn add(mut self, option: Opt) -> Self {
        self.options.push(option);
        self
    }

    /// Add a nested command.
    /// Nested commands are listed in the command's own help (ex: `program build --help`), but never run: the enclosing command has already claimed the parse.
    pub fn command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    pub(crate) fn build(self) -> Result<Registry, ConfigError> {
        let CommandScope {
            types,
            options,
            commands,
        } = self;
        let options = options
            .into_iter()
            .map(|option| option.compile(&types))
            .collect::<Result<Vec<_>, ConfigError>>()?;
        let commands = commands
            .into_iter()
            .map(|command| command.compile(types.clone()))
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Registry::new(options, commands)
    }
}
