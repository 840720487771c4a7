use thiserror::Error;

/// A mistake in how the command line parser was declared.
///
/// Returned when building the parser, or at parse time (wrapped in [`ParseError::Declaration`]) when a command's deferred declaration block runs.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// An argument grammar string is malformed.
    #[error("Config error: invalid argument string '{0}' (each argument must look like '<name>' or '[<name>]').")]
    InvalidArgumentString(String),

    /// Two options share a long name.
    #[error("Config error: cannot duplicate the option '{0}'.")]
    DuplicateOption(String),

    /// Two options share a short name.
    #[error("Config error: cannot duplicate the short option '{0}'.")]
    DuplicateShortOption(char),

    /// Two commands share a name.
    #[error("Config error: cannot duplicate the command '{0}'.")]
    DuplicateCommand(String),

    /// A type was named that is not in the type registry.
    #[error("Config error: unknown type '{0}'.")]
    UnknownType(String),

    /// Any other inconsistent declaration.
    #[error("Config error: {0}")]
    InvalidDeclaration(String),
}

/// A failure to match the input tokens against the declared options and commands.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The tokens collected for `node` do not satisfy its signature `expected`.
    #[error("Parse error: missing or invalid argument(s) for '{node}' (given [{}], expected '{expected}').", .supplied.join(" "))]
    MissingArgument {
        /// The option or command name.
        node: String,
        /// The tokens collected for it.
        supplied: Vec<String>,
        /// Its argument signature.
        expected: String,
    },

    /// An option-shaped token does not refer to any declared option.
    #[error("Parse error: option '{0}' does not exist.")]
    MissingOption(String),

    /// A command's deferred declaration failed when the command was invoked.
    #[error(transparent)]
    Declaration(#[from] ConfigError),
}

impl ParseError {
    pub(crate) fn missing_argument(
        node: impl Into<String>,
        supplied: &[String],
        expected: impl std::fmt::Display,
    ) -> Self {
        ParseError::MissingArgument {
            node: node.into(),
            supplied: supplied.to_vec(),
            expected: expected.to_string(),
        }
    }

    /// The exit code a program should use when reporting this error.
    pub fn exit_code(&self) -> i32 {
        1
    }
}
