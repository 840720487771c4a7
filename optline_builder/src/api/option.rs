use crate::api::{ParameterSpec, TypeRegistry};
use crate::matcher::{normalize, OptionClass, OptionNode, Placement};
use crate::parser::ConfigError;
use crate::prelude::Declare;

/// An option for the command line parser: a switch, a flag or a bool.
/// Used with [`CommandLineParser::add`](./struct.CommandLineParser.html#method.add) and [`CommandScope::add`](./struct.CommandScope.html#method.add).
///
/// The option's name is the key its value is written under.
/// A multi-character name doubles as the long name (`auto_build` is matched by both `--auto-build` and `--auto_build`), while a single character name doubles as the short name.
///
/// ### Example
/// ```
/// # use optline_builder as optline;
/// use optline::{prelude::*, float, CommandLineParser, Opt, Value};
///
/// let parser = CommandLineParser::new("program")
///     .add(Opt::switch("verbose").short('v'))
///     .add(Opt::flag("scale").short('s').kind(float()))
///     .add(Opt::boolean("colour"))
///     .build_parser()
///     .unwrap();
///
/// let state = parser
///     .parse_tokens(&["-v", "--scale", "2.5", "--no-colour"])
///     .unwrap()
///     .state;
/// assert_eq!(state.get("verbose"), Some(&Value::Bool(true)));
/// assert_eq!(state.get("scale"), Some(&Value::Float(2.5)));
/// assert_eq!(state.get("colour"), Some(&Value::Bool(false)));
/// ```
pub struct Opt {
    class: OptionClass,
    name: String,
    long: Option<String>,
    short: Option<char>,
    placement: Placement,
    group: Option<String>,
    spec: ParameterSpec,
}

impl Opt {
    fn new(class: OptionClass, name: impl Into<String>) -> Self {
        Self {
            class,
            name: name.into(),
            long: None,
            short: None,
            placement: Placement::Body,
            group: None,
            spec: ParameterSpec::default(),
        }
    }

    /// Create a switch: an option without arguments, set to `true` when present.
    pub fn switch(name: impl Into<String>) -> Self {
        Self::new(OptionClass::Switch, name)
    }

    /// Create a flag: an option with arguments.
    /// Without an explicit grammar, a flag takes exactly one argument named after the flag.
    pub fn flag(name: impl Into<String>) -> Self {
        Self::new(OptionClass::Flag, name)
    }

    /// Create a bool: a switch which is set to `false` by its negated form `--no-<long>`.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(OptionClass::Bool, name)
    }

    /// Set the short name, ex: `-v`.
    pub fn short(mut self, short: char) -> Self {
        self.short.replace(short);
        self
    }

    /// Set the long name, ex: `--verbose`, overriding the one derived from the option name.
    pub fn long(mut self, long: impl Into<String>) -> Self {
        self.long.replace(long.into());
        self
    }

    /// List this option first in the help message.
    pub fn head(mut self) -> Self {
        self.placement = Placement::Head;
        self
    }

    /// List this option last in the help message.
    pub fn tail(mut self) -> Self {
        self.placement = Placement::Tail;
        self
    }

    /// List this option under the heading `group` in the help message.
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group.replace(group.into());
        self
    }

    pub(crate) fn compile(self, types: &TypeRegistry) -> Result<OptionNode, ConfigError> {
        let Opt {
            class,
            name,
            long,
            short,
            placement,
            group,
            spec,
        } = self;

        if name.is_empty() || name.starts_with('-') {
            return Err(ConfigError::InvalidDeclaration(format!(
                "invalid option name '{name}'."
            )));
        }

        let single = {
            let mut chars = name.chars();
            match (chars.next(), chars.next()) {
                (Some(single), None) => Some(single),
                _ => None,
            }
        };
        let long = match long {
            Some(long) => Some(normalize(long.trim_start_matches('-'))),
            None if single.is_none() => Some(normalize(&name)),
            None => None,
        };
        let short = short.or(single);

        if let Some(short) = short {
            if short == '-' || short == '=' || short.is_whitespace() {
                return Err(ConfigError::InvalidDeclaration(format!(
                    "invalid short name '{short}' for option '{name}'."
                )));
            }
        }

        let fallback = match class {
            OptionClass::Flag => Some(format!("<{name}>")),
            OptionClass::Switch | OptionClass::Bool => {
                if spec.has_shape() {
                    return Err(ConfigError::InvalidDeclaration(format!(
                        "the {} '{name}' cannot take arguments.",
                        if class == OptionClass::Switch {
                            "switch"
                        } else {
                            "bool"
                        },
                    )));
                }

                None
            }
        };
        let signature = spec.signature(&name, fallback, types)?;

        if class == OptionClass::Flag && signature.is_empty() {
            return Err(ConfigError::InvalidDeclaration(format!(
                "the flag '{name}' must take arguments (use a switch instead)."
            )));
        }

        Ok(OptionNode {
            name,
            long,
            short,
            class,
            signature,
            callback: spec.callback,
            description: spec.description,
            placement,
            group,
        })
    }
}

impl Declare for Opt {
    fn spec(&mut self) -> &mut ParameterSpec {
        &mut self.spec
    }
}
