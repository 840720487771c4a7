use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};

#[cfg(feature = "tracing_debug")]
use tracing::debug;

use crate::api::{Callback, CommandScope, TypeRegistry};
use crate::constant::NO_PREFIX;
use crate::parser::ConfigError;
use crate::signature::ArgumentSignature;

/// A deferred command declaration.
pub(crate) type DeclareBlock = Box<dyn Fn(CommandScope) -> CommandScope + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OptionClass {
    Switch,
    Flag,
    Bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Placement {
    Head,
    Body,
    Tail,
}

pub(crate) struct OptionNode {
    // The state key.
    pub name: String,
    pub long: Option<String>,
    pub short: Option<char>,
    pub class: OptionClass,
    pub signature: ArgumentSignature,
    pub callback: Option<Callback>,
    pub description: Option<String>,
    pub placement: Placement,
    pub group: Option<String>,
}

impl std::fmt::Debug for OptionNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{class:?}[{name}, {long:?}, {short:?}, '{signature}']",
            class = self.class,
            name = self.name,
            long = self.long,
            short = self.short,
            signature = self.signature,
        )
    }
}

impl OptionNode {
    pub(crate) fn is_negatable(&self) -> bool {
        self.class == OptionClass::Bool && self.long.is_some()
    }

    pub(crate) fn takes_arguments(&self) -> bool {
        !self.signature.is_empty()
    }
}

pub(crate) struct CommandNode {
    pub name: String,
    pub signature: ArgumentSignature,
    pub callback: Option<Callback>,
    pub description: Option<String>,
    block: Option<DeclareBlock>,
    types: Arc<TypeRegistry>,
    registry: OnceLock<Result<Registry, ConfigError>>,
}

impl std::fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Command[{name}, '{signature}', materialized={materialized}]",
            name = self.name,
            signature = self.signature,
            materialized = self.registry.get().is_some(),
        )
    }
}

impl CommandNode {
    pub(crate) fn new(
        name: String,
        signature: ArgumentSignature,
        callback: Option<Callback>,
        description: Option<String>,
        block: Option<DeclareBlock>,
        types: Arc<TypeRegistry>,
    ) -> Self {
        Self {
            name,
            signature,
            callback,
            description,
            block,
            types,
            registry: OnceLock::new(),
        }
    }

    /// The command's own options (and nested commands).
    /// The declaration block runs on first access only; later accesses (even from other parses) see the same outcome.
    pub(crate) fn registry(&self) -> Result<&Registry, ConfigError> {
        self.registry
            .get_or_init(|| {
                #[cfg(feature = "tracing_debug")]
                {
                    debug!("Materializing command '{}'.", self.name);
                }

                match &self.block {
                    Some(block) => block(CommandScope::new(self.types.clone())).build(),
                    None => Ok(Registry::default()),
                }
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    #[cfg(test)]
    pub(crate) fn is_materialized(&self) -> bool {
        self.registry.get().is_some()
    }
}

#[derive(Debug)]
pub(crate) enum Node<'r> {
    Option(&'r OptionNode),
    Command(&'r CommandNode),
}

/// The declared options and commands of one scope.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    options: Vec<OptionNode>,
    longs: HashMap<String, usize>,
    shorts: HashMap<char, usize>,
    commands: Vec<CommandNode>,
    command_names: HashMap<String, usize>,
}

/// Long names are compared with dashes and underscores treated alike.
pub(crate) fn normalize(long: &str) -> String {
    long.replace('_', "-")
}

impl Registry {
    pub(crate) fn new(
        options: Vec<OptionNode>,
        commands: Vec<CommandNode>,
    ) -> Result<Self, ConfigError> {
        let mut longs = HashMap::default();
        let mut shorts = HashMap::default();
        // Long names, including the negated forms of booleans.
        let mut reserved = HashSet::new();

        for (index, option) in options.iter().enumerate() {
            if let Some(long) = &option.long {
                let key = normalize(long);

                if !reserved.insert(key.clone()) {
                    return Err(ConfigError::DuplicateOption(long.clone()));
                }

                if option.is_negatable() && !reserved.insert(format!("{NO_PREFIX}{key}")) {
                    return Err(ConfigError::DuplicateOption(format!("{NO_PREFIX}{long}")));
                }

                longs.insert(key, index);
            }

            if let Some(short) = option.short {
                if shorts.insert(short, index).is_some() {
                    return Err(ConfigError::DuplicateShortOption(short));
                }
            }
        }

        let mut command_names = HashMap::default();

        for (index, command) in commands.iter().enumerate() {
            if command_names.insert(command.name.clone(), index).is_some() {
                return Err(ConfigError::DuplicateCommand(command.name.clone()));
            }
        }

        Ok(Self {
            options,
            longs,
            shorts,
            commands,
            command_names,
        })
    }

    pub(crate) fn options(&self) -> &[OptionNode] {
        &self.options
    }

    pub(crate) fn commands(&self) -> &[CommandNode] {
        &self.commands
    }

    pub(crate) fn find_long(&self, long: &str) -> Option<&OptionNode> {
        self.longs
            .get(&normalize(long))
            .map(|index| &self.options[*index])
    }

    pub(crate) fn find_short(&self, short: char) -> Option<&OptionNode> {
        self.shorts.get(&short).map(|index| &self.options[*index])
    }

    /// The boolean named by `no-<long>`.
    pub(crate) fn find_negated(&self, long: &str) -> Option<&OptionNode> {
        let long = normalize(long);
        long.strip_prefix(NO_PREFIX)
            .and_then(|rest| self.find_long(rest))
            .filter(|option| option.is_negatable())
    }

    pub(crate) fn find_command(&self, word: &str) -> Option<&CommandNode> {
        self.command_names
            .get(word)
            .map(|index| &self.commands[*index])
    }

    /// Look up a token in its plain form: `--long`, `--no-long` (booleans only), `-x` or a bare command word.
    pub(crate) fn find(&self, token: &str) -> Option<Node<'_>> {
        if let Some(long) = token.strip_prefix("--") {
            self.find_long(long)
                .or_else(|| self.find_negated(long))
                .map(Node::Option)
        } else if let Some(short) = token.strip_prefix('-') {
            let mut chars = short.chars();

            match (chars.next(), chars.next()) {
                (Some(single), None) => self.find_short(single).map(Node::Option),
                _ => None,
            }
        } else {
            self.find_command(token).map(Node::Command)
        }
    }
}
