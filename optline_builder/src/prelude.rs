//! Traits which, typically, may be imported without concern: `use optline::prelude::*`.
use std::sync::Arc;

use regex::Regex;

use crate::api::{KindSpec, ParameterSpec, Per, Shape, TypeRef};
use crate::model::{Arguments, Value};
use crate::signature::{ArgumentSlot, Within};

/// The declaration keys shared by options ([`Opt`](../struct.Opt.html)) and commands ([`Command`](../struct.Command.html)).
///
/// Keys that restrict slots come in two forms.
/// The singular form (ex: [`Declare::kind`]) applies to every slot, while the plural form (ex: [`Declare::kinds`]) aligns with the slots positionally.
/// A plural form may be shorter than the slots, but never longer.
/// If repeated, only the final declaration of a key applies.
///
/// ### Example
/// ```
/// # use optline_builder as optline;
/// use optline::{prelude::*, integer, CommandLineParser, Opt};
///
/// let parser = CommandLineParser::new("program")
///     .add(Opt::flag("size").args("<width> [<height>]").kind(integer()).default(1))
///     .build_parser()
///     .unwrap();
///
/// let state = parser.parse_tokens(&["--size", "3"]).unwrap().state;
/// assert_eq!(state.get("size").unwrap().to_string(), "[3, 1]");
/// ```
pub trait Declare: Sized {
    #[doc(hidden)]
    fn spec(&mut self) -> &mut ParameterSpec;

    /// Declare the argument grammar: space separated `<name>`, `[<name>]` or final `<name>...` slots.
    fn args(mut self, grammar: impl Into<String>) -> Self {
        self.spec().shape.replace(Shape::Grammar(grammar.into()));
        self
    }

    /// Declare the slots explicitly.
    fn slots(mut self, slots: Vec<ArgumentSlot>) -> Self {
        self.spec().shape.replace(Shape::Slots(slots));
        self
    }

    /// Declare a single integer argument, restricted to the inclusive range.
    fn range(mut self, start: i64, end: i64) -> Self {
        self.spec().shape.replace(Shape::Range(start, end));
        self
    }

    /// Declare a single argument, restricted to the literal choices.
    fn choices<V: Into<Value>>(mut self, choices: Vec<V>) -> Self {
        let choices = choices.into_iter().map(Into::into).collect();
        self.spec().shape.replace(Shape::Choices(choices));
        self
    }

    /// Restrict and coerce every slot by `kind`.
    fn kind(mut self, kind: TypeRef) -> Self {
        self.spec().kinds.replace(Per::All(KindSpec::Ref(kind)));
        self
    }

    /// Restrict and coerce the slots, positionally.
    fn kinds(mut self, kinds: Vec<TypeRef>) -> Self {
        let kinds = kinds.into_iter().map(KindSpec::Ref).collect();
        self.spec().kinds.replace(Per::Each(kinds));
        self
    }

    /// Restrict and coerce every slot by the type registered under `name`.
    /// An unknown name is reported when the parser is built (or, inside a command, when it is invoked).
    fn kind_named(mut self, name: impl Into<String>) -> Self {
        self.spec()
            .kinds
            .replace(Per::All(KindSpec::Named(name.into())));
        self
    }

    /// Restrict and coerce the slots, positionally, by registered type names.
    fn kinds_named<S: Into<String>>(mut self, names: Vec<S>) -> Self {
        let kinds = names
            .into_iter()
            .map(|name| KindSpec::Named(name.into()))
            .collect();
        self.spec().kinds.replace(Per::Each(kinds));
        self
    }

    /// Restrict every slot to tokens matching `pattern`.
    fn matching(mut self, pattern: Regex) -> Self {
        self.spec().patterns.replace(Per::All(pattern));
        self
    }

    /// Restrict the slots, positionally, to tokens matching the patterns.
    fn matchings(mut self, patterns: Vec<Regex>) -> Self {
        self.spec().patterns.replace(Per::Each(patterns));
        self
    }

    /// Restrict every slot to an allowed set.
    fn within(mut self, within: Within) -> Self {
        self.spec().withins.replace(Per::All(within));
        self
    }

    /// Restrict the slots, positionally, to allowed sets.
    fn withins(mut self, withins: Vec<Within>) -> Self {
        self.spec().withins.replace(Per::Each(withins));
        self
    }

    /// Default every unfilled slot to `value` (which makes every slot optional).
    fn default(mut self, value: impl Into<Value>) -> Self {
        self.spec().defaults.replace(Per::All(value.into()));
        self
    }

    /// Default the unfilled slots, positionally.
    /// A [`Value::Null`] entry leaves its slot without a default.
    fn defaults<V: Into<Value>>(mut self, values: Vec<V>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.spec().defaults.replace(Per::Each(values));
        self
    }

    /// Restrict every slot to tokens whose coerced value satisfies `predicate`.
    fn constraint(mut self, predicate: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.spec().constraints.replace(Per::All(Arc::new(predicate)));
        self
    }

    /// Restrict the slots, positionally, by predicates over their coerced values.
    fn constraints(
        mut self,
        predicates: Vec<Arc<dyn Fn(&Value) -> bool + Send + Sync>>,
    ) -> Self {
        self.spec().constraints.replace(Per::Each(predicates));
        self
    }

    /// Document the help message.
    fn description(mut self, description: impl Into<String>) -> Self {
        self.spec().description.replace(description.into());
        self
    }

    /// Run `callback` with the resolved arguments, instead of writing them into the parse state.
    fn callback(mut self, callback: impl Fn(&Arguments) + Send + Sync + 'static) -> Self {
        self.spec().callback.replace(Arc::new(callback));
        self
    }
}
