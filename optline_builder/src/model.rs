use chrono::NaiveDateTime;
use indexmap::IndexMap;

/// A coerced value, as produced by an [`ArgType`](./trait.ArgType.html) or written into [`State`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// An unfilled optional slot without a default.
    Null,
    /// A switch, bool or `Boolean` typed value.
    Bool(bool),
    /// An `Integer` typed value.
    Integer(i64),
    /// A `Float` typed value.
    Float(f64),
    /// An untyped (or `String` typed) value.
    Str(String),
    /// A `Symbol` typed value.
    Symbol(String),
    /// A `Time` typed value.
    Time(NaiveDateTime),
    /// Multiple values: an `Array` typed value, a splat slot, or a multi-slot option.
    List(Vec<Value>),
    /// A `Range` typed value (inclusive on both ends).
    Range(i64, i64),
    /// The nested state of a command.
    Map(State),
}

impl Value {
    /// Whether this is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The boolean, if this is a [`Value::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The integer, if this is a [`Value::Integer`].
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// The float, if this is a [`Value::Float`] (or a widened [`Value::Integer`]).
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// The text, if this is a [`Value::Str`] or [`Value::Symbol`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) | Value::Symbol(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// The items, if this is a [`Value::List`].
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// The nested state, if this is a [`Value::Map`].
    pub fn as_map(&self) -> Option<&State> {
        match self {
            Value::Map(state) => Some(state),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Symbol(s) => write!(f, ":{s}"),
            Value::Time(t) => write!(f, "{t}"),
            Value::List(items) => {
                let items: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", items.join(", "))
            }
            Value::Range(start, end) => write!(f, "{start}..{end}"),
            Value::Map(state) => write!(f, "{state}"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::List(value.into_iter().map(Into::into).collect())
    }
}

/// The accumulated result of a parse: option/command name to [`Value`], in the order first written.
///
/// A command's own options and arguments are nested as a [`Value::Map`] under the command's name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
    values: IndexMap<String, Value>,
}

impl State {
    /// Write a value, replacing any previous value under the same name (its position is kept).
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Get the value written under `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Whether anything was written under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// The nested state of command `name`, if that command ran.
    pub fn command(&self, name: &str) -> Option<&State> {
        self.get(name).and_then(Value::as_map)
    }

    /// The number of names written.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing was written.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate `(name, value)` pairs in write order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries: Vec<String> = self
            .values
            .iter()
            .map(|(name, value)| format!("{name}: {value}"))
            .collect();
        write!(f, "{{{}}}", entries.join(", "))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for State {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut state = State::default();
        for (name, value) in iter {
            state.insert(name, value);
        }
        state
    }
}

/// The outcome of a successful parse.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parsed {
    /// Tokens not consumed by any option or command, in input order.
    pub arguments: Vec<String>,
    /// The accumulated option/command state.
    pub state: State,
}

impl Parsed {
    /// Split into `(leftover arguments, state)`.
    pub fn into_parts(self) -> (Vec<String>, State) {
        (self.arguments, self.state)
    }
}

/// The resolved arguments handed to an option or command callback, by slot name.
///
/// Switches receive a single `true`, negated booleans a single `false`, both under the option's own name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: Vec<(String, Value)>,
}

impl Arguments {
    pub(crate) fn new(values: Vec<(String, Value)>) -> Self {
        Self { values }
    }

    /// The value of the slot `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    /// The first value (the only value, for switches and single argument flags).
    pub fn first(&self) -> Option<&Value> {
        self.values.first().map(|(_, value)| value)
    }

    /// The values in slot order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.values.iter().map(|(_, value)| value)
    }

    /// The number of slots.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no slots.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
