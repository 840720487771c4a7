use std::sync::Arc;

use regex::Regex;

use crate::api::{ArgType, CastError, TypeRef};
use crate::model::Value;

/// A predicate over the coerced value of a slot.
pub type Constraint = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// The allowed values of a slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Within {
    /// Membership in a set of literal values (compared against both the raw token and its coerced value).
    Values(Vec<Value>),
    /// Membership in an inclusive numeric range.
    Range(i64, i64),
}

impl Within {
    fn contains(&self, raw: &str, value: &Value) -> bool {
        match self {
            Within::Values(values) => values.iter().any(|v| match v {
                Value::Str(s) | Value::Symbol(s) => s == raw || v == value,
                _ => v == value,
            }),
            Within::Range(start, end) => {
                let number = value.as_float().or_else(|| raw.parse::<f64>().ok());
                match number {
                    Some(n) => (*start as f64) <= n && n <= (*end as f64),
                    None => false,
                }
            }
        }
    }
}

impl std::fmt::Display for Within {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Within::Values(values) => {
                let values: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "{{{}}}", values.join(", "))
            }
            Within::Range(start, end) => write!(f, "{start}..{end}"),
        }
    }
}

/// One positional slot of an [`ArgumentSignature`](./struct.ArgumentSignature.html).
///
/// A token may occupy the slot when it passes every restriction present: the type, the match pattern, the allowed set and the constraint.
///
/// ### Example
/// ```
/// # use optline_builder as optline;
/// use optline::{integer, ArgumentSlot};
///
/// let slot = ArgumentSlot::new("count")
///     .kind(integer())
///     .constraint(|v| v.as_integer().map(|i| i > 0).unwrap_or(false));
///
/// assert!(slot.is_possible("3"));
/// assert!(!slot.is_possible("-3"));
/// assert!(!slot.is_possible("three"));
/// ```
#[derive(Clone)]
pub struct ArgumentSlot {
    name: String,
    optional: bool,
    explicit_optional: bool,
    splat: bool,
    kind: Option<TypeRef>,
    pattern: Option<Regex>,
    within: Option<Within>,
    default: Option<Value>,
    constraint: Option<Constraint>,
}

impl std::fmt::Debug for ArgumentSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArgumentSlot")
            .field("name", &self.name)
            .field("optional", &self.optional)
            .field("splat", &self.splat)
            .field("kind", &self.kind.as_ref().map(|k| k.name().to_string()))
            .field("pattern", &self.pattern.as_ref().map(Regex::as_str))
            .field("within", &self.within)
            .field("default", &self.default)
            .field("constraint", &self.constraint.is_some())
            .finish()
    }
}

impl ArgumentSlot {
    /// Create a mandatory slot.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            optional: false,
            explicit_optional: false,
            splat: false,
            kind: None,
            pattern: None,
            within: None,
            default: None,
            constraint: None,
        }
    }

    /// Explicitly set whether this slot is optional.
    /// This takes precedence over the optionality implied by [`ArgumentSlot::default`].
    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self.explicit_optional = true;
        self
    }

    /// Let this slot absorb any number of tokens (it must be the final slot).
    pub fn splat(mut self) -> Self {
        self.splat = true;
        self
    }

    /// Restrict and coerce tokens with an [`ArgType`].
    pub fn kind(mut self, kind: TypeRef) -> Self {
        self.kind.replace(kind);
        self
    }

    /// Restrict tokens to those matching `pattern`.
    pub fn matching(mut self, pattern: Regex) -> Self {
        self.pattern.replace(pattern);
        self
    }

    /// Restrict tokens to an allowed set.
    pub fn within(mut self, within: Within) -> Self {
        self.within.replace(within);
        self
    }

    /// Substitute `value` when the slot is left unfilled.
    /// Implies the slot is optional, unless [`ArgumentSlot::optional`] says otherwise.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default.replace(value.into());
        if !self.explicit_optional {
            self.optional = true;
        }
        self
    }

    /// Restrict tokens to those whose coerced value satisfies `predicate`.
    pub fn constraint(mut self, predicate: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.constraint.replace(Arc::new(predicate));
        self
    }

    pub(crate) fn shared_constraint(mut self, constraint: Constraint) -> Self {
        self.constraint.replace(constraint);
        self
    }

    /// The slot name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the slot may be left unfilled.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Whether the slot absorbs any number of tokens.
    pub fn is_splat(&self) -> bool {
        self.splat
    }

    pub(crate) fn within_ref(&self) -> Option<&Within> {
        self.within.as_ref()
    }

    /// Whether `raw` could legally occupy this slot.
    pub fn is_possible(&self, raw: &str) -> bool {
        if let Some(kind) = &self.kind {
            if !kind.is_valid(raw) {
                return false;
            }
        }

        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(raw) {
                return false;
            }
        }

        if self.within.is_none() && self.constraint.is_none() {
            return true;
        }

        let value = match self.cast(raw) {
            Ok(value) => value,
            Err(_) => return false,
        };

        if let Some(within) = &self.within {
            if !within.contains(raw, &value) {
                return false;
            }
        }

        match &self.constraint {
            Some(constraint) => constraint(&value),
            None => true,
        }
    }

    /// Coerce `raw` by this slot's type (untyped slots keep the token as a string).
    pub fn cast(&self, raw: &str) -> Result<Value, CastError> {
        match &self.kind {
            Some(kind) => kind.cast(raw),
            None => Ok(Value::Str(raw.to_string())),
        }
    }

    /// The value of this slot when it is left unfilled.
    pub(crate) fn unfilled(&self) -> Result<Value, CastError> {
        match &self.default {
            Some(Value::Str(raw)) if self.kind.is_some() => self.cast(raw),
            Some(value) => Ok(value.clone()),
            None if self.splat => Ok(Value::List(Vec::default())),
            None => Ok(Value::Null),
        }
    }
}

impl std::fmt::Display for ArgumentSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let splat = if self.splat { "..." } else { "" };

        if self.optional {
            write!(f, "[<{}>{splat}]", self.name)
        } else {
            write!(f, "<{}>{splat}", self.name)
        }
    }
}
