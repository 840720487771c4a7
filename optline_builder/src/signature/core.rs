use thiserror::Error;

#[cfg(feature = "tracing_debug")]
use tracing::debug;

use crate::api::CastError;
use crate::model::Value;
use crate::signature::ArgumentSlot;

/// The assignment of candidate tokens to one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Fill<'t> {
    Empty,
    One(&'t str),
    Many(Vec<&'t str>),
}

impl<'t> Fill<'t> {
    pub(crate) fn is_empty(&self) -> bool {
        matches!(self, Fill::Empty)
    }
}

/// The result of zipping candidate tokens against a signature.
/// `fills` always has one entry per slot.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Zipped<'t> {
    pub fills: Vec<Fill<'t>>,
    pub consumed: usize,
}

/// The tokens could not be resolved against an [`ArgumentSignature`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// A mandatory slot is unfilled, or a token found no slot.
    #[error("the tokens do not satisfy the signature.")]
    Unsatisfied,

    /// A token could not be cast by its slot type.
    #[error(transparent)]
    Cast(#[from] CastError),
}

/// The ordered argument slots of an option or command.
///
/// ### Example
/// ```
/// # use optline_builder as optline;
/// use optline::{ArgumentSignature, Value};
///
/// let signature = ArgumentSignature::parse("<source> [<target>]").unwrap();
/// assert_eq!(signature.min_arity(), 1);
/// assert_eq!(signature.max_arity(), Some(2));
///
/// let values = signature.resolve(&["a".to_string()]).unwrap();
/// assert_eq!(values, vec![Value::Str("a".to_string()), Value::Null]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ArgumentSignature {
    slots: Vec<ArgumentSlot>,
}

impl ArgumentSignature {
    /// Create a signature from explicit slots.
    pub fn new(slots: Vec<ArgumentSlot>) -> Self {
        Self { slots }
    }

    /// The slots, in positional order.
    pub fn slots(&self) -> &[ArgumentSlot] {
        &self.slots
    }

    pub(crate) fn slots_mut(&mut self) -> &mut Vec<ArgumentSlot> {
        &mut self.slots
    }

    /// The number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the signature takes no arguments.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The number of mandatory slots.
    pub fn min_arity(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_optional()).count()
    }

    /// The most tokens the signature accepts, or `None` when the final slot is a splat.
    pub fn max_arity(&self) -> Option<usize> {
        if self.is_splat() {
            None
        } else {
            Some(self.slots.len())
        }
    }

    /// Whether the final slot is a splat.
    pub fn is_splat(&self) -> bool {
        self.slots.last().map(ArgumentSlot::is_splat).unwrap_or(false)
    }

    /// Assign tokens to slots, left to right.
    ///
    /// A slot takes the next token only when the token is possible for it.
    /// An optional slot additionally needs a spare: the spare budget is the number of tokens beyond the mandatory slot count.
    /// It is computed once from the full token list and only decremented when an optional slot consumes.
    pub(crate) fn zip<'t>(&self, tokens: &'t [String]) -> Zipped<'t> {
        let mut spares = tokens.len().saturating_sub(self.min_arity());
        #[cfg(feature = "tracing_debug")]
        {
            debug!("Zipping {} tokens against '{self}' with {spares} spare(s).", tokens.len());
        }
        let mut fills = Vec::with_capacity(self.slots.len());
        let mut consumed = 0;

        for slot in &self.slots {
            if slot.is_splat() {
                let mut many = Vec::default();

                while let Some(token) = tokens.get(consumed) {
                    if !slot.is_possible(token) {
                        break;
                    }

                    many.push(token.as_str());
                    consumed += 1;
                }

                fills.push(if many.is_empty() {
                    Fill::Empty
                } else {
                    Fill::Many(many)
                });
                continue;
            }

            let fill = match tokens.get(consumed) {
                Some(token) if slot.is_possible(token) => {
                    if !slot.is_optional() {
                        Fill::One(token.as_str())
                    } else if spares > 0 {
                        spares -= 1;
                        Fill::One(token.as_str())
                    } else {
                        Fill::Empty
                    }
                }
                _ => Fill::Empty,
            };

            if !fill.is_empty() {
                consumed += 1;
            }

            fills.push(fill);
        }

        Zipped { fills, consumed }
    }

    /// Whether the tokens could be (the start of) an acceptable argument list.
    ///
    /// Each token must find a slot, in order: an optional slot may be passed over, a mandatory slot may not.
    /// Missing trailing slots are not considered, so an incomplete list that is still being collected is possible.
    /// Unlike [`ArgumentSignature::is_valid`], no spare budget applies.
    ///
    /// ### Example
    /// ```
    /// # use optline_builder as optline;
    /// use optline::ArgumentSignature;
    ///
    /// let signature = ArgumentSignature::parse("[<a>] <b> <c>").unwrap();
    /// let tokens: Vec<String> = vec!["1".to_string(), "2".to_string()];
    /// assert!(signature.is_possible(&tokens));
    /// assert!(!signature.is_valid(&tokens[..1]));
    /// assert!(signature.is_possible(&tokens[..1]));
    /// ```
    pub fn is_possible(&self, tokens: &[String]) -> bool {
        if let Some(max) = self.max_arity() {
            if tokens.len() > max {
                return false;
            }
        }

        fits(&self.slots, tokens)
    }

    /// Whether the tokens are a complete, acceptable argument list.
    pub fn is_valid(&self, tokens: &[String]) -> bool {
        let zipped = self.zip(tokens);
        self.zipped_valid(&zipped, tokens)
    }

    fn zipped_valid(&self, zipped: &Zipped, tokens: &[String]) -> bool {
        zipped.consumed == tokens.len()
            && self
                .slots
                .iter()
                .zip(zipped.fills.iter())
                .all(|(slot, fill)| slot.is_optional() || !fill.is_empty())
    }

    /// Validate and coerce the tokens, producing one value per slot.
    ///
    /// Unfilled slots take their default (coerced by the slot type), or [`Value::Null`].
    /// A splat slot produces a [`Value::List`].
    pub fn resolve(&self, tokens: &[String]) -> Result<Vec<Value>, ResolveError> {
        let zipped = self.zip(tokens);

        if !self.zipped_valid(&zipped, tokens) {
            return Err(ResolveError::Unsatisfied);
        }

        let mut values = Vec::with_capacity(self.slots.len());

        for (slot, fill) in self.slots.iter().zip(zipped.fills) {
            let value = match fill {
                Fill::Empty => slot.unfilled()?,
                Fill::One(token) => slot.cast(token)?,
                Fill::Many(many) => Value::List(
                    many.into_iter()
                        .map(|token| slot.cast(token))
                        .collect::<Result<Vec<Value>, CastError>>()?,
                ),
            };
            values.push(value);
        }

        Ok(values)
    }
}

// Whether the tokens can be assigned, in order, to the slots.
// A splat slot stays in place while it accepts tokens.
fn fits(slots: &[ArgumentSlot], tokens: &[String]) -> bool {
    let (token, rest) = match tokens.split_first() {
        Some(split) => split,
        None => return true,
    };
    let (slot, later) = match slots.split_first() {
        Some(split) => split,
        None => return false,
    };

    if slot.is_possible(token) {
        let next = if slot.is_splat() { slots } else { later };

        if fits(next, rest) {
            return true;
        }
    }

    slot.is_optional() && fits(later, tokens)
}

impl std::fmt::Display for ArgumentSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slots: Vec<String> = self.slots.iter().map(ToString::to_string).collect();
        write!(f, "{}", slots.join(" "))
    }
}
