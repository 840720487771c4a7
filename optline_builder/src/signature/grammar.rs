use crate::api::integer;
use crate::model::Value;
use crate::parser::ConfigError;
use crate::signature::{ArgumentSignature, ArgumentSlot, Within};

const SPLAT: &str = "...";

impl ArgumentSignature {
    /// Parse the argument grammar: space separated `<name>` (mandatory) or `[<name>]` (optional) slots.
    /// The final slot may be suffixed with `...` to absorb any number of tokens.
    ///
    /// ### Example
    /// ```
    /// # use optline_builder as optline;
    /// use optline::ArgumentSignature;
    ///
    /// let signature = ArgumentSignature::parse("[<a>] <b> <c> [<d>]").unwrap();
    /// assert_eq!(signature.min_arity(), 2);
    /// assert_eq!(signature.max_arity(), Some(4));
    ///
    /// let signature = ArgumentSignature::parse("<target> [<files>...]").unwrap();
    /// assert_eq!(signature.max_arity(), None);
    ///
    /// assert!(ArgumentSignature::parse("target").is_err());
    /// ```
    pub fn parse(grammar: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidArgumentString(grammar.to_string());
        let parts: Vec<&str> = grammar.split_whitespace().collect();
        let mut slots = Vec::with_capacity(parts.len());

        for (index, part) in parts.iter().enumerate() {
            let (slot, splat) = parse_slot(part).ok_or_else(invalid)?;

            if splat && index + 1 != parts.len() {
                return Err(invalid());
            }

            slots.push(slot);
        }

        Ok(ArgumentSignature::new(slots))
    }

    /// A signature of exactly one integer argument, constrained to the inclusive range.
    pub fn from_range(name: impl Into<String>, start: i64, end: i64) -> Self {
        ArgumentSignature::new(vec![ArgumentSlot::new(name)
            .kind(integer())
            .within(Within::Range(start, end))])
    }

    /// A signature of exactly one argument, constrained to the literal choices.
    pub fn from_choices(name: impl Into<String>, choices: Vec<Value>) -> Self {
        ArgumentSignature::new(vec![
            ArgumentSlot::new(name).within(Within::Values(choices))
        ])
    }
}

// Returns the slot, and whether it is a splat.
fn parse_slot(part: &str) -> Option<(ArgumentSlot, bool)> {
    if let Some(inner) = part.strip_prefix('[') {
        // Both "[<name>...]" and "[<name>]..." are accepted.
        let (inner, outer_splat) = match inner.strip_suffix(SPLAT) {
            Some(inner) => (inner, true),
            None => (inner, false),
        };
        let inner = inner.strip_suffix(']')?;
        let (name, inner_splat) = parse_name(inner)?;
        let splat = outer_splat || inner_splat;

        if outer_splat && inner_splat {
            return None;
        }

        let slot = ArgumentSlot::new(name).optional(true);
        Some((if splat { slot.splat() } else { slot }, splat))
    } else if part.starts_with('<') {
        let (name, splat) = parse_name(part)?;
        let slot = ArgumentSlot::new(name);
        Some((if splat { slot.splat() } else { slot }, splat))
    } else {
        None
    }
}

fn parse_name(part: &str) -> Option<(&str, bool)> {
    let (part, splat) = match part.strip_suffix(SPLAT) {
        Some(part) => (part, true),
        None => (part, false),
    };
    let name = part.strip_prefix('<')?.strip_suffix('>')?;

    if name.is_empty() || name.contains(['<', '>', '[', ']']) {
        None
    } else {
        Some((name, splat))
    }
}
