use std::sync::Arc;

use regex::Regex;

use crate::api::{TypeRef, TypeRegistry};
use crate::model::{Arguments, Value};
use crate::parser::ConfigError;
use crate::signature::{ArgumentSignature, ArgumentSlot, Constraint, Within};

/// A side effect to run instead of writing into the parse state.
pub type Callback = Arc<dyn Fn(&Arguments) + Send + Sync>;

// A declaration key given either once for every slot, or per slot.
#[derive(Clone)]
pub(crate) enum Per<T> {
    All(T),
    Each(Vec<T>),
}

impl<T> Per<T> {
    fn get(&self, index: usize) -> Option<&T> {
        match self {
            Per::All(value) => Some(value),
            Per::Each(values) => values.get(index),
        }
    }

    fn overflows(&self, length: usize) -> Option<usize> {
        match self {
            Per::Each(values) if values.len() > length => Some(values.len()),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub(crate) enum KindSpec {
    Ref(TypeRef),
    Named(String),
}

impl KindSpec {
    fn resolve(&self, types: &TypeRegistry) -> Result<TypeRef, ConfigError> {
        match self {
            KindSpec::Ref(type_ref) => Ok(type_ref.clone()),
            KindSpec::Named(name) => types
                .find(name)
                .ok_or_else(|| ConfigError::UnknownType(name.clone())),
        }
    }
}

#[derive(Clone)]
pub(crate) enum Shape {
    Grammar(String),
    Slots(Vec<ArgumentSlot>),
    Range(i64, i64),
    Choices(Vec<Value>),
}

/// The declaration keys shared by options and commands.
/// Use via the [`Declare`](./prelude/trait.Declare.html) trait.
#[doc(hidden)]
#[derive(Default)]
pub struct ParameterSpec {
    pub(crate) shape: Option<Shape>,
    pub(crate) kinds: Option<Per<KindSpec>>,
    pub(crate) patterns: Option<Per<Regex>>,
    pub(crate) withins: Option<Per<Within>>,
    pub(crate) defaults: Option<Per<Value>>,
    pub(crate) constraints: Option<Per<Constraint>>,
    pub(crate) description: Option<String>,
    pub(crate) callback: Option<Callback>,
}

impl ParameterSpec {
    pub(crate) fn has_shape(&self) -> bool {
        self.shape.is_some()
    }

    /// Compute the signature for the parameter `name`.
    /// Without a declared shape, `fallback` is used as the grammar (or no arguments at all).
    pub(crate) fn signature(
        &self,
        name: &str,
        fallback: Option<String>,
        types: &TypeRegistry,
    ) -> Result<ArgumentSignature, ConfigError> {
        let mut signature = match (&self.shape, fallback) {
            (Some(Shape::Grammar(grammar)), _) => ArgumentSignature::parse(grammar)?,
            (Some(Shape::Slots(slots)), _) => {
                let splat_interior = slots
                    .iter()
                    .rev()
                    .skip(1)
                    .any(ArgumentSlot::is_splat);

                if splat_interior {
                    return Err(ConfigError::InvalidDeclaration(format!(
                        "only the final argument of '{name}' may be a splat."
                    )));
                }

                ArgumentSignature::new(slots.clone())
            }
            (Some(Shape::Range(start, end)), _) => ArgumentSignature::from_range(name, *start, *end),
            (Some(Shape::Choices(choices)), _) => {
                ArgumentSignature::from_choices(name, choices.clone())
            }
            (None, Some(grammar)) => ArgumentSignature::parse(&grammar)?,
            (None, None) => ArgumentSignature::default(),
        };

        let length = signature.len();
        for (key, overflow) in [
            ("types", self.kinds.as_ref().and_then(|p| p.overflows(length))),
            ("patterns", self.patterns.as_ref().and_then(|p| p.overflows(length))),
            ("allowed sets", self.withins.as_ref().and_then(|p| p.overflows(length))),
            ("defaults", self.defaults.as_ref().and_then(|p| p.overflows(length))),
            ("constraints", self.constraints.as_ref().and_then(|p| p.overflows(length))),
        ] {
            if let Some(count) = overflow {
                return Err(ConfigError::InvalidDeclaration(format!(
                    "'{name}' declares {count} {key} for {length} argument(s)."
                )));
            }
        }

        let slots = std::mem::take(signature.slots_mut());
        let mut declared = Vec::with_capacity(slots.len());

        for (index, mut slot) in slots.into_iter().enumerate() {
            if let Some(kind) = self.kinds.as_ref().and_then(|p| p.get(index)) {
                slot = slot.kind(kind.resolve(types)?);
            }

            if let Some(pattern) = self.patterns.as_ref().and_then(|p| p.get(index)) {
                slot = slot.matching(pattern.clone());
            }

            if let Some(within) = self.withins.as_ref().and_then(|p| p.get(index)) {
                slot = slot.within(within.clone());
            }

            match self.defaults.as_ref().and_then(|p| p.get(index)) {
                Some(Value::Null) | None => {}
                Some(default) => slot = slot.default(default.clone()),
            }

            if let Some(constraint) = self.constraints.as_ref().and_then(|p| p.get(index)) {
                slot = slot.shared_constraint(constraint.clone());
            }

            declared.push(slot);
        }

        *signature.slots_mut() = declared;
        Ok(signature)
    }
}
