use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use thiserror::Error;

use crate::model::Value;

/// A value validator/coercer that may be attached to an argument slot.
///
/// `is_valid` must be a pure check: the matcher calls it speculatively while deciding how many tokens an option consumes.
/// `cast` is only called on tokens that passed `is_valid`.
///
/// ### Example
/// ```
/// # use optline_builder as optline;
/// use optline::{ArgType, CastError, Value};
///
/// #[derive(Debug)]
/// struct Even;
///
/// impl ArgType for Even {
///     fn name(&self) -> &str {
///         "even"
///     }
///
///     fn is_valid(&self, raw: &str) -> bool {
///         raw.parse::<i64>().map(|i| i % 2 == 0).unwrap_or(false)
///     }
///
///     fn cast(&self, raw: &str) -> Result<Value, CastError> {
///         raw.parse::<i64>()
///             .map(Value::Integer)
///             .map_err(|_| CastError::new(raw, self.name()))
///     }
/// }
///
/// assert!(Even.is_valid("4"));
/// assert!(!Even.is_valid("3"));
/// ```
pub trait ArgType: Debug + Send + Sync {
    /// The display name of this type (used in help and error messages).
    fn name(&self) -> &str;

    /// Whether the raw token can be cast to this type.
    fn is_valid(&self, raw: &str) -> bool;

    /// Cast the raw token to this type.
    fn cast(&self, raw: &str) -> Result<Value, CastError>;
}

/// A shared handle to an [`ArgType`].
pub type TypeRef = Arc<dyn ArgType>;

/// A raw token could not be cast by an [`ArgType`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cannot convert '{token}' to {type_name}.")]
pub struct CastError {
    token: String,
    type_name: String,
}

impl CastError {
    /// Describe a failed cast of `token` to `type_name`.
    pub fn new(token: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            type_name: type_name.into(),
        }
    }

    /// The token that failed to cast.
    pub fn token(&self) -> &str {
        &self.token
    }
}

/// Signed 64 bit integers.
#[derive(Debug, Default)]
pub struct IntegerType;

/// 64 bit floats.
#[derive(Debug, Default)]
pub struct FloatType;

/// `true/false`, `yes/no`, `on/off`, `1/0` (case-insensitive).
#[derive(Debug, Default)]
pub struct BooleanType;

/// Dates and date-times, naive or RFC 3339 (converted to UTC).
#[derive(Debug, Default)]
pub struct TimeType;

/// Any token, kept verbatim.
#[derive(Debug, Default)]
pub struct StringType;

/// Any non-empty token, with a leading `:` dropped.
#[derive(Debug, Default)]
pub struct SymbolType;

/// Comma separated items, each kept as a string.
#[derive(Debug, Default)]
pub struct ArrayType;

/// Integer ranges: `1..5` (inclusive) or `1...5` (exclusive of the end).
#[derive(Debug, Default)]
pub struct RangeType;

impl ArgType for IntegerType {
    fn name(&self) -> &str {
        "integer"
    }

    fn is_valid(&self, raw: &str) -> bool {
        raw.parse::<i64>().is_ok()
    }

    fn cast(&self, raw: &str) -> Result<Value, CastError> {
        raw.parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| CastError::new(raw, self.name()))
    }
}

impl ArgType for FloatType {
    fn name(&self) -> &str {
        "float"
    }

    fn is_valid(&self, raw: &str) -> bool {
        // Rust accepts "inf" and "NaN"; a command line float must carry a digit.
        raw.chars().any(|c| c.is_ascii_digit()) && raw.parse::<f64>().is_ok()
    }

    fn cast(&self, raw: &str) -> Result<Value, CastError> {
        if !self.is_valid(raw) {
            return Err(CastError::new(raw, self.name()));
        }

        raw.parse::<f64>()
            .map(Value::Float)
            .map_err(|_| CastError::new(raw, self.name()))
    }
}

fn boolean(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "on" | "1" => Some(true),
        "false" | "f" | "no" | "n" | "off" | "0" => Some(false),
        _ => None,
    }
}

impl ArgType for BooleanType {
    fn name(&self) -> &str {
        "boolean"
    }

    fn is_valid(&self, raw: &str) -> bool {
        boolean(raw).is_some()
    }

    fn cast(&self, raw: &str) -> Result<Value, CastError> {
        boolean(raw)
            .map(Value::Bool)
            .ok_or_else(|| CastError::new(raw, self.name()))
    }
}

const TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

fn time(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(date_time) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(date_time.naive_utc());
    }

    for format in TIME_FORMATS {
        if let Ok(date_time) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(date_time);
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

impl ArgType for TimeType {
    fn name(&self) -> &str {
        "time"
    }

    fn is_valid(&self, raw: &str) -> bool {
        time(raw).is_some()
    }

    fn cast(&self, raw: &str) -> Result<Value, CastError> {
        time(raw)
            .map(Value::Time)
            .ok_or_else(|| CastError::new(raw, self.name()))
    }
}

impl ArgType for StringType {
    fn name(&self) -> &str {
        "string"
    }

    fn is_valid(&self, _raw: &str) -> bool {
        true
    }

    fn cast(&self, raw: &str) -> Result<Value, CastError> {
        Ok(Value::Str(raw.to_string()))
    }
}

impl ArgType for SymbolType {
    fn name(&self) -> &str {
        "symbol"
    }

    fn is_valid(&self, raw: &str) -> bool {
        !raw.is_empty()
    }

    fn cast(&self, raw: &str) -> Result<Value, CastError> {
        if raw.is_empty() {
            return Err(CastError::new(raw, self.name()));
        }

        Ok(Value::Symbol(raw.trim_start_matches(':').to_string()))
    }
}

impl ArgType for ArrayType {
    fn name(&self) -> &str {
        "array"
    }

    fn is_valid(&self, _raw: &str) -> bool {
        true
    }

    fn cast(&self, raw: &str) -> Result<Value, CastError> {
        if raw.is_empty() {
            return Ok(Value::List(Vec::default()));
        }

        Ok(Value::List(
            raw.split(',')
                .map(|item| Value::Str(item.trim().to_string()))
                .collect(),
        ))
    }
}

fn range(raw: &str) -> Option<(i64, i64)> {
    // The three dot form must be tried first, since it contains the two dot form.
    if let Some((start, end)) = raw.split_once("...") {
        let start = start.trim().parse::<i64>().ok()?;
        let end = end.trim().parse::<i64>().ok()?;
        return Some((start, end.checked_sub(1)?));
    }

    let (start, end) = raw.split_once("..")?;
    Some((start.trim().parse().ok()?, end.trim().parse().ok()?))
}

impl ArgType for RangeType {
    fn name(&self) -> &str {
        "range"
    }

    fn is_valid(&self, raw: &str) -> bool {
        range(raw).is_some()
    }

    fn cast(&self, raw: &str) -> Result<Value, CastError> {
        range(raw)
            .map(|(start, end)| Value::Range(start, end))
            .ok_or_else(|| CastError::new(raw, self.name()))
    }
}

/// The built-in `Integer` type.
pub fn integer() -> TypeRef {
    Arc::new(IntegerType)
}

/// The built-in `Float` type.
pub fn float() -> TypeRef {
    Arc::new(FloatType)
}

/// The built-in `Boolean` type.
pub fn boolean_type() -> TypeRef {
    Arc::new(BooleanType)
}

/// The built-in `Time` type.
pub fn time_type() -> TypeRef {
    Arc::new(TimeType)
}

/// The built-in `String` type.
pub fn string() -> TypeRef {
    Arc::new(StringType)
}

/// The built-in `Symbol` type.
pub fn symbol() -> TypeRef {
    Arc::new(SymbolType)
}

/// The built-in `Array` type.
pub fn array() -> TypeRef {
    Arc::new(ArrayType)
}

/// The built-in `Range` type.
pub fn range_type() -> TypeRef {
    Arc::new(RangeType)
}

/// A type that accepts tokens matching a regular expression, keeping them as strings.
#[derive(Debug)]
pub struct PatternType {
    pattern: Regex,
}

impl PatternType {
    /// Create a pattern type.
    pub fn new(pattern: Regex) -> Self {
        Self { pattern }
    }
}

impl ArgType for PatternType {
    fn name(&self) -> &str {
        self.pattern.as_str()
    }

    fn is_valid(&self, raw: &str) -> bool {
        self.pattern.is_match(raw)
    }

    fn cast(&self, raw: &str) -> Result<Value, CastError> {
        if self.is_valid(raw) {
            Ok(Value::Str(raw.to_string()))
        } else {
            Err(CastError::new(raw, self.name()))
        }
    }
}

/// Named lookup of argument types.
///
/// Holds the built-ins (under their names and common aliases) and any custom types registered by the program.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: HashMap<String, TypeRef>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        let mut registry = Self {
            types: HashMap::default(),
        };

        for (aliases, type_ref) in [
            (&["integer", "int"][..], integer()),
            (&["float", "numeric", "number"][..], float()),
            (&["boolean", "bool"][..], boolean_type()),
            (&["time", "date", "datetime"][..], time_type()),
            (&["string", "str"][..], string()),
            (&["symbol", "sym"][..], symbol()),
            (&["array", "list"][..], array()),
            (&["range"][..], range_type()),
        ] {
            for alias in aliases {
                registry.register(*alias, type_ref.clone());
            }
        }

        registry
    }
}

impl TypeRegistry {
    /// Register a type under `name` (case-insensitive), replacing any previous type of that name.
    pub fn register(&mut self, name: impl AsRef<str>, type_ref: TypeRef) {
        self.types
            .insert(name.as_ref().to_ascii_lowercase(), type_ref);
    }

    /// Find the type registered under `name` (case-insensitive).
    pub fn find(&self, name: &str) -> Option<TypeRef> {
        self.types.get(&name.to_ascii_lowercase()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("0", Some(0))]
    #[case("-12", Some(-12))]
    #[case("+7", Some(7))]
    #[case("1.5", None)]
    #[case("abc", None)]
    #[case("", None)]
    fn integer_type(#[case] raw: &str, #[case] expected: Option<i64>) {
        let t = IntegerType;
        assert_eq!(t.is_valid(raw), expected.is_some());

        match expected {
            Some(i) => assert_eq!(t.cast(raw).unwrap(), Value::Integer(i)),
            None => assert_eq!(t.cast(raw).unwrap_err(), CastError::new(raw, "integer")),
        }
    }

    #[rstest]
    #[case("2.45", Some(2.45))]
    #[case("-1", Some(-1.0))]
    #[case("1e3", Some(1000.0))]
    #[case("inf", None)]
    #[case("NaN", None)]
    #[case("x", None)]
    fn float_type(#[case] raw: &str, #[case] expected: Option<f64>) {
        let t = FloatType;
        assert_eq!(t.is_valid(raw), expected.is_some());

        if let Some(f) = expected {
            assert_eq!(t.cast(raw).unwrap(), Value::Float(f));
        } else {
            assert!(t.cast(raw).is_err());
        }
    }

    #[rstest]
    #[case("true", Some(true))]
    #[case("YES", Some(true))]
    #[case("on", Some(true))]
    #[case("0", Some(false))]
    #[case("off", Some(false))]
    #[case("maybe", None)]
    fn boolean_type_cast(#[case] raw: &str, #[case] expected: Option<bool>) {
        let t = BooleanType;
        assert_eq!(t.is_valid(raw), expected.is_some());
        assert_eq!(t.cast(raw).ok(), expected.map(Value::Bool));
    }

    #[rstest]
    #[case("2024-01-02", true)]
    #[case("2024-01-02 03:04:05", true)]
    #[case("2024-01-02T03:04", true)]
    #[case("2024-01-02T03:04:05+02:00", true)]
    #[case("02/01/2024", false)]
    #[case("yesterday", false)]
    fn time_type_valid(#[case] raw: &str, #[case] expected: bool) {
        assert_eq!(TimeType.is_valid(raw), expected);
    }

    #[test]
    fn time_type_cast() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(TimeType.cast("2024-01-02").unwrap(), Value::Time(expected));

        let expected = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(1, 4, 5)
            .unwrap();
        assert_eq!(
            TimeType.cast("2024-01-02T03:04:05+02:00").unwrap(),
            Value::Time(expected)
        );
    }

    #[test]
    fn array_type() {
        assert_eq!(
            ArrayType.cast("a, b,c").unwrap(),
            Value::from(vec!["a", "b", "c"])
        );
        assert_eq!(ArrayType.cast("").unwrap(), Value::List(vec![]));
    }

    #[rstest]
    #[case("1..5", Some((1, 5)))]
    #[case("1...5", Some((1, 4)))]
    #[case("-3..3", Some((-3, 3)))]
    #[case("1..", None)]
    #[case("a..b", None)]
    #[case("15", None)]
    #[case("0...-9223372036854775808", None)]
    #[case("0..-9223372036854775808", Some((0, i64::MIN)))]
    fn range_type(#[case] raw: &str, #[case] expected: Option<(i64, i64)>) {
        assert_eq!(RangeType.is_valid(raw), expected.is_some());
        assert_eq!(
            RangeType.cast(raw).ok(),
            expected.map(|(s, e)| Value::Range(s, e))
        );
    }

    #[test]
    fn symbol_type() {
        assert_eq!(
            SymbolType.cast(":abc").unwrap(),
            Value::Symbol("abc".to_string())
        );
        assert!(!SymbolType.is_valid(""));
    }

    #[test]
    fn pattern_type() {
        let t = PatternType::new(Regex::new("^v[0-9]+$").unwrap());
        assert!(t.is_valid("v12"));
        assert!(!t.is_valid("12"));
        assert_eq!(t.cast("v1").unwrap(), Value::Str("v1".to_string()));
    }

    #[rstest]
    #[case("int", "integer")]
    #[case("Integer", "integer")]
    #[case("numeric", "float")]
    #[case("bool", "boolean")]
    #[case("date", "time")]
    #[case("list", "array")]
    #[case("range", "range")]
    fn registry_aliases(#[case] alias: &str, #[case] name: &str) {
        let registry = TypeRegistry::default();
        assert_eq!(registry.find(alias).unwrap().name(), name);
    }

    #[test]
    fn registry_custom() {
        let mut registry = TypeRegistry::default();
        assert!(registry.find("version").is_none());

        registry.register(
            "version",
            Arc::new(PatternType::new(Regex::new("^v[0-9]+$").unwrap())),
        );
        assert!(registry.find("VERSION").unwrap().is_valid("v3"));
    }
}
