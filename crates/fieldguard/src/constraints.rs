//! Semantic constraints attached to annotated types
//!
//! A constraint runs only after the value's base type already matched. Each
//! one is an immutable value object; invalid parameters are rejected when the
//! constraint is built, never at validation time.

use crate::errors::ConfigError;
use crate::types::{format_float, write_joined, Value};
use std::cmp::Ordering;
use std::fmt;

// ============================================================================
// Constraint Trait
// ============================================================================

/// A semantic rule evaluated against an already type-checked value
///
/// `Display` renders the constraint the way it appears inside an
/// `Annotated[...]` type name.
pub trait Constraint: fmt::Debug + fmt::Display + Send + Sync {
    /// `Ok(())` when the value satisfies the rule, otherwise the message
    /// fragment appended to the field's diagnostic.
    fn validate(&self, value: &Value) -> Result<(), String>;
}

// ============================================================================
// Number
// ============================================================================

/// Numeric bound for [`ValueRange`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }

    fn is_finite(self) -> bool {
        match self {
            Self::Int(_) => true,
            Self::Float(f) => f.is_finite(),
        }
    }

    /// Compare with a numeric value; integers compare exactly with integers.
    fn cmp_value(self, value: &Value) -> Option<Ordering> {
        match (self, value) {
            (Self::Int(bound), Value::Int(v)) => Some(bound.cmp(v)),
            (bound, Value::Int(v)) => bound.as_f64().partial_cmp(&(*v as f64)),
            (bound, Value::Float(v)) => bound.as_f64().partial_cmp(v),
            _ => None,
        }
    }
}

impl From<i64> for Number {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Number {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Number {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => f.write_str(&format_float(*x)),
        }
    }
}

// ============================================================================
// ValueRange
// ============================================================================

/// Inclusive numeric bounds: `lo <= value <= hi`
#[derive(Debug, Clone, PartialEq)]
pub struct ValueRange {
    lo: Number,
    hi: Number,
}

impl ValueRange {
    pub fn new(lo: impl Into<Number>, hi: impl Into<Number>) -> Result<Self, ConfigError> {
        let (lo, hi) = (lo.into(), hi.into());
        if !lo.is_finite() || !hi.is_finite() {
            return Err(ConfigError::NonFiniteBound);
        }
        if lo.as_f64() > hi.as_f64() {
            return Err(ConfigError::InvertedRange { lo, hi });
        }
        Ok(Self { lo, hi })
    }

    pub fn lo(&self) -> Number {
        self.lo
    }

    pub fn hi(&self) -> Number {
        self.hi
    }
}

impl Constraint for ValueRange {
    fn validate(&self, value: &Value) -> Result<(), String> {
        let above_lo = matches!(self.lo.cmp_value(value), Some(Ordering::Less | Ordering::Equal));
        let below_hi = matches!(self.hi.cmp_value(value), Some(Ordering::Greater | Ordering::Equal));
        if above_lo && below_hi {
            Ok(())
        } else {
            Err(format!(
                "Value \"{}\" should met this condition: {} <= <value> <= {}.",
                value, self.lo, self.hi
            ))
        }
    }
}

impl fmt::Display for ValueRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueRange(lo={}, hi={})", self.lo, self.hi)
    }
}

// ============================================================================
// NotEmpty
// ============================================================================

/// Requires a sized value with at least one element (or character)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotEmpty;

impl Constraint for NotEmpty {
    fn validate(&self, value: &Value) -> Result<(), String> {
        match value.len() {
            Some(len) if len > 0 => Ok(()),
            _ => Err(format!("Value \"{}\" should be not empty.", value)),
        }
    }
}

impl fmt::Display for NotEmpty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NotEmpty()")
    }
}

// ============================================================================
// Options
// ============================================================================

/// Requires the value to be one of an allowed set
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    allowed: Vec<Value>,
}

impl Options {
    /// Duplicate options are dropped; declaration order is kept for messages.
    pub fn new<I, V>(allowed: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut distinct: Vec<Value> = Vec::new();
        for option in allowed {
            let option = option.into();
            if !distinct.iter().any(|known| same_option(known, &option)) {
                distinct.push(option);
            }
        }
        Self { allowed: distinct }
    }

    pub fn allowed(&self) -> &[Value] {
        &self.allowed
    }
}

/// Renders the allowed set as `{a, b}`
struct OptionSet<'a>(&'a [Value]);

impl fmt::Display for OptionSet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("set()");
        }
        f.write_str("{")?;
        write_joined(f, self.0)?;
        f.write_str("}")
    }
}

/// Option equality; integers and integral floats of the same number match.
fn same_option(option: &Value, value: &Value) -> bool {
    match (option, value) {
        (Value::Int(i), Value::Float(f)) | (Value::Float(f), Value::Int(i)) => {
            f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 && *f as i64 == *i
        }
        _ => option == value,
    }
}

impl Constraint for Options {
    fn validate(&self, value: &Value) -> Result<(), String> {
        if self.allowed.iter().any(|option| same_option(option, value)) {
            Ok(())
        } else {
            Err(format!(
                "Value \"{}\" should be chosen from this options: {}",
                value,
                OptionSet(&self.allowed)
            ))
        }
    }
}

impl fmt::Display for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Options(opts={})", OptionSet(&self.allowed))
    }
}

// ============================================================================
// LimitedLength
// ============================================================================

/// Upper bound on the size of a sized value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitedLength {
    length: usize,
}

impl LimitedLength {
    /// Fails for limits below 1.
    pub fn new(length: i64) -> Result<Self, ConfigError> {
        if length < 1 {
            return Err(ConfigError::InvalidLengthLimit(length));
        }
        let length = usize::try_from(length).map_err(|_| ConfigError::InvalidLengthLimit(length))?;
        Ok(Self { length })
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl Constraint for LimitedLength {
    fn validate(&self, value: &Value) -> Result<(), String> {
        match value.len() {
            Some(len) if len <= self.length => Ok(()),
            Some(len) => Err(format!(
                "Value \"{}\" length should be <= {}. Actual is {}",
                value, self.length, len
            )),
            None => Err(format!(
                "Value \"{}\" length should be <= {}. Actual value has no length",
                value, self.length
            )),
        }
    }
}

impl fmt::Display for LimitedLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LimitedLength(length={})", self.length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_range_bounds_inclusive() {
        let range = ValueRange::new(-10, 10).unwrap();
        for ok in [-10, -9, 0, 9, 10] {
            assert!(range.validate(&Value::Int(ok)).is_ok(), "{} should pass", ok);
        }
        assert_eq!(
            range.validate(&Value::Int(11)).unwrap_err(),
            "Value \"11\" should met this condition: -10 <= <value> <= 10."
        );
        assert!(range.validate(&Value::Int(-11)).is_err());
    }

    #[test]
    fn test_value_range_float() {
        let range = ValueRange::new(-10.0, 10.0).unwrap();
        assert!(range.validate(&Value::Float(-9.9)).is_ok());
        assert!(range.validate(&Value::Float(10.0)).is_ok());
        assert_eq!(
            range.validate(&Value::Float(10.1)).unwrap_err(),
            "Value \"10.1\" should met this condition: -10.0 <= <value> <= 10.0."
        );
        assert_eq!(range.to_string(), "ValueRange(lo=-10.0, hi=10.0)");
    }

    #[test]
    fn test_value_range_rejects_non_numeric() {
        let range = ValueRange::new(0, 1).unwrap();
        assert!(range.validate(&Value::string("0")).is_err());
        assert!(range.validate(&Value::Bool(true)).is_err());
    }

    #[test]
    fn test_value_range_config_errors() {
        assert_eq!(
            ValueRange::new(5, 1).unwrap_err(),
            ConfigError::InvertedRange { lo: Number::Int(5), hi: Number::Int(1) }
        );
        assert_eq!(ValueRange::new(0.0, f64::NAN).unwrap_err(), ConfigError::NonFiniteBound);
    }

    #[test]
    fn test_not_empty() {
        assert!(NotEmpty.validate(&Value::string("x")).is_ok());
        assert!(NotEmpty.validate(&Value::List(vec![Value::Int(1)])).is_ok());
        assert_eq!(
            NotEmpty.validate(&Value::string("")).unwrap_err(),
            "Value \"\" should be not empty."
        );
        assert_eq!(
            NotEmpty.validate(&Value::Set(vec![])).unwrap_err(),
            "Value \"set()\" should be not empty."
        );
        assert_eq!(
            NotEmpty.validate(&Value::Map(vec![])).unwrap_err(),
            "Value \"{}\" should be not empty."
        );
        assert!(NotEmpty.validate(&Value::Int(3)).is_err());
    }

    #[test]
    fn test_options() {
        let opts = Options::new(["opt_1", "opt_2", "opt_1"]);
        assert_eq!(opts.allowed().len(), 2);
        assert!(opts.validate(&Value::string("opt_2")).is_ok());
        assert_eq!(
            opts.validate(&Value::string("bad_opt")).unwrap_err(),
            r#"Value "bad_opt" should be chosen from this options: {"opt_1", "opt_2"}"#
        );
        assert_eq!(opts.to_string(), r#"Options(opts={"opt_1", "opt_2"})"#);

        let ints = Options::new([1, 2]);
        assert_eq!(
            ints.validate(&Value::Int(100)).unwrap_err(),
            "Value \"100\" should be chosen from this options: {1, 2}"
        );

        assert!(ints.validate(&Value::Float(1.0)).is_ok());
        assert!(ints.validate(&Value::Float(1.5)).is_err());
        assert!(ints.validate(&Value::Bool(true)).is_err());

        let floats = Options::new([2.0, 3.5]);
        assert!(floats.validate(&Value::Int(2)).is_ok());
        assert!(floats.validate(&Value::Int(3)).is_err());
        assert_eq!(Options::new([Value::Int(1), Value::Float(1.0)]).allowed().len(), 1);
    }

    #[test]
    fn test_limited_length() {
        let limit = LimitedLength::new(2).unwrap();
        assert!(limit.validate(&Value::string("ok")).is_ok());
        assert!(limit.validate(&Value::string("!")).is_ok());
        assert_eq!(
            limit.validate(&Value::string("not")).unwrap_err(),
            "Value \"not\" length should be <= 2. Actual is 3"
        );
        assert_eq!(
            limit
                .validate(&Value::List(vec![1.into(), 2.into(), 3.into()]))
                .unwrap_err(),
            "Value \"[1, 2, 3]\" length should be <= 2. Actual is 3"
        );
    }

    #[test]
    fn test_limited_length_rejects_non_positive() {
        assert_eq!(LimitedLength::new(0).unwrap_err(), ConfigError::InvalidLengthLimit(0));
        assert_eq!(LimitedLength::new(-3).unwrap_err(), ConfigError::InvalidLengthLimit(-3));
        assert_eq!(LimitedLength::new(1).unwrap().length(), 1);
    }
}
