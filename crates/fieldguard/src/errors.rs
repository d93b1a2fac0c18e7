//! Validation error types
//!
//! Two families live here. Diagnostics ([`ValidationError`], collected in
//! [`ValidationErrors`]) describe a value that does not fit its declared
//! type; they are data, returned inside a [`ValidationResult`]. Fatal errors
//! ([`ConfigError`], [`RecordError`]) abort schema setup or a record
//! operation and are propagated with `?`.

use crate::constraints::Number;
use crate::types::Value;
use std::fmt;
use thiserror::Error;

// ============================================================================
// Single Validation Error
// ============================================================================

/// One diagnostic produced while checking a field
///
/// `Display` renders the exact sentence downstream consumers parse:
///
/// ```text
/// Expected that attr "<field>" would be of type "<expected>". Value <value>, of type "<actual>" was passed.<extra>
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ValidationError {
    /// Field name
    pub field: String,

    /// Rendering of the expected type expression
    pub expected: String,

    /// Rendering of the offending value
    pub actual_value: String,

    /// Rendering of the offending value's kind
    pub actual_type: String,

    /// Message appended by a failed constraint or custom validator
    pub extra: Option<String>,

    /// Error type classification
    pub error_type: ErrorType,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(
        field: impl Into<String>,
        expected: impl fmt::Display,
        value: &Value,
        extra: Option<String>,
        error_type: ErrorType,
    ) -> Self {
        Self {
            field: field.into(),
            expected: expected.to_string(),
            actual_value: value.to_string(),
            actual_type: value.kind().to_string(),
            extra,
            error_type,
        }
    }

    /// Create a structural mismatch error
    pub fn type_error(field: impl Into<String>, expected: impl fmt::Display, value: &Value) -> Self {
        Self::new(field, expected, value, None, ErrorType::TypeError)
    }

    /// Create a constraint violation error
    pub fn value_error(
        field: impl Into<String>,
        expected: impl fmt::Display,
        value: &Value,
        message: String,
    ) -> Self {
        Self::new(field, expected, value, Some(message), ErrorType::ValueError)
    }

    /// Create an error reported by a registered field validator
    pub fn custom_error(
        field: impl Into<String>,
        expected: impl fmt::Display,
        value: &Value,
        message: String,
    ) -> Self {
        Self::new(field, expected, value, Some(message), ErrorType::Custom)
    }

    /// The full diagnostic sentence
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Expected that attr \"{}\" would be of type \"{}\". Value {}, of type \"{}\" was passed.{}",
            self.field,
            self.expected,
            self.actual_value,
            self.actual_type,
            self.extra.as_deref().unwrap_or("")
        )
    }
}

// ============================================================================
// Error Type Classification
// ============================================================================

/// Classification of validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(rename_all = "snake_case"))]
pub enum ErrorType {
    /// Value shape/kind does not match the declared type
    TypeError,

    /// Value has the right type but breaks an attached constraint
    ValueError,

    /// Rejected by a registered field validator
    Custom,
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeError => write!(f, "type_error"),
            Self::ValueError => write!(f, "value_error"),
            Self::Custom => write!(f, "custom_error"),
        }
    }
}

// ============================================================================
// Validation Errors Collection
// ============================================================================

/// Append-only collection of diagnostics for one validation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    /// List of individual validation errors
    pub errors: Vec<ValidationError>,
}

impl ValidationErrors {
    /// Create a new empty validation errors collection
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Check if there are any errors
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get the number of errors
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Add a validation error to the collection
    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Add multiple validation errors
    pub fn extend(&mut self, errors: impl IntoIterator<Item = ValidationError>) {
        self.errors.extend(errors);
    }

    /// Merge another ValidationErrors into this one
    pub fn merge(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }

    /// Whether any collected error belongs to `field`
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Convert to Result - Ok if no errors, Err if there are errors
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Get errors as a slice
    pub fn as_slice(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Diagnostic sentences in discovery order
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ValidationError::message).collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation error(s)", self.errors.len())
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

// ============================================================================
// Validation Result
// ============================================================================

/// Verdict of one validation call plus every diagnostic, in discovery order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    /// `true` iff `errors` is empty
    pub passed: bool,
    pub errors: ValidationErrors,
}

impl ValidationResult {
    /// Diagnostic sentences in discovery order
    pub fn messages(&self) -> Vec<String> {
        self.errors.messages()
    }

    /// Ok if passed, otherwise the collected errors
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        self.errors.into_result()
    }
}

impl From<ValidationErrors> for ValidationResult {
    fn from(errors: ValidationErrors) -> Self {
        Self {
            passed: errors.is_empty(),
            errors,
        }
    }
}

// ============================================================================
// Fatal Errors
// ============================================================================

/// Invalid schema or constraint definition
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("length limit should be greater than 0 (got {0})")]
    InvalidLengthLimit(i64),

    #[error("range lower bound {lo} is greater than upper bound {hi}")]
    InvertedRange { lo: Number, hi: Number },

    #[error("range bounds must be finite numbers")]
    NonFiniteBound,

    #[error("field \"{0}\" is declared more than once")]
    DuplicateField(String),

    #[error("validator registered for undeclared field \"{0}\"")]
    UnknownValidatorField(String),

    #[error("cannot parse type annotation \"{input}\" at offset {position}: {message}")]
    Parse {
        input: String,
        position: usize,
        message: String,
    },
}

/// Result type alias for record operations
pub type RecordResult<T> = std::result::Result<T, RecordError>;

/// Failure of a record operation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    /// Strict-mode validation failed; carries every diagnostic
    #[error("record validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("record has no field \"{0}\"")]
    UnknownField(String),

    #[error("missing value for field \"{0}\"")]
    MissingField(String),

    #[error("expected {expected} field values, got {actual}")]
    ValueCount { expected: usize, actual: usize },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl RecordError {
    /// Diagnostics carried by a validation failure
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}
