//! Strict mode enforcement
//!
//! Decides what a failed validation means for a record: in strict mode the
//! failure becomes an error carrying every diagnostic, in lenient mode it is
//! logged and the record is accepted as is.

use crate::errors::{RecordError, ValidationResult};

// ============================================================================
// Strict Mode Configuration
// ============================================================================

/// How a failed validation is surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrictMode {
    /// Fail the record operation with every diagnostic
    Strict,
    /// Log the diagnostics and keep going (default)
    #[default]
    Lenient,
}

impl StrictMode {
    /// Create a strict mode
    pub fn strict() -> Self {
        Self::Strict
    }

    /// Create a lenient mode
    pub fn lenient() -> Self {
        Self::Lenient
    }

    pub fn is_strict(self) -> bool {
        self == Self::Strict
    }

    /// Turn a validation result into the outcome of a record operation
    pub fn enforce(self, record: &str, result: ValidationResult) -> Result<(), RecordError> {
        if result.passed {
            return Ok(());
        }

        match self {
            Self::Strict => Err(RecordError::Validation(result.errors)),
            Self::Lenient => {
                tracing::warn!(
                    record = record,
                    errors = result.errors.len(),
                    "record failed validation; accepted in lenient mode"
                );
                for error in result.errors.as_slice() {
                    tracing::debug!(record = record, field = %error.field, "{}", error);
                }
                Ok(())
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ValidationError, ValidationErrors};
    use crate::types::Value;

    fn failed() -> ValidationResult {
        let mut errors = ValidationErrors::new();
        errors.add(ValidationError::type_error("x", "<string>", &Value::Int(1)));
        ValidationResult::from(errors)
    }

    #[test]
    fn test_strict_mode_default() {
        assert_eq!(StrictMode::default(), StrictMode::Lenient);
        assert!(!StrictMode::lenient().is_strict());
        assert!(StrictMode::strict().is_strict());
    }

    #[test]
    fn test_strict_raises_with_all_errors() {
        let err = StrictMode::Strict.enforce("User", failed()).unwrap_err();
        assert_eq!(err.validation_errors().map(ValidationErrors::len), Some(1));
    }

    #[test]
    fn test_lenient_accepts() {
        assert!(StrictMode::Lenient.enforce("User", failed()).is_ok());
    }

    #[test]
    fn test_passed_result_is_ok_in_both_modes() {
        let passed = ValidationResult::from(ValidationErrors::new());
        assert!(StrictMode::Strict.enforce("User", passed.clone()).is_ok());
        assert!(StrictMode::Lenient.enforce("User", passed).is_ok());
    }
}
