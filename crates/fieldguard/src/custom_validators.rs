//! Custom validator support for field-level validation
//!
//! Field validators are registered explicitly on a record schema, keyed by
//! field name. They run after a field has passed its type and constraint
//! checks and can read every other field of the record.
//!
//! # Example
//!
//! ```rust
//! use fieldguard::custom_validators::{FnFieldValidator, ValidatorCollection};
//! use fieldguard::Value;
//!
//! let mut validators = ValidatorCollection::new();
//! validators.add_field_validator(FnFieldValidator::new("end", |value, ctx| {
//!     match (ctx.get_field("start"), value) {
//!         (Some(Value::Int(start)), Value::Int(end)) if end < start => {
//!             Err(format!("End {} is before start {}.", end, start))
//!         }
//!         _ => Ok(()),
//!     }
//! }));
//! assert!(!validators.is_empty());
//! ```

use crate::errors::{ValidationError, ValidationErrors};
use crate::types::{TypeExpr, Value};
use std::collections::HashMap;
use std::sync::Arc;

// ============================================================================
// Validator Context
// ============================================================================

/// Read access to the record being validated
#[derive(Debug, Clone, Default)]
pub struct ValidatorContext<'a> {
    /// All field values of the record
    fields: HashMap<&'a str, &'a Value>,
    /// Field currently being validated
    current: &'a str,
}

impl<'a> ValidatorContext<'a> {
    /// Create a context over `(name, value)` pairs
    pub fn new(fields: impl IntoIterator<Item = (&'a str, &'a Value)>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
            current: "",
        }
    }

    /// Get a field value by name
    pub fn get_field(&self, name: &str) -> Option<&'a Value> {
        self.fields.get(name).copied()
    }

    /// Name of the field under validation
    pub fn current_field(&self) -> &str {
        self.current
    }

    fn focus(&mut self, field: &'a str) {
        self.current = field;
    }
}

// ============================================================================
// Field Validator Trait
// ============================================================================

/// A post-type-check rule for one field
pub trait FieldValidator: Send + Sync {
    /// Name of the field this validator applies to
    fn field_name(&self) -> &str;

    /// `Ok(())` to accept, or a message appended to the field's diagnostic
    fn validate(&self, value: &Value, context: &ValidatorContext<'_>) -> Result<(), String>;
}

/// Type alias for boxed field validator
pub type BoxedFieldValidator = Arc<dyn FieldValidator>;

// ============================================================================
// Validator Collection
// ============================================================================

/// Field validators of a schema, grouped by field name
#[derive(Default, Clone)]
pub struct ValidatorCollection {
    field_validators: HashMap<String, Vec<BoxedFieldValidator>>,
}

impl ValidatorCollection {
    /// Create empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field validator; validators of one field run in insertion order
    pub fn add_field_validator(&mut self, validator: impl FieldValidator + 'static) {
        let field_name = validator.field_name().to_string();
        self.field_validators
            .entry(field_name)
            .or_default()
            .push(Arc::new(validator));
    }

    /// Get field validators for a specific field
    pub fn get_field_validators(&self, field_name: &str) -> Option<&Vec<BoxedFieldValidator>> {
        self.field_validators.get(field_name)
    }

    /// Names of every field with at least one validator
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.field_validators.keys().map(String::as_str)
    }

    /// Check if collection is empty
    pub fn is_empty(&self) -> bool {
        self.field_validators.is_empty()
    }

    /// Run the validators of `field_name`, one diagnostic per rejection
    pub fn run_field_validators<'a>(
        &self,
        field_name: &'a str,
        declared: &TypeExpr,
        value: &Value,
        context: &mut ValidatorContext<'a>,
        errors: &mut ValidationErrors,
    ) {
        let Some(validators) = self.field_validators.get(field_name) else {
            return;
        };

        context.focus(field_name);
        for validator in validators {
            if let Err(message) = validator.validate(value, context) {
                tracing::trace!(field = field_name, "custom validator rejected value");
                errors.add(ValidationError::custom_error(field_name, declared, value, message));
            }
        }
    }
}

impl std::fmt::Debug for ValidatorCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorCollection")
            .field("field_validators", &self.field_validators.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ============================================================================
// Function-based Validators (for ergonomic API)
// ============================================================================

/// Create a field validator from a function
pub struct FnFieldValidator<F>
where
    F: Fn(&Value, &ValidatorContext<'_>) -> Result<(), String> + Send + Sync,
{
    field_name: String,
    validate_fn: F,
}

impl<F> FnFieldValidator<F>
where
    F: Fn(&Value, &ValidatorContext<'_>) -> Result<(), String> + Send + Sync,
{
    /// Create a new function-based field validator
    pub fn new(field_name: impl Into<String>, validate_fn: F) -> Self {
        Self {
            field_name: field_name.into(),
            validate_fn,
        }
    }
}

impl<F> FieldValidator for FnFieldValidator<F>
where
    F: Fn(&Value, &ValidatorContext<'_>) -> Result<(), String> + Send + Sync,
{
    fn field_name(&self) -> &str {
        &self.field_name
    }

    fn validate(&self, value: &Value, context: &ValidatorContext<'_>) -> Result<(), String> {
        (self.validate_fn)(value, context)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorType;

    #[test]
    fn test_validator_context() {
        let name = Value::string("test");
        let age = Value::Int(25);
        let ctx = ValidatorContext::new([("name", &name), ("age", &age)]);

        assert_eq!(ctx.get_field("name"), Some(&Value::string("test")));
        assert_eq!(ctx.get_field("age"), Some(&Value::Int(25)));
        assert_eq!(ctx.get_field("missing"), None);
    }

    #[test]
    fn test_fn_field_validator() {
        let validator = FnFieldValidator::new("age", |value, _ctx| match value {
            Value::Int(age) if *age < 0 => Err("Age must be non-negative.".to_string()),
            _ => Ok(()),
        });

        let ctx = ValidatorContext::default();
        assert_eq!(validator.field_name(), "age");
        assert!(validator.validate(&Value::Int(25), &ctx).is_ok());
        assert!(validator.validate(&Value::Int(-5), &ctx).is_err());
    }

    #[test]
    fn test_validator_collection_runs_in_order() {
        let mut collection = ValidatorCollection::new();
        collection.add_field_validator(FnFieldValidator::new("name", |_, _| Err("first".to_string())));
        collection.add_field_validator(FnFieldValidator::new("name", |_, ctx| {
            Err(format!("second for {}", ctx.current_field()))
        }));
        assert!(!collection.is_empty());
        assert_eq!(collection.get_field_validators("name").map(Vec::len), Some(2));

        let value = Value::string("John");
        let mut ctx = ValidatorContext::new([("name", &value)]);
        let mut errors = ValidationErrors::new();
        collection.run_field_validators("name", &TypeExpr::string(), &value, &mut ctx, &mut errors);

        let extras: Vec<_> = errors.as_slice().iter().map(|e| e.extra.as_deref().unwrap_or("")).collect();
        assert_eq!(extras, vec!["first", "second for name"]);
        assert!(errors.as_slice().iter().all(|e| e.error_type == ErrorType::Custom));
    }

    #[test]
    fn test_unregistered_field_is_noop() {
        let collection = ValidatorCollection::new();
        let value = Value::Int(1);
        let mut ctx = ValidatorContext::default();
        let mut errors = ValidationErrors::new();
        collection.run_field_validators("age", &TypeExpr::integer(), &value, &mut ctx, &mut errors);
        assert!(errors.is_empty());
    }
}
