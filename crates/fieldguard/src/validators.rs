//! Core validation engine
//!
//! Matches values against declared [`TypeExpr`]s. Every field of a record is
//! checked, every failure is recorded, and each call owns its own error
//! collection so one engine can serve any number of threads.
//!
//! Composite checks are deliberately shallow: element, key and value types are
//! compared by outer kind against a [`KindSet`] and never validated
//! recursively.

use crate::constraints::Constraint;
use crate::errors::{ValidationError, ValidationErrors, ValidationResult};
use crate::types::{ContainerKind, KindSet, TupleArity, TypeExpr, Value, ValueKind};
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Public API
// ============================================================================

/// Check one field
///
/// # Example
///
/// ```
/// use fieldguard::{check_field, TypeExpr, Value};
///
/// let result = check_field("x", &TypeExpr::string(), &Value::Int(0));
/// assert!(!result.passed);
/// assert_eq!(
///     result.messages(),
///     vec![r#"Expected that attr "x" would be of type "<string>". Value 0, of type "<integer>" was passed."#]
/// );
/// ```
pub fn check_field(name: &str, expr: &TypeExpr, value: &Value) -> ValidationResult {
    TypeChecker::new().check_field(name, expr, value)
}

/// Check every `(name, type, value)` triple, in the given order
pub fn check_record<'a, I>(fields: I) -> ValidationResult
where
    I: IntoIterator<Item = (&'a str, &'a TypeExpr, &'a Value)>,
{
    TypeChecker::new().check_record(fields)
}

// ============================================================================
// TypeChecker
// ============================================================================

/// Stateless type-matching engine
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeChecker;

impl TypeChecker {
    pub fn new() -> Self {
        Self
    }

    /// Check all fields and return a fresh result.
    ///
    /// A failing field never stops the remaining ones from being checked.
    pub fn check_record<'a, I>(&self, fields: I) -> ValidationResult
    where
        I: IntoIterator<Item = (&'a str, &'a TypeExpr, &'a Value)>,
    {
        let mut errors = ValidationErrors::new();
        let mut checked = 0usize;

        for (name, expr, value) in fields {
            self.check_into(name, expr, value, &mut errors);
            checked += 1;
        }

        tracing::debug!(fields = checked, errors = errors.len(), "record type check finished");
        ValidationResult::from(errors)
    }

    /// Check a single field and return a fresh result
    pub fn check_field(&self, name: &str, expr: &TypeExpr, value: &Value) -> ValidationResult {
        let mut errors = ValidationErrors::new();
        self.check_into(name, expr, value, &mut errors);
        ValidationResult::from(errors)
    }

    /// Check a single field, appending diagnostics to `errors`
    pub fn check_into(&self, name: &str, expr: &TypeExpr, value: &Value, errors: &mut ValidationErrors) {
        tracing::trace!(field = name, tag = expr.tag(), kind = value.type_name(), "checking field");
        let mut check = FieldCheck {
            field: name,
            declared: expr,
            errors,
        };
        check.dispatch(expr, value);
    }
}

// ============================================================================
// Per-field dispatch
// ============================================================================

/// Checks one field against its declared expression
struct FieldCheck<'a> {
    field: &'a str,
    /// Expression named in diagnostics (the field's declared type)
    declared: &'a TypeExpr,
    errors: &'a mut ValidationErrors,
}

impl FieldCheck<'_> {
    fn dispatch(&mut self, expr: &TypeExpr, value: &Value) {
        match expr {
            TypeExpr::Primitive(kind) => self.expect_kind(kind.kind(), value),
            TypeExpr::Null => self.expect_kind(ValueKind::Null, value),
            TypeExpr::Any => {}
            TypeExpr::Union(_) => self.check_union(expr, value),
            TypeExpr::Container { kind, elements } => {
                self.check_container(*kind, elements.as_deref(), value)
            }
            TypeExpr::Tuple(arity) => self.check_tuple(arity.as_ref(), value),
            TypeExpr::Mapping { key, value: val } => {
                self.check_mapping(key.as_deref(), val.as_deref(), value)
            }
            TypeExpr::Annotated { base, constraints } => {
                self.check_annotated(base, constraints, value)
            }
            // Reported under the Final[...] name
            TypeExpr::Final(inner) => self.dispatch(inner, value),
            TypeExpr::Unsupported(name) => {
                tracing::debug!(field = self.field, declared = %name, "no rule for declared type, value left unchecked");
            }
        }
    }

    fn mismatch(&mut self, value: &Value) {
        self.errors.add(ValidationError::type_error(self.field, self.declared, value));
    }

    fn mismatch_with(&mut self, expected: &dyn fmt::Display, value: &Value) {
        self.errors.add(ValidationError::type_error(self.field, expected, value));
    }

    fn expect_kind(&mut self, kind: ValueKind, value: &Value) {
        if value.kind() != kind {
            self.mismatch(value);
        }
    }

    fn check_union(&mut self, union: &TypeExpr, value: &Value) {
        if !KindSet::leaf(union).admits(value) {
            self.mismatch(value);
        }
    }

    // ------------------------------------------------------------------------
    // Collections
    // ------------------------------------------------------------------------

    fn check_container(&mut self, kind: ContainerKind, elements: Option<&[TypeExpr]>, value: &Value) {
        let Some(elements) = elements else {
            self.expect_kind(kind.kind(), value);
            return;
        };

        // With element types declared, lists and sets are interchangeable.
        let items = match value {
            Value::List(items) | Value::Set(items) => items,
            _ => {
                self.mismatch(value);
                return;
            }
        };

        let allowed = KindSet::flatten(elements);
        if allowed.accepts_any() {
            return;
        }

        if !items.iter().all(|item| allowed.admits(item)) {
            self.mismatch(value);
        }
    }

    fn check_tuple(&mut self, arity: Option<&TupleArity>, value: &Value) {
        let Some(arity) = arity else {
            self.expect_kind(ValueKind::Tuple, value);
            return;
        };

        let Value::Tuple(items) = value else {
            self.mismatch(value);
            return;
        };

        match arity {
            TupleArity::Fixed(positions) => {
                // Extra elements or positions beyond the shorter side are not checked.
                for (item, position) in items.iter().zip(positions) {
                    let allowed = KindSet::flatten(std::iter::once(position));
                    if allowed.accepts_any() {
                        continue;
                    }
                    if !allowed.admits(item) {
                        self.mismatch(item);
                    }
                }
            }
            TupleArity::Variadic(element) => {
                let allowed = KindSet::leaf(element);
                if allowed.accepts_any() {
                    return;
                }
                for item in items {
                    if !allowed.admits(item) {
                        self.mismatch(item);
                    }
                }
            }
        }
    }

    fn check_mapping(&mut self, key: Option<&TypeExpr>, val: Option<&TypeExpr>, value: &Value) {
        if key.is_none() && val.is_none() {
            self.expect_kind(ValueKind::Map, value);
            return;
        }

        let Value::Map(entries) = value else {
            self.mismatch_with(&ValueKind::Map, value);
            return;
        };

        let keys = key.map(|k| (k, KindSet::flatten(std::iter::once(k))));
        let vals = val.map(|v| (v, KindSet::flatten(std::iter::once(v))));

        for (k, v) in entries {
            if let Some((expected, allowed)) = &keys {
                if !allowed.admits(k) {
                    self.mismatch_with(expected, k);
                }
            }
            if let Some((expected, allowed)) = &vals {
                if !allowed.admits(v) {
                    self.mismatch_with(expected, v);
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // Constraints
    // ------------------------------------------------------------------------

    fn check_annotated(&mut self, base: &TypeExpr, constraints: &[Arc<dyn Constraint>], value: &Value) {
        if !KindSet::leaf(base).admits(value) {
            // Constraints assume a well-typed value; skip them.
            self.mismatch(value);
            return;
        }

        for constraint in constraints {
            if let Err(message) = constraint.validate(value) {
                self.errors.add(ValidationError::value_error(
                    self.field,
                    self.declared,
                    value,
                    message,
                ));
            }
        }
    }
}
