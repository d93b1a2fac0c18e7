//! Record schemas and validated records
//!
//! A [`RecordSchema`] is the ordered list of field declarations plus the
//! field validators registered for them. It is built once and shared behind
//! an `Arc`. A [`Record`] pairs a schema with current field values and
//! validates itself after construction and (in strict mode) after partial
//! updates.

use crate::config::{ExtraFields, RecordConfig};
use crate::custom_validators::{FieldValidator, ValidatorCollection, ValidatorContext};
use crate::errors::{ConfigError, RecordError, RecordResult, ValidationResult};
use crate::types::{TypeExpr, Value};
use crate::validators::TypeChecker;
use std::collections::HashSet;
use std::sync::Arc;

// ============================================================================
// Field Declaration
// ============================================================================

/// A named field and its declared type
#[derive(Debug, Clone)]
pub struct FieldDeclaration {
    name: String,
    type_expr: TypeExpr,
    default: Option<Value>,
}

impl FieldDeclaration {
    pub fn new(name: impl Into<String>, type_expr: TypeExpr) -> Self {
        Self {
            name: name.into(),
            type_expr,
            default: None,
        }
    }

    /// Value used when construction input omits the field
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_expr(&self) -> &TypeExpr {
        &self.type_expr
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

// ============================================================================
// Record Schema
// ============================================================================

/// Ordered field declarations of one record type
#[derive(Debug, Clone)]
pub struct RecordSchema {
    name: String,
    fields: Vec<FieldDeclaration>,
    validators: ValidatorCollection,
    checker: TypeChecker,
}

impl RecordSchema {
    /// Start defining a schema
    ///
    /// ```
    /// use fieldguard::{RecordSchema, TypeExpr};
    /// use fieldguard::constraints::ValueRange;
    ///
    /// let schema = RecordSchema::builder("Point")
    ///     .field("x", TypeExpr::integer().with(ValueRange::new(-10, 10).unwrap()))
    ///     .parse_field("label", "str | None")
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(schema.len(), 2);
    /// ```
    pub fn builder(name: impl Into<String>) -> RecordSchemaBuilder {
        RecordSchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
            validators: ValidatorCollection::new(),
            error: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declarations in declaration order
    pub fn fields(&self) -> &[FieldDeclaration] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDeclaration> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn validators(&self) -> &ValidatorCollection {
        &self.validators
    }

    /// Type-check `values`, given in declaration order.
    ///
    /// `values` must hold exactly one value per declared field.
    pub fn check_types(&self, values: &[Value]) -> RecordResult<ValidationResult> {
        self.ensure_complete(values)?;
        Ok(self.type_check(values))
    }

    /// Type-check `values`, then run field validators for every field that
    /// passed its own type check.
    ///
    /// `values` must hold exactly one value per declared field.
    pub fn validate(
        &self,
        values: &[Value],
        run_field_validators: bool,
    ) -> RecordResult<ValidationResult> {
        self.ensure_complete(values)?;
        Ok(self.run_validation(values, run_field_validators))
    }

    fn ensure_complete(&self, values: &[Value]) -> RecordResult<()> {
        if let Some(missing) = self.fields.get(values.len()) {
            return Err(RecordError::MissingField(missing.name.clone()));
        }
        if values.len() > self.fields.len() {
            return Err(RecordError::ValueCount {
                expected: self.fields.len(),
                actual: values.len(),
            });
        }
        Ok(())
    }

    fn type_check(&self, values: &[Value]) -> ValidationResult {
        self.checker.check_record(
            self.fields
                .iter()
                .zip(values)
                .map(|(decl, value)| (decl.name.as_str(), &decl.type_expr, value)),
        )
    }

    fn run_validation(&self, values: &[Value], run_field_validators: bool) -> ValidationResult {
        let result = self.type_check(values);
        if !run_field_validators || self.validators.is_empty() {
            return result;
        }

        let mut errors = result.errors;
        let failed: Vec<bool> = self.fields.iter().map(|decl| errors.has_field(&decl.name)).collect();
        let mut context = ValidatorContext::new(
            self.fields
                .iter()
                .zip(values)
                .map(|(decl, value)| (decl.name.as_str(), value)),
        );

        for ((decl, value), failed) in self.fields.iter().zip(values).zip(failed) {
            if failed {
                continue;
            }
            self.validators.run_field_validators(
                &decl.name,
                &decl.type_expr,
                value,
                &mut context,
                &mut errors,
            );
        }

        ValidationResult::from(errors)
    }
}

/// Builder for [`RecordSchema`]; errors surface from [`build`](Self::build)
pub struct RecordSchemaBuilder {
    name: String,
    fields: Vec<FieldDeclaration>,
    validators: ValidatorCollection,
    error: Option<ConfigError>,
}

impl RecordSchemaBuilder {
    /// Declare a field
    pub fn field(mut self, name: impl Into<String>, type_expr: TypeExpr) -> Self {
        self.fields.push(FieldDeclaration::new(name, type_expr));
        self
    }

    /// Declare a field with a default value
    pub fn field_with_default(
        mut self,
        name: impl Into<String>,
        type_expr: TypeExpr,
        default: impl Into<Value>,
    ) -> Self {
        self.fields
            .push(FieldDeclaration::new(name, type_expr).with_default(default));
        self
    }

    /// Declare a field from annotation text, see [`TypeExpr::parse`]
    pub fn parse_field(mut self, name: impl Into<String>, annotation: &str) -> Self {
        match TypeExpr::parse(annotation) {
            Ok(type_expr) => self.fields.push(FieldDeclaration::new(name, type_expr)),
            Err(e) => {
                self.error.get_or_insert(e);
            }
        }
        self
    }

    /// Register a field validator
    pub fn validator(mut self, validator: impl FieldValidator + 'static) -> Self {
        self.validators.add_field_validator(validator);
        self
    }

    pub fn build(self) -> Result<RecordSchema, ConfigError> {
        if let Some(e) = self.error {
            return Err(e);
        }

        {
            let mut seen = HashSet::new();
            for decl in &self.fields {
                if !seen.insert(decl.name.as_str()) {
                    return Err(ConfigError::DuplicateField(decl.name.clone()));
                }
            }

            if let Some(unknown) = self.validators.field_names().find(|name| !seen.contains(name)) {
                return Err(ConfigError::UnknownValidatorField(unknown.to_string()));
            }
        }

        tracing::debug!(schema = %self.name, fields = self.fields.len(), "record schema built");
        Ok(RecordSchema {
            name: self.name,
            fields: self.fields,
            validators: self.validators,
            checker: TypeChecker::new(),
        })
    }
}

// ============================================================================
// Record
// ============================================================================

/// Field values bound to a schema
#[derive(Debug, Clone)]
pub struct Record {
    schema: Arc<RecordSchema>,
    config: RecordConfig,
    values: Vec<Value>,
}

impl Record {
    /// Bind values to `schema` and validate the result.
    ///
    /// Omitted fields take their declared default. In strict mode a failed
    /// validation is returned as [`RecordError::Validation`]; in lenient mode
    /// it is logged and the record is returned anyway.
    pub fn new<I, K>(schema: Arc<RecordSchema>, config: RecordConfig, values: I) -> RecordResult<Self>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let mut slots: Vec<Option<Value>> = vec![None; schema.len()];
        for (key, value) in values {
            match schema.index_of(key.as_ref()) {
                Some(index) => slots[index] = Some(value),
                None => reject_extra(config.extra, schema.name(), key.as_ref())?,
            }
        }

        let values = schema
            .fields()
            .iter()
            .zip(slots)
            .map(|(decl, slot)| {
                slot.or_else(|| decl.default().cloned())
                    .ok_or_else(|| RecordError::MissingField(decl.name().to_string()))
            })
            .collect::<RecordResult<Vec<_>>>()?;

        let record = Self {
            schema,
            config,
            values,
        };
        record.enforce()?;
        Ok(record)
    }

    pub fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    pub fn config(&self) -> &RecordConfig {
        &self.config
    }

    /// Values in declaration order
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schema.index_of(name).map(|i| &self.values[i])
    }

    /// Replace one field value without validating
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> RecordResult<()> {
        let index = self
            .schema
            .index_of(name)
            .ok_or_else(|| RecordError::UnknownField(name.to_string()))?;
        self.values[index] = value.into();
        Ok(())
    }

    /// Type check plus field validators (when enabled)
    pub fn validate(&self) -> ValidationResult {
        // `values` always holds one entry per declared field
        self.schema
            .run_validation(&self.values, self.config.run_field_validators)
    }

    /// Type check only
    pub fn check_types(&self) -> ValidationResult {
        self.schema.type_check(&self.values)
    }

    /// Set several fields from key/value pairs.
    ///
    /// Unknown keys are checked before anything is written. In strict mode
    /// with `validate_on_update` the whole record is re-validated afterwards;
    /// the new values stay in place even if that validation fails.
    pub fn update_from<I, K>(&mut self, pairs: I) -> RecordResult<()>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let mut updates = Vec::new();
        for (key, value) in pairs {
            match self.schema.index_of(key.as_ref()) {
                Some(index) => updates.push((index, value)),
                None => reject_extra(self.config.extra, self.schema.name(), key.as_ref())?,
            }
        }

        for (index, value) in updates {
            self.values[index] = value;
        }

        if self.config.strict.is_strict() && self.config.validate_on_update {
            self.enforce()?;
        }
        Ok(())
    }

    /// [`update_from`](Self::update_from) with a JSON object as the source
    #[cfg(feature = "serde")]
    pub fn update_from_json(
        &mut self,
        object: &serde_json::Map<String, serde_json::Value>,
    ) -> RecordResult<()> {
        self.update_from(
            object
                .iter()
                .map(|(key, value)| (key.as_str(), Value::from(value.clone()))),
        )
    }

    /// Key/value view: a map from field name to value, in declaration order
    pub fn as_map(&self) -> Value {
        Value::Map(
            self.schema
                .fields()
                .iter()
                .zip(&self.values)
                .map(|(decl, value)| (Value::string(decl.name()), value.clone()))
                .collect(),
        )
    }

    /// Positional view: a tuple of values in declaration order
    pub fn as_tuple(&self) -> Value {
        Value::Tuple(self.values.clone())
    }

    fn enforce(&self) -> RecordResult<()> {
        self.config.strict.enforce(self.schema.name(), self.validate())
    }
}

fn reject_extra(extra: ExtraFields, record: &str, key: &str) -> RecordResult<()> {
    match extra {
        ExtraFields::Forbid => Err(RecordError::UnknownField(key.to_string())),
        ExtraFields::Ignore => {
            tracing::debug!(record = record, key = key, "ignoring unknown field");
            Ok(())
        }
    }
}
