//! Configuration options for record validation behavior

use crate::strict::StrictMode;

// ============================================================================
// Extra Field Handling
// ============================================================================

/// How to handle keys that name no declared field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtraFields {
    /// Reject the whole operation (default)
    #[default]
    Forbid,
    /// Skip unknown keys
    Ignore,
}

// ============================================================================
// Record Config
// ============================================================================

/// Configuration options for record validation behavior
#[derive(Debug, Clone)]
pub struct RecordConfig {
    /// Strict mode configuration
    pub strict: StrictMode,

    /// How to handle unknown keys on construction and update
    pub extra: ExtraFields,

    /// Run registered field validators after the type check
    pub run_field_validators: bool,

    /// Re-validate after a partial update (only when strict)
    pub validate_on_update: bool,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            strict: StrictMode::default(),
            extra: ExtraFields::default(),
            run_field_validators: true,
            validate_on_update: true,
        }
    }
}

impl RecordConfig {
    /// Create a new record config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set strict mode
    pub fn strict(mut self, strict: StrictMode) -> Self {
        self.strict = strict;
        self
    }

    /// Enable strict mode
    pub fn strict_mode(mut self) -> Self {
        self.strict = StrictMode::Strict;
        self
    }

    /// Enable lenient mode
    pub fn lenient_mode(mut self) -> Self {
        self.strict = StrictMode::Lenient;
        self
    }

    /// Set extra field handling
    pub fn extra(mut self, extra: ExtraFields) -> Self {
        self.extra = extra;
        self
    }

    /// Skip unknown keys instead of failing
    pub fn ignore_extra(mut self) -> Self {
        self.extra = ExtraFields::Ignore;
        self
    }

    /// Enable or disable registered field validators
    pub fn run_field_validators(mut self, run: bool) -> Self {
        self.run_field_validators = run;
        self
    }

    /// Enable or disable re-validation after partial updates
    pub fn validate_on_update(mut self, validate: bool) -> Self {
        self.validate_on_update = validate;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
