//! Fieldguard
//!
//! Declared-type and constraint validation for structured records.
//!
//! A value is checked against a [`TypeExpr`] (primitives, unions, lists,
//! sets, tuples, mappings, constrained and final types). Every mismatch is
//! collected as a [`ValidationError`] whose message names the field, the
//! expected type, the offending value and its runtime type. Records built
//! from a [`RecordSchema`] validate themselves after construction and can
//! either fail (strict) or log and carry on (lenient).
//!
//! # Features
//!
//! - **Default**: Core validation
//! - **serde**: `serde_json` conversions, serializable diagnostics and JSON
//!   record updates
//!
//! # Example
//!
//! ```rust
//! use fieldguard::{check_field, TypeExpr, Value};
//! use fieldguard::constraints::ValueRange;
//!
//! let age = TypeExpr::integer().with(ValueRange::new(0, 150).unwrap());
//!
//! assert!(check_field("age", &age, &Value::Int(42)).passed);
//!
//! let result = check_field("age", &age, &Value::Int(200));
//! assert_eq!(
//!     result.messages(),
//!     vec![concat!(
//!         r#"Expected that attr "age" would be of type "Annotated[integer, ValueRange(lo=0, hi=150)]". "#,
//!         r#"Value 200, of type "<integer>" was passed.Value "200" should met this condition: 0 <= <value> <= 150."#,
//!     )]
//! );
//! ```

// Public modules
pub mod config;
pub mod constraints;
pub mod custom_validators;
pub mod errors;
pub mod parse;
pub mod record;
pub mod strict;
pub mod types;
pub mod validators;

// serde_json bridge (feature-gated)
#[cfg(feature = "serde")]
pub mod json;

// Re-export commonly used types
pub use config::{ExtraFields, RecordConfig};
pub use constraints::{Constraint, LimitedLength, NotEmpty, Number, Options, ValueRange};
pub use custom_validators::{
    BoxedFieldValidator, FieldValidator, FnFieldValidator, ValidatorCollection, ValidatorContext,
};
pub use errors::{
    ConfigError, ErrorType, RecordError, RecordResult, ValidationError, ValidationErrors,
    ValidationResult,
};
pub use record::{FieldDeclaration, Record, RecordSchema, RecordSchemaBuilder};
pub use strict::StrictMode;
pub use types::{ContainerKind, KindSet, PrimitiveKind, TupleArity, TypeExpr, Value, ValueKind};
pub use validators::{check_field, check_record, TypeChecker};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
