//! Core type system for validation
//!
//! This module defines the runtime values that get validated, the declared
//! type expressions they are validated against, and the flattened kind sets
//! the engine uses for membership tests.

use crate::constraints::Constraint;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Value Enum - Runtime values to be validated
// ============================================================================

/// Runtime value that can be validated
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (i64)
    Int(i64),
    /// Float value (f64)
    Float(f64),
    /// String value
    String(String),
    /// Binary data
    Bytes(Vec<u8>),
    /// Ordered, growable sequence
    List(Vec<Value>),
    /// Unordered collection of distinct values (kept in insertion order)
    Set(Vec<Value>),
    /// Fixed sequence
    Tuple(Vec<Value>),
    /// Key/value pairs with arbitrary keys
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Build a string value
    pub fn string(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }

    /// Build a set value, dropping duplicates while keeping first occurrence order
    pub fn set(items: impl IntoIterator<Item = Value>) -> Self {
        let mut distinct: Vec<Value> = Vec::new();
        for item in items {
            if !distinct.contains(&item) {
                distinct.push(item);
            }
        }
        Self::Set(distinct)
    }

    /// Runtime kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::String(_) => ValueKind::String,
            Self::Bytes(_) => ValueKind::Bytes,
            Self::List(_) => ValueKind::List,
            Self::Set(_) => ValueKind::Set,
            Self::Tuple(_) => ValueKind::Tuple,
            Self::Map(_) => ValueKind::Map,
        }
    }

    /// Get human-readable type name for error messages
    pub fn type_name(&self) -> &'static str {
        self.kind().name()
    }

    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Size of a sized value (characters for strings), `None` for scalars
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::String(s) => Some(s.chars().count()),
            Self::Bytes(b) => Some(b.len()),
            Self::List(items) | Self::Set(items) | Self::Tuple(items) => Some(items.len()),
            Self::Map(entries) => Some(entries.len()),
            Self::Null | Self::Bool(_) | Self::Int(_) | Self::Float(_) => None,
        }
    }

    /// Elements of a list, set or tuple
    pub fn elements(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) | Self::Set(items) | Self::Tuple(items) => Some(items),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}

/// Top-level strings render bare; everything nested renders quoted.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            other => write!(f, "{}", Repr(other)),
        }
    }
}

/// Quoted rendering used for values nested inside collections
struct Repr<'a>(&'a Value);

impl fmt::Display for Repr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => f.write_str(&format_float(*x)),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Bytes(bytes) => {
                f.write_str("b\"")?;
                for b in bytes {
                    write!(f, "{}", std::ascii::escape_default(*b))?;
                }
                f.write_str("\"")
            }
            Value::List(items) => {
                f.write_str("[")?;
                write_joined(f, items)?;
                f.write_str("]")
            }
            Value::Set(items) if items.is_empty() => f.write_str("set()"),
            Value::Set(items) => {
                f.write_str("{")?;
                write_joined(f, items)?;
                f.write_str("}")
            }
            Value::Tuple(items) => {
                f.write_str("(")?;
                write_joined(f, items)?;
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", Repr(k), Repr(v))?;
                }
                f.write_str("}")
            }
        }
    }
}

pub(crate) fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", Repr(item))?;
    }
    Ok(())
}

/// Floats always carry a fractional digit so `1.0` never reads as an integer.
pub(crate) fn format_float(x: f64) -> String {
    if !x.is_finite() || x.fract() != 0.0 {
        x.to_string()
    } else if x.abs() < 1e16 {
        format!("{:.1}", x)
    } else {
        // `1e16`, not `10000000000000000`
        format!("{:e}", x)
    }
}

// ============================================================================
// Kinds
// ============================================================================

/// Runtime kind of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    String,
    Bytes,
    List,
    Set,
    Tuple,
    Map,
}

impl ValueKind {
    /// Human-readable kind name
    pub fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "boolean",
            Self::Int => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::List => "list",
            Self::Set => "set",
            Self::Tuple => "tuple",
            Self::Map => "mapping",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.name())
    }
}

/// Scalar kinds a field can be declared as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    String,
    Bool,
    Bytes,
    Int,
    Float,
}

impl PrimitiveKind {
    pub fn kind(self) -> ValueKind {
        match self {
            Self::String => ValueKind::String,
            Self::Bool => ValueKind::Bool,
            Self::Bytes => ValueKind::Bytes,
            Self::Int => ValueKind::Int,
            Self::Float => ValueKind::Float,
        }
    }
}

/// Growable collection kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    List,
    Set,
}

impl ContainerKind {
    pub fn kind(self) -> ValueKind {
        match self {
            Self::List => ValueKind::List,
            Self::Set => ValueKind::Set,
        }
    }
}

// ============================================================================
// TypeExpr - Declared type expressions
// ============================================================================

/// Element layout of a parameterized tuple
#[derive(Debug, Clone)]
pub enum TupleArity {
    /// One expression per position
    Fixed(Vec<TypeExpr>),
    /// Any number of elements sharing one expression
    Variadic(Box<TypeExpr>),
}

/// Declared type of a field
///
/// Built once when a record schema is defined and shared read-only by every
/// validation afterwards. Constraints are held behind `Arc` so cloning a
/// schema never copies them.
#[derive(Debug, Clone)]
pub enum TypeExpr {
    /// Scalar type, matched by exact kind
    Primitive(PrimitiveKind),

    /// The null marker (only meaningful as a union member)
    Null,

    /// Any value (no validation)
    Any,

    /// Value must match at least one member
    Union(Vec<TypeExpr>),

    /// List or set, optionally with allowed element types
    Container {
        kind: ContainerKind,
        elements: Option<Vec<TypeExpr>>,
    },

    /// Tuple, optionally with per-position or uniform element types
    Tuple(Option<TupleArity>),

    /// Mapping, optionally with key and value types
    Mapping {
        key: Option<Box<TypeExpr>>,
        value: Option<Box<TypeExpr>>,
    },

    /// Base type plus semantic constraints, evaluated in order
    Annotated {
        base: Box<TypeExpr>,
        constraints: Vec<Arc<dyn Constraint>>,
    },

    /// Behaves as the wrapped type
    Final(Box<TypeExpr>),

    /// A declared type the engine has no rule for; checked like `Any`
    Unsupported(String),
}

impl TypeExpr {
    pub fn string() -> Self {
        Self::Primitive(PrimitiveKind::String)
    }

    pub fn integer() -> Self {
        Self::Primitive(PrimitiveKind::Int)
    }

    pub fn float() -> Self {
        Self::Primitive(PrimitiveKind::Float)
    }

    pub fn boolean() -> Self {
        Self::Primitive(PrimitiveKind::Bool)
    }

    pub fn bytes() -> Self {
        Self::Primitive(PrimitiveKind::Bytes)
    }

    /// Union of the given members.
    ///
    /// Nested unions are spliced into the outer one, duplicate plain kinds
    /// are dropped, and a single remaining member is returned unwrapped.
    pub fn union(members: impl IntoIterator<Item = TypeExpr>) -> Self {
        let mut flat: Vec<TypeExpr> = Vec::new();
        for member in members {
            match member {
                Self::Union(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }

        let mut distinct: Vec<TypeExpr> = Vec::with_capacity(flat.len());
        for member in flat {
            let duplicate = member
                .plain_kind()
                .is_some_and(|kind| distinct.iter().any(|seen| seen.plain_kind() == Some(kind)));
            if !duplicate {
                distinct.push(member);
            }
        }

        if distinct.len() == 1 {
            distinct.remove(0)
        } else {
            Self::Union(distinct)
        }
    }

    /// `inner` or null
    pub fn optional(inner: TypeExpr) -> Self {
        Self::union([inner, Self::Null])
    }

    /// List of any elements
    pub fn list() -> Self {
        Self::Container { kind: ContainerKind::List, elements: None }
    }

    /// List whose elements must match one of `elements`
    pub fn list_of(elements: impl IntoIterator<Item = TypeExpr>) -> Self {
        Self::Container { kind: ContainerKind::List, elements: Some(elements.into_iter().collect()) }
    }

    /// Set of any elements
    pub fn set() -> Self {
        Self::Container { kind: ContainerKind::Set, elements: None }
    }

    /// Set whose elements must match one of `elements`
    pub fn set_of(elements: impl IntoIterator<Item = TypeExpr>) -> Self {
        Self::Container { kind: ContainerKind::Set, elements: Some(elements.into_iter().collect()) }
    }

    /// Tuple of any shape
    pub fn tuple() -> Self {
        Self::Tuple(None)
    }

    /// Tuple with one expression per position
    pub fn tuple_of(positions: impl IntoIterator<Item = TypeExpr>) -> Self {
        Self::Tuple(Some(TupleArity::Fixed(positions.into_iter().collect())))
    }

    /// Tuple of any length whose elements all match `element`
    pub fn variadic_tuple(element: TypeExpr) -> Self {
        Self::Tuple(Some(TupleArity::Variadic(Box::new(element))))
    }

    /// Mapping with unchecked keys and values
    pub fn mapping() -> Self {
        Self::Mapping { key: None, value: None }
    }

    /// Mapping with typed keys and values
    pub fn mapping_of(key: TypeExpr, value: TypeExpr) -> Self {
        Self::Mapping { key: Some(Box::new(key)), value: Some(Box::new(value)) }
    }

    pub fn final_of(inner: TypeExpr) -> Self {
        Self::Final(Box::new(inner))
    }

    /// Attach a constraint, wrapping `self` in `Annotated` on first use
    ///
    /// ```
    /// use fieldguard::TypeExpr;
    /// use fieldguard::constraints::{NotEmpty, LimitedLength};
    ///
    /// let name = TypeExpr::string()
    ///     .with(NotEmpty)
    ///     .with(LimitedLength::new(10).unwrap());
    /// assert_eq!(name.to_string(), "Annotated[string, NotEmpty(), LimitedLength(length=10)]");
    /// ```
    pub fn with(self, constraint: impl Constraint + 'static) -> Self {
        match self {
            Self::Annotated { base, mut constraints } => {
                constraints.push(Arc::new(constraint));
                Self::Annotated { base, constraints }
            }
            base => Self::Annotated { base: Box::new(base), constraints: vec![Arc::new(constraint)] },
        }
    }

    /// Short tag naming the variant, for logs
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Primitive(_) => "primitive",
            Self::Null => "null",
            Self::Any => "any",
            Self::Union(_) => "union",
            Self::Container { .. } => "container",
            Self::Tuple(_) => "tuple",
            Self::Mapping { .. } => "mapping",
            Self::Annotated { .. } => "annotated",
            Self::Final(_) => "final",
            Self::Unsupported(_) => "unsupported",
        }
    }

    /// Kind of an expression that carries no arguments
    fn plain_kind(&self) -> Option<ValueKind> {
        match self {
            Self::Primitive(kind) => Some(kind.kind()),
            Self::Null => Some(ValueKind::Null),
            Self::Container { kind, elements: None } => Some(kind.kind()),
            Self::Tuple(None) => Some(ValueKind::Tuple),
            Self::Mapping { key: None, value: None } => Some(ValueKind::Map),
            _ => None,
        }
    }

    /// Rendering used inside brackets (`string`, `integer | null`, ...)
    fn fmt_inline(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(kind) = self.plain_kind() {
            return f.write_str(kind.name());
        }
        match self {
            Self::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    member.fmt_inline(f)?;
                }
                Ok(())
            }
            other => other.fmt_generic(f),
        }
    }

    fn fmt_args(f: &mut fmt::Formatter<'_>, args: &[TypeExpr]) -> fmt::Result {
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            arg.fmt_inline(f)?;
        }
        Ok(())
    }

    fn fmt_generic(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("Any"),
            Self::Unsupported(name) => f.write_str(name),
            Self::Container { kind, elements: Some(elements) } => {
                write!(f, "{}[", kind.kind().name())?;
                Self::fmt_args(f, elements)?;
                f.write_str("]")
            }
            Self::Tuple(Some(TupleArity::Fixed(positions))) if positions.is_empty() => {
                f.write_str("tuple[()]")
            }
            Self::Tuple(Some(TupleArity::Fixed(positions))) => {
                f.write_str("tuple[")?;
                Self::fmt_args(f, positions)?;
                f.write_str("]")
            }
            Self::Tuple(Some(TupleArity::Variadic(element))) => {
                f.write_str("tuple[")?;
                element.fmt_inline(f)?;
                f.write_str(", ...]")
            }
            Self::Mapping { key, value } => {
                f.write_str("mapping[")?;
                match key {
                    Some(key) => key.fmt_inline(f)?,
                    None => f.write_str("Any")?,
                }
                f.write_str(", ")?;
                match value {
                    Some(value) => value.fmt_inline(f)?,
                    None => f.write_str("Any")?,
                }
                f.write_str("]")
            }
            Self::Annotated { base, constraints } => {
                f.write_str("Annotated[")?;
                base.fmt_inline(f)?;
                for constraint in constraints {
                    write!(f, ", {}", constraint)?;
                }
                f.write_str("]")
            }
            Self::Final(inner) => {
                f.write_str("Final[")?;
                inner.fmt_inline(f)?;
                f.write_str("]")
            }
            other => other.fmt_inline(f),
        }
    }
}

/// Plain kinds render as `<kind>`, a top-level union as the tuple of its
/// members, everything else in generic bracket form.
impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(kind) = self.plain_kind() {
            return write!(f, "{}", kind);
        }
        match self {
            Self::Union(members) => {
                f.write_str("(")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", member)?;
                }
                f.write_str(")")
            }
            other => other.fmt_generic(f),
        }
    }
}

// ============================================================================
// KindSet - Flattened type sets
// ============================================================================

/// Set of value kinds a value is tested against
///
/// Built from type expressions without recursing into nested structure:
/// only the outer kind of each member counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KindSet {
    kinds: Vec<ValueKind>,
    any: bool,
}

impl KindSet {
    /// Outer kinds of `expr`; unions contribute every member's outer kind.
    pub fn leaf(expr: &TypeExpr) -> Self {
        let mut set = Self::default();
        set.insert_leaf(expr);
        set
    }

    /// Flatten declared generic arguments one level.
    ///
    /// Each argument contributes the outer kinds of its own arguments when it
    /// has any (so `integer | string` yields `{integer, string}` and
    /// `list[integer]` yields `{integer}`), otherwise its own outer kind.
    pub fn flatten<'a>(args: impl IntoIterator<Item = &'a TypeExpr>) -> Self {
        let mut set = Self::default();
        for arg in args {
            match arg {
                TypeExpr::Union(members) => members.iter().for_each(|m| set.insert_leaf(m)),
                TypeExpr::Container { elements: Some(elements), .. } => {
                    elements.iter().for_each(|e| set.insert_leaf(e))
                }
                TypeExpr::Tuple(Some(TupleArity::Fixed(positions))) if !positions.is_empty() => {
                    positions.iter().for_each(|p| set.insert_leaf(p))
                }
                TypeExpr::Tuple(Some(TupleArity::Variadic(element))) => set.insert_leaf(element),
                TypeExpr::Mapping { key, value } if key.is_some() || value.is_some() => {
                    key.iter().chain(value.iter()).for_each(|side| set.insert_leaf(side))
                }
                other => set.insert_leaf(other),
            }
        }
        set
    }

    fn insert_leaf(&mut self, expr: &TypeExpr) {
        match expr {
            TypeExpr::Primitive(kind) => self.insert(kind.kind()),
            TypeExpr::Null => self.insert(ValueKind::Null),
            TypeExpr::Any | TypeExpr::Unsupported(_) => self.any = true,
            TypeExpr::Union(members) => members.iter().for_each(|m| self.insert_leaf(m)),
            TypeExpr::Container { kind, .. } => self.insert(kind.kind()),
            TypeExpr::Tuple(_) => self.insert(ValueKind::Tuple),
            TypeExpr::Mapping { .. } => self.insert(ValueKind::Map),
            TypeExpr::Annotated { base, .. } => self.insert_leaf(base),
            TypeExpr::Final(inner) => self.insert_leaf(inner),
        }
    }

    fn insert(&mut self, kind: ValueKind) {
        if !self.kinds.contains(&kind) {
            self.kinds.push(kind);
        }
    }

    /// Whether an `Any` (or unsupported) member made the set unconditional
    pub fn accepts_any(&self) -> bool {
        self.any
    }

    pub fn contains(&self, kind: ValueKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Whether `value` passes a membership test against this set
    pub fn admits(&self, value: &Value) -> bool {
        self.any || self.contains(value.kind())
    }

    /// Member kinds in insertion order
    pub fn kinds(&self) -> &[ValueKind] {
        &self.kinds
    }
}
