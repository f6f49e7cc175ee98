//! Runtime values.
//!
//! `Value` is the closed set of things a variable can hold. Scalars are
//! stored inline; strings, arrays, objects, resources and reference cells
//! are handles.
//!
//! # Factory Methods
//!
//! Build values through the factory methods (`Value::string`,
//! `Value::array`, ...) rather than assembling handles by hand; they apply
//! the interning and normalization rules the rest of the runtime relies on.
//!
//! # Coercion
//!
//! Every value converts to bool, integer, double, string and array key
//! following the language's weak-typing rules (`to_bool`, `to_long`,
//! `to_double`, `to_str`, `to_key`). Loose comparison lives in
//! [`crate::compare`].

use std::fmt;

use crate::array::{ArrayValue, ConstArray};
use crate::heap::ValueId;
use crate::intern::intern;
use crate::key::ArrayKey;
use crate::numeric::{format_double, Number, NumericKind};
use crate::object::{language_error, ObjectValue, ResourceValue};
use crate::string::StrValue;
use crate::var::Var;

/// A runtime value.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(StrValue),
    /// Mutable copy-on-write array.
    Array(ArrayValue),
    /// Frozen array; copying it yields a mutable array.
    ConstArray(ConstArray),
    Object(ObjectValue),
    Resource(ResourceValue),
    /// Reference to a shared cell. Never stored inside a `Var`.
    Reference(Var),
    /// `break N` control signal travelling up through loops.
    Break(u32),
    /// `continue N` control signal travelling up through loops.
    Continue(u32),
}

/// Discriminant of a [`Value`], with both array variants folded together.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Double,
    Str,
    Array,
    Object,
    Resource,
    Reference,
    Break,
    Continue,
}

// Factories
impl Value {
    /// Integer value.
    #[inline]
    pub fn int(n: i64) -> Self {
        Value::Int(n)
    }

    /// Floating-point value. NaN and infinities are kept as given.
    #[inline]
    pub fn double(d: f64) -> Self {
        Value::Double(d)
    }

    /// Boolean value.
    #[inline]
    pub fn bool(b: bool) -> Self {
        Value::Bool(b)
    }

    /// Fresh string value.
    pub fn string(s: impl AsRef<[u8]>) -> Self {
        Value::Str(StrValue::new(s))
    }

    /// Canonical (interned) string value.
    pub fn interned(s: impl AsRef<[u8]>) -> Self {
        Value::Str(intern(s))
    }

    /// Empty mutable array.
    pub fn array() -> Self {
        Value::Array(ArrayValue::new())
    }

    /// List array keyed `0, 1, 2, ...` in iteration order.
    ///
    /// ```
    /// use rill_value::Value;
    ///
    /// let list = Value::list([Value::Int(10), Value::Int(20)]);
    /// assert_eq!(list.to_str().to_string(), "Array");
    /// assert!(list.to_bool());
    /// ```
    pub fn list(values: impl IntoIterator<Item = Value>) -> Self {
        Value::Array(ArrayValue::from_values(values))
    }

    /// Array from key/value pairs in order; a repeated key keeps its first
    /// position and takes the last value.
    pub fn map(pairs: impl IntoIterator<Item = (ArrayKey, Value)>) -> Self {
        Value::Array(ArrayValue::from_pairs(pairs))
    }

    /// New instance of `class` with no properties.
    pub fn object(class: &str) -> Self {
        Value::Object(ObjectValue::new(class))
    }

    /// Fresh cell holding `value`, as a reference.
    pub fn reference(value: Value) -> Self {
        Value::Reference(Var::new(value))
    }
}

// Inspection
impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Double(_) => ValueKind::Double,
            Value::Str(_) => ValueKind::Str,
            Value::Array(_) | Value::ConstArray(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
            Value::Resource(_) => ValueKind::Resource,
            Value::Reference(_) => ValueKind::Reference,
            Value::Break(_) => ValueKind::Break,
            Value::Continue(_) => ValueKind::Continue,
        }
    }

    /// The language's name for this value's type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Double(_) => "double",
            Value::Str(_) => "string",
            Value::Array(_) | Value::ConstArray(_) => "array",
            Value::Object(_) => "object",
            Value::Resource(_) => "resource",
            Value::Reference(var) => var.get().type_name(),
            Value::Break(_) | Value::Continue(_) => "signal",
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_) | Value::ConstArray(_))
    }

    /// True for `break`/`continue` signals.
    #[inline]
    pub fn is_signal(&self) -> bool {
        matches!(self, Value::Break(_) | Value::Continue(_))
    }

    /// True if this is an exception object made by [`language_error`].
    pub fn is_exception(&self) -> bool {
        matches!(self, Value::Object(o) if o.is_instance_of(crate::object::EXCEPTION_CLASS))
    }

    /// Whole-value numeric classification, as used by `is_numeric`.
    pub fn numeric_kind(&self) -> NumericKind {
        match self {
            Value::Int(_) => NumericKind::Long,
            Value::Double(_) => NumericKind::Double,
            Value::Str(s) => s.numeric_kind(),
            Value::Reference(var) => var.get().numeric_kind(),
            _ => NumericKind::NotNumeric,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.numeric_kind().is_numeric()
    }

    /// Identity of a heap-backed value; `None` for inline scalars.
    ///
    /// Strings have an identity too, but equal strings need not share one
    /// unless both were interned.
    pub fn identity(&self) -> Option<ValueId> {
        match self {
            Value::Str(s) => Some(s.id()),
            Value::Array(a) => Some(a.id()),
            Value::ConstArray(c) => Some(c.id()),
            Value::Object(o) => Some(o.id()),
            Value::Resource(r) => Some(r.id()),
            Value::Reference(v) => Some(v.id()),
            Value::Null
            | Value::Bool(_)
            | Value::Int(_)
            | Value::Double(_)
            | Value::Break(_)
            | Value::Continue(_) => None,
        }
    }
}

// Conversions
impl Value {
    /// The value a reference points at; any other value as itself.
    pub fn to_value(&self) -> Value {
        match self {
            Value::Reference(var) => var.get(),
            other => other.clone(),
        }
    }

    /// Value-copy semantics for assignment.
    ///
    /// Arrays become new instances sharing storage until written (a frozen
    /// array becomes a mutable one); references are resolved and the target
    /// copied; everything else is returned as-is, handles included.
    pub fn copy(&self) -> Value {
        match self {
            Value::Array(a) => Value::Array(a.copy()),
            Value::ConstArray(c) => Value::Array(c.copy()),
            Value::Reference(var) => var.get().copy(),
            other => other.clone(),
        }
    }

    /// Frozen form: arrays (nested ones included) become `ConstArray`s and
    /// references are resolved.
    pub fn freeze(&self) -> Value {
        match self {
            Value::Array(a) => Value::ConstArray(a.freeze()),
            Value::Reference(var) => var.get().freeze(),
            other => other.clone(),
        }
    }

    pub fn to_bool(&self) -> bool {
        match self {
            Value::Null | Value::Break(_) | Value::Continue(_) => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Double(d) => *d != 0.0,
            Value::Str(s) => s.to_bool(),
            Value::Array(a) => !a.is_empty(),
            Value::ConstArray(c) => !c.is_empty(),
            Value::Object(_) | Value::Resource(_) => true,
            Value::Reference(var) => var.get().to_bool(),
        }
    }

    /// Integer conversion. Doubles truncate toward zero, saturating at the
    /// `i64` bounds, with NaN as 0.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "double to integer conversion truncates by definition"
    )]
    pub fn to_long(&self) -> i64 {
        match self {
            Value::Null | Value::Break(_) | Value::Continue(_) => 0,
            Value::Bool(b) => i64::from(*b),
            Value::Int(n) => *n,
            Value::Double(d) => *d as i64,
            Value::Str(s) => s.to_long(),
            Value::Array(a) => i64::from(!a.is_empty()),
            Value::ConstArray(c) => i64::from(!c.is_empty()),
            Value::Object(_) => 1,
            Value::Resource(r) => r.resource_id(),
            Value::Reference(var) => var.get().to_long(),
        }
    }

    #[expect(
        clippy::cast_precision_loss,
        reason = "integer to double promotion follows the language's arithmetic"
    )]
    pub fn to_double(&self) -> f64 {
        match self {
            Value::Double(d) => *d,
            Value::Int(n) => *n as f64,
            Value::Str(s) => s.to_double(),
            Value::Reference(var) => var.get().to_double(),
            other => other.to_long() as f64,
        }
    }

    /// Number for arithmetic and numeric comparison.
    pub(crate) fn to_number(&self) -> Number {
        match self {
            Value::Double(d) => Number::Double(*d),
            Value::Str(s) => s.to_number(),
            Value::Reference(var) => var.get().to_number(),
            other => Number::Long(other.to_long()),
        }
    }

    /// String conversion.
    pub fn to_str(&self) -> StrValue {
        match self {
            Value::Str(s) => s.clone(),
            Value::Null | Value::Bool(false) | Value::Break(_) | Value::Continue(_) => {
                intern(b"")
            }
            Value::Bool(true) => intern(b"1"),
            Value::Int(n) => StrValue::new(n.to_string()),
            Value::Double(d) => StrValue::new(format_double(*d)),
            Value::Array(_) | Value::ConstArray(_) => intern(b"Array"),
            Value::Object(o) => StrValue::new(o.class_name()),
            Value::Resource(r) => StrValue::new(r.to_string()),
            Value::Reference(var) => var.get().to_str(),
        }
    }

    /// Normalized array key.
    ///
    /// - integers key as themselves, doubles truncate, bools are 0/1
    /// - `null` and control signals key as `""`
    /// - strings key as integers only in canonical decimal spelling
    /// - objects and resources key by their instance id
    ///
    /// Arrays cannot be keys; the error is the language exception value.
    pub fn to_key(&self) -> Result<ArrayKey, Value> {
        match self {
            Value::Int(n) => Ok(ArrayKey::Int(*n)),
            Value::Bool(b) => Ok(ArrayKey::Int(i64::from(*b))),
            Value::Double(_) => Ok(ArrayKey::Int(self.to_long())),
            Value::Str(s) => Ok(ArrayKey::from_str_value(s)),
            Value::Null | Value::Break(_) | Value::Continue(_) => Ok(ArrayKey::Str(intern(b""))),
            Value::Object(o) => Ok(ArrayKey::Int(o.object_id())),
            Value::Resource(r) => Ok(ArrayKey::Int(r.resource_id())),
            Value::Array(_) | Value::ConstArray(_) => Err(language_error("Illegal offset type")),
            Value::Reference(var) => var.get().to_key(),
        }
    }
}

// Increment and decrement
impl Value {
    /// `++` on a copy of this value.
    pub fn add_one(&self) -> Value {
        self.increment(1)
    }

    /// `--` on a copy of this value.
    pub fn sub_one(&self) -> Value {
        self.increment(-1)
    }

    /// Value after adding `incr`, following the language's `++`/`--` rules.
    ///
    /// - integers promote to double on overflow
    /// - `null` plus a positive step is that step; a negative step leaves `null`
    /// - numeric strings step as numbers; `""` steps up to `"1"` and
    ///   otherwise behaves as 0
    /// - other strings take the alphanumeric increment for a step of 1 and
    ///   are unchanged otherwise
    /// - bools, arrays, objects, resources and signals are unchanged
    #[expect(
        clippy::cast_precision_loss,
        reason = "overflow promotes to double by definition"
    )]
    pub fn increment(&self, incr: i64) -> Value {
        match self {
            Value::Int(n) => match n.checked_add(incr) {
                Some(sum) => Value::Int(sum),
                None => Value::Double(*n as f64 + incr as f64),
            },
            Value::Double(d) => Value::Double(d + incr as f64),
            Value::Null if incr > 0 => Value::Int(incr),
            Value::Str(s) if s.is_empty() && incr != 1 => Value::Int(0).increment(incr),
            Value::Str(s) => match s.numeric_kind() {
                NumericKind::Long => Value::Int(s.to_long()).increment(incr),
                NumericKind::Double => Value::Double(s.to_double() + incr as f64),
                NumericKind::NotNumeric if incr == 1 => Value::Str(s.increment()),
                NumericKind::NotNumeric => self.clone(),
            },
            Value::Reference(var) => var.get().increment(incr),
            _ => self.clone(),
        }
    }
}

impl PartialEq for Value {
    /// Strict (`===`) equality: same type and same content. Arrays compare
    /// entries in order; objects and resources compare by instance.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Reference(a), b) => a.get() == *b,
            (a, Value::Reference(b)) => *a == b.get(),
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            #[allow(clippy::float_cmp, reason = "strict equality is exact by definition")]
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => ObjectValue::ptr_eq(a, b),
            (Value::Resource(a), Value::Resource(b)) => ResourceValue::ptr_eq(a, b),
            (Value::Break(a), Value::Break(b)) | (Value::Continue(a), Value::Continue(b)) => a == b,
            (a, b) if a.is_array() && b.is_array() => strict_array_eq(a, b),
            _ => false,
        }
    }
}

fn strict_array_eq(a: &Value, b: &Value) -> bool {
    let (Some(a), Some(b)) = (a.array_snapshot(), b.array_snapshot()) else {
        return false;
    };
    if std::sync::Arc::ptr_eq(&a, &b) {
        return true;
    }
    a.len() == b.len()
        && rill_stack::with_stack(|| {
            a.iter()
                .zip(b.iter())
                .all(|((ka, va), (kb, vb))| ka == kb && va == vb)
        })
}

impl Value {
    /// Storage of either array variant.
    pub(crate) fn array_snapshot(&self) -> Option<std::sync::Arc<crate::array::ArrayStorage>> {
        match self {
            Value::Array(a) => Some(a.snapshot()),
            Value::ConstArray(c) => Some(c.snapshot()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Double(d) => write!(f, "{}", format_double(*d)),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Array(a) => write!(f, "{a:?}"),
            Value::ConstArray(c) => write!(f, "{c:?}"),
            Value::Object(o) => write!(f, "{o:?}"),
            Value::Resource(r) => write!(f, "{r:?}"),
            Value::Reference(var) => write!(f, "{var:?}"),
            Value::Break(n) => write!(f, "break {n}"),
            Value::Continue(n) => write!(f, "continue {n}"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<StrValue> for Value {
    fn from(s: StrValue) -> Self {
        Value::Str(s)
    }
}

impl From<ArrayValue> for Value {
    fn from(a: ArrayValue) -> Self {
        Value::Array(a)
    }
}
