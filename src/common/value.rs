use crate::common::element::Element;
use crate::common::instance::ObjectInstance;
use std::fmt::{Debug, Display, Formatter};

/// Compare two integers represented as i128 for equality.
/// This handles cross-type comparison by converting to a common type.
#[inline]
fn num_eq_int(a: i128, b: i128) -> bool {
    a == b
}

/// Compare two floats for equality with proper NaN handling.
#[inline]
fn num_eq_float(a: f64, b: f64) -> bool {
    if a.is_nan() && b.is_nan() {
        true
    } else {
        a == b
    }
}

/// Represents a dynamically typed value carried by an [Element].
///
/// # Purpose
/// Provides a unified representation for every value that can travel between a
/// domain object and a communication entity. Supports native Rust scalars,
/// nested element lists (sub-entities), domain-side object graphs, and deferred
/// query parameters.
///
/// # Variants
/// - `Null`: absence of a value
/// - `Bool`, `I8`-`U64`, `F32`/`F64`, `Char`, `String`, `Bytes`: scalar values
/// - `Array(Vec<Value>)`: ordered collection of values; an embedded collection
///   travels as an `Array` of `Elements` entries
/// - `Elements(Vec<Element>)`: a nested element list (the wire form of a
///   sub-entity wrapped under a single element)
/// - `Object(ObjectInstance)`: a domain-side nested object, consumed by the
///   entity converter before it reaches the wire
/// - `Parameter(String)`: a named placeholder awaiting binding in a prepared
///   query
///
/// # Characteristics
/// - **Comparable**: numeric equality coerces across integer widths and across
///   float widths; `NaN == NaN` holds so equality stays reflexive
/// - **Immutable**: once constructed a value is never mutated in place
/// - **Default**: defaults to `Null`
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// Represents a null value.
    #[default]
    Null,
    /// Represents a boolean value.
    Bool(bool),
    /// Represents a signed 8-bit integer value.
    I8(i8),
    /// Represents a signed 16-bit integer value.
    I16(i16),
    /// Represents a signed 32-bit integer value.
    I32(i32),
    /// Represents a signed 64-bit integer value.
    I64(i64),
    /// Represents an unsigned 8-bit integer value.
    U8(u8),
    /// Represents an unsigned 16-bit integer value.
    U16(u16),
    /// Represents an unsigned 32-bit integer value.
    U32(u32),
    /// Represents an unsigned 64-bit integer value.
    U64(u64),
    /// Represents a 32-bit floating point value.
    F32(f32),
    /// Represents a 64-bit floating point value.
    F64(f64),
    /// Represents a character value.
    Char(char),
    /// Represents a string value.
    String(String),
    /// Represents a byte array value. It cannot be filtered on.
    Bytes(Vec<u8>),
    /// Represents an ordered collection of values.
    Array(Vec<Value>),
    /// Represents a nested element list, the wire form of a sub-entity.
    Elements(Vec<Element>),
    /// Represents a domain-side nested object graph.
    Object(ObjectInstance),
    /// Represents a named query parameter placeholder awaiting binding.
    Parameter(String),
}

impl Value {
    /// Checks whether this value is `Null`.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Checks whether this value is any integer variant.
    #[inline]
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Value::I8(_)
                | Value::I16(_)
                | Value::I32(_)
                | Value::I64(_)
                | Value::U8(_)
                | Value::U16(_)
                | Value::U32(_)
                | Value::U64(_)
        )
    }

    /// Returns the integer content widened to `i128`, if this is an integer.
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Value::I8(v) => Some(*v as i128),
            Value::I16(v) => Some(*v as i128),
            Value::I32(v) => Some(*v as i128),
            Value::I64(v) => Some(*v as i128),
            Value::U8(v) => Some(*v as i128),
            Value::U16(v) => Some(*v as i128),
            Value::U32(v) => Some(*v as i128),
            Value::U64(v) => Some(*v as i128),
            _ => None,
        }
    }

    /// Checks whether this value is a floating point variant.
    #[inline]
    pub fn is_decimal(&self) -> bool {
        matches!(self, Value::F32(_) | Value::F64(_))
    }

    /// Returns the decimal content widened to `f64`, if this is a float.
    pub fn as_decimal(&self) -> Option<f64> {
        match self {
            Value::F32(v) => Some(*v as f64),
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the boolean content, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string content, if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the array content, if this is an `Array`.
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the nested element list, if this is an `Elements` value.
    pub fn as_elements(&self) -> Option<&Vec<Element>> {
        match self {
            Value::Elements(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the element groups of an embedded collection, if this value is
    /// an `Array` whose entries are all `Elements`.
    ///
    /// # Returns
    ///
    /// `Some(groups)` where each group is one converted embeddable item, or
    /// `None` if the value has a different shape.
    pub fn as_element_groups(&self) -> Option<Vec<&[Element]>> {
        match self {
            Value::Array(items) => {
                let mut groups = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::Elements(elements) => groups.push(elements.as_slice()),
                        _ => return None,
                    }
                }
                Some(groups)
            }
            _ => None,
        }
    }

    /// Returns the nested object graph, if this is an `Object` value.
    pub fn as_object(&self) -> Option<&ObjectInstance> {
        match self {
            Value::Object(v) => Some(v),
            _ => None,
        }
    }

    /// Checks whether this value is a deferred query parameter.
    #[inline]
    pub fn is_parameter(&self) -> bool {
        matches!(self, Value::Parameter(_))
    }

    /// Returns the parameter name, if this is a `Parameter` placeholder.
    pub fn parameter_name(&self) -> Option<&str> {
        match self {
            Value::Parameter(name) => Some(name),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        if self.is_integer() && other.is_integer() {
            if let (Some(a), Some(b)) = (self.as_integer(), other.as_integer()) {
                return num_eq_int(a, b);
            }
        }

        if self.is_decimal() && other.is_decimal() {
            if let (Some(a), Some(b)) = (self.as_decimal(), other.as_decimal()) {
                return num_eq_float(a, b);
            }
        }

        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => *a == *b,
            (Value::Char(a), Value::Char(b)) => *a == *b,
            (Value::String(a), Value::String(b)) => *a == *b,
            (Value::Bytes(a), Value::Bytes(b)) => *a == *b,
            (Value::Array(a), Value::Array(b)) => *a == *b,
            (Value::Elements(a), Value::Elements(b)) => *a == *b,
            (Value::Object(a), Value::Object(b)) => *a == *b,
            (Value::Parameter(a), Value::Parameter(b)) => *a == *b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::I8(v) => write!(f, "{}", v),
            Value::I16(v) => write!(f, "{}", v),
            Value::I32(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::U8(v) => write!(f, "{}", v),
            Value::U16(v) => write!(f, "{}", v),
            Value::U32(v) => write!(f, "{}", v),
            Value::U64(v) => write!(f, "{}", v),
            Value::F32(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{}", v),
            Value::Char(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{}", v),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Elements(elements) => {
                write!(f, "{{")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", element.name(), element.value())?;
                }
                write!(f, "}}")
            }
            Value::Object(instance) => write!(f, "{}", instance),
            Value::Parameter(name) => write!(f, "@{}", name),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i8> for Value {
    fn from(value: i8) -> Self {
        Value::I8(value)
    }
}

impl From<i16> for Value {
    fn from(value: i16) -> Self {
        Value::I16(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::I32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::I64(value)
    }
}

impl From<u8> for Value {
    fn from(value: u8) -> Self {
        Value::U8(value)
    }
}

impl From<u16> for Value {
    fn from(value: u16) -> Self {
        Value::U16(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::U32(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::U64(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::F32(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::F64(value)
    }
}

impl From<char> for Value {
    fn from(value: char) -> Self {
        Value::Char(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<Vec<Element>> for Value {
    fn from(value: Vec<Element>) -> Self {
        Value::Elements(value)
    }
}

impl From<ObjectInstance> for Value {
    fn from(value: ObjectInstance) -> Self {
        Value::Object(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}
