use crate::common::value::Value;
use std::fmt::{Display, Formatter};

/// Represents a single name/value pair inside a communication entity.
///
/// An `Element` is the atomic unit of the storage representation: a
/// communication entity is a named list of elements. The value is a
/// dynamically typed [Value] which may itself carry a nested element list
/// (sub-entity) or an array of element lists (embedded collection).
///
/// Elements are immutable once constructed.
///
/// # Examples
///
/// ```rust,ignore
/// use entimap::{Element, Value};
///
/// let element = Element::new("name", "Ada");
/// assert_eq!(element.name(), "name");
/// assert_eq!(element.value(), &Value::String("Ada".to_string()));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Element {
    name: String,
    value: Value,
}

impl Element {
    /// Creates a new element from a name and any value convertible to [Value].
    ///
    /// # Arguments
    ///
    /// * `name` - The element name
    /// * `value` - The element value
    pub fn new<T: Into<Value>>(name: &str, value: T) -> Self {
        Element {
            name: name.to_string(),
            value: value.into(),
        }
    }

    /// Returns the element name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the element value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Consumes the element and returns its value.
    pub fn into_value(self) -> Value {
        self.value
    }
}

impl Display for Element {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}
