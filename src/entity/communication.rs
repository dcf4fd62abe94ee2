use crate::common::{Element, Value};
use itertools::Itertools;
use std::fmt::Display;

/// The semistructured wire representation of one entity.
///
/// A communication entity pairs a logical entity name with an ordered list of
/// named elements. It is the value the converter produces on the way out and
/// consumes on the way in, and what a [crate::manager::DatabaseManager]
/// stores and returns.
///
/// The entity is immutable once built; duplicate element names are permitted
/// and [`find`] returns the first match.
///
/// [`find`]: CommunicationEntity::find
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CommunicationEntity {
    name: String,
    elements: Vec<Element>,
}

impl CommunicationEntity {
    /// Creates a communication entity from a name and its elements.
    pub fn new(name: &str, elements: Vec<Element>) -> Self {
        CommunicationEntity {
            name: name.to_string(),
            elements,
        }
    }

    /// Returns the logical entity name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the elements in insertion order.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Consumes the entity, returning its elements.
    pub fn into_elements(self) -> Vec<Element> {
        self.elements
    }

    /// Finds the first element with the given name.
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.elements.iter().find(|element| element.name() == name)
    }

    /// Returns the value of the first element with the given name, or `Null`
    /// when the element is absent.
    pub fn value_of(&self, name: &str) -> Value {
        match self.find(name) {
            Some(element) => element.value().clone(),
            None => Value::Null,
        }
    }

    /// Returns the number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Checks whether the entity has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl Display for CommunicationEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{{{}}}",
            self.name,
            self.elements.iter().map(|e| e.to_string()).join(", ")
        )
    }
}
