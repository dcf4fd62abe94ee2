use crate::common::value::Value;
use crate::errors::EntimapResult;
use indexmap::IndexMap;
use std::fmt::{Display, Formatter};

/// A runtime representation of one domain object instance.
///
/// `ObjectInstance` stands in for reflection: it carries the object's type
/// name and an ordered map of field name to [Value]. Nested objects appear as
/// [Value::Object] entries and collections of embeddables as [Value::Array]
/// entries of objects. The entity converter walks this structure guided by
/// entity metadata; it never inspects concrete Rust types.
///
/// Field order is preserved (insertion order), which keeps element output in
/// metadata declaration order when instances are produced by [MappedEntity]
/// implementations.
///
/// # Examples
///
/// ```rust,ignore
/// use entimap::{ObjectInstance, Value};
///
/// let person = ObjectInstance::new("Person")
///     .with_field("id", 1i64)
///     .with_field("name", "Ada");
/// assert_eq!(person.get("name"), Some(&Value::String("Ada".to_string())));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectInstance {
    type_name: String,
    fields: IndexMap<String, Value>,
}

impl ObjectInstance {
    /// Creates a new, empty instance of the given type.
    ///
    /// # Arguments
    ///
    /// * `type_name` - The domain type name, used for metadata lookup
    pub fn new(type_name: &str) -> Self {
        ObjectInstance {
            type_name: type_name.to_string(),
            fields: IndexMap::new(),
        }
    }

    /// Adds a field value and returns the instance, for fluent construction.
    ///
    /// # Arguments
    ///
    /// * `name` - The field name
    /// * `value` - The field value
    pub fn with_field<T: Into<Value>>(mut self, name: &str, value: T) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// Sets a field value, replacing any previous value for the name.
    pub fn set<T: Into<Value>>(&mut self, name: &str, value: T) {
        self.fields.insert(name.to_string(), value.into());
    }

    /// Returns the value of a field, or `None` if the field is absent.
    ///
    /// Absence is distinct from a present `Null`: a merge leaves absent
    /// fields untouched but resets fields carrying an explicit `Null`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Checks whether the instance carries a value (including `Null`) for the
    /// field.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Returns the domain type name of this instance.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Iterates over the fields in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Returns the number of fields present on this instance.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Checks whether the instance carries no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Display for ObjectInstance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{{", self.type_name)?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", name, value)?;
        }
        write!(f, "}}")
    }
}

/// Bridge between typed domain structs and the generic [ObjectInstance] form
/// the entity converter operates on.
///
/// Implementations are mechanical: `to_instance` reads every mapped field into
/// the instance, `from_instance` rebuilds the struct applying defaults for
/// absent fields. The associated `TYPE_NAME` must match the `type_name` used
/// when registering the entity metadata.
///
/// # Usage
///
/// ```rust,ignore
/// struct Person { id: i64, name: String }
///
/// impl MappedEntity for Person {
///     const TYPE_NAME: &'static str = "Person";
///
///     fn to_instance(&self) -> EntimapResult<ObjectInstance> {
///         Ok(ObjectInstance::new(Self::TYPE_NAME)
///             .with_field("id", self.id)
///             .with_field("name", self.name.as_str()))
///     }
///
///     fn from_instance(instance: &ObjectInstance) -> EntimapResult<Self> {
///         // read fields back, defaulting absent ones
///     }
/// }
/// ```
pub trait MappedEntity: Sized {
    /// The domain type name this struct maps to.
    const TYPE_NAME: &'static str;

    /// Converts the struct into its generic instance form.
    fn to_instance(&self) -> EntimapResult<ObjectInstance>;

    /// Rebuilds the struct from a generic instance.
    fn from_instance(instance: &ObjectInstance) -> EntimapResult<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_construction() {
        let instance = ObjectInstance::new("Person")
            .with_field("id", 1i64)
            .with_field("name", "Ada");

        assert_eq!(instance.type_name(), "Person");
        assert_eq!(instance.len(), 2);
        assert_eq!(instance.get("id"), Some(&Value::I64(1)));
        assert_eq!(instance.get("name"), Some(&Value::String("Ada".to_string())));
        assert_eq!(instance.get("missing"), None);
    }

    #[test]
    fn test_instance_set_replaces() {
        let mut instance = ObjectInstance::new("Person").with_field("name", "Ada");
        instance.set("name", "Grace");
        assert_eq!(
            instance.get("name"),
            Some(&Value::String("Grace".to_string()))
        );
        assert_eq!(instance.len(), 1);
    }

    #[test]
    fn test_instance_field_order_preserved() {
        let instance = ObjectInstance::new("Person")
            .with_field("id", 1i64)
            .with_field("name", "Ada")
            .with_field("age", 36i32);

        let names: Vec<&String> = instance.fields().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["id", "name", "age"]);
    }

    #[test]
    fn test_null_field_is_present() {
        let instance = ObjectInstance::new("Person").with_field("name", Value::Null);
        assert!(instance.contains("name"));
        assert_eq!(instance.get("name"), Some(&Value::Null));
        assert!(!instance.contains("age"));
    }

    #[test]
    fn test_instance_display() {
        let instance = ObjectInstance::new("Person").with_field("name", "Ada");
        assert_eq!(format!("{}", instance), "Person{name: Ada}");
    }
}
