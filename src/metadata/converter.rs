use crate::common::Value;
use crate::errors::{EntimapError, EntimapResult, ErrorKind};
use std::collections::HashMap;
use std::sync::Arc;

/// Per-attribute value translation between the domain and the storage
/// representation.
///
/// A converter is registered under an id and referenced from
/// [crate::metadata::FieldMetadata]. It runs before a scalar value is wrapped
/// into an element (`to_storage`) and after an element value is extracted
/// during reconstruction (`from_storage`). Converters must be pure; the core
/// may apply them any number of times while building queries.
pub trait AttributeConverter: Send + Sync {
    /// Translates a domain value into its storage representation.
    fn to_storage(&self, value: Value) -> EntimapResult<Value>;

    /// Translates a storage value back into its domain representation.
    fn from_storage(&self, value: Value) -> EntimapResult<Value>;
}

/// Registry of attribute converters keyed by id.
///
/// Explicitly constructed and shared by reference or `Arc`; there is no
/// process-wide converter table.
#[derive(Clone, Default)]
pub struct ConverterRegistry {
    converters: HashMap<String, Arc<dyn AttributeConverter>>,
}

impl ConverterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        ConverterRegistry {
            converters: HashMap::new(),
        }
    }

    /// Registers a converter under the given id, replacing any previous
    /// registration.
    pub fn register(&mut self, id: &str, converter: Arc<dyn AttributeConverter>) {
        self.converters.insert(id.to_string(), converter);
    }

    /// Looks up a converter by id.
    ///
    /// # Returns
    ///
    /// The converter, or an error if no converter is registered under the id.
    pub fn get(&self, id: &str) -> EntimapResult<Arc<dyn AttributeConverter>> {
        match self.converters.get(id) {
            Some(converter) => Ok(Arc::clone(converter)),
            None => {
                log::error!("No attribute converter registered under id {}", id);
                Err(EntimapError::new(
                    &format!("No attribute converter registered under id {}", id),
                    ErrorKind::ConverterNotFound,
                ))
            }
        }
    }

    /// Checks whether a converter is registered under the id.
    pub fn contains(&self, id: &str) -> bool {
        self.converters.contains_key(id)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Stores booleans as "Y"/"N" strings.
    pub(crate) struct BoolToFlagConverter;

    impl AttributeConverter for BoolToFlagConverter {
        fn to_storage(&self, value: Value) -> EntimapResult<Value> {
            match value {
                Value::Bool(true) => Ok(Value::String("Y".to_string())),
                Value::Bool(false) => Ok(Value::String("N".to_string())),
                Value::Null => Ok(Value::Null),
                other => Err(EntimapError::new(
                    &format!("Value {} is not a boolean", other),
                    ErrorKind::TypeMismatch,
                )),
            }
        }

        fn from_storage(&self, value: Value) -> EntimapResult<Value> {
            match value {
                Value::String(flag) if flag == "Y" => Ok(Value::Bool(true)),
                Value::String(flag) if flag == "N" => Ok(Value::Bool(false)),
                Value::Null => Ok(Value::Null),
                other => Err(EntimapError::new(
                    &format!("Value {} is not a Y/N flag", other),
                    ErrorKind::TypeMismatch,
                )),
            }
        }
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = ConverterRegistry::new();
        registry.register("bool_to_flag", Arc::new(BoolToFlagConverter));

        assert!(registry.contains("bool_to_flag"));
        let converter = registry.get("bool_to_flag").unwrap();
        assert_eq!(
            converter.to_storage(Value::Bool(true)).unwrap(),
            Value::String("Y".to_string())
        );
        assert_eq!(
            converter
                .from_storage(Value::String("N".to_string()))
                .unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_get_unknown_converter() {
        let registry = ConverterRegistry::new();
        let result = registry.get("missing");
        assert!(result.is_err());
        assert_eq!(result.err().unwrap().kind(), &ErrorKind::ConverterNotFound);
    }

    #[test]
    fn test_converter_round_trip() {
        let converter = BoolToFlagConverter;
        let stored = converter.to_storage(Value::Bool(true)).unwrap();
        assert_eq!(converter.from_storage(stored).unwrap(), Value::Bool(true));
    }
}
