use crate::common::Value;
use crate::errors::{EntimapError, EntimapResult, ErrorKind};
use indexmap::IndexMap;
use itertools::Itertools;

#[derive(Debug, Clone)]
struct ParamSlot {
    value: Option<Value>,
    converter: Option<String>,
}

/// The named parameters of one parsed query.
///
/// Parameters are declared by the parser as it meets `@name` placeholders,
/// each remembering the attribute converter of the field it compares against.
/// Binding fills a slot; a prepared statement refuses to resolve while any
/// slot is empty, and refuses further binds once it has been consumed.
///
/// Declaration order is preserved so diagnostics list parameters the way they
/// appear in the query text.
#[derive(Debug, Clone, Default)]
pub struct Params {
    slots: IndexMap<String, ParamSlot>,
    consumed: bool,
}

impl Params {
    pub(crate) fn new() -> Self {
        Params {
            slots: IndexMap::new(),
            consumed: false,
        }
    }

    /// Declares a parameter, remembering the converter of its target field.
    /// Re-declaring a name keeps the first converter; the same parameter may
    /// appear at several places in one query.
    pub(crate) fn declare(&mut self, name: &str, converter: Option<String>) {
        self.slots.entry(name.to_string()).or_insert(ParamSlot {
            value: None,
            converter,
        });
    }

    pub(crate) fn converter_of(&self, name: &str) -> Option<&str> {
        self.slots
            .get(name)
            .and_then(|slot| slot.converter.as_deref())
    }

    /// Binds a value to a declared parameter.
    ///
    /// # Errors
    ///
    /// * `ValidationError` - the name was never declared by the query
    /// * `InvalidOperation` - the statement has already been consumed
    pub(crate) fn bind(&mut self, name: &str, value: Value) -> EntimapResult<()> {
        if self.consumed {
            log::error!("Cannot bind {} on a consumed statement", name);
            return Err(EntimapError::new(
                &format!("Cannot bind {} on a consumed statement", name),
                ErrorKind::InvalidOperation,
            ));
        }
        match self.slots.get_mut(name) {
            Some(slot) => {
                slot.value = Some(value);
                Ok(())
            }
            None => {
                log::error!("Query declares no parameter named {}", name);
                Err(EntimapError::new(
                    &format!("Query declares no parameter named {}", name),
                    ErrorKind::ValidationError,
                ))
            }
        }
    }

    /// Returns the bound value of a parameter, if any.
    pub(crate) fn value_of(&self, name: &str) -> Option<&Value> {
        self.slots.get(name).and_then(|slot| slot.value.as_ref())
    }

    /// Lists the declared parameters still missing a value, in declaration
    /// order.
    pub fn unbound(&self) -> Vec<String> {
        self.slots
            .iter()
            .filter(|(_, slot)| slot.value.is_none())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Checks whether the query declared any parameters at all.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn is_consumed(&self) -> bool {
        self.consumed
    }

    pub(crate) fn mark_consumed(&mut self) {
        self.consumed = true;
    }

    /// Formats the unbound names for diagnostics.
    pub(crate) fn unbound_list(&self) -> String {
        self.unbound().iter().join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declare_and_bind() {
        let mut params = Params::new();
        params.declare("name", None);
        params.declare("age", Some("age_converter".to_string()));

        assert_eq!(params.unbound(), vec!["name".to_string(), "age".to_string()]);
        assert_eq!(params.converter_of("age"), Some("age_converter"));

        params.bind("name", Value::from("Ada")).unwrap();
        assert_eq!(params.unbound(), vec!["age".to_string()]);
        assert_eq!(params.value_of("name"), Some(&Value::from("Ada")));
    }

    #[test]
    fn test_bind_unknown_name() {
        let mut params = Params::new();
        params.declare("name", None);
        let result = params.bind("missing", Value::from("x"));
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn test_bind_after_consume() {
        let mut params = Params::new();
        params.declare("name", None);
        params.bind("name", Value::from("Ada")).unwrap();
        params.mark_consumed();

        let result = params.bind("name", Value::from("Grace"));
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_redeclare_keeps_first_converter() {
        let mut params = Params::new();
        params.declare("x", Some("first".to_string()));
        params.declare("x", Some("second".to_string()));
        assert_eq!(params.converter_of("x"), Some("first"));
        assert_eq!(params.unbound().len(), 1);
    }

    #[test]
    fn test_unbound_list_format() {
        let mut params = Params::new();
        params.declare("a", None);
        params.declare("b", None);
        assert_eq!(params.unbound_list(), "a, b");
    }
}
