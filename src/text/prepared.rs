use crate::common::Value;
use crate::criteria::CriteriaCondition;
use crate::errors::{EntimapError, EntimapResult, ErrorKind};
use crate::metadata::{ConverterRegistry, MetadataRegistry};
use crate::query::{DeleteQuery, SelectQuery};
use crate::text::params::Params;
use crate::text::parser::{ParsedQuery, QueryParser};
use std::sync::Arc;

/// A parsed query awaiting parameter values.
///
/// The statement is built by [`prepare`], bound through [`bind`] and executed
/// once through [`resolve`]. Resolution substitutes every placeholder with
/// its bound value and consumes the statement: a second resolve, or a bind
/// after resolve, is an invalid operation. Resolving with unbound parameters
/// fails listing the missing names.
///
/// Bound values run through the attribute converter of the field their
/// placeholder compares against, so bind-time values speak the domain
/// vocabulary just like builder predicates.
///
/// [`prepare`]: PreparedStatement::prepare
/// [`bind`]: PreparedStatement::bind
/// [`resolve`]: PreparedStatement::resolve
pub struct PreparedStatement {
    query: ParsedQuery,
    params: Params,
    converters: Arc<ConverterRegistry>,
}

impl PreparedStatement {
    /// Parses a query text into a bindable statement.
    pub fn prepare(
        text: &str,
        metadata: &MetadataRegistry,
        converters: Arc<ConverterRegistry>,
    ) -> EntimapResult<PreparedStatement> {
        let (query, params) = QueryParser::new().parse_with_params(text, metadata, &converters)?;
        Ok(PreparedStatement {
            query,
            params,
            converters,
        })
    }

    /// Binds a value to a named parameter, applying the target field's
    /// attribute converter.
    ///
    /// # Errors
    ///
    /// * `ValidationError` - the query declares no such parameter
    /// * `InvalidOperation` - the statement has already been resolved
    pub fn bind<T: Into<Value>>(&mut self, name: &str, value: T) -> EntimapResult<&mut Self> {
        let value = value.into();
        let converted = match self.params.converter_of(name) {
            Some(id) => self.converters.get(id)?.to_storage(value)?,
            None => value,
        };
        self.params.bind(name, converted)?;
        Ok(self)
    }

    /// Lists the parameters still missing a value.
    pub fn unbound(&self) -> Vec<String> {
        self.params.unbound()
    }

    /// Substitutes every placeholder and consumes the statement.
    ///
    /// # Errors
    ///
    /// * `UnboundParameters` - at least one parameter is still missing a
    ///   value; the message lists them
    /// * `InvalidOperation` - the statement was already resolved
    pub fn resolve(&mut self) -> EntimapResult<ParsedQuery> {
        if self.params.is_consumed() {
            log::error!("Prepared statement was already resolved");
            return Err(EntimapError::new(
                "Prepared statement was already resolved",
                ErrorKind::InvalidOperation,
            ));
        }
        if !self.params.unbound().is_empty() {
            log::error!("Unbound parameters: {}", self.params.unbound_list());
            return Err(EntimapError::new(
                &format!("Unbound parameters: {}", self.params.unbound_list()),
                ErrorKind::UnboundParameters,
            ));
        }

        let resolved = match &self.query {
            ParsedQuery::Select(query) => {
                let condition = match query.condition() {
                    Some(condition) => {
                        Some(substitute_condition(condition.clone(), &self.params)?)
                    }
                    None => None,
                };
                ParsedQuery::Select(SelectQuery::new(
                    query.name(),
                    query.columns().to_vec(),
                    condition,
                    query.sorts().to_vec(),
                    query.skip(),
                    query.limit(),
                ))
            }
            ParsedQuery::Delete(query) => {
                let condition = match query.condition() {
                    Some(condition) => {
                        Some(substitute_condition(condition.clone(), &self.params)?)
                    }
                    None => None,
                };
                ParsedQuery::Delete(DeleteQuery::new(
                    query.name(),
                    query.columns().to_vec(),
                    condition,
                ))
            }
        };

        self.params.mark_consumed();
        Ok(resolved)
    }

    /// Resolves and unwraps a select statement.
    pub fn resolve_select(&mut self) -> EntimapResult<SelectQuery> {
        self.resolve()?.into_select()
    }

    /// Resolves and unwraps a delete statement.
    pub fn resolve_delete(&mut self) -> EntimapResult<DeleteQuery> {
        self.resolve()?.into_delete()
    }
}

fn substitute_condition(
    condition: CriteriaCondition,
    params: &Params,
) -> EntimapResult<CriteriaCondition> {
    match condition {
        CriteriaCondition::Leaf { operator, element } => {
            let name = element.name().to_string();
            let value = substitute_value(element.into_value(), params)?;
            Ok(CriteriaCondition::Leaf {
                operator,
                element: crate::common::Element::new(&name, value),
            })
        }
        CriteriaCondition::Combinator {
            operator,
            conditions,
        } => {
            let substituted = conditions
                .into_iter()
                .map(|child| substitute_condition(child, params))
                .collect::<EntimapResult<Vec<_>>>()?;
            Ok(CriteriaCondition::Combinator {
                operator,
                conditions: substituted,
            })
        }
    }
}

fn substitute_value(value: Value, params: &Params) -> EntimapResult<Value> {
    match value {
        Value::Parameter(name) => match params.value_of(&name) {
            Some(bound) => Ok(bound.clone()),
            None => {
                log::error!("Parameter {} has no bound value", name);
                Err(EntimapError::new(
                    &format!("Parameter {} has no bound value", name),
                    ErrorKind::UnboundParameters,
                ))
            }
        },
        Value::Array(items) => {
            let substituted = items
                .into_iter()
                .map(|item| substitute_value(item, params))
                .collect::<EntimapResult<Vec<_>>>()?;
            Ok(Value::Array(substituted))
        }
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria;
    use crate::metadata::converter::tests::BoolToFlagConverter;
    use crate::metadata::{EntityMetadata, FieldMetadata};

    fn registry() -> MetadataRegistry {
        let mut registry = MetadataRegistry::new();
        registry
            .register(EntityMetadata::new(
                "people",
                "Person",
                vec![
                    FieldMetadata::scalar("name", "name"),
                    FieldMetadata::scalar("age", "age"),
                    FieldMetadata::scalar("active", "active").with_converter("bool_to_flag"),
                ],
            ))
            .unwrap();
        registry
    }

    fn converters() -> Arc<ConverterRegistry> {
        let mut registry = ConverterRegistry::new();
        registry.register("bool_to_flag", Arc::new(BoolToFlagConverter));
        Arc::new(registry)
    }

    #[test]
    fn test_bind_and_resolve() {
        let mut statement = PreparedStatement::prepare(
            "select * from people where name = @name and age > @age",
            &registry(),
            converters(),
        )
        .unwrap();

        statement.bind("name", "Ada").unwrap();
        statement.bind("age", 30i64).unwrap();
        let query = statement.resolve_select().unwrap();

        let expected = criteria::eq("name", "Ada").and(criteria::gt("age", 30i64));
        assert_eq!(query.condition(), Some(&expected));
    }

    #[test]
    fn test_resolve_with_unbound_lists_names() {
        let mut statement = PreparedStatement::prepare(
            "select * from people where name = @name and age > @age",
            &registry(),
            converters(),
        )
        .unwrap();
        statement.bind("name", "Ada").unwrap();

        let result = statement.resolve();
        assert!(result.is_err());
        let error = result.unwrap_err();
        assert_eq!(error.kind(), &ErrorKind::UnboundParameters);
        assert!(error.message().contains("age"));
    }

    #[test]
    fn test_bind_converter_applied() {
        let mut statement = PreparedStatement::prepare(
            "select * from people where active = @active",
            &registry(),
            converters(),
        )
        .unwrap();
        statement.bind("active", true).unwrap();
        let query = statement.resolve_select().unwrap();
        assert_eq!(query.condition(), Some(&criteria::eq("active", "Y")));
    }

    #[test]
    fn test_rebind_before_resolve_wins() {
        let mut statement = PreparedStatement::prepare(
            "select * from people where name = @name",
            &registry(),
            converters(),
        )
        .unwrap();
        statement.bind("name", "Ada").unwrap();
        statement.bind("name", "Grace").unwrap();
        let query = statement.resolve_select().unwrap();
        assert_eq!(query.condition(), Some(&criteria::eq("name", "Grace")));
    }

    #[test]
    fn test_second_resolve_fails() {
        let mut statement = PreparedStatement::prepare(
            "select * from people where name = @name",
            &registry(),
            converters(),
        )
        .unwrap();
        statement.bind("name", "Ada").unwrap();
        statement.resolve().unwrap();

        let result = statement.resolve();
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_bind_after_resolve_fails() {
        let mut statement = PreparedStatement::prepare(
            "select * from people where name = @name",
            &registry(),
            converters(),
        )
        .unwrap();
        statement.bind("name", "Ada").unwrap();
        statement.resolve().unwrap();

        let result = statement.bind("name", "Grace");
        assert!(result.is_err());
        assert_eq!(result.err().unwrap().kind(), &ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_bind_unknown_parameter() {
        let mut statement = PreparedStatement::prepare(
            "select * from people where name = @name",
            &registry(),
            converters(),
        )
        .unwrap();
        let result = statement.bind("missing", "x");
        assert!(result.is_err());
        assert_eq!(result.err().unwrap().kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn test_parameter_in_membership_list() {
        let mut statement = PreparedStatement::prepare(
            "select * from people where name in ('Ada', @other)",
            &registry(),
            converters(),
        )
        .unwrap();
        statement.bind("other", "Grace").unwrap();
        let query = statement.resolve_select().unwrap();

        let expected = criteria::in_values(
            "name",
            vec![Value::from("Ada"), Value::from("Grace")],
        );
        assert_eq!(query.condition(), Some(&expected));
    }

    #[test]
    fn test_prepared_delete() {
        let mut statement = PreparedStatement::prepare(
            "delete from people where age < @cutoff",
            &registry(),
            converters(),
        )
        .unwrap();
        statement.bind("cutoff", 18i64).unwrap();
        let query = statement.resolve_delete().unwrap();
        assert_eq!(query.condition(), Some(&criteria::lt("age", 18i64)));
    }
}
