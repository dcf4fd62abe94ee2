use crate::common::{Sort, SortOrder, Value};
use crate::criteria::{self, CombinatorOperator, CriteriaCondition};
use crate::errors::{EntimapError, EntimapResult, ErrorKind};
use crate::metadata::{ConverterRegistry, EntityMetadata};
use crate::query::query::{DeleteQuery, SelectQuery};

/// Shared condition-building state of the fluent builders.
///
/// A predicate is expressed in two steps: a navigation call (`where_`, `and`,
/// `or`) names the field, a terminal call (`eq`, `gt`, ...) supplies the
/// operator and value and attaches the finished leaf to the condition under
/// construction. `not` flags the next leaf for negation.
struct ConditionState<'a> {
    metadata: &'a EntityMetadata,
    converters: &'a ConverterRegistry,
    condition: Option<CriteriaCondition>,
    pending_field: Option<String>,
    pending_negate: bool,
    pending_combinator: CombinatorOperator,
}

impl<'a> ConditionState<'a> {
    /// Seeds the state; subtypes start with their discriminator equality so
    /// every built query is scoped to the subtype.
    fn new(metadata: &'a EntityMetadata, converters: &'a ConverterRegistry) -> Self {
        let condition = metadata.inheritance().map(|inheritance| {
            criteria::eq(
                inheritance.discriminator_column(),
                inheritance.discriminator_value(),
            )
        });
        ConditionState {
            metadata,
            converters,
            condition,
            pending_field: None,
            pending_negate: false,
            pending_combinator: CombinatorOperator::And,
        }
    }

    fn navigate(&mut self, name: &str, combinator: CombinatorOperator) {
        self.pending_field = Some(name.to_string());
        self.pending_combinator = combinator;
    }

    fn negate_next(&mut self) {
        self.pending_negate = !self.pending_negate;
    }

    /// Converts a predicate value: reject nulls, then run the pending field's
    /// attribute converter so stored and queried representations line up.
    fn prepare_value(&self, field_name: &str, value: Value) -> EntimapResult<Value> {
        if value.is_null() {
            log::error!("Predicate on field {} received a null value", field_name);
            return Err(EntimapError::new(
                &format!("Predicate on field {} received a null value", field_name),
                ErrorKind::ValidationError,
            ));
        }
        match self.metadata.field(field_name).and_then(|f| f.converter()) {
            Some(id) => self.converters.get(id)?.to_storage(value),
            None => Ok(value),
        }
    }

    fn attach<F>(&mut self, make_leaf: F) -> EntimapResult<()>
    where
        F: FnOnce(&str) -> CriteriaCondition,
    {
        let field = match self.pending_field.take() {
            Some(field) => field,
            None => {
                log::error!("Predicate called without a pending field");
                return Err(EntimapError::new(
                    "Predicate called without a pending field; call where_, and or or first",
                    ErrorKind::InvalidOperation,
                ));
            }
        };
        let physical = self.metadata.column_name(&field);
        let mut leaf = make_leaf(&physical);
        if self.pending_negate {
            leaf = leaf.negate();
            self.pending_negate = false;
        }
        self.condition = Some(match self.condition.take() {
            None => leaf,
            Some(existing) => match self.pending_combinator {
                CombinatorOperator::Or => existing.or(leaf),
                _ => existing.and(leaf),
            },
        });
        Ok(())
    }

    fn pending_field_name(&self) -> Option<&str> {
        self.pending_field.as_deref()
    }

    fn comparison<T: Into<Value>>(
        &mut self,
        value: T,
        build: fn(&str, Value) -> CriteriaCondition,
    ) -> EntimapResult<()> {
        let field = match self.pending_field_name() {
            Some(field) => field.to_string(),
            None => {
                log::error!("Predicate called without a pending field");
                return Err(EntimapError::new(
                    "Predicate called without a pending field; call where_, and or or first",
                    ErrorKind::InvalidOperation,
                ));
            }
        };
        let prepared = self.prepare_value(&field, value.into())?;
        self.attach(|physical| build(physical, prepared))
    }

    fn finish(&self) -> EntimapResult<Option<CriteriaCondition>> {
        if let Some(field) = self.pending_field_name() {
            log::error!("Field {} is missing its predicate", field);
            return Err(EntimapError::new(
                &format!("Field {} is missing its predicate", field),
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(self.condition.clone())
    }
}

/// Fluent builder of [SelectQuery] values.
///
/// The builder resolves logical field names to physical element names and
/// applies attribute converters to predicate values, so the produced query
/// speaks the wire vocabulary. [`build`] snapshots the current state; the
/// builder stays usable and later predicates do not affect earlier snapshots.
///
/// # Examples
///
/// ```rust,ignore
/// let query = select(&metadata, &converters)
///     .where_("name").eq("Ada")?
///     .and("age").gt(30i64)?
///     .order_by("age").desc()
///     .limit(10)
///     .build()?;
/// ```
///
/// [`build`]: SelectQueryBuilder::build
pub struct SelectQueryBuilder<'a> {
    state: ConditionState<'a>,
    columns: Vec<String>,
    sorts: Vec<Sort>,
    skip: u64,
    limit: u64,
}

/// Starts a select query builder over the given entity metadata.
pub fn select<'a>(
    metadata: &'a EntityMetadata,
    converters: &'a ConverterRegistry,
) -> SelectQueryBuilder<'a> {
    SelectQueryBuilder {
        state: ConditionState::new(metadata, converters),
        columns: Vec::new(),
        sorts: Vec::new(),
        skip: 0,
        limit: 0,
    }
}

impl<'a> SelectQueryBuilder<'a> {
    /// Projects the query onto the given logical field names.
    pub fn columns(mut self, names: &[&str]) -> Self {
        self.columns = names
            .iter()
            .map(|name| self.state.metadata.column_name(name))
            .collect();
        self
    }

    /// Names the first predicate field.
    pub fn where_(mut self, name: &str) -> Self {
        self.state.navigate(name, CombinatorOperator::And);
        self
    }

    /// Names the next predicate field, combined with logical and.
    pub fn and(mut self, name: &str) -> Self {
        self.state.navigate(name, CombinatorOperator::And);
        self
    }

    /// Names the next predicate field, combined with logical or.
    pub fn or(mut self, name: &str) -> Self {
        self.state.navigate(name, CombinatorOperator::Or);
        self
    }

    /// Negates the next predicate.
    pub fn not(mut self) -> Self {
        self.state.negate_next();
        self
    }

    /// Attaches an equality predicate on the pending field.
    pub fn eq<T: Into<Value>>(mut self, value: T) -> EntimapResult<Self> {
        self.state.comparison(value, criteria::condition::eq)?;
        Ok(self)
    }

    /// Attaches a pattern-match predicate on the pending field.
    pub fn like<T: Into<Value>>(mut self, value: T) -> EntimapResult<Self> {
        self.state.comparison(value, criteria::condition::like)?;
        Ok(self)
    }

    /// Attaches a greater-than predicate on the pending field.
    pub fn gt<T: Into<Value>>(mut self, value: T) -> EntimapResult<Self> {
        self.state.comparison(value, criteria::condition::gt)?;
        Ok(self)
    }

    /// Attaches a greater-than-or-equals predicate on the pending field.
    pub fn gte<T: Into<Value>>(mut self, value: T) -> EntimapResult<Self> {
        self.state.comparison(value, criteria::condition::gte)?;
        Ok(self)
    }

    /// Attaches a lesser-than predicate on the pending field.
    pub fn lt<T: Into<Value>>(mut self, value: T) -> EntimapResult<Self> {
        self.state.comparison(value, criteria::condition::lt)?;
        Ok(self)
    }

    /// Attaches a lesser-than-or-equals predicate on the pending field.
    pub fn lte<T: Into<Value>>(mut self, value: T) -> EntimapResult<Self> {
        self.state.comparison(value, criteria::condition::lte)?;
        Ok(self)
    }

    /// Attaches an inclusive range predicate on the pending field.
    pub fn between<T: Into<Value>>(mut self, lower: T, upper: T) -> EntimapResult<Self> {
        let field = match self.state.pending_field_name() {
            Some(field) => field.to_string(),
            None => {
                log::error!("Predicate called without a pending field");
                return Err(EntimapError::new(
                    "Predicate called without a pending field; call where_, and or or first",
                    ErrorKind::InvalidOperation,
                ));
            }
        };
        let lower = self.state.prepare_value(&field, lower.into())?;
        let upper = self.state.prepare_value(&field, upper.into())?;
        self.state
            .attach(|physical| criteria::between(physical, lower, upper))?;
        Ok(self)
    }

    /// Attaches a membership predicate on the pending field.
    pub fn in_values(mut self, values: Vec<Value>) -> EntimapResult<Self> {
        let field = match self.state.pending_field_name() {
            Some(field) => field.to_string(),
            None => {
                log::error!("Predicate called without a pending field");
                return Err(EntimapError::new(
                    "Predicate called without a pending field; call where_, and or or first",
                    ErrorKind::InvalidOperation,
                ));
            }
        };
        let mut prepared = Vec::with_capacity(values.len());
        for value in values {
            prepared.push(self.state.prepare_value(&field, value)?);
        }
        self.state
            .attach(|physical| criteria::in_values(physical, prepared))?;
        Ok(self)
    }

    /// Adds a sort key on the given logical field, ascending. A following
    /// [`asc`] or [`desc`] adjusts its direction.
    ///
    /// [`asc`]: SelectQueryBuilder::asc
    /// [`desc`]: SelectQueryBuilder::desc
    pub fn order_by(mut self, name: &str) -> Self {
        let physical = self.state.metadata.column_name(name);
        self.sorts.push(Sort::asc(&physical));
        self
    }

    /// Makes the last added sort key ascending.
    pub fn asc(mut self) -> Self {
        if let Some(sort) = self.sorts.pop() {
            self.sorts.push(Sort::of(sort.name(), SortOrder::Ascending));
        }
        self
    }

    /// Makes the last added sort key descending.
    pub fn desc(mut self) -> Self {
        if let Some(sort) = self.sorts.pop() {
            self.sorts.push(Sort::of(sort.name(), SortOrder::Descending));
        }
        self
    }

    /// Skips the given number of leading rows.
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    /// Caps the number of returned rows; zero means unbounded.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// Snapshots the builder into an immutable query.
    ///
    /// # Errors
    ///
    /// * `InvalidOperation` - a navigated field is still missing its predicate
    pub fn build(&self) -> EntimapResult<SelectQuery> {
        let condition = self.state.finish()?;
        Ok(SelectQuery::new(
            self.state.metadata.name(),
            self.columns.clone(),
            condition,
            self.sorts.clone(),
            self.skip,
            self.limit,
        ))
    }
}

/// Fluent builder of [DeleteQuery] values, sharing the predicate vocabulary
/// of [SelectQueryBuilder].
pub struct DeleteQueryBuilder<'a> {
    state: ConditionState<'a>,
    columns: Vec<String>,
}

/// Starts a delete query builder over the given entity metadata.
pub fn delete<'a>(
    metadata: &'a EntityMetadata,
    converters: &'a ConverterRegistry,
) -> DeleteQueryBuilder<'a> {
    DeleteQueryBuilder {
        state: ConditionState::new(metadata, converters),
        columns: Vec::new(),
    }
}

impl<'a> DeleteQueryBuilder<'a> {
    /// Restricts the deletion to the given logical field names.
    pub fn columns(mut self, names: &[&str]) -> Self {
        self.columns = names
            .iter()
            .map(|name| self.state.metadata.column_name(name))
            .collect();
        self
    }

    /// Names the first predicate field.
    pub fn where_(mut self, name: &str) -> Self {
        self.state.navigate(name, CombinatorOperator::And);
        self
    }

    /// Names the next predicate field, combined with logical and.
    pub fn and(mut self, name: &str) -> Self {
        self.state.navigate(name, CombinatorOperator::And);
        self
    }

    /// Names the next predicate field, combined with logical or.
    pub fn or(mut self, name: &str) -> Self {
        self.state.navigate(name, CombinatorOperator::Or);
        self
    }

    /// Negates the next predicate.
    pub fn not(mut self) -> Self {
        self.state.negate_next();
        self
    }

    /// Attaches an equality predicate on the pending field.
    pub fn eq<T: Into<Value>>(mut self, value: T) -> EntimapResult<Self> {
        self.state.comparison(value, criteria::condition::eq)?;
        Ok(self)
    }

    /// Attaches a pattern-match predicate on the pending field.
    pub fn like<T: Into<Value>>(mut self, value: T) -> EntimapResult<Self> {
        self.state.comparison(value, criteria::condition::like)?;
        Ok(self)
    }

    /// Attaches a greater-than predicate on the pending field.
    pub fn gt<T: Into<Value>>(mut self, value: T) -> EntimapResult<Self> {
        self.state.comparison(value, criteria::condition::gt)?;
        Ok(self)
    }

    /// Attaches a greater-than-or-equals predicate on the pending field.
    pub fn gte<T: Into<Value>>(mut self, value: T) -> EntimapResult<Self> {
        self.state.comparison(value, criteria::condition::gte)?;
        Ok(self)
    }

    /// Attaches a lesser-than predicate on the pending field.
    pub fn lt<T: Into<Value>>(mut self, value: T) -> EntimapResult<Self> {
        self.state.comparison(value, criteria::condition::lt)?;
        Ok(self)
    }

    /// Attaches a lesser-than-or-equals predicate on the pending field.
    pub fn lte<T: Into<Value>>(mut self, value: T) -> EntimapResult<Self> {
        self.state.comparison(value, criteria::condition::lte)?;
        Ok(self)
    }

    /// Snapshots the builder into an immutable query.
    pub fn build(&self) -> EntimapResult<DeleteQuery> {
        let condition = self.state.finish()?;
        Ok(DeleteQuery::new(
            self.state.metadata.name(),
            self.columns.clone(),
            condition,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::{self, CriteriaCondition};
    use crate::metadata::converter::tests::BoolToFlagConverter;
    use crate::metadata::{FieldMetadata, InheritanceMetadata};
    use std::sync::Arc;

    fn person_metadata() -> EntityMetadata {
        EntityMetadata::new(
            "people",
            "Person",
            vec![
                FieldMetadata::scalar("id", "_id"),
                FieldMetadata::scalar("name", "name"),
                FieldMetadata::scalar("age", "age"),
                FieldMetadata::scalar("active", "active").with_converter("bool_to_flag"),
            ],
        )
    }

    fn converters() -> ConverterRegistry {
        let mut registry = ConverterRegistry::new();
        registry.register("bool_to_flag", Arc::new(BoolToFlagConverter));
        registry
    }

    #[test]
    fn test_simple_select() {
        let metadata = person_metadata();
        let converters = converters();
        let query = select(&metadata, &converters)
            .where_("name")
            .eq("Ada")
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(query.name(), "people");
        assert_eq!(query.condition(), Some(&criteria::eq("name", "Ada")));
    }

    #[test]
    fn test_physical_name_resolution() {
        let metadata = person_metadata();
        let converters = converters();
        let query = select(&metadata, &converters)
            .where_("id")
            .eq(1i64)
            .unwrap()
            .order_by("id")
            .build()
            .unwrap();

        assert_eq!(query.condition(), Some(&criteria::eq("_id", 1i64)));
        assert_eq!(query.sorts()[0].name(), "_id");
    }

    #[test]
    fn test_combinators_left_to_right() {
        let metadata = person_metadata();
        let converters = converters();
        let query = select(&metadata, &converters)
            .where_("name")
            .eq("Ada")
            .unwrap()
            .and("age")
            .gt(30i64)
            .unwrap()
            .or("age")
            .lt(10i64)
            .unwrap()
            .build()
            .unwrap();

        let expected = criteria::eq("name", "Ada")
            .and(criteria::gt("age", 30i64))
            .or(criteria::lt("age", 10i64));
        assert_eq!(query.condition(), Some(&expected));
    }

    #[test]
    fn test_not_flags_next_predicate() {
        let metadata = person_metadata();
        let converters = converters();
        let query = select(&metadata, &converters)
            .where_("name")
            .not()
            .eq("Ada")
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(
            query.condition(),
            Some(&criteria::eq("name", "Ada").negate())
        );
    }

    #[test]
    fn test_predicate_converter_applied() {
        let metadata = person_metadata();
        let converters = converters();
        let query = select(&metadata, &converters)
            .where_("active")
            .eq(true)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(query.condition(), Some(&criteria::eq("active", "Y")));
    }

    #[test]
    fn test_null_predicate_rejected() {
        let metadata = person_metadata();
        let converters = converters();
        let result = select(&metadata, &converters).where_("name").eq(Value::Null);
        assert!(result.is_err());
        assert_eq!(result.err().unwrap().kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn test_predicate_without_field_rejected() {
        let metadata = person_metadata();
        let converters = converters();
        let result = select(&metadata, &converters).eq("Ada");
        assert!(result.is_err());
        assert_eq!(result.err().unwrap().kind(), &ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_build_with_dangling_field_rejected() {
        let metadata = person_metadata();
        let converters = converters();
        let result = select(&metadata, &converters).where_("name").build();
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_build_snapshots_are_independent() {
        let metadata = person_metadata();
        let converters = converters();
        let builder = select(&metadata, &converters)
            .where_("name")
            .eq("Ada")
            .unwrap();
        let first = builder.build().unwrap();
        let builder = builder.and("age").gt(30i64).unwrap();
        let second = builder.build().unwrap();

        assert_eq!(first.condition(), Some(&criteria::eq("name", "Ada")));
        assert_ne!(first.condition(), second.condition());
    }

    #[test]
    fn test_sort_skip_limit() {
        let metadata = person_metadata();
        let converters = converters();
        let query = select(&metadata, &converters)
            .order_by("age")
            .desc()
            .order_by("name")
            .skip(5)
            .limit(10)
            .build()
            .unwrap();

        assert_eq!(query.sorts().len(), 2);
        assert_eq!(query.sorts()[0], Sort::desc("age"));
        assert_eq!(query.sorts()[1], Sort::asc("name"));
        assert_eq!(query.skip(), 5);
        assert_eq!(query.limit(), 10);
    }

    #[test]
    fn test_between_and_in() {
        let metadata = person_metadata();
        let converters = converters();
        let query = select(&metadata, &converters)
            .where_("age")
            .between(18i64, 65i64)
            .unwrap()
            .and("name")
            .in_values(vec![Value::from("Ada"), Value::from("Grace")])
            .unwrap()
            .build()
            .unwrap();

        let expected = criteria::between("age", 18i64, 65i64).and(criteria::in_values(
            "name",
            vec![Value::from("Ada"), Value::from("Grace")],
        ));
        assert_eq!(query.condition(), Some(&expected));
    }

    #[test]
    fn test_subtype_scoping() {
        let metadata = EntityMetadata::new(
            "animals",
            "Dog",
            vec![FieldMetadata::scalar("name", "name")],
        )
        .with_inheritance(InheritanceMetadata::new("kind", "dog", "Animal"));
        let converters = ConverterRegistry::new();

        let unfiltered = select(&metadata, &converters).build().unwrap();
        assert_eq!(unfiltered.condition(), Some(&criteria::eq("kind", "dog")));

        let filtered = select(&metadata, &converters)
            .where_("name")
            .eq("Rex")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            filtered.condition(),
            Some(&criteria::eq("kind", "dog").and(criteria::eq("name", "Rex")))
        );
    }

    #[test]
    fn test_delete_builder() {
        let metadata = person_metadata();
        let converters = converters();
        let query = delete(&metadata, &converters)
            .where_("age")
            .lt(18i64)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(query.name(), "people");
        assert_eq!(query.condition(), Some(&criteria::lt("age", 18i64)));
        assert!(query.columns().is_empty());
    }

    #[test]
    fn test_unknown_field_passes_through() {
        let metadata = person_metadata();
        let converters = converters();
        let query = select(&metadata, &converters)
            .where_("nickname")
            .eq("ada")
            .unwrap()
            .build()
            .unwrap();
        match query.condition().unwrap() {
            CriteriaCondition::Leaf { element, .. } => assert_eq!(element.name(), "nickname"),
            _ => panic!("expected a leaf"),
        }
    }
}
