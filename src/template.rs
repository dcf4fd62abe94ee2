use crate::common::MappedEntity;
use crate::errors::{EntimapError, EntimapResult, ErrorKind};
use crate::manager::DatabaseManager;
use crate::mapping::EntityConverter;
use crate::metadata::{ConverterRegistry, MetadataRegistry};
use crate::query::{DeleteQuery, SelectQuery};
use crate::text::{PreparedStatement, QueryParser};
use std::sync::Arc;

/// Typed facade over a [DatabaseManager].
///
/// The template converts typed domain values to communication entities on the
/// way to the manager and back on the way out, so callers never touch the
/// wire representation. It also fronts the text query language: [`query`]
/// parses and runs a select in one step, [`prepare`] hands out a bindable
/// statement.
///
/// [`query`]: EntityTemplate::query
/// [`prepare`]: EntityTemplate::prepare
pub struct EntityTemplate<M: DatabaseManager> {
    metadata: Arc<MetadataRegistry>,
    converters: Arc<ConverterRegistry>,
    converter: EntityConverter,
    manager: M,
}

impl<M: DatabaseManager> EntityTemplate<M> {
    /// Creates a template over the given metadata, converters and manager.
    pub fn new(
        metadata: Arc<MetadataRegistry>,
        converters: Arc<ConverterRegistry>,
        manager: M,
    ) -> Self {
        let converter = EntityConverter::new(Arc::clone(&metadata), Arc::clone(&converters));
        EntityTemplate {
            metadata,
            converters,
            converter,
            manager,
        }
    }

    /// Returns the underlying entity converter.
    pub fn converter(&self) -> &EntityConverter {
        &self.converter
    }

    /// Inserts a typed value, returning its stored form.
    pub fn insert<T: MappedEntity>(&mut self, value: &T) -> EntimapResult<T> {
        let entity = self.converter.to_entity(value)?;
        let stored = self.manager.insert(entity)?;
        self.converter.to_object(&stored)
    }

    /// Updates a typed value, returning its stored form.
    pub fn update<T: MappedEntity>(&mut self, value: &T) -> EntimapResult<T> {
        let entity = self.converter.to_entity(value)?;
        let stored = self.manager.update(entity)?;
        self.converter.to_object(&stored)
    }

    /// Deletes the entities matching the query.
    pub fn delete(&mut self, query: &DeleteQuery) -> EntimapResult<()> {
        self.manager.delete(query)
    }

    /// Runs a select query, reconstructing each row as `T`.
    pub fn select<T: MappedEntity>(&self, query: &SelectQuery) -> EntimapResult<Vec<T>> {
        self.manager
            .select(query)?
            .iter()
            .map(|entity| self.converter.to_object(entity))
            .collect()
    }

    /// Runs a select query expected to match at most one row.
    ///
    /// # Errors
    ///
    /// * `InvalidOperation` - the query matched more than one row
    pub fn single_result<T: MappedEntity>(&self, query: &SelectQuery) -> EntimapResult<Option<T>> {
        let mut rows = self.manager.select(query)?;
        if rows.len() > 1 {
            log::error!(
                "Query on {} matched {} rows where at most one was expected",
                query.name(),
                rows.len()
            );
            return Err(EntimapError::new(
                &format!(
                    "Query on {} matched {} rows where at most one was expected",
                    query.name(),
                    rows.len()
                ),
                ErrorKind::InvalidOperation,
            ));
        }
        match rows.pop() {
            Some(entity) => Ok(Some(self.converter.to_object(&entity)?)),
            None => Ok(None),
        }
    }

    /// Counts the entities matching the query.
    pub fn count(&self, query: &SelectQuery) -> EntimapResult<u64> {
        self.manager.count(query)
    }

    /// Checks whether any entity matches the query.
    pub fn exists(&self, query: &SelectQuery) -> EntimapResult<bool> {
        self.manager.exists(query)
    }

    /// Parses and runs a text select query in one step. The text must not
    /// declare parameters; prepare a statement for those.
    pub fn query<T: MappedEntity>(&self, text: &str) -> EntimapResult<Vec<T>> {
        let query = QueryParser::new()
            .parse(text, &self.metadata, &self.converters)?
            .into_select()?;
        self.select(&query)
    }

    /// Parses a text query into a bindable prepared statement.
    pub fn prepare(&self, text: &str) -> EntimapResult<PreparedStatement> {
        PreparedStatement::prepare(text, &self.metadata, Arc::clone(&self.converters))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Element, ObjectInstance, Value};
    use crate::criteria;
    use crate::entity::CommunicationEntity;
    use crate::metadata::{EntityMetadata, FieldMetadata};
    use crate::query::select;
    use std::cell::RefCell;

    /// In-memory manager: stores entities as-is and hands the whole set back
    /// on select, recording the queries it was given.
    #[derive(Default)]
    struct RecordingManager {
        rows: Vec<CommunicationEntity>,
        last_select: RefCell<Option<SelectQuery>>,
        last_delete: Option<DeleteQuery>,
    }

    impl DatabaseManager for RecordingManager {
        fn insert(&mut self, entity: CommunicationEntity) -> EntimapResult<CommunicationEntity> {
            self.rows.push(entity.clone());
            Ok(entity)
        }

        fn update(&mut self, entity: CommunicationEntity) -> EntimapResult<CommunicationEntity> {
            Ok(entity)
        }

        fn delete(&mut self, query: &DeleteQuery) -> EntimapResult<()> {
            self.last_delete = Some(query.clone());
            Ok(())
        }

        fn select(&self, query: &SelectQuery) -> EntimapResult<Vec<CommunicationEntity>> {
            *self.last_select.borrow_mut() = Some(query.clone());
            Ok(self.rows.clone())
        }
    }

    #[derive(Debug, PartialEq)]
    struct Person {
        id: i64,
        name: String,
        age: i32,
    }

    impl MappedEntity for Person {
        const TYPE_NAME: &'static str = "Person";

        fn to_instance(&self) -> EntimapResult<ObjectInstance> {
            Ok(ObjectInstance::new(Self::TYPE_NAME)
                .with_field("id", self.id)
                .with_field("name", self.name.as_str())
                .with_field("age", self.age))
        }

        fn from_instance(instance: &ObjectInstance) -> EntimapResult<Self> {
            Ok(Person {
                id: instance
                    .get("id")
                    .and_then(|v| v.as_integer())
                    .unwrap_or_default() as i64,
                name: instance
                    .get("name")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                age: instance
                    .get("age")
                    .and_then(|v| v.as_integer())
                    .unwrap_or_default() as i32,
            })
        }
    }

    fn person_metadata() -> EntityMetadata {
        EntityMetadata::new(
            "people",
            "Person",
            vec![
                FieldMetadata::scalar("id", "_id"),
                FieldMetadata::scalar("name", "name"),
                FieldMetadata::scalar("age", "age"),
            ],
        )
        .with_id_field("id")
    }

    fn template() -> EntityTemplate<RecordingManager> {
        let mut registry = MetadataRegistry::new();
        registry.register(person_metadata()).unwrap();
        EntityTemplate::new(
            Arc::new(registry),
            Arc::new(ConverterRegistry::new()),
            RecordingManager::default(),
        )
    }

    fn ada() -> Person {
        Person {
            id: 1,
            name: "Ada".to_string(),
            age: 36,
        }
    }

    #[test]
    fn test_insert_round_trips() {
        colog::init();
        let mut template = template();
        let stored = template.insert(&ada()).unwrap();
        assert_eq!(stored, ada());

        let entity = &template.manager.rows[0];
        assert_eq!(entity.name(), "people");
        assert_eq!(entity.value_of("_id"), Value::I64(1));
    }

    #[test]
    fn test_select_end_to_end() {
        let mut template = template();
        template.insert(&ada()).unwrap();

        let metadata = person_metadata();
        let converters = ConverterRegistry::new();
        let query = select(&metadata, &converters)
            .where_("name")
            .eq("Ada")
            .unwrap()
            .build()
            .unwrap();

        let people: Vec<Person> = template.select(&query).unwrap();
        assert_eq!(people, vec![ada()]);

        let seen = template.manager.last_select.borrow().clone().unwrap();
        assert_eq!(seen.condition(), Some(&criteria::eq("name", "Ada")));
    }

    #[test]
    fn test_text_query_end_to_end() {
        let mut template = template();
        template.insert(&ada()).unwrap();

        let people: Vec<Person> = template.query("select * from people where age > 30").unwrap();
        assert_eq!(people, vec![ada()]);

        let seen = template.manager.last_select.borrow().clone().unwrap();
        assert_eq!(seen.condition(), Some(&criteria::gt("age", 30i64)));
    }

    #[test]
    fn test_prepared_statement_end_to_end() {
        let mut template = template();
        template.insert(&ada()).unwrap();

        let mut statement = template
            .prepare("select * from people where name = @name")
            .unwrap();
        statement.bind("name", "Ada").unwrap();
        let query = statement.resolve_select().unwrap();

        let people: Vec<Person> = template.select(&query).unwrap();
        assert_eq!(people, vec![ada()]);
    }

    #[test]
    fn test_single_result() {
        let mut template = template();
        let metadata = person_metadata();
        let converters = ConverterRegistry::new();
        let query = select(&metadata, &converters).build().unwrap();

        let none: Option<Person> = template.single_result(&query).unwrap();
        assert!(none.is_none());

        template.insert(&ada()).unwrap();
        let one: Option<Person> = template.single_result(&query).unwrap();
        assert_eq!(one, Some(ada()));

        template
            .insert(&Person {
                id: 2,
                name: "Grace".to_string(),
                age: 45,
            })
            .unwrap();
        let result: EntimapResult<Option<Person>> = template.single_result(&query);
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_count_and_exists() {
        let mut template = template();
        let metadata = person_metadata();
        let converters = ConverterRegistry::new();
        let query = select(&metadata, &converters).build().unwrap();

        assert_eq!(template.count(&query).unwrap(), 0);
        assert!(!template.exists(&query).unwrap());

        template.insert(&ada()).unwrap();
        assert_eq!(template.count(&query).unwrap(), 1);
        assert!(template.exists(&query).unwrap());
    }

    #[test]
    fn test_delete_passes_query_through() {
        let mut template = template();
        let query = DeleteQuery::new("people", vec![], Some(criteria::lt("age", 18i64)));
        template.delete(&query).unwrap();
        assert_eq!(template.manager.last_delete.as_ref(), Some(&query));
    }

    #[test]
    fn test_update_round_trips() {
        let mut template = template();
        let updated = template.update(&ada()).unwrap();
        assert_eq!(updated, ada());
    }

    #[test]
    fn test_query_rejects_delete_text() {
        let template = template();
        let result: EntimapResult<Vec<Person>> = template.query("delete from people");
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_element_round_trip_through_manager() {
        let mut template = template();
        template.insert(&ada()).unwrap();
        let entity = template.manager.rows[0].clone();
        assert_eq!(
            entity.elements(),
            &[
                Element::new("_id", 1i64),
                Element::new("name", "Ada"),
                Element::new("age", 36i32),
            ]
        );
    }
}
