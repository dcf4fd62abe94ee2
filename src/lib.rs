//! Entimap is a mapping layer between typed domain objects and a
//! semistructured, element-based wire representation, together with a query
//! model to address the mapped entities.
//!
//! The crate does not store anything itself: it produces and consumes
//! [CommunicationEntity] values and hands fully resolved queries to a
//! [DatabaseManager] implementation, which is the storage seam.
//!
//! # Building blocks
//!
//! - **Values and elements**: [Value] is the dynamically typed payload,
//!   [Element] a named value, and [ObjectInstance] the reflection-free
//!   runtime form of a domain object. Typed structs plug in through the
//!   [MappedEntity] trait.
//! - **Metadata**: [EntityMetadata] describes how one entity maps onto
//!   elements; a [MetadataRegistry] indexes the descriptors and their
//!   inheritance groups; [AttributeConverter] translates individual values.
//! - **Conversion**: [EntityConverter] walks instances and entities in both
//!   directions, honoring embedded objects, collections, constructor shapes
//!   and single-table inheritance.
//! - **Queries**: [CriteriaCondition] is the condition algebra; the fluent
//!   [select] and [delete] builders and the text [QueryParser] produce
//!   immutable [SelectQuery] and [DeleteQuery] values, with named parameters
//!   served by [PreparedStatement] and cursor pagination by [seek_after] and
//!   friends.
//! - **Template**: [EntityTemplate] is the typed facade gluing the converter
//!   to a manager.
//!
//! # Example
//!
//! ```rust,ignore
//! use entimap::*;
//!
//! let mut registry = MetadataRegistry::new();
//! registry.register(EntityMetadata::new(
//!     "people",
//!     "Person",
//!     vec![
//!         FieldMetadata::scalar("id", "_id"),
//!         FieldMetadata::scalar("name", "name"),
//!     ],
//! ))?;
//!
//! let mut template = EntityTemplate::new(
//!     Arc::new(registry),
//!     Arc::new(ConverterRegistry::new()),
//!     manager,
//! );
//! template.insert(&person)?;
//! let adults: Vec<Person> =
//!     template.query("select * from people where age >= 18")?;
//! ```

pub mod common;
pub mod criteria;
pub mod entity;
pub mod errors;
pub mod manager;
pub mod mapping;
pub mod metadata;
pub mod query;
pub mod template;
pub mod text;

pub use common::{Element, MappedEntity, ObjectInstance, Sort, SortOrder, Value};
pub use criteria::{CombinatorOperator, CriteriaCondition, LeafOperator};
pub use entity::CommunicationEntity;
pub use errors::{EntimapError, EntimapResult, ErrorKind};
pub use manager::DatabaseManager;
pub use mapping::EntityConverter;
pub use metadata::{
    AttributeConverter, CollectionKind, ConstructorMetadata, ConverterRegistry, EntityMetadata,
    FieldKind, FieldMetadata, InheritanceMetadata, MetadataRegistry, ParamMetadata,
};
pub use query::{
    delete, seek_after, seek_before, select, token_from, CursorToken, DeleteQuery,
    DeleteQueryBuilder, SelectQuery, SelectQueryBuilder,
};
pub use template::EntityTemplate;
pub use text::{ParsedQuery, Params, PreparedStatement, QueryParser};
