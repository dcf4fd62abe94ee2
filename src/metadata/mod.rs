pub(crate) mod converter;
pub(crate) mod entity;
pub(crate) mod field;
pub(crate) mod registry;

pub use converter::{AttributeConverter, ConverterRegistry};
pub use entity::{ConstructorMetadata, EntityMetadata, InheritanceMetadata, ParamMetadata};
pub use field::{CollectionKind, FieldKind, FieldMetadata};
pub use registry::MetadataRegistry;
