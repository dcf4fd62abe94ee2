use crate::common::{Element, MappedEntity, ObjectInstance, Value};
use crate::entity::CommunicationEntity;
use crate::errors::{EntimapError, EntimapResult, ErrorKind};
use crate::mapping::{field_adapter, param_adapter};
use crate::metadata::{
    ConstructorMetadata, ConverterRegistry, EntityMetadata, MetadataRegistry,
};
use std::sync::Arc;

/// Name-sorted view over one element list for `O(log n)` lookups during
/// reconstruction. Duplicate names resolve to an arbitrary duplicate; the
/// wire form produced by this crate never carries duplicates.
pub(crate) struct ElementIndex<'a> {
    entries: Vec<(&'a str, &'a Value)>,
}

impl<'a> ElementIndex<'a> {
    pub(crate) fn new(elements: &'a [Element]) -> Self {
        let mut entries: Vec<(&'a str, &'a Value)> = elements
            .iter()
            .map(|element| (element.name(), element.value()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        ElementIndex { entries }
    }

    pub(crate) fn find(&self, name: &str) -> Option<&'a Value> {
        self.entries
            .binary_search_by(|(entry_name, _)| entry_name.cmp(&name))
            .ok()
            .map(|position| self.entries[position].1)
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }
}

/// Bidirectional converter between domain object instances and communication
/// entities, driven entirely by registered metadata.
///
/// # Purpose
/// The converter is the heart of the mapping layer. On the way out it walks an
/// [ObjectInstance] field by field, producing wire elements in metadata
/// declaration order, with the inheritance discriminator appended last. On the
/// way in it reconstructs an instance from an entity's elements, honoring the
/// entity's constructor shape and dispatching inheritance roots to the
/// concrete subtype named by the discriminator element.
///
/// # Characteristics
/// - **Metadata driven**: never inspects concrete Rust types; the
///   [MappedEntity] bridge is the only typed seam
/// - **Recursive**: embedded, referenced and grouped sub-objects are converted
///   with the same rules as their parent
/// - **Converter aware**: attribute converters run on scalar values on both
///   directions, per item for scalar collections
pub struct EntityConverter {
    metadata: Arc<MetadataRegistry>,
    converters: Arc<ConverterRegistry>,
}

impl EntityConverter {
    /// Creates a converter over the given metadata and attribute converters.
    pub fn new(metadata: Arc<MetadataRegistry>, converters: Arc<ConverterRegistry>) -> Self {
        EntityConverter {
            metadata,
            converters,
        }
    }

    pub(crate) fn registry(&self) -> &MetadataRegistry {
        &self.metadata
    }

    pub(crate) fn converter_registry(&self) -> &ConverterRegistry {
        &self.converters
    }

    /// Converts a domain instance into its communication entity.
    ///
    /// Elements come out in metadata declaration order; for subtypes the
    /// discriminator element is appended after every field.
    ///
    /// # Errors
    ///
    /// * `EntityNotFound` - no metadata is registered for the instance's type
    /// * `TypeMismatch` - a field value does not match its declared kind
    pub fn to_communication(&self, instance: &ObjectInstance) -> EntimapResult<CommunicationEntity> {
        let metadata = self.metadata.get(instance.type_name())?;
        let elements = self.instance_elements(instance)?;
        Ok(CommunicationEntity::new(metadata.name(), elements))
    }

    /// Converts an instance into its wire element list, discriminator
    /// included. Shared by the top-level path and the nested structural
    /// kinds.
    pub(crate) fn instance_elements(&self, instance: &ObjectInstance) -> EntimapResult<Vec<Element>> {
        let metadata = self.metadata.get(instance.type_name())?;
        let mut elements = Vec::with_capacity(metadata.fields().len() + 1);
        for field in metadata.fields() {
            let buf = field_adapter::to_elements(self, field, instance.get(field.name()))?;
            elements.extend(buf);
        }
        if let Some(inheritance) = metadata.inheritance() {
            elements.push(Element::new(
                inheritance.discriminator_column(),
                inheritance.discriminator_value(),
            ));
        }
        Ok(elements)
    }

    /// Reconstructs a domain instance of the target type from a communication
    /// entity.
    ///
    /// When the target type is an inheritance root, the discriminator element
    /// selects the concrete subtype and the returned instance carries the
    /// subtype's type name.
    ///
    /// # Errors
    ///
    /// * `EntityNotFound` - no metadata is registered for the target type
    /// * `MissingDiscriminator` - the target is an inheritance root but the
    ///   entity carries no usable discriminator element
    /// * `UnknownDiscriminator` - the discriminator value names no registered
    ///   subtype
    pub fn to_instance(
        &self,
        entity: &CommunicationEntity,
        target_type: &str,
    ) -> EntimapResult<ObjectInstance> {
        let metadata = self.resolve_target(entity, target_type)?;
        let index = ElementIndex::new(entity.elements());
        self.instance_from_index(&metadata, &index)
    }

    /// Merges an entity's elements into an existing instance.
    ///
    /// For default-constructed entities the instance is updated in place:
    /// present elements overwrite their fields (an explicit `Null` resets),
    /// absent elements leave their fields untouched. Entities built through a
    /// parameterized constructor are immutable, so the merge reconstructs a
    /// fresh instance from the entity alone.
    pub fn merge(
        &self,
        entity: &CommunicationEntity,
        instance: ObjectInstance,
    ) -> EntimapResult<ObjectInstance> {
        let metadata = self.metadata.get(instance.type_name())?;
        match metadata.constructor() {
            ConstructorMetadata::Parameterized(_) => self.to_instance(entity, instance.type_name()),
            ConstructorMetadata::Default => {
                let mut merged = instance;
                let index = ElementIndex::new(entity.elements());
                for field in metadata.fields() {
                    if let Some(value) = param_adapter::from_elements(self, field, &index)? {
                        merged.set(field.name(), value);
                    }
                }
                Ok(merged)
            }
        }
    }

    /// Converts a typed domain value into its communication entity.
    pub fn to_entity<T: MappedEntity>(&self, value: &T) -> EntimapResult<CommunicationEntity> {
        let instance = value.to_instance()?;
        self.to_communication(&instance)
    }

    /// Reconstructs a typed domain value from a communication entity.
    pub fn to_object<T: MappedEntity>(&self, entity: &CommunicationEntity) -> EntimapResult<T> {
        let instance = self.to_instance(entity, T::TYPE_NAME)?;
        T::from_instance(&instance)
    }

    /// Builds an instance of the given metadata from indexed elements,
    /// honoring the constructor shape.
    pub(crate) fn instance_from_index(
        &self,
        metadata: &EntityMetadata,
        index: &ElementIndex<'_>,
    ) -> EntimapResult<ObjectInstance> {
        match metadata.constructor() {
            ConstructorMetadata::Default => {
                let mut instance = ObjectInstance::new(metadata.type_name());
                for field in metadata.fields() {
                    if let Some(value) = param_adapter::from_elements(self, field, index)? {
                        instance.set(field.name(), value);
                    }
                }
                Ok(instance)
            }
            ConstructorMetadata::Parameterized(params) => {
                let mut instance = ObjectInstance::new(metadata.type_name());
                for param in params {
                    let field = match metadata.field(param.name()) {
                        Some(field) => field,
                        None => {
                            log::error!(
                                "Constructor parameter {} of {} has no field metadata",
                                param.name(),
                                metadata.type_name()
                            );
                            return Err(EntimapError::new(
                                &format!(
                                    "Constructor parameter {} of {} has no field metadata",
                                    param.name(),
                                    metadata.type_name()
                                ),
                                ErrorKind::ObjectMappingError,
                            ));
                        }
                    };
                    let value = param_adapter::from_elements(self, field, index)?
                        .unwrap_or(Value::Null);
                    instance.set(field.name(), value);
                }
                Ok(instance)
            }
        }
    }

    fn resolve_target(
        &self,
        entity: &CommunicationEntity,
        target_type: &str,
    ) -> EntimapResult<Arc<EntityMetadata>> {
        if !self.metadata.is_inheritance_root(target_type) {
            return self.metadata.get(target_type);
        }

        // the root check above guarantees a group exists
        let column = self
            .metadata
            .discriminator_column(target_type)
            .map(|c| c.to_string())
            .unwrap_or_default();
        let discriminator = match entity.find(&column).map(|e| e.value()) {
            Some(Value::String(value)) => value.clone(),
            Some(other) => {
                log::error!(
                    "Discriminator element {} of {} carries non-string value {}",
                    column,
                    entity.name(),
                    other
                );
                return Err(EntimapError::new(
                    &format!(
                        "Discriminator element {} of {} carries a non-string value",
                        column,
                        entity.name()
                    ),
                    ErrorKind::MissingDiscriminator,
                ));
            }
            None => {
                log::error!(
                    "Entity {} carries no discriminator element {}",
                    entity.name(),
                    column
                );
                return Err(EntimapError::new(
                    &format!(
                        "Entity {} carries no discriminator element {}",
                        entity.name(),
                        column
                    ),
                    ErrorKind::MissingDiscriminator,
                ));
            }
        };

        self.metadata
            .resolve_discriminator(target_type, &discriminator)
    }
}
