use crate::errors::{EntimapError, EntimapResult, ErrorKind};
use crate::metadata::entity::EntityMetadata;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Discriminator bookkeeping for one inheritance group, keyed by the root
/// type.
#[derive(Default)]
struct InheritanceGroup {
    discriminator_column: String,
    // discriminator value -> concrete subtype name
    subtypes: BTreeMap<String, String>,
}

/// Registry of entity metadata, the lookup capability the core consumes.
///
/// Metadata is produced externally and handed in through [`register`], which
/// is also where configuration invariants are enforced: an attribute
/// converter on a structural field and a duplicate or conflicting
/// discriminator are rejected immediately rather than at conversion time.
///
/// Lookups are by domain type name ([`get`]) or by logical entity name
/// ([`find_by_name`]). Inheritance groups are indexed by their root type so
/// the converter can dispatch a discriminator value to the concrete subtype.
///
/// The registry is read-mostly: populate it during startup, then share it
/// behind an `Arc`.
///
/// [`register`]: MetadataRegistry::register
/// [`get`]: MetadataRegistry::get
/// [`find_by_name`]: MetadataRegistry::find_by_name
#[derive(Default)]
pub struct MetadataRegistry {
    by_type: HashMap<String, Arc<EntityMetadata>>,
    by_name: HashMap<String, String>,
    groups: HashMap<String, InheritanceGroup>,
}

impl MetadataRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        MetadataRegistry {
            by_type: HashMap::new(),
            by_name: HashMap::new(),
            groups: HashMap::new(),
        }
    }

    /// Registers entity metadata, validating its configuration.
    ///
    /// # Errors
    ///
    /// * `ConverterMismatch` - a field carries an attribute converter but has
    ///   a structural kind (embedded, entity reference, group, or embeddable
    ///   collection)
    /// * `ValidationError` - the inheritance descriptor conflicts with its
    ///   group: a different discriminator column than the group's, or a
    ///   discriminator value already claimed by another subtype
    pub fn register(&mut self, metadata: EntityMetadata) -> EntimapResult<()> {
        for field in metadata.fields() {
            if field.converter().is_some() && field.kind().is_structural() {
                log::error!(
                    "Field {} of {} has kind {:?} and cannot carry an attribute converter",
                    field.name(),
                    metadata.type_name(),
                    field.kind()
                );
                return Err(EntimapError::new(
                    &format!(
                        "Field {} of {} cannot carry an attribute converter",
                        field.name(),
                        metadata.type_name()
                    ),
                    ErrorKind::ConverterMismatch,
                ));
            }
        }

        if let Some(inheritance) = metadata.inheritance() {
            let group = self
                .groups
                .entry(inheritance.parent_type().to_string())
                .or_default();

            if group.subtypes.is_empty() {
                group.discriminator_column = inheritance.discriminator_column().to_string();
            } else if group.discriminator_column != inheritance.discriminator_column() {
                log::error!(
                    "Inheritance group {} already uses discriminator column {}",
                    inheritance.parent_type(),
                    group.discriminator_column
                );
                return Err(EntimapError::new(
                    &format!(
                        "Inheritance group {} already uses discriminator column {}",
                        inheritance.parent_type(),
                        group.discriminator_column
                    ),
                    ErrorKind::ValidationError,
                ));
            }

            if group
                .subtypes
                .contains_key(inheritance.discriminator_value())
            {
                log::error!(
                    "Discriminator value {} is already registered in group {}",
                    inheritance.discriminator_value(),
                    inheritance.parent_type()
                );
                return Err(EntimapError::new(
                    &format!(
                        "Discriminator value {} is already registered in group {}",
                        inheritance.discriminator_value(),
                        inheritance.parent_type()
                    ),
                    ErrorKind::ValidationError,
                ));
            }

            group.subtypes.insert(
                inheritance.discriminator_value().to_string(),
                metadata.type_name().to_string(),
            );
        }

        self.by_name
            .insert(metadata.name().to_string(), metadata.type_name().to_string());
        self.by_type
            .insert(metadata.type_name().to_string(), Arc::new(metadata));
        Ok(())
    }

    /// Looks up metadata by domain type name.
    pub fn get(&self, type_name: &str) -> EntimapResult<Arc<EntityMetadata>> {
        match self.by_type.get(type_name) {
            Some(metadata) => Ok(Arc::clone(metadata)),
            None => {
                log::error!("No entity metadata registered for type {}", type_name);
                Err(EntimapError::new(
                    &format!("No entity metadata registered for type {}", type_name),
                    ErrorKind::EntityNotFound,
                ))
            }
        }
    }

    /// Looks up metadata by logical entity name.
    pub fn find_by_name(&self, name: &str) -> EntimapResult<Arc<EntityMetadata>> {
        match self.by_name.get(name) {
            Some(type_name) => self.get(type_name),
            None => {
                log::error!("No entity metadata registered under name {}", name);
                Err(EntimapError::new(
                    &format!("No entity metadata registered under name {}", name),
                    ErrorKind::EntityNotFound,
                ))
            }
        }
    }

    /// Checks whether the type is the root of a registered inheritance group.
    pub fn is_inheritance_root(&self, type_name: &str) -> bool {
        self.groups.contains_key(type_name)
    }

    /// Returns the discriminator column shared by the group rooted at the
    /// type, if one exists.
    pub fn discriminator_column(&self, root_type: &str) -> Option<&str> {
        self.groups
            .get(root_type)
            .map(|group| group.discriminator_column.as_str())
    }

    /// Resolves a discriminator value to the concrete subtype metadata of the
    /// group rooted at the type.
    ///
    /// # Errors
    ///
    /// * `UnknownDiscriminator` - the value is not registered in the group
    pub fn resolve_discriminator(
        &self,
        root_type: &str,
        discriminator_value: &str,
    ) -> EntimapResult<Arc<EntityMetadata>> {
        let group = match self.groups.get(root_type) {
            Some(group) => group,
            None => {
                log::error!("Type {} is not an inheritance root", root_type);
                return Err(EntimapError::new(
                    &format!("Type {} is not an inheritance root", root_type),
                    ErrorKind::EntityNotFound,
                ));
            }
        };

        match group.subtypes.get(discriminator_value) {
            Some(type_name) => self.get(type_name),
            None => {
                log::error!(
                    "Discriminator value {} is not registered in group {}",
                    discriminator_value,
                    root_type
                );
                Err(EntimapError::new(
                    &format!(
                        "Discriminator value {} is not registered in group {}",
                        discriminator_value, root_type
                    ),
                    ErrorKind::UnknownDiscriminator,
                ))
            }
        }
    }

    /// Returns the discriminator values registered in the group rooted at the
    /// type, in lexicographic order.
    pub fn discriminator_values(&self, root_type: &str) -> Vec<&str> {
        match self.groups.get(root_type) {
            Some(group) => group.subtypes.keys().map(|value| value.as_str()).collect(),
            None => Vec::new(),
        }
    }
}
