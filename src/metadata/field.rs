/// The element kind of a mapped collection field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    /// A collection of scalar values, stored as one array element.
    Scalar,
    /// A collection of embeddable objects, stored as one element carrying a
    /// list of element lists.
    Embeddable,
}

/// The mapping kind of a field, driving adapter dispatch.
///
/// This is a closed union: the converter matches on it exhaustively, so a new
/// kind cannot be added without updating every adapter.
///
/// # Variants
/// - `Scalar`: one element carrying the raw (or converter-translated) value
/// - `Embedded`: the sub-object's elements are inlined into the parent list
/// - `EntityRef`: the sub-object's elements are nested under one element
/// - `EmbeddedGroup`: like `EntityRef`, a grouped sub-entity under one element
/// - `Collection`: a collection field, scalar or embeddable per
///   [CollectionKind]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A plain scalar value.
    Scalar,
    /// A nested object whose elements are flattened into the parent.
    Embedded,
    /// A nested object wrapped as a single element.
    EntityRef,
    /// A grouped sub-entity wrapped as a single element.
    EmbeddedGroup,
    /// A collection of scalars or embeddables.
    Collection(CollectionKind),
}

impl FieldKind {
    /// Checks whether this kind maps a nested object structure rather than a
    /// scalar value. Attribute converters are only valid on non-structural
    /// fields.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            FieldKind::Embedded
                | FieldKind::EntityRef
                | FieldKind::EmbeddedGroup
                | FieldKind::Collection(CollectionKind::Embeddable)
        )
    }
}

/// Read-only descriptor of one mapped field.
///
/// Produced by an external metadata source and consumed by the converter and
/// the query builders. Every field has exactly one [FieldKind]; structural
/// kinds additionally name the nested entity type they map to, which is how
/// the converter recurses without reflection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMetadata {
    name: String,
    physical_name: String,
    kind: FieldKind,
    converter: Option<String>,
    target_type: Option<String>,
}

impl FieldMetadata {
    /// Creates a scalar field descriptor.
    ///
    /// # Arguments
    ///
    /// * `name` - The logical field name on the domain object
    /// * `physical_name` - The element name in the communication entity
    pub fn scalar(name: &str, physical_name: &str) -> Self {
        FieldMetadata {
            name: name.to_string(),
            physical_name: physical_name.to_string(),
            kind: FieldKind::Scalar,
            converter: None,
            target_type: None,
        }
    }

    /// Creates an embedded (flattened) field descriptor.
    ///
    /// # Arguments
    ///
    /// * `name` - The logical field name
    /// * `physical_name` - The element name used when the value is null
    /// * `target_type` - The nested entity type name
    pub fn embedded(name: &str, physical_name: &str, target_type: &str) -> Self {
        FieldMetadata {
            name: name.to_string(),
            physical_name: physical_name.to_string(),
            kind: FieldKind::Embedded,
            converter: None,
            target_type: Some(target_type.to_string()),
        }
    }

    /// Creates an entity-reference field descriptor (nested under one
    /// element).
    pub fn entity_ref(name: &str, physical_name: &str, target_type: &str) -> Self {
        FieldMetadata {
            name: name.to_string(),
            physical_name: physical_name.to_string(),
            kind: FieldKind::EntityRef,
            converter: None,
            target_type: Some(target_type.to_string()),
        }
    }

    /// Creates a grouped sub-entity field descriptor (nested under one
    /// element).
    pub fn embedded_group(name: &str, physical_name: &str, target_type: &str) -> Self {
        FieldMetadata {
            name: name.to_string(),
            physical_name: physical_name.to_string(),
            kind: FieldKind::EmbeddedGroup,
            converter: None,
            target_type: Some(target_type.to_string()),
        }
    }

    /// Creates a collection field descriptor.
    ///
    /// # Arguments
    ///
    /// * `name` - The logical field name
    /// * `physical_name` - The element name
    /// * `kind` - Whether the items are scalars or embeddables
    /// * `target_type` - The item entity type for embeddable collections
    pub fn collection(
        name: &str,
        physical_name: &str,
        kind: CollectionKind,
        target_type: Option<&str>,
    ) -> Self {
        FieldMetadata {
            name: name.to_string(),
            physical_name: physical_name.to_string(),
            kind: FieldKind::Collection(kind),
            converter: None,
            target_type: target_type.map(|t| t.to_string()),
        }
    }

    /// Attaches an attribute converter id to this field.
    ///
    /// Registration of the enclosing entity fails with a configuration error
    /// if the field is structural.
    pub fn with_converter(mut self, converter_id: &str) -> Self {
        self.converter = Some(converter_id.to_string());
        self
    }

    /// Returns the logical field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the physical element name.
    pub fn physical_name(&self) -> &str {
        &self.physical_name
    }

    /// Returns the mapping kind.
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Returns the attribute converter id, if one is registered.
    pub fn converter(&self) -> Option<&str> {
        self.converter.as_deref()
    }

    /// Returns the nested entity type name for structural fields.
    pub fn target_type(&self) -> Option<&str> {
        self.target_type.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_field() {
        let field = FieldMetadata::scalar("name", "name");
        assert_eq!(field.kind(), FieldKind::Scalar);
        assert!(!field.kind().is_structural());
        assert!(field.converter().is_none());
        assert!(field.target_type().is_none());
    }

    #[test]
    fn test_structural_kinds() {
        assert!(FieldMetadata::embedded("a", "a", "Address")
            .kind()
            .is_structural());
        assert!(FieldMetadata::entity_ref("a", "a", "Address")
            .kind()
            .is_structural());
        assert!(FieldMetadata::embedded_group("a", "a", "Address")
            .kind()
            .is_structural());
        assert!(
            FieldMetadata::collection("a", "a", CollectionKind::Embeddable, Some("Address"))
                .kind()
                .is_structural()
        );
        assert!(
            !FieldMetadata::collection("a", "a", CollectionKind::Scalar, None)
                .kind()
                .is_structural()
        );
    }

    #[test]
    fn test_with_converter() {
        let field = FieldMetadata::scalar("active", "active").with_converter("bool_to_flag");
        assert_eq!(field.converter(), Some("bool_to_flag"));
    }

    #[test]
    fn test_physical_name() {
        let field = FieldMetadata::scalar("id", "_id");
        assert_eq!(field.name(), "id");
        assert_eq!(field.physical_name(), "_id");
    }
}
