use crate::metadata::field::FieldMetadata;

/// One constructor parameter of a parameterized (immutable) entity.
///
/// Parameters are matched positionally during reconstruction; each names the
/// field it populates, which is how the parameter adapter finds the element
/// and the mapping kind to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamMetadata {
    name: String,
}

impl ParamMetadata {
    /// Creates a parameter descriptor for the named field.
    pub fn new(name: &str) -> Self {
        ParamMetadata {
            name: name.to_string(),
        }
    }

    /// Returns the field name this parameter populates.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// How instances of an entity are created during reconstruction.
///
/// # Variants
/// - `Default`: mutable entities, instantiated empty then field-assigned;
///   merge mutates the given instance in place and preserves identity
/// - `Parameterized`: immutable entities, built positionally from constructor
///   parameters; merge always reconstructs a fresh instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstructorMetadata {
    /// Instantiate then assign fields one by one.
    Default,
    /// Build through positional constructor parameters.
    Parameterized(Vec<ParamMetadata>),
}

/// Single-table inheritance descriptor of a concrete subtype.
///
/// Entities sharing a `parent_type` form one inheritance group. The group
/// shares a single discriminator column and every subtype claims a distinct
/// discriminator value; both invariants are enforced at registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InheritanceMetadata {
    discriminator_column: String,
    discriminator_value: String,
    parent_type: String,
}

impl InheritanceMetadata {
    /// Creates an inheritance descriptor.
    ///
    /// # Arguments
    ///
    /// * `discriminator_column` - The shared element name carrying the
    ///   discriminator
    /// * `discriminator_value` - The value identifying this concrete subtype
    /// * `parent_type` - The type name of the inheritance root
    pub fn new(discriminator_column: &str, discriminator_value: &str, parent_type: &str) -> Self {
        InheritanceMetadata {
            discriminator_column: discriminator_column.to_string(),
            discriminator_value: discriminator_value.to_string(),
            parent_type: parent_type.to_string(),
        }
    }

    /// Returns the discriminator element name.
    pub fn discriminator_column(&self) -> &str {
        &self.discriminator_column
    }

    /// Returns the discriminator value of this subtype.
    pub fn discriminator_value(&self) -> &str {
        &self.discriminator_value
    }

    /// Returns the type name of the inheritance root.
    pub fn parent_type(&self) -> &str {
        &self.parent_type
    }
}

/// Read-only descriptor of one mapped entity type.
///
/// Carries the logical (storage) name, the domain type name, the field list in
/// declaration order, the optional id field, the constructor shape and the
/// optional inheritance descriptor. Produced externally, registered in a
/// [crate::metadata::MetadataRegistry] and consumed by the converter, the
/// builders and the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMetadata {
    name: String,
    type_name: String,
    fields: Vec<FieldMetadata>,
    id_field: Option<String>,
    constructor: ConstructorMetadata,
    inheritance: Option<InheritanceMetadata>,
}

impl EntityMetadata {
    /// Creates entity metadata with a default constructor and no inheritance.
    ///
    /// # Arguments
    ///
    /// * `name` - The logical name used on the wire (communication entity
    ///   name)
    /// * `type_name` - The domain type name used for lookup by runtime type
    /// * `fields` - Field descriptors in declaration order
    pub fn new(name: &str, type_name: &str, fields: Vec<FieldMetadata>) -> Self {
        EntityMetadata {
            name: name.to_string(),
            type_name: type_name.to_string(),
            fields,
            id_field: None,
            constructor: ConstructorMetadata::Default,
            inheritance: None,
        }
    }

    /// Declares the id field by logical name.
    pub fn with_id_field(mut self, name: &str) -> Self {
        self.id_field = Some(name.to_string());
        self
    }

    /// Replaces the constructor descriptor.
    pub fn with_constructor(mut self, constructor: ConstructorMetadata) -> Self {
        self.constructor = constructor;
        self
    }

    /// Attaches an inheritance descriptor, marking this type as a concrete
    /// subtype of an inheritance group.
    pub fn with_inheritance(mut self, inheritance: InheritanceMetadata) -> Self {
        self.inheritance = Some(inheritance);
        self
    }

    /// Returns the logical (wire) name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the domain type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns the field descriptors in declaration order.
    pub fn fields(&self) -> &[FieldMetadata] {
        &self.fields
    }

    /// Looks up a field descriptor by logical name.
    pub fn field(&self, name: &str) -> Option<&FieldMetadata> {
        self.fields.iter().find(|field| field.name() == name)
    }

    /// Looks up a field descriptor by physical element name.
    pub fn field_by_physical(&self, physical_name: &str) -> Option<&FieldMetadata> {
        self.fields
            .iter()
            .find(|field| field.physical_name() == physical_name)
    }

    /// Resolves a logical field name to its physical element name.
    ///
    /// Unknown names pass through unchanged; the metadata lookup is a
    /// best-effort mapping and callers may address columns directly.
    pub fn column_name(&self, field_name: &str) -> String {
        match self.field(field_name) {
            Some(field) => field.physical_name().to_string(),
            None => field_name.to_string(),
        }
    }

    /// Returns the id field descriptor, if one is declared.
    pub fn id_field(&self) -> Option<&FieldMetadata> {
        self.id_field.as_deref().and_then(|name| self.field(name))
    }

    /// Returns the constructor descriptor.
    pub fn constructor(&self) -> &ConstructorMetadata {
        &self.constructor
    }

    /// Returns the inheritance descriptor, if this type is a concrete
    /// subtype.
    pub fn inheritance(&self) -> Option<&InheritanceMetadata> {
        self.inheritance.as_ref()
    }
}
