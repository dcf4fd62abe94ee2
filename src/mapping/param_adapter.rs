use crate::common::Value;
use crate::errors::{EntimapError, EntimapResult, ErrorKind};
use crate::mapping::converter::{ElementIndex, EntityConverter};
use crate::metadata::{CollectionKind, EntityMetadata, FieldKind, FieldMetadata};

/// Reconstructs the domain value of one field from indexed wire elements,
/// dispatching on the field's mapping kind.
///
/// # Returns
///
/// `Ok(Some(value))` for a present field, `Ok(None)` when the wire carries
/// nothing for it. Absence is meaningful: a merge leaves absent fields
/// untouched, and a parameterized constructor substitutes `Null`.
pub(crate) fn from_elements(
    converter: &EntityConverter,
    field: &FieldMetadata,
    index: &ElementIndex<'_>,
) -> EntimapResult<Option<Value>> {
    match field.kind() {
        FieldKind::Scalar => match index.find(field.physical_name()) {
            None => Ok(None),
            Some(value) => Ok(Some(apply_from_storage(converter, field, value.clone())?)),
        },
        FieldKind::Collection(CollectionKind::Scalar) => {
            match index.find(field.physical_name()) {
                None => Ok(None),
                Some(Value::Null) => Ok(Some(Value::Null)),
                Some(Value::Array(items)) => {
                    let mut restored = Vec::with_capacity(items.len());
                    for item in items {
                        restored.push(apply_from_storage(converter, field, item.clone())?);
                    }
                    Ok(Some(Value::Array(restored)))
                }
                Some(other) => {
                    log::error!(
                        "Collection field {} carries non-array value {}",
                        field.name(),
                        other
                    );
                    Err(EntimapError::new(
                        &format!("Collection field {} carries a non-array value", field.name()),
                        ErrorKind::TypeMismatch,
                    ))
                }
            }
        }
        FieldKind::Embedded => {
            let target = target_metadata(converter, field)?;
            if let Some(Value::Null) = index.find(field.physical_name()) {
                return Ok(Some(Value::Null));
            }
            // Flattened fields are present iff any of the target's element
            // names appear in the parent's element list.
            let present = target
                .fields()
                .iter()
                .any(|f| index.contains(f.physical_name()));
            if !present {
                return Ok(None);
            }
            let instance = converter.instance_from_index(&target, index)?;
            Ok(Some(Value::Object(instance)))
        }
        FieldKind::EntityRef | FieldKind::EmbeddedGroup => {
            let target = target_metadata(converter, field)?;
            match index.find(field.physical_name()) {
                None => Ok(None),
                Some(Value::Null) => Ok(Some(Value::Null)),
                Some(Value::Elements(elements)) => {
                    let nested = ElementIndex::new(elements);
                    let instance = converter.instance_from_index(&target, &nested)?;
                    Ok(Some(Value::Object(instance)))
                }
                Some(other) => {
                    log::error!(
                        "Grouped field {} carries non-nested value {}",
                        field.name(),
                        other
                    );
                    Err(EntimapError::new(
                        &format!("Grouped field {} carries a non-nested value", field.name()),
                        ErrorKind::TypeMismatch,
                    ))
                }
            }
        }
        FieldKind::Collection(CollectionKind::Embeddable) => {
            let target = target_metadata(converter, field)?;
            match index.find(field.physical_name()) {
                None => Ok(None),
                Some(Value::Null) => Ok(Some(Value::Null)),
                Some(value) => match value.as_element_groups() {
                    Some(groups) => {
                        let mut items = Vec::with_capacity(groups.len());
                        for group in groups {
                            let nested = ElementIndex::new(group);
                            let instance = converter.instance_from_index(&target, &nested)?;
                            items.push(Value::Object(instance));
                        }
                        Ok(Some(Value::Array(items)))
                    }
                    None => {
                        log::error!(
                            "Embeddable collection {} carries malformed value {}",
                            field.name(),
                            value
                        );
                        Err(EntimapError::new(
                            &format!(
                                "Embeddable collection {} carries a malformed value",
                                field.name()
                            ),
                            ErrorKind::TypeMismatch,
                        ))
                    }
                },
            }
        }
    }
}

/// Runs the field's attribute converter backwards on a stored value, if one
/// is registered.
pub(crate) fn apply_from_storage(
    converter: &EntityConverter,
    field: &FieldMetadata,
    value: Value,
) -> EntimapResult<Value> {
    match field.converter() {
        Some(id) => converter.converter_registry().get(id)?.from_storage(value),
        None => Ok(value),
    }
}

fn target_metadata(
    converter: &EntityConverter,
    field: &FieldMetadata,
) -> EntimapResult<std::sync::Arc<EntityMetadata>> {
    match field.target_type() {
        Some(target) => converter.registry().get(target),
        None => {
            log::error!("Structural field {} declares no target type", field.name());
            Err(EntimapError::new(
                &format!("Structural field {} declares no target type", field.name()),
                ErrorKind::ObjectMappingError,
            ))
        }
    }
}
