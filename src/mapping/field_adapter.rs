use crate::common::{Element, Value};
use crate::errors::{EntimapError, EntimapResult, ErrorKind};
use crate::mapping::converter::EntityConverter;
use crate::metadata::{CollectionKind, FieldKind, FieldMetadata};
use smallvec::SmallVec;

/// Element buffer for one field; embedded fields are the only kind producing
/// more than one element, and rarely many.
pub(crate) type ElementBuf = SmallVec<[Element; 4]>;

/// Maps one domain field value into its wire elements, dispatching on the
/// field's mapping kind.
///
/// An absent field behaves like an explicit `Null` on the way out: every kind
/// except `Embedded` produces a single null-valued element, and an embedded
/// null collapses to one null element under the field's physical name.
pub(crate) fn to_elements(
    converter: &EntityConverter,
    field: &FieldMetadata,
    value: Option<&Value>,
) -> EntimapResult<ElementBuf> {
    let value = value.cloned().unwrap_or(Value::Null);
    let mut buf = ElementBuf::new();

    match field.kind() {
        FieldKind::Scalar => {
            if value.as_object().is_some() {
                log::error!(
                    "Scalar field {} received a nested object",
                    field.name()
                );
                return Err(EntimapError::new(
                    &format!("Scalar field {} received a nested object", field.name()),
                    ErrorKind::TypeMismatch,
                ));
            }
            let stored = apply_to_storage(converter, field, value)?;
            buf.push(Element::new(field.physical_name(), stored));
        }
        FieldKind::Collection(CollectionKind::Scalar) => match value {
            Value::Null => buf.push(Element::new(field.physical_name(), Value::Null)),
            Value::Array(items) => {
                let mut stored = Vec::with_capacity(items.len());
                for item in items {
                    stored.push(apply_to_storage(converter, field, item)?);
                }
                buf.push(Element::new(field.physical_name(), Value::Array(stored)));
            }
            other => {
                log::error!(
                    "Collection field {} received non-array value {}",
                    field.name(),
                    other
                );
                return Err(EntimapError::new(
                    &format!("Collection field {} received a non-array value", field.name()),
                    ErrorKind::TypeMismatch,
                ));
            }
        },
        FieldKind::Embedded => match value {
            Value::Null => buf.push(Element::new(field.physical_name(), Value::Null)),
            Value::Object(instance) => {
                buf.extend(converter.instance_elements(&instance)?);
            }
            other => {
                log::error!(
                    "Embedded field {} received non-object value {}",
                    field.name(),
                    other
                );
                return Err(EntimapError::new(
                    &format!("Embedded field {} received a non-object value", field.name()),
                    ErrorKind::TypeMismatch,
                ));
            }
        },
        FieldKind::EntityRef | FieldKind::EmbeddedGroup => match value {
            Value::Null => buf.push(Element::new(field.physical_name(), Value::Null)),
            Value::Object(instance) => {
                let nested = converter.instance_elements(&instance)?;
                buf.push(Element::new(
                    field.physical_name(),
                    Value::Elements(nested),
                ));
            }
            other => {
                log::error!(
                    "Grouped field {} received non-object value {}",
                    field.name(),
                    other
                );
                return Err(EntimapError::new(
                    &format!("Grouped field {} received a non-object value", field.name()),
                    ErrorKind::TypeMismatch,
                ));
            }
        },
        FieldKind::Collection(CollectionKind::Embeddable) => match value {
            Value::Null => buf.push(Element::new(field.physical_name(), Value::Null)),
            Value::Array(items) => {
                let mut groups = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::Object(instance) => {
                            groups.push(Value::Elements(converter.instance_elements(&instance)?));
                        }
                        other => {
                            log::error!(
                                "Embeddable collection {} received non-object item {}",
                                field.name(),
                                other
                            );
                            return Err(EntimapError::new(
                                &format!(
                                    "Embeddable collection {} received a non-object item",
                                    field.name()
                                ),
                                ErrorKind::TypeMismatch,
                            ));
                        }
                    }
                }
                buf.push(Element::new(field.physical_name(), Value::Array(groups)));
            }
            other => {
                log::error!(
                    "Embeddable collection {} received non-array value {}",
                    field.name(),
                    other
                );
                return Err(EntimapError::new(
                    &format!(
                        "Embeddable collection {} received a non-array value",
                        field.name()
                    ),
                    ErrorKind::TypeMismatch,
                ));
            }
        },
    }

    Ok(buf)
}

/// Runs the field's attribute converter on a scalar value, if one is
/// registered. Null passes through converters unchanged only when the
/// converter says so; the registry lookup itself fails fast on a dangling id.
pub(crate) fn apply_to_storage(
    converter: &EntityConverter,
    field: &FieldMetadata,
    value: Value,
) -> EntimapResult<Value> {
    match field.converter() {
        Some(id) => converter.converter_registry().get(id)?.to_storage(value),
        None => Ok(value),
    }
}
