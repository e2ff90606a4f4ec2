//! Conversion of OpenAPI schema objects into Cedar schema types.
//!
//! References stay references: a `$ref` to `#/components/schemas/Pet` becomes
//! the common-type reference `Pet` and is never inlined, so conversion cannot
//! loop through reference cycles. The target must be one of the declared
//! reusable schemas. Plain nesting of objects and arrays is bounded by
//! [`MAX_SCHEMA_DEPTH`].

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::MappingError;
use crate::types::{json_type_name, Attribute, SchemaType, SCHEMA_REF_PREFIX};

/// Deepest object/array nesting accepted below a top-level schema.
pub const MAX_SCHEMA_DEPTH: usize = 64;

/// OpenAPI primitive type names and their Cedar equivalents.
///
/// Both numeric kinds collapse to `Long`; Cedar has no floating point type.
const PRIMITIVE_TYPES: [(&str, SchemaType); 4] = [
    ("string", SchemaType::String),
    ("number", SchemaType::Long),
    ("integer", SchemaType::Long),
    ("boolean", SchemaType::Boolean),
];

const COMPOSITION_KEYWORDS: &[&str] = &["oneOf", "anyOf", "allOf"];

/// Convert every reusable schema into a Cedar common type, keeping declaration order.
///
/// # Errors
///
/// Returns the first conversion error encountered.
pub fn convert_common_types(
    schemas: &Map<String, Value>,
) -> Result<IndexMap<String, SchemaType>, MappingError> {
    let mut common_types = IndexMap::with_capacity(schemas.len());
    for (name, schema) in schemas {
        let converted = convert_schema(name, schema, Some(schemas), 0)?;
        debug!(common_type = %name, "converted reusable schema");
        common_types.insert(name.clone(), converted);
    }
    Ok(common_types)
}

/// Convert one OpenAPI schema node.
///
/// `name` identifies the node in error messages; nested properties extend it
/// as `Parent.property` and array items as `Parent[]`. `declared` holds the
/// document's `components.schemas`, which every `$ref` must point into.
///
/// # Errors
///
/// - `UnsupportedRef` for any `$ref` other than `#/components/schemas/<Name>`
///   with `<Name>` declared
/// - `MissingArrayItems` for an array without `items`
/// - `UnsupportedSchemaShape` for compositions, unknown types, or nodes with
///   neither `type` nor `$ref`
/// - `DepthExceeded` past [`MAX_SCHEMA_DEPTH`]
pub fn convert_schema(
    name: &str,
    node: &Value,
    declared: Option<&Map<String, Value>>,
    depth: usize,
) -> Result<SchemaType, MappingError> {
    if depth > MAX_SCHEMA_DEPTH {
        return Err(MappingError::DepthExceeded {
            name: name.to_string(),
            limit: MAX_SCHEMA_DEPTH,
        });
    }

    let Some(map) = node.as_object() else {
        return Err(unsupported(
            name,
            format!("expected a schema object, got {}", json_type_name(node)),
        ));
    };

    if let Some(reference) = map.get("$ref") {
        return convert_reference(name, reference, declared);
    }

    match map.get("type") {
        Some(Value::String(ty)) => match ty.as_str() {
            "object" => convert_object(name, map, declared, depth),
            "array" => {
                let items = map.get("items").ok_or_else(|| MappingError::MissingArrayItems {
                    name: name.to_string(),
                })?;
                let element =
                    convert_schema(&format!("{}[]", name), items, declared, depth + 1)?;
                Ok(SchemaType::set_of(element))
            }
            other => primitive_type(other)
                .ok_or_else(|| unsupported(name, format!("type {} is not supported", other))),
        },
        Some(other) => Err(unsupported(
            name,
            format!("type must be a string, got {}", json_type_name(other)),
        )),
        None => {
            let detail = match COMPOSITION_KEYWORDS.iter().find(|k| map.contains_key(**k)) {
                Some(keyword) => format!("{} compositions are not supported", keyword),
                None => "it neither has a type nor a $ref".to_string(),
            };
            Err(unsupported(name, detail))
        }
    }
}

/// Name referenced by a `#/components/schemas/<Name>` pointer.
pub fn referenced_schema_name(reference: &str) -> Option<&str> {
    reference
        .strip_prefix(SCHEMA_REF_PREFIX)
        .filter(|rest| !rest.is_empty() && !rest.contains('/'))
}

fn convert_reference(
    name: &str,
    reference: &Value,
    declared: Option<&Map<String, Value>>,
) -> Result<SchemaType, MappingError> {
    reference
        .as_str()
        .and_then(referenced_schema_name)
        .filter(|target| declared.is_some_and(|schemas| schemas.contains_key(*target)))
        .map(SchemaType::reference)
        .ok_or_else(|| MappingError::UnsupportedRef {
            name: name.to_string(),
            reference: match reference {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        })
}

/// Object properties become optional record attributes; the schema's
/// `required` list is not carried over.
fn convert_object(
    name: &str,
    map: &Map<String, Value>,
    declared: Option<&Map<String, Value>>,
    depth: usize,
) -> Result<SchemaType, MappingError> {
    let properties = match map.get("properties") {
        None => return Ok(SchemaType::empty_record()),
        Some(Value::Object(properties)) => properties,
        Some(other) => {
            return Err(unsupported(
                name,
                format!("properties must be an object, got {}", json_type_name(other)),
            ))
        }
    };

    let mut attributes = IndexMap::with_capacity(properties.len());
    for (property, schema) in properties {
        let converted =
            convert_schema(&format!("{}.{}", name, property), schema, declared, depth + 1)?;
        attributes.insert(property.clone(), Attribute::new(converted));
    }
    Ok(SchemaType::Record { attributes })
}

fn primitive_type(ty: &str) -> Option<SchemaType> {
    PRIMITIVE_TYPES
        .iter()
        .find(|(openapi, _)| *openapi == ty)
        .map(|(_, cedar)| cedar.clone())
}

fn unsupported(name: &str, detail: String) -> MappingError {
    MappingError::UnsupportedSchemaShape {
        name: name.to_string(),
        detail,
    }
}
