//! Operation parameters to Cedar request context.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::debug;

use crate::converter::convert_schema;
use crate::error::MappingError;
use crate::types::{json_type_name, Attribute, SchemaType};

/// Context attribute holding path parameters.
pub const PATH_PARAMETERS: &str = "pathParameters";
/// Context attribute holding query string parameters.
pub const QUERY_STRING_PARAMETERS: &str = "queryStringParameters";

/// Path and query parameters of one operation, keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterContext {
    pub path_parameters: IndexMap<String, Attribute>,
    pub query_string_parameters: IndexMap<String, Attribute>,
}

impl ParameterContext {
    /// The Cedar context record:
    /// `{ pathParameters: Record, queryStringParameters: Record }`.
    pub fn into_context_type(self) -> SchemaType {
        let mut attributes = IndexMap::with_capacity(2);
        attributes.insert(
            PATH_PARAMETERS.to_string(),
            Attribute::new(SchemaType::Record {
                attributes: self.path_parameters,
            }),
        );
        attributes.insert(
            QUERY_STRING_PARAMETERS.to_string(),
            Attribute::new(SchemaType::Record {
                attributes: self.query_string_parameters,
            }),
        );
        SchemaType::Record { attributes }
    }
}

/// Build the parameter context for an operation's `parameters` list.
///
/// `location` prefixes error paths, e.g. `/users/{id}/get`. `declared` is the
/// document's `components.schemas`, used to resolve `$ref` parameter schemas.
/// Header and cookie parameters are skipped. A repeated name within one location keeps the last
/// definition.
///
/// # Errors
///
/// - `UnsupportedParameterRef` for `$ref` parameters
/// - `MissingParameterFields` when `name`, `in` or `schema` is absent
/// - any `convert_schema` error for the parameter's schema
pub fn build_parameter_context(
    parameters: Option<&Value>,
    location: &str,
    declared: Option<&Map<String, Value>>,
) -> Result<ParameterContext, MappingError> {
    let mut context = ParameterContext::default();
    let Some(parameters) = parameters else {
        return Ok(context);
    };

    let Some(parameters) = parameters.as_array() else {
        return Err(MappingError::UnsupportedSchemaShape {
            name: format!("{}/parameters", location),
            detail: format!("parameters must be an array, got {}", json_type_name(parameters)),
        });
    };

    for (index, parameter) in parameters.iter().enumerate() {
        let path = format!("{}/parameters/{}", location, index);

        if let Some(reference) = parameter.get("$ref") {
            return Err(MappingError::UnsupportedParameterRef {
                path,
                reference: match reference {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                },
            });
        }

        let name = parameter.get("name").and_then(Value::as_str);
        let in_location = parameter.get("in").and_then(Value::as_str);
        let schema = parameter.get("schema");

        let (Some(name), Some(in_location), Some(schema)) = (name, in_location, schema) else {
            let missing = [
                ("name", name.is_none()),
                ("in", in_location.is_none()),
                ("schema", schema.is_none()),
            ]
            .into_iter()
            .filter(|(_, absent)| *absent)
            .map(|(field, _)| field.to_string())
            .collect();
            return Err(MappingError::MissingParameterFields { path, missing });
        };

        let target = match in_location {
            "path" => &mut context.path_parameters,
            "query" => &mut context.query_string_parameters,
            other => {
                debug!(parameter = name, location = other, "skipping parameter");
                continue;
            }
        };

        let ty = convert_schema(name, schema, declared, 0)?;
        let required = parameter
            .get("required")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let attribute = if required {
            Attribute::required(ty)
        } else {
            Attribute::new(ty)
        };
        target.insert(name.to_string(), attribute);
    }

    Ok(context)
}
