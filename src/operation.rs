//! Mapping of individual OpenAPI operations to Cedar actions.

use serde_json::{Map, Value};

use crate::base_path::join_base_path;
use crate::error::MappingError;
use crate::parameters::build_parameter_context;
use crate::types::{
    json_type_name, ActionAnnotations, ActionDefinition, HttpVerb, ANY_METHOD_KEY,
    APPLICATION_ENTITY, APPLIES_TO_RESOURCE_TYPES, CEDAR_EXTENSION_KEY, USER_ENTITY,
};

/// One Cedar action derived from an operation, plus its presentation annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedAction {
    pub name: String,
    pub definition: ActionDefinition,
    pub annotations: ActionAnnotations,
}

/// Operations of a path item that produce actions, in mapping order.
///
/// Keys that are not supported verbs are ignored. When the path item carries
/// the any-method key, the verb list becomes every supported verb and each is
/// looked up directly; the any-method operation itself is not used.
pub fn path_operations(path_item: &Map<String, Value>) -> Vec<(HttpVerb, &Value)> {
    let verbs: Vec<HttpVerb> = if path_item.contains_key(ANY_METHOD_KEY) {
        HttpVerb::ALL.to_vec()
    } else {
        path_item
            .keys()
            .filter_map(|key| HttpVerb::parse(key))
            .collect()
    };

    verbs
        .into_iter()
        .filter_map(|verb| {
            path_item
                .get(verb.as_str())
                .filter(|operation| operation.is_object())
                .map(|operation| (verb, operation))
        })
        .collect()
}

/// Map one operation to a Cedar action.
///
/// The annotated path template is `path_template` prefixed with `base_path`.
/// Parameter schemas may reference the reusable schemas in `declared`.
///
/// # Errors
///
/// Returns `MappingError::InvalidCedarExtension` for a malformed `x-cedar`
/// extension and any parameter mapping error.
pub fn map_operation(
    verb: HttpVerb,
    path_template: &str,
    base_path: &str,
    operation: &Value,
    declared: Option<&Map<String, Value>>,
) -> Result<MappedAction, MappingError> {
    let name = action_name(verb, path_template, operation);
    let resource_types = resource_types(&name, operation)?;
    let context = build_parameter_context(
        operation.get("parameters"),
        &format!("{}/{}", path_template, verb),
        declared,
    )?;

    Ok(MappedAction {
        definition: ActionDefinition {
            principal_types: vec![USER_ENTITY.to_string()],
            resource_types,
            context: context.into_context_type(),
        },
        annotations: ActionAnnotations {
            http_verb: verb,
            http_path_template: join_base_path(base_path, path_template),
        },
        name,
    })
}

/// The operation id when declared, otherwise `"<verb> <path template>"`.
pub fn action_name(verb: HttpVerb, path_template: &str, operation: &Value) -> String {
    operation
        .get("operationId")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .unwrap_or_else(|| format!("{} {}", verb, path_template))
}

/// Resource types from `x-cedar.appliesToResourceTypes`, defaulting to `Application`.
///
/// # Errors
///
/// Returns `MappingError::InvalidCedarExtension` if the extension is not an
/// object, or the list is not a non-empty array of strings.
pub fn resource_types(action: &str, operation: &Value) -> Result<Vec<String>, MappingError> {
    let default = || vec![APPLICATION_ENTITY.to_string()];

    let Some(extension) = operation.get(CEDAR_EXTENSION_KEY) else {
        return Ok(default());
    };
    let Some(extension) = extension.as_object() else {
        return Err(invalid_extension(
            action,
            format!("expected an object, got {}", json_type_name(extension)),
        ));
    };
    let Some(listed) = extension.get(APPLIES_TO_RESOURCE_TYPES) else {
        return Ok(default());
    };
    let Some(listed) = listed.as_array() else {
        return Err(invalid_extension(
            action,
            format!(
                "{} must be an array, got {}",
                APPLIES_TO_RESOURCE_TYPES,
                json_type_name(listed)
            ),
        ));
    };
    if listed.is_empty() {
        return Err(invalid_extension(
            action,
            format!("{} must not be empty", APPLIES_TO_RESOURCE_TYPES),
        ));
    }

    listed
        .iter()
        .map(|value| {
            value.as_str().map(String::from).ok_or_else(|| {
                invalid_extension(
                    action,
                    format!(
                        "{} entries must be strings, got {}",
                        APPLIES_TO_RESOURCE_TYPES,
                        json_type_name(value)
                    ),
                )
            })
        })
        .collect()
}

fn invalid_extension(action: &str, detail: String) -> MappingError {
    MappingError::InvalidCedarExtension {
        action: action.to_string(),
        detail,
    }
}
