//! Starter policies for a generated schema, checked with `cedar-policy`.

use std::collections::BTreeSet;
use std::str::FromStr;

use cedar_policy::{ParseErrors, PolicySet, Schema, ValidationMode, Validator};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::PolicyError;

/// Group granted every action by the second starter policy; meant to be replaced.
pub const PLACEHOLDER_GROUP: &str = "ENTER_THE_USER_GROUP_HERE";

/// Group granted unrestricted access by the first starter policy.
pub const ADMIN_GROUP: &str = "admin";

/// Parse a Cedar JSON schema.
///
/// # Errors
///
/// Returns `PolicyError::InvalidSchema` with Cedar's diagnostics.
pub fn validate_schema(schema_json: &Value) -> Result<Schema, PolicyError> {
    Schema::from_json_value(schema_json.clone()).map_err(|e| PolicyError::InvalidSchema {
        message: e.to_string(),
    })
}

/// Parse a schema in Cedar's human-readable format.
///
/// # Errors
///
/// Returns `PolicyError::InvalidSchema` with Cedar's diagnostics.
pub fn parse_cedar_schema(text: &str) -> Result<Schema, PolicyError> {
    let (schema, warnings) =
        Schema::from_cedarschema_str(text).map_err(|e| PolicyError::InvalidSchema {
            message: e.to_string(),
        })?;
    for warning in warnings {
        warn!(warning = %warning, "cedar schema warning");
    }
    Ok(schema)
}

/// Parse a schema in either format: text starting with `{` is JSON, anything
/// else is the human-readable format.
///
/// # Errors
///
/// Returns `PolicyError::InvalidSchema` for malformed JSON or a schema Cedar rejects.
pub fn parse_schema(content: &str) -> Result<Schema, PolicyError> {
    if content.trim_start().starts_with('{') {
        let schema_json: Value =
            serde_json::from_str(content).map_err(|e| PolicyError::InvalidSchema {
                message: e.to_string(),
            })?;
        validate_schema(&schema_json)
    } else {
        parse_cedar_schema(content)
    }
}

/// Build the starter policies for a single-namespace Cedar schema.
///
/// Returns the admin policy and, when the schema declares actions, a policy
/// granting a placeholder group every action in lexical order. Each policy is
/// parsed and strictly validated against the schema.
///
/// # Errors
///
/// - `NamespaceCount` unless the schema has exactly one namespace
/// - `PolicyParse` / `PolicyValidation` if a generated policy is rejected
pub fn generate_policies(schema: Schema) -> Result<Vec<String>, PolicyError> {
    let mut namespaces = schema_namespaces(&schema);
    let namespace = match (namespaces.pop_first(), namespaces.is_empty()) {
        (Some(namespace), true) => namespace,
        (first, _) => {
            return Err(PolicyError::NamespaceCount {
                count: namespaces.len() + usize::from(first.is_some()),
            })
        }
    };

    let actions: BTreeSet<String> = schema
        .actions()
        .map(|action| {
            let id: &str = action.id().as_ref();
            id.to_string()
        })
        .collect();
    let actions: Vec<&str> = actions.iter().map(String::as_str).collect();

    let mut policies = vec![admin_policy(&namespace)];
    if !actions.is_empty() {
        policies.push(group_policy(&namespace, &actions));
    }

    let validator = Validator::new(schema);
    for (index, policy) in policies.iter().enumerate() {
        let policy_set = PolicySet::from_str(policy).map_err(|e: ParseErrors| {
            PolicyError::PolicyParse {
                index,
                message: e.to_string(),
            }
        })?;

        let result = validator.validate(&policy_set, ValidationMode::Strict);
        if !result.validation_passed() {
            return Err(PolicyError::PolicyValidation {
                index,
                errors: result
                    .validation_errors()
                    .map(|e| e.to_string())
                    .collect(),
            });
        }
        debug!(index, "starter policy validated");
    }

    Ok(policies)
}

/// Namespaces declaring at least one entity type or action.
fn schema_namespaces(schema: &Schema) -> BTreeSet<String> {
    schema
        .entity_types()
        .map(|entity_type| entity_type.namespace())
        .chain(schema.actions().map(|action| action.type_name().namespace()))
        .collect()
}

fn admin_policy(namespace: &str) -> String {
    format!(
        "// Allows admin usergroup access to everything\n\
         permit (\n    \
             principal in {namespace}::UserGroup::\"{ADMIN_GROUP}\",\n    \
             action,\n    \
             resource\n\
         );\n"
    )
}

fn group_policy(namespace: &str, actions: &[&str]) -> String {
    let action_list = actions
        .iter()
        .map(|action| format!("        {}::Action::\"{}\"", namespace, action.escape_default()))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        "// Allows more granular user group control, change actions as needed\n\
         permit (\n    \
             principal in {namespace}::UserGroup::\"{PLACEHOLDER_GROUP}\",\n    \
             action in [\n{action_list}\n    ],\n    \
             resource\n\
         );\n"
    )
}
