//! Schema assembly - turns a whole OpenAPI document into Cedar schemas.
//!
//! Assembly builds one [`NormalizedSchema`] and serializes it through two
//! projections, so the legacy and annotated documents can only differ in
//! their annotations:
//!
//! | Projection    | Namespace `annotations` | Action `annotations`             |
//! |---------------|-------------------------|----------------------------------|
//! | [`legacy`]    | -                       | -                                |
//! | [`annotated`] | `mappingType`           | `httpVerb`, `httpPathTemplate`   |
//!
//! [`legacy`]: AuthMapping::legacy
//! [`annotated`]: AuthMapping::annotated

use indexmap::{IndexMap, IndexSet};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::base_path::resolve_base_path;
use crate::converter::convert_common_types;
use crate::document::ApiDocument;
use crate::error::MappingError;
use crate::namespace::validate_namespace;
use crate::operation::{map_operation, path_operations, MappedAction};
use crate::types::{
    ActionAnnotations, ActionDefinition, EntityTypeDefinition, MappingOptions, MappingType,
    SchemaType, ANY_METHOD_KEY, APPLICATION_ENTITY, USER_ENTITY, USER_GROUP_ENTITY,
};

/// Annotation-free content shared by both output documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSchema {
    pub namespace: String,
    pub mapping_type: MappingType,
    pub base_path: String,
    pub entity_types: IndexMap<String, EntityTypeDefinition>,
    /// Actions keyed by name; the annotations are only emitted by the annotated projection.
    pub actions: IndexMap<String, MappedAction>,
    pub common_types: IndexMap<String, SchemaType>,
}

/// Result of mapping an API description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthMapping {
    schema: NormalizedSchema,
}

impl AuthMapping {
    pub fn mapping_type(&self) -> MappingType {
        self.schema.mapping_type
    }

    pub fn schema(&self) -> &NormalizedSchema {
        &self.schema
    }

    /// Schema without annotations, accepted by Cedar 2.x and 3.x.
    pub fn legacy(&self) -> SchemaDocument<'_> {
        SchemaDocument {
            schema: &self.schema,
            annotated: false,
        }
    }

    /// Schema with mapping annotations, for Cedar 4.x.
    pub fn annotated(&self) -> SchemaDocument<'_> {
        SchemaDocument {
            schema: &self.schema,
            annotated: true,
        }
    }

    /// Pretty-printed legacy schema.
    pub fn legacy_json(&self) -> Result<String, MappingError> {
        to_pretty_json(&self.legacy())
    }

    /// Pretty-printed annotated schema.
    pub fn annotated_json(&self) -> Result<String, MappingError> {
        to_pretty_json(&self.annotated())
    }
}

/// One serializable projection of a [`NormalizedSchema`].
#[derive(Debug, Clone, Copy)]
pub struct SchemaDocument<'a> {
    schema: &'a NormalizedSchema,
    annotated: bool,
}

impl SchemaDocument<'_> {
    /// The projection as a JSON value.
    pub fn to_value(&self) -> Result<Value, MappingError> {
        serde_json::to_value(self).map_err(|source| MappingError::Serialize { source })
    }
}

#[derive(Serialize)]
struct NamespaceView<'a> {
    #[serde(rename = "entityTypes")]
    entity_types: &'a IndexMap<String, EntityTypeDefinition>,
    actions: IndexMap<&'a str, ActionView<'a>>,
    #[serde(rename = "commonTypes")]
    common_types: &'a IndexMap<String, SchemaType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    annotations: Option<NamespaceAnnotations>,
}

#[derive(Serialize)]
struct ActionView<'a> {
    #[serde(rename = "appliesTo")]
    applies_to: &'a ActionDefinition,
    #[serde(skip_serializing_if = "Option::is_none")]
    annotations: Option<&'a ActionAnnotations>,
}

#[derive(Serialize)]
struct NamespaceAnnotations {
    #[serde(rename = "mappingType")]
    mapping_type: MappingType,
}

impl Serialize for SchemaDocument<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let schema = self.schema;
        let actions = schema
            .actions
            .iter()
            .map(|(name, action)| {
                let view = ActionView {
                    applies_to: &action.definition,
                    annotations: self.annotated.then_some(&action.annotations),
                };
                (name.as_str(), view)
            })
            .collect();

        let body = NamespaceView {
            entity_types: &schema.entity_types,
            actions,
            common_types: &schema.common_types,
            annotations: self.annotated.then_some(NamespaceAnnotations {
                mapping_type: schema.mapping_type,
            }),
        };

        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&schema.namespace, &body)?;
        map.end()
    }
}

/// Generate the Cedar schemas for an OpenAPI document.
///
/// # Errors
///
/// Returns the first `MappingError` hit; no partial output is produced.
///
/// # Example
///
/// ```
/// use cedar_openapi_schema::{generate_schema, MappingOptions};
/// use serde_json::json;
///
/// let spec = json!({
///     "openapi": "3.0.0",
///     "servers": [{ "url": "https://api.example.com/v1" }],
///     "paths": {
///         "/pets": { "get": { "operationId": "listPets" } }
///     }
/// });
///
/// let mapping = generate_schema(&spec, &MappingOptions::new("PetStore")).unwrap();
/// let annotated = mapping.annotated().to_value().unwrap();
///
/// let action = &annotated["PetStore"]["actions"]["listPets"];
/// assert_eq!(action["appliesTo"]["resourceTypes"][0], "Application");
/// assert_eq!(action["annotations"]["httpPathTemplate"], "/v1/pets");
/// ```
pub fn generate_schema(
    spec: &Value,
    options: &MappingOptions,
) -> Result<AuthMapping, MappingError> {
    let document = ApiDocument::from_value(spec)?;
    validate_namespace(&options.namespace)?;
    let base_path = resolve_base_path(&document.server_urls()?, options.base_path.as_deref())?;

    let mut entity_types = seeded_entity_types();
    let mut actions: IndexMap<String, MappedAction> = IndexMap::new();
    let mut pending_resources: IndexSet<String> = IndexSet::new();

    for (path_template, path_item) in document.paths() {
        let Some(path_item) = path_item.as_object() else {
            debug!(path = %path_template, "skipping non-object path item");
            continue;
        };

        let operations = path_operations(path_item);
        if operations.is_empty() && path_item.contains_key(ANY_METHOD_KEY) {
            warn!(
                path = %path_template,
                "path declares {} without explicit operations; no actions generated",
                ANY_METHOD_KEY
            );
        }

        for (verb, operation) in operations {
            let action =
                map_operation(verb, path_template, &base_path, operation, document.schemas())?;
            debug!(action = %action.name, verb = %verb, path = %path_template, "mapped operation");

            for resource_type in &action.definition.resource_types {
                let local_name = unqualified(resource_type);
                if !entity_types.contains_key(local_name) {
                    pending_resources.insert(local_name.to_string());
                }
            }

            if actions.contains_key(&action.name) {
                warn!(action = %action.name, path = %path_template, verb = %verb, "duplicate action name; last definition wins");
            }
            actions.insert(action.name.clone(), action);
        }
    }

    let common_types = match document.schemas() {
        Some(schemas) => convert_common_types(schemas)?,
        None => IndexMap::new(),
    };

    if document.has_schema(USER_ENTITY) {
        if let Some(user) = entity_types.get_mut(USER_ENTITY) {
            user.shape = SchemaType::reference(USER_ENTITY);
        }
    }

    for resource in pending_resources {
        let shape = if document.has_schema(&resource) {
            SchemaType::reference(resource.as_str())
        } else {
            SchemaType::empty_record()
        };
        entity_types
            .entry(resource)
            .or_insert(EntityTypeDefinition {
                shape,
                member_of_types: Some(Vec::new()),
            });
    }

    info!(
        namespace = %options.namespace,
        base_path = %base_path,
        actions = actions.len(),
        entity_types = entity_types.len(),
        common_types = common_types.len(),
        "generated Cedar schema"
    );

    Ok(AuthMapping {
        schema: NormalizedSchema {
            namespace: options.namespace.clone(),
            mapping_type: options.mapping_type,
            base_path,
            entity_types,
            actions,
            common_types,
        },
    })
}

fn seeded_entity_types() -> IndexMap<String, EntityTypeDefinition> {
    let mut entity_types = IndexMap::new();
    entity_types.insert(
        USER_ENTITY.to_string(),
        EntityTypeDefinition {
            shape: SchemaType::empty_record(),
            member_of_types: Some(vec![USER_GROUP_ENTITY.to_string()]),
        },
    );
    entity_types.insert(USER_GROUP_ENTITY.to_string(), EntityTypeDefinition::empty());
    entity_types.insert(APPLICATION_ENTITY.to_string(), EntityTypeDefinition::empty());
    entity_types
}

/// Last `::` segment of a possibly namespace-qualified type name.
fn unqualified(type_name: &str) -> &str {
    type_name.rsplit("::").next().unwrap_or(type_name)
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, MappingError> {
    serde_json::to_string_pretty(value).map_err(|source| MappingError::Serialize { source })
}
