//! OpenAPI to Cedar Schema
//!
//! Derives a Cedar authorization schema (entity types, actions and per-action
//! context) from an OpenAPI 3 description, so an existing HTTP API can be put
//! behind Cedar policies without hand-writing its schema.
//!
//! # Example
//!
//! ```
//! use cedar_openapi_schema::{generate_schema, MappingOptions};
//! use serde_json::json;
//!
//! let spec = json!({
//!     "openapi": "3.0.0",
//!     "paths": {
//!         "/users/{id}": {
//!             "get": {
//!                 "operationId": "getUserById",
//!                 "x-cedar": { "appliesToResourceTypes": ["User"] },
//!                 "parameters": [
//!                     { "name": "id", "in": "path", "required": true, "schema": { "type": "string" } }
//!                 ]
//!             }
//!         }
//!     }
//! });
//!
//! let mapping = generate_schema(&spec, &MappingOptions::new("TestAPI")).unwrap();
//! let schema = mapping.legacy().to_value().unwrap();
//!
//! let action = &schema["TestAPI"]["actions"]["getUserById"]["appliesTo"];
//! assert_eq!(action["resourceTypes"], json!(["User"]));
//! assert_eq!(
//!     action["context"]["attributes"]["pathParameters"]["attributes"]["id"],
//!     json!({ "type": "String", "required": true })
//! );
//! ```
//!
//! # Mapping Rules (`SimpleRest`)
//!
//! | OpenAPI                                   | Cedar                                        |
//! |-------------------------------------------|----------------------------------------------|
//! | `operationId`                             | action name                                  |
//! | no `operationId`                          | action name `"<verb> <path template>"`       |
//! | `x-cedar.appliesToResourceTypes`          | action resource types (default `Application`)|
//! | path / query parameters                   | `context.pathParameters` / `context.queryStringParameters` |
//! | `components.schemas`                      | common types                                 |
//! | `servers[].url`                           | base path of annotated `httpPathTemplate`    |
//!
//! Every action applies to principals of type `User`, which is a member of
//! `UserGroup`.
//!
//! # Outputs
//!
//! Two documents with the same entity types, actions and common types:
//! [`AuthMapping::legacy`] without annotations (Cedar 2.x/3.x), and
//! [`AuthMapping::annotated`] carrying the mapping type and each action's
//! HTTP verb and path template (Cedar 4.x).

mod assembler;
mod base_path;
mod converter;
mod document;
mod error;
mod loader;
mod namespace;
mod operation;
mod parameters;
mod policy;
mod types;

pub use assembler::{generate_schema, AuthMapping, NormalizedSchema, SchemaDocument};
pub use base_path::{join_base_path, resolve_base_path, sanitize_path};
pub use converter::{convert_common_types, convert_schema, MAX_SCHEMA_DEPTH};
pub use document::ApiDocument;
pub use error::{LoadError, MappingError, PolicyError};
pub use loader::{is_url, load_spec, load_spec_auto, load_spec_str, load_text};
pub use namespace::{validate_namespace, RESERVED_WORDS};
pub use operation::{map_operation, path_operations, MappedAction};
pub use parameters::{build_parameter_context, ParameterContext};
pub use policy::{generate_policies, parse_cedar_schema, parse_schema, validate_schema};
pub use types::{
    ActionAnnotations, ActionDefinition, Attribute, EntityTypeDefinition, HttpVerb,
    MappingOptions, MappingType, SchemaType,
};

#[cfg(feature = "remote")]
pub use loader::load_spec_url;
