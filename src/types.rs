//! Core types for OpenAPI to Cedar schema mapping.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Path-item key that stands in for every HTTP method (API Gateway extension).
pub const ANY_METHOD_KEY: &str = "x-amazon-apigateway-any-method";

/// Operation-level extension carrying Cedar mapping hints.
pub const CEDAR_EXTENSION_KEY: &str = "x-cedar";

/// Field of the `x-cedar` extension that overrides an action's resource types.
pub const APPLIES_TO_RESOURCE_TYPES: &str = "appliesToResourceTypes";

/// Prefix every supported `$ref` must carry.
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Principal entity type every action applies to.
pub const USER_ENTITY: &str = "User";
/// Group entity type users are members of.
pub const USER_GROUP_ENTITY: &str = "UserGroup";
/// Default resource entity type.
pub const APPLICATION_ENTITY: &str = "Application";

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// HTTP methods that produce Cedar actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpVerb {
    /// All supported verbs, in the order they are expanded for any-method paths.
    pub const ALL: [HttpVerb; 5] = [
        HttpVerb::Get,
        HttpVerb::Post,
        HttpVerb::Put,
        HttpVerb::Patch,
        HttpVerb::Delete,
    ];

    /// Lowercase key used in OpenAPI path items.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVerb::Get => "get",
            HttpVerb::Post => "post",
            HttpVerb::Put => "put",
            HttpVerb::Patch => "patch",
            HttpVerb::Delete => "delete",
        }
    }

    /// Parse a path-item key. Only exact lowercase keys are methods in OpenAPI.
    ///
    /// Returns `None` for `options`, `head`, `trace`, extensions and other keys.
    pub fn parse(s: &str) -> Option<Self> {
        HttpVerb::ALL.into_iter().find(|verb| verb.as_str() == s)
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cedar schema type node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaType {
    String,
    Long,
    Boolean,
    Set { element: Box<SchemaType> },
    Record { attributes: IndexMap<String, Attribute> },
    /// Named reference to a common type, serialized as `{"type": "<name>"}`.
    Reference { name: String },
}

impl SchemaType {
    pub fn empty_record() -> Self {
        SchemaType::Record {
            attributes: IndexMap::new(),
        }
    }

    pub fn set_of(element: SchemaType) -> Self {
        SchemaType::Set {
            element: Box::new(element),
        }
    }

    pub fn reference(name: impl Into<String>) -> Self {
        SchemaType::Reference { name: name.into() }
    }

    /// Attributes of a record, or `None` for any other node.
    pub fn attributes(&self) -> Option<&IndexMap<String, Attribute>> {
        match self {
            SchemaType::Record { attributes } => Some(attributes),
            _ => None,
        }
    }

    fn type_name(&self) -> &str {
        match self {
            SchemaType::String => "String",
            SchemaType::Long => "Long",
            SchemaType::Boolean => "Boolean",
            SchemaType::Set { .. } => "Set",
            SchemaType::Record { .. } => "Record",
            SchemaType::Reference { name } => name,
        }
    }

    fn serialize_entries<M: SerializeMap>(&self, map: &mut M) -> Result<(), M::Error> {
        map.serialize_entry("type", self.type_name())?;
        match self {
            SchemaType::Set { element } => map.serialize_entry("element", element.as_ref()),
            SchemaType::Record { attributes } => map.serialize_entry("attributes", attributes),
            _ => Ok(()),
        }
    }
}

impl Serialize for SchemaType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        self.serialize_entries(&mut map)?;
        map.end()
    }
}

/// Record attribute: a type plus the `required` flag.
///
/// `required` is only ever emitted as `true`; optional attributes carry no flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub ty: SchemaType,
    pub required: bool,
}

impl Attribute {
    pub fn new(ty: SchemaType) -> Self {
        Self {
            ty,
            required: false,
        }
    }

    pub fn required(ty: SchemaType) -> Self {
        Self { ty, required: true }
    }
}

impl Serialize for Attribute {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        self.ty.serialize_entries(&mut map)?;
        if self.required {
            map.serialize_entry("required", &true)?;
        }
        map.end()
    }
}

/// Entity type declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityTypeDefinition {
    /// Either a record or a reference to a common type.
    pub shape: SchemaType,
    #[serde(rename = "memberOfTypes", skip_serializing_if = "Option::is_none")]
    pub member_of_types: Option<Vec<String>>,
}

impl EntityTypeDefinition {
    /// Entity with an empty record shape and no declared memberships.
    pub fn empty() -> Self {
        Self {
            shape: SchemaType::empty_record(),
            member_of_types: None,
        }
    }
}

/// Action declaration without presentation annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionDefinition {
    #[serde(rename = "principalTypes")]
    pub principal_types: Vec<String>,
    #[serde(rename = "resourceTypes")]
    pub resource_types: Vec<String>,
    pub context: SchemaType,
}

/// Presentation-only data attached to actions in the annotated schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionAnnotations {
    #[serde(rename = "httpVerb")]
    pub http_verb: HttpVerb,
    #[serde(rename = "httpPathTemplate")]
    pub http_path_template: String,
}

/// Strategy used to derive actions and resources from the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MappingType {
    /// Actions from operation ids or `<verb> <path>`, resources from `x-cedar` or `Application`.
    #[default]
    SimpleRest,
}

impl MappingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MappingType::SimpleRest => "SimpleRest",
        }
    }
}

impl fmt::Display for MappingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MappingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SimpleRest" => Ok(MappingType::SimpleRest),
            other => Err(format!("unknown mapping type \"{other}\": expected SimpleRest")),
        }
    }
}

/// Options for schema generation.
#[derive(Debug, Clone)]
pub struct MappingOptions {
    /// Cedar namespace the schema is generated under.
    pub namespace: String,
    /// Base path selecting one of several declared servers.
    pub base_path: Option<String>,
    pub mapping_type: MappingType,
}

impl MappingOptions {
    /// Create options for a namespace with no base path and the default mapping.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            base_path: None,
            mapping_type: MappingType::default(),
        }
    }

    /// Set the base path used to disambiguate between servers.
    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    pub fn mapping_type(mut self, mapping_type: MappingType) -> Self {
        self.mapping_type = mapping_type;
        self
    }
}
