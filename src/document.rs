//! Read-only view over the parts of an OpenAPI document the mapping uses.

use serde_json::{Map, Value};

use crate::error::MappingError;

/// An OpenAPI 3 description, borrowed from its raw JSON value.
///
/// Only `paths`, `servers` and `components.schemas` are looked at; everything
/// else in the document is ignored.
#[derive(Debug, Clone, Copy)]
pub struct ApiDocument<'a> {
    paths: &'a Map<String, Value>,
    servers: Option<&'a Vec<Value>>,
    schemas: Option<&'a Map<String, Value>>,
}

impl<'a> ApiDocument<'a> {
    /// Borrow a document view from a parsed OpenAPI value.
    ///
    /// # Errors
    ///
    /// Returns `MappingError::MissingInput` when `paths` is absent or not an object.
    pub fn from_value(value: &'a Value) -> Result<Self, MappingError> {
        let paths = value
            .get("paths")
            .and_then(Value::as_object)
            .ok_or(MappingError::MissingInput)?;

        let servers = value.get("servers").and_then(Value::as_array);
        let schemas = value
            .get("components")
            .and_then(|components| components.get("schemas"))
            .and_then(Value::as_object);

        Ok(Self {
            paths,
            servers,
            schemas,
        })
    }

    /// Path templates mapped to their path items, in declaration order.
    pub fn paths(&self) -> &'a Map<String, Value> {
        self.paths
    }

    /// Declared server urls, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns `MappingError::InvalidServerUrl` for a server entry without a string `url`.
    pub fn server_urls(&self) -> Result<Vec<String>, MappingError> {
        let Some(servers) = self.servers else {
            return Ok(Vec::new());
        };

        servers
            .iter()
            .map(|server| {
                server
                    .get("url")
                    .and_then(Value::as_str)
                    .map(String::from)
                    .ok_or_else(|| MappingError::InvalidServerUrl {
                        url: server.to_string(),
                    })
            })
            .collect()
    }

    /// Reusable schemas under `components.schemas`.
    pub fn schemas(&self) -> Option<&'a Map<String, Value>> {
        self.schemas
    }

    /// Whether a reusable schema with exactly this name exists.
    pub fn has_schema(&self, name: &str) -> bool {
        self.schemas
            .map(|schemas| schemas.contains_key(name))
            .unwrap_or(false)
    }
}
