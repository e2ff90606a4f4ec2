//! Error types for schema generation, input loading and policy generation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while mapping an API description to a Cedar schema.
///
/// Mapping is fail-fast: the first error aborts the whole run and no partial
/// schema is produced.
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("invalid OpenAPI spec: missing paths object")]
    MissingInput,

    #[error("invalid input: missing namespace")]
    MissingNamespace,

    #[error(
        "invalid namespace format \"{namespace}\". Namespace must start with a letter or underscore (_), \
         and can include alphanumeric characters and underscores. Double colons (::) can separate components, \
         where each component must start with a letter or underscore. Reserved words (if, in, is, __cedar) \
         cannot be used as namespaces."
    )]
    InvalidNamespace { namespace: String },

    #[error("{count} servers are declared; a base path must be provided to pick one")]
    AmbiguousServers { count: usize },

    #[error("base path \"{base_path}\" does not match any declared server ({})", servers.join(", "))]
    BasePathMismatch {
        base_path: String,
        servers: Vec<String>,
    },

    #[error("invalid server url \"{url}\"")]
    InvalidServerUrl { url: String },

    #[error(
        "unsupported $ref value \"{reference}\" for {name}; only local refs to declared #/components/schemas entries are supported"
    )]
    UnsupportedRef { name: String, reference: String },

    #[error("unsupported schema shape for {name}: {detail}")]
    UnsupportedSchemaShape { name: String, detail: String },

    #[error("unsupported schema for {name}: array items are not defined directly under the property")]
    MissingArrayItems { name: String },

    #[error("parameter at {path} is a $ref (\"{reference}\"); only inline parameters are supported")]
    UnsupportedParameterRef { path: String, reference: String },

    #[error("parameter at {path} is missing required field(s): {}", missing.join(", "))]
    MissingParameterFields { path: String, missing: Vec<String> },

    #[error("invalid x-cedar extension on {action}: {detail}")]
    InvalidCedarExtension { action: String, detail: String },

    #[error("schema for {name} is nested deeper than {limit} levels")]
    DepthExceeded { name: String, limit: usize },

    #[error("failed to serialize schema: {source}")]
    Serialize {
        #[source]
        source: serde_json::Error,
    },
}

impl MappingError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Errors while loading an API description or a schema document.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid YAML: {source}")]
    InvalidYaml {
        #[source]
        source: serde_yaml::Error,
    },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

/// Errors while validating a Cedar schema or the starter policies built for it.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("schema parsing failed: {message}")]
    InvalidSchema { message: String },

    #[error("schema must have exactly one namespace, found {count}")]
    NamespaceCount { count: usize },

    #[error("policy parsing failed for policy {index}: {message}")]
    PolicyParse { index: usize, message: String },

    #[error("policy validation failed for policy {index}: {}", errors.join("; "))]
    PolicyValidation { index: usize, errors: Vec<String> },
}

impl PolicyError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            PolicyError::PolicyValidation { .. } => 1,
            _ => 2,
        }
    }
}
