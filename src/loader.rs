//! Loading API descriptions and schema documents.
//!
//! Handles files, strings and HTTP URLs, in JSON or YAML.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::LoadError;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Load a document from a file path.
///
/// Files ending in `.yaml` or `.yml` are parsed as YAML; anything else is
/// sniffed like [`load_spec_str`].
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist, `ReadError`
/// if it can't be read, or a parse error.
pub fn load_spec(path: &Path) -> Result<Value, LoadError> {
    let content = load_text(path)?;

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
        .unwrap_or(false);

    if is_yaml {
        parse_yaml(&content)
    } else {
        load_spec_str(&content)
    }
}

/// Read a file as text without parsing it.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist or `ReadError`
/// if it can't be read.
pub fn load_text(path: &Path) -> Result<String, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = content.len(), "loaded document");
    Ok(content)
}

/// Load a document from a string.
///
/// Content starting with `{` is parsed as JSON, anything else as YAML.
///
/// # Errors
///
/// Returns `LoadError::InvalidJson` or `LoadError::InvalidYaml`.
pub fn load_spec_str(content: &str) -> Result<Value, LoadError> {
    if content.trim_start().starts_with('{') {
        serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })
    } else {
        parse_yaml(content)
    }
}

fn parse_yaml(content: &str) -> Result<Value, LoadError> {
    serde_yaml::from_str(content).map_err(|source| LoadError::InvalidYaml { source })
}

/// Load a document from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
///
/// # Errors
///
/// Returns `LoadError::NetworkError` if the request fails or the server
/// answers with an error status, or a parse error for the body.
#[cfg(feature = "remote")]
pub fn load_spec_url(url: &str) -> Result<Value, LoadError> {
    let network_error = |source: reqwest::Error| LoadError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network_error)?;

    let body = client
        .get(url)
        .header("Accept", "application/json, application/yaml, text/yaml")
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.text())
        .map_err(network_error)?;
    debug!(url, bytes = body.len(), "fetched document");

    load_spec_str(&body)
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load a document from a file path or URL.
///
/// URL loading requires the `remote` feature.
///
/// # Errors
///
/// Returns appropriate errors based on the source type.
pub fn load_spec_auto(source: &str) -> Result<Value, LoadError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            load_spec_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(LoadError::FileNotFound {
                path: std::path::PathBuf::from(source),
            })
        }
    } else {
        load_spec(Path::new(source))
    }
}
