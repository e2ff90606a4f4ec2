//! Cedar namespace validation.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::MappingError;

/// Words Cedar refuses as namespace names (compared case-insensitively).
pub const RESERVED_WORDS: &[&str] = &["if", "in", "is", "__cedar"];

static NAMESPACE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[_a-zA-Z][_a-zA-Z0-9]*(?:::[_a-zA-Z][_a-zA-Z0-9]*)*$")
        .expect("namespace pattern is a valid regex")
});

/// Validate a Cedar namespace.
///
/// # Errors
///
/// Returns `MappingError::MissingNamespace` for an empty string and
/// `MappingError::InvalidNamespace` when the grammar does not match or the
/// namespace is a reserved word.
pub fn validate_namespace(namespace: &str) -> Result<(), MappingError> {
    if namespace.is_empty() {
        return Err(MappingError::MissingNamespace);
    }

    let lowered = namespace.to_lowercase();
    if !NAMESPACE_RE.is_match(namespace) || RESERVED_WORDS.contains(&lowered.as_str()) {
        return Err(MappingError::InvalidNamespace {
            namespace: namespace.to_string(),
        });
    }

    Ok(())
}
