//! Base path resolution from the API's declared servers.

use url::Url;

use crate::error::MappingError;

/// Base used to resolve server urls given as relative paths (`/api/v1`).
const RELATIVE_URL_BASE: &str = "http://localhost";

/// Normalize a url path: trim each segment, drop empty segments, and rejoin
/// with a single leading `/` and no trailing `/`.
///
/// The root path (and any path with no segments) becomes `/`.
pub fn sanitize_path(path: &str) -> String {
    let segments: Vec<&str> = path
        .split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect();
    format!("/{}", segments.join("/"))
}

/// Prefix a path template with a resolved base path.
pub fn join_base_path(base_path: &str, path_template: &str) -> String {
    let base = base_path.trim_end_matches('/');
    if path_template.starts_with('/') {
        format!("{}{}", base, path_template)
    } else {
        format!("{}/{}", base, path_template)
    }
}

/// Extract the path component of a server url.
///
/// Relative server urls (`/v1`, `v1`) are resolved against a placeholder host.
///
/// # Errors
///
/// Returns `MappingError::InvalidServerUrl` if the url cannot be parsed.
pub fn server_url_path(server_url: &str) -> Result<String, MappingError> {
    let parsed = match Url::parse(server_url) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = Url::parse(RELATIVE_URL_BASE).map_err(|_| invalid_url(server_url))?;
            base.join(server_url).map_err(|_| invalid_url(server_url))?
        }
        Err(_) => return Err(invalid_url(server_url)),
    };
    Ok(parsed.path().to_string())
}

/// Resolve the base path for the given server urls.
///
/// - no servers: `""`
/// - one server: that server's sanitized path (a supplied base path must still match it)
/// - several servers: the sanitized `base_path`, which is required and must match
///   at least one server
///
/// # Errors
///
/// Returns `MappingError::AmbiguousServers`, `MappingError::BasePathMismatch`
/// or `MappingError::InvalidServerUrl`.
pub fn resolve_base_path(
    servers: &[String],
    base_path: Option<&str>,
) -> Result<String, MappingError> {
    if servers.is_empty() {
        return Ok(String::new());
    }

    let server_paths = servers
        .iter()
        .map(|url| server_url_path(url).map(|path| sanitize_path(&path)))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(requested) = base_path {
        let requested = sanitize_path(requested);
        if !server_paths.iter().any(|path| *path == requested) {
            return Err(MappingError::BasePathMismatch {
                base_path: requested,
                servers: servers.to_vec(),
            });
        }
    }

    match (server_paths.as_slice(), base_path) {
        ([only], _) => Ok(only.clone()),
        (_, Some(requested)) => Ok(sanitize_path(requested)),
        (_, None) => Err(MappingError::AmbiguousServers {
            count: servers.len(),
        }),
    }
}

fn invalid_url(url: &str) -> MappingError {
    MappingError::InvalidServerUrl {
        url: url.to_string(),
    }
}
