//! JSON document loading from files, strings and HTTP URLs.
//!
//! Used by the CLI to read JSON Schema fragments and OpenAPI documents.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::LoadError;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Load a JSON document from a file path.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// or `LoadError::InvalidJson` if the file isn't valid JSON.
pub fn load_json(path: &Path) -> Result<Value, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), bytes = content.len(), "loaded file");
    load_json_str(&content)
}

/// Load a JSON document from a string.
///
/// # Errors
///
/// Returns `LoadError::InvalidJson` if the string isn't valid JSON.
pub fn load_json_str(content: &str) -> Result<Value, LoadError> {
    serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })
}

/// Load a JSON document from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
///
/// # Errors
///
/// Returns `LoadError::NetworkError` if the request fails, the server
/// answers with an error status, or the body isn't valid JSON.
#[cfg(feature = "remote")]
pub fn load_json_url(url: &str) -> Result<Value, LoadError> {
    let network = |source| LoadError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network)?;

    let response = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(network)?;

    debug!(url, status = %response.status(), "fetched document");
    response.json().map_err(network)
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load a JSON document from a file path or URL.
///
/// URL loading requires the `remote` feature; without it a URL is treated
/// as a missing file.
///
/// # Errors
///
/// Returns appropriate errors based on the source type.
pub fn load_json_auto(source: &str) -> Result<Value, LoadError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            load_json_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(LoadError::FileNotFound {
                path: std::path::PathBuf::from(source),
            })
        }
    } else {
        load_json(Path::new(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn load_json_valid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"openapi": "3.1.0"}}"#).unwrap();

        let document = load_json(file.path()).unwrap();
        assert_eq!(document["openapi"], "3.1.0");
    }

    #[test]
    fn load_json_file_not_found() {
        let result = load_json(Path::new("/nonexistent/openapi.json"));
        assert!(matches!(result, Err(LoadError::FileNotFound { .. })));
    }

    #[test]
    fn load_json_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "openapi: 3.1.0").unwrap();

        let result = load_json(file.path());
        assert!(matches!(result, Err(LoadError::InvalidJson { .. })));
    }

    #[test]
    fn load_json_str_roundtrip() {
        let value = load_json_str(r#"{"type": "string", "minLength": 4}"#).unwrap();
        assert_eq!(value["minLength"], 4);
        assert!(matches!(
            load_json_str("{"),
            Err(LoadError::InvalidJson { .. })
        ));
    }

    #[test]
    fn is_url_detection() {
        assert!(is_url("https://example.com/openapi.json"));
        assert!(is_url("http://localhost:3000/documentation/json"));
        assert!(!is_url("/path/to/openapi.json"));
        assert!(!is_url("./openapi.json"));
        assert!(!is_url("openapi.json"));
    }

    #[test]
    fn load_json_auto_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"type": "string"}}"#).unwrap();

        let value = load_json_auto(file.path().to_str().unwrap()).unwrap();
        assert_eq!(value["type"], "string");
    }

    #[cfg(feature = "remote")]
    mod remote {
        use super::*;

        #[test]
        fn load_json_url_valid() {
            let mut server = mockito::Server::new();
            let mock = server
                .mock("GET", "/documentation/json")
                .with_status(200)
                .with_header("content-type", "application/json")
                .with_body(r#"{"openapi": "3.0.3", "paths": {}}"#)
                .create();

            let url = format!("{}/documentation/json", server.url());
            let document = load_json_url(&url).unwrap();

            assert_eq!(document["openapi"], "3.0.3");
            mock.assert();
        }

        #[test]
        fn load_json_url_error_status() {
            let mut server = mockito::Server::new();
            let _mock = server.mock("GET", "/missing.json").with_status(404).create();

            let url = format!("{}/missing.json", server.url());
            let result = load_json_url(&url);
            assert!(matches!(result, Err(LoadError::NetworkError { .. })));
        }

        #[test]
        fn load_json_url_invalid_body() {
            let mut server = mockito::Server::new();
            let _mock = server
                .mock("GET", "/broken.json")
                .with_status(200)
                .with_body("not json")
                .create();

            let url = format!("{}/broken.json", server.url());
            let result = load_json_url(&url);
            assert!(matches!(result, Err(LoadError::NetworkError { .. })));
        }

        #[test]
        fn load_json_auto_url() {
            let mut server = mockito::Server::new();
            let _mock = server
                .mock("GET", "/openapi.json")
                .with_status(200)
                .with_body(r#"{"openapi": "3.1.0"}"#)
                .create();

            let url = format!("{}/openapi.json", server.url());
            assert!(load_json_auto(&url).is_ok());
        }
    }
}
