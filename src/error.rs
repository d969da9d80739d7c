//! Error types for schema conversion, document transformation and the
//! request/response boundary.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::schema::SchemaRef;

/// Errors raised while building, registering or generating schemas.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema node {node} does not belong to graph {graph}")]
    ForeignNode { node: SchemaRef, graph: u32 },

    #[error("schema id \"{id}\" already exists in the registry")]
    DuplicateId { id: String },

    #[error("cycle detected at {path}")]
    Cycle { path: String },

    #[error("{kind} cannot be represented in JSON Schema (at {path})")]
    Unrepresentable { kind: &'static str, path: String },
}

/// Errors raised by the per-route and whole-document transforms.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("OpenAPI 2.0 is not supported")]
    OpenApi2Unsupported,

    #[error("unsupported OpenAPI document object: version {}", version.as_deref().unwrap_or("<missing>"))]
    UnsupportedOpenApiVersion { version: Option<String> },

    #[error("collision detected for schema \"{name}\": there is already an input schema with the same name")]
    SchemaIdCollision { name: String },

    #[error("invalid schema passed: {value}")]
    InvalidSchema { value: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl TransformError {
    /// HTTP status a framework should surface this error with.
    pub fn status_code(&self) -> u16 {
        500
    }
}

/// Errors while loading JSON documents.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
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

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            LoadError::InvalidJson { .. } => 2,
        }
    }
}

/// One step of the path to an offending value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(i) => write!(f, "{}", i),
        }
    }
}

/// A single problem reported by a [`SafeParse`](crate::SafeParse) capability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    /// Rule that failed (e.g. `minLength`, `required`).
    pub code: String,
    pub path: Vec<PathSegment>,
    pub message: String,
    /// Any further details the parser reports.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
}

/// The failure side of a parse: every issue found in the data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseIssues {
    pub issues: Vec<Issue>,
}

impl fmt::Display for ParseIssues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} issue(s)", self.issues.len())?;
        for issue in &self.issues {
            let path: Vec<String> = issue.path.iter().map(|p| p.to_string()).collect();
            write!(f, "; /{}: {}", path.join("/"), issue.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseIssues {}

/// Framework-facing record for one request validation issue.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaValidationIssue {
    pub keyword: String,
    pub instance_path: String,
    pub schema_path: String,
    pub message: String,
    pub params: Map<String, Value>,
}

/// Request data did not satisfy its input schema.
///
/// Being its own type is what lets error handlers tell this family apart
/// from unrelated validation errors, see [`has_schema_validation_errors`].
#[derive(Debug, Clone, Error)]
#[error("request validation failed with {} issue(s)", issues.len())]
pub struct RequestValidationError {
    pub issues: Vec<SchemaValidationIssue>,
}

impl RequestValidationError {
    pub fn status_code(&self) -> u16 {
        400
    }
}

/// Response data did not satisfy its output schema.
#[derive(Debug, Clone, Error)]
#[error("response doesn't match the schema ({method} {url})")]
pub struct ResponseSerializationError {
    pub method: String,
    pub url: String,
    #[source]
    pub cause: ParseIssues,
}

impl ResponseSerializationError {
    pub fn status_code(&self) -> u16 {
        500
    }
}

/// Errors from the request validator.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Schema(#[from] TransformError),

    #[error("{0}")]
    Invalid(#[from] RequestValidationError),
}

impl ValidateError {
    pub fn status_code(&self) -> u16 {
        match self {
            ValidateError::Schema(e) => e.status_code(),
            ValidateError::Invalid(e) => e.status_code(),
        }
    }
}

/// Errors from the response serializer.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error(transparent)]
    Schema(#[from] TransformError),

    #[error("{0}")]
    Response(#[from] ResponseSerializationError),

    #[error("cannot encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

impl SerializeError {
    pub fn status_code(&self) -> u16 {
        500
    }
}

/// Returns true if `error`, or anything in its source chain, is a
/// non-empty [`RequestValidationError`].
pub fn has_schema_validation_errors(error: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(err) = current {
        if let Some(validation) = err.downcast_ref::<RequestValidationError>() {
            return !validation.issues.is_empty();
        }
        current = err.source();
    }
    false
}

/// Returns true if `error`, or anything in its source chain, is a
/// [`ResponseSerializationError`].
pub fn is_response_serialization_error(error: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(err) = current {
        if err.is::<ResponseSerializationError>() {
            return true;
        }
        current = err.source();
    }
    false
}
