//! Core types shared by the conversion, normalization and pruning passes.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prefix every generated component reference starts with.
pub const COMPONENTS_SCHEMAS_PREFIX: &str = "#/components/schemas/";

/// Suffix appended to input-direction schema names.
pub const INPUT_SUFFIX: &str = "Input";

/// Routes of the documentation UI that are never documented themselves.
pub const DEFAULT_SKIP_LIST: &[&str] = &[
    "/documentation/",
    "/documentation/initOAuth",
    "/documentation/json",
    "/documentation/uiConfig",
    "/documentation/yaml",
    "/documentation/*",
    "/documentation/static/*",
];

/// JavaScript-style truthiness, used to decide whether an `example` is set.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Which side of the request/response boundary a schema is rendered for.
///
/// The same logical schema may accept a different shape than it produces:
/// a field with a default is optional for callers but always present in
/// what the server sends back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// What a caller must send (request validation).
    Input,
    /// What a caller receives (response serialization).
    Output,
}

impl Direction {
    /// Component name for a schema id in this direction.
    pub fn schema_name(&self, id: &str) -> String {
        match self {
            Direction::Input => format!("{}{}", id, INPUT_SUFFIX),
            Direction::Output => id.to_string(),
        }
    }

    /// `$ref` URI pointing at the component for `id` in this direction.
    pub fn reference_uri(&self, id: &str) -> String {
        format!("{}{}", COMPONENTS_SCHEMAS_PREFIX, self.schema_name(id))
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => f.write_str("input"),
            Direction::Output => f.write_str("output"),
        }
    }
}

/// `$ref` URI for `id` in the given direction.
pub fn reference_uri(id: &str, direction: Direction) -> String {
    direction.reference_uri(id)
}

/// OpenAPI dialect a document targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpenApiVersion {
    #[serde(rename = "3.0")]
    V3_0,
    #[serde(rename = "3.1")]
    V3_1,
}

impl OpenApiVersion {
    /// Match a declared version string by prefix (`3.1.0` -> `3.1`).
    ///
    /// Returns `None` for anything that is not 3.0.x or 3.1.x.
    pub fn from_version_str(s: &str) -> Option<Self> {
        if s.starts_with("3.1") {
            Some(OpenApiVersion::V3_1)
        } else if s.starts_with("3.0") {
            Some(OpenApiVersion::V3_0)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OpenApiVersion::V3_0 => "3.0",
            OpenApiVersion::V3_1 => "3.1",
        }
    }
}

impl fmt::Display for OpenApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for the per-route and whole-document transforms.
#[derive(Debug, Clone)]
pub struct TransformOptions {
    /// Route URLs that are hidden from the document.
    ///
    /// Entries ending in `*` match any URL with the preceding prefix.
    pub skip_list: Vec<String>,
}

impl TransformOptions {
    /// Options with the default documentation-UI skip list.
    pub fn new() -> Self {
        Self {
            skip_list: DEFAULT_SKIP_LIST.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replace the skip list.
    pub fn skip_list<I, S>(mut self, skip_list: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_list = skip_list.into_iter().map(Into::into).collect();
        self
    }

    /// Returns true if `url` is hidden by the skip list.
    pub fn is_skipped(&self, url: &str) -> bool {
        is_skipped(url, &self.skip_list)
    }
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Exact match, or prefix match for entries with a trailing `*`.
pub fn is_skipped(url: &str, skip_list: &[String]) -> bool {
    skip_list.iter().any(|pattern| match pattern.strip_suffix('*') {
        Some(prefix) => url.starts_with(prefix),
        None => pattern == url,
    })
}
