//! Route-level and document-level OpenAPI transforms.
//!
//! A documentation generator calls [`SchemaTransform::transform_route`]
//! once per route while it assembles paths, then
//! [`SchemaTransform::transform_document`] once on the assembled document
//! to mount the registry's components and drop the unused ones.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::convert::{registry_to_json, schema_to_json};
use crate::error::TransformError;
use crate::prune::prune;
use crate::registry::Registry;
use crate::schema::{SchemaGraph, SchemaRef};
use crate::types::{is_truthy, Direction, OpenApiVersion, TransformOptions};
use crate::validator::{resolve_schema, SchemaSlot};

/// Schema declaration of one route.
#[derive(Debug, Clone, Default)]
pub struct RouteSchema {
    pub headers: Option<SchemaSlot>,
    pub querystring: Option<SchemaSlot>,
    pub body: Option<SchemaSlot>,
    pub params: Option<SchemaSlot>,
    /// Response schemas keyed by status code (`"200"`, `"4XX"`, `"default"`).
    pub response: Option<BTreeMap<String, SchemaSlot>>,
    pub hide: bool,
    /// Any other route keys (`description`, `tags`, ...), passed through.
    pub extra: Map<String, Value>,
}

impl RouteSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn headers(mut self, schema: impl Into<SchemaSlot>) -> Self {
        self.headers = Some(schema.into());
        self
    }

    pub fn querystring(mut self, schema: impl Into<SchemaSlot>) -> Self {
        self.querystring = Some(schema.into());
        self
    }

    /// Alias for [`querystring`](Self::querystring).
    pub fn query(self, schema: impl Into<SchemaSlot>) -> Self {
        self.querystring(schema)
    }

    pub fn body(mut self, schema: impl Into<SchemaSlot>) -> Self {
        self.body = Some(schema.into());
        self
    }

    pub fn params(mut self, schema: impl Into<SchemaSlot>) -> Self {
        self.params = Some(schema.into());
        self
    }

    pub fn response(mut self, status: impl Into<String>, schema: impl Into<SchemaSlot>) -> Self {
        self.response
            .get_or_insert_with(BTreeMap::new)
            .insert(status.into(), schema.into());
        self
    }

    pub fn hide(mut self, hide: bool) -> Self {
        self.hide = hide;
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    fn inputs(&self) -> [(&'static str, Option<&SchemaSlot>); 4] {
        [
            ("headers", self.headers.as_ref()),
            ("querystring", self.querystring.as_ref()),
            ("body", self.body.as_ref()),
            ("params", self.params.as_ref()),
        ]
    }
}

/// OpenAPI dialect declared by `document`.
///
/// # Errors
///
/// `OpenApi2Unsupported` for a Swagger 2.0 document, and
/// `UnsupportedOpenApiVersion` when `openapi` is missing or not 3.0.x/3.1.x.
pub fn openapi_version(document: &Value) -> Result<OpenApiVersion, TransformError> {
    if document.get("swagger").is_some() {
        return Err(TransformError::OpenApi2Unsupported);
    }

    let declared = document.get("openapi").and_then(Value::as_str);
    declared
        .and_then(OpenApiVersion::from_version_str)
        .ok_or_else(|| TransformError::UnsupportedOpenApiVersion {
            version: declared.map(str::to_string),
        })
}

/// Converts route schemas and documents against one graph and registry.
#[derive(Debug, Clone)]
pub struct SchemaTransform<'a> {
    graph: &'a SchemaGraph,
    registry: &'a Registry,
    options: TransformOptions,
}

impl<'a> SchemaTransform<'a> {
    /// Transform with the default skip list.
    pub fn new(graph: &'a SchemaGraph, registry: &'a Registry) -> Self {
        Self {
            graph,
            registry,
            options: TransformOptions::default(),
        }
    }

    pub fn options(mut self, options: TransformOptions) -> Self {
        self.options = options;
        self
    }

    /// Render one route's schemas for `document`.
    ///
    /// Returns `None` when the route declares no schema. Routes on the skip
    /// list, or marked hidden, render as `{"hide": true}`. Request slots
    /// use the input direction and responses the output direction; other
    /// truthy route keys are copied through.
    ///
    /// # Errors
    ///
    /// Fails on a Swagger 2.0 or unknown-version document, an invalid slot,
    /// or a node outside the graph.
    pub fn transform_route(
        &self,
        schema: Option<&RouteSchema>,
        url: &str,
        document: &Value,
    ) -> Result<Option<Value>, TransformError> {
        if document.get("swagger").is_some() {
            return Err(TransformError::OpenApi2Unsupported);
        }

        let Some(schema) = schema else {
            return Ok(None);
        };

        if schema.hide || self.options.is_skipped(url) {
            debug!(url, "route hidden from documentation");
            return Ok(Some(json!({ "hide": true })));
        }

        let version = openapi_version(document)?;
        let mut transformed = Map::new();

        for (key, slot) in schema.inputs() {
            if let Some(slot) = slot {
                let fragment = self.convert(slot, Direction::Input, version)?;
                transformed.insert(key.to_string(), fragment);
            }
        }

        if let Some(responses) = &schema.response {
            let mut rendered = Map::new();
            for (status, slot) in responses {
                let fragment = self.convert(slot, Direction::Output, version)?;
                rendered.insert(status.clone(), fragment);
            }
            transformed.insert("response".into(), Value::Object(rendered));
        }

        for (key, value) in &schema.extra {
            if is_truthy(value) {
                transformed.insert(key.clone(), value.clone());
            }
        }

        debug!(url, %version, "transformed route schema");
        Ok(Some(Value::Object(transformed)))
    }

    /// Mount the registry's components into `document` and prune unused
    /// component schemas.
    ///
    /// Both directions are generated. Pre-existing `components.schemas`
    /// entries are kept unless a generated name replaces them; other
    /// `components` sections are not touched.
    ///
    /// # Errors
    ///
    /// Fails on a Swagger 2.0 or unknown-version document, on an output
    /// component name that is also an input component name, or on a
    /// registered node outside the graph.
    pub fn transform_document(&self, document: &Value) -> Result<Value, TransformError> {
        let version = openapi_version(document)?;

        let inputs = registry_to_json(self.graph, self.registry, Direction::Input, version)?;
        let outputs = registry_to_json(self.graph, self.registry, Direction::Output, version)?;

        if let Some(name) = outputs.keys().find(|name| inputs.contains_key(*name)) {
            return Err(TransformError::SchemaIdCollision { name: name.clone() });
        }

        let mut merged = document.clone();
        if let Some(root) = merged.as_object_mut() {
            ensure_object(root, "components");
            if let Some(components) = root.get_mut("components").and_then(Value::as_object_mut) {
                ensure_object(components, "schemas");
                if let Some(schemas) = components.get_mut("schemas").and_then(Value::as_object_mut)
                {
                    schemas.extend(inputs);
                    schemas.extend(outputs);
                }
            }
        }

        debug!(%version, registered = self.registry.len(), "transformed document");
        Ok(prune(&merged))
    }

    fn convert(
        &self,
        slot: &SchemaSlot,
        direction: Direction,
        version: OpenApiVersion,
    ) -> Result<Value, TransformError> {
        let node: SchemaRef = resolve_schema(slot)?;
        Ok(schema_to_json(
            self.graph,
            node,
            self.registry,
            direction,
            version,
        )?)
    }
}

/// Make `map[key]` an object, keeping an existing object in place.
fn ensure_object(map: &mut Map<String, Value>, key: &str) {
    if !map.get(key).is_some_and(Value::is_object) {
        map.insert(key.to_string(), Value::Object(Map::new()));
    }
}
