//! Request validation and response serialization against schema nodes.

use std::fmt;

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::convert::{registry_to_json, schema_to_json};
use crate::error::{
    Issue, ParseIssues, PathSegment, RequestValidationError, ResponseSerializationError,
    SchemaError, SchemaValidationIssue, SerializeError, TransformError, ValidateError,
};
use crate::registry::Registry;
use crate::schema::{SchemaGraph, SchemaRef};
use crate::types::{Direction, OpenApiVersion};

/// What a route declared where a schema was expected.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaSlot {
    /// A schema node.
    Node(SchemaRef),
    /// The legacy `{ properties: <node> }` wrapper.
    Wrapped { properties: SchemaRef },
    /// Any other value. Never a valid schema.
    Json(Value),
}

impl From<SchemaRef> for SchemaSlot {
    fn from(node: SchemaRef) -> Self {
        SchemaSlot::Node(node)
    }
}

/// The node a slot stands for.
///
/// # Errors
///
/// Returns `TransformError::InvalidSchema` with the value's JSON text for
/// anything that is not a node or the legacy wrapper.
pub fn resolve_schema(slot: &SchemaSlot) -> Result<SchemaRef, TransformError> {
    match slot {
        SchemaSlot::Node(node) => Ok(*node),
        SchemaSlot::Wrapped { properties } => Ok(*properties),
        SchemaSlot::Json(value) => Err(TransformError::InvalidSchema {
            value: value.to_string(),
        }),
    }
}

/// Parse data against a schema node without panicking.
///
/// On success the parsed value is returned; on failure every issue found.
pub trait SafeParse {
    fn safe_parse(&self, node: SchemaRef, data: &Value) -> Result<Value, ParseIssues>;
}

/// [`SafeParse`] backed by the `jsonschema` crate.
///
/// Data is checked against the input-direction 3.1 rendering of the node,
/// with the registry's input components mounted so `$ref`s resolve. The
/// parsed value is the data itself: transforms, defaults and key stripping
/// are not applied.
#[derive(Debug, Clone, Copy)]
pub struct JsonSchemaParser<'a> {
    graph: &'a SchemaGraph,
    registry: &'a Registry,
}

impl<'a> JsonSchemaParser<'a> {
    pub fn new(graph: &'a SchemaGraph, registry: &'a Registry) -> Self {
        Self { graph, registry }
    }

    /// Standalone JSON Schema document for `node`.
    pub fn schema_document(&self, node: SchemaRef) -> Result<Value, SchemaError> {
        let version = OpenApiVersion::V3_1;
        let mut root = schema_to_json(self.graph, node, self.registry, Direction::Input, version)?;
        let components = registry_to_json(self.graph, self.registry, Direction::Input, version)?;

        if !components.is_empty() {
            if let Value::Object(map) = &mut root {
                map.insert("components".into(), json!({ "schemas": components }));
            }
        }
        Ok(root)
    }
}

impl SafeParse for JsonSchemaParser<'_> {
    fn safe_parse(&self, node: SchemaRef, data: &Value) -> Result<Value, ParseIssues> {
        let schema = self
            .schema_document(node)
            .map_err(|e| invalid_schema(e.to_string()))?;
        let validator = jsonschema::validator_for(&schema).map_err(|e| invalid_schema(e.to_string()))?;

        let issues: Vec<Issue> = validator
            .iter_errors(data)
            .map(|e| {
                let schema_path = e.schema_path.to_string();
                Issue {
                    code: schema_path
                        .rsplit('/')
                        .next()
                        .filter(|s| !s.is_empty())
                        .unwrap_or("schema")
                        .to_string(),
                    path: parse_pointer(&e.instance_path.to_string()),
                    message: e.to_string(),
                    params: [("instance".to_string(), e.instance.clone().into_owned())]
                        .into_iter()
                        .collect(),
                }
            })
            .collect();

        if issues.is_empty() {
            Ok(data.clone())
        } else {
            Err(ParseIssues { issues })
        }
    }
}

fn invalid_schema(message: String) -> ParseIssues {
    ParseIssues {
        issues: vec![Issue {
            code: "invalid_schema".into(),
            path: Vec::new(),
            message,
            params: Map::new(),
        }],
    }
}

/// Split a JSON pointer into path segments. Numeric segments are indices.
fn parse_pointer(pointer: &str) -> Vec<PathSegment> {
    pointer
        .split('/')
        .skip(1)
        .map(|raw| {
            let segment = raw.replace("~1", "/").replace("~0", "~");
            match segment.parse::<usize>() {
                Ok(i) => PathSegment::Index(i),
                Err(_) => PathSegment::Key(segment),
            }
        })
        .collect()
}

/// Framework-facing issue records for a failed request parse.
pub fn create_validation_error(error: &ParseIssues) -> Vec<SchemaValidationIssue> {
    error
        .issues
        .iter()
        .map(|issue| {
            let joined = issue
                .path
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("/");
            SchemaValidationIssue {
                keyword: issue.code.clone(),
                instance_path: format!("/{}", joined),
                schema_path: format!("#/{}/{}", joined, issue.code),
                message: issue.message.clone(),
                params: issue.params.clone(),
            }
        })
        .collect()
}

/// Validates request data (body, query, params, headers).
#[derive(Debug, Clone)]
pub struct RequestValidator<P> {
    parser: P,
}

impl<P: SafeParse> RequestValidator<P> {
    pub fn new(parser: P) -> Self {
        Self { parser }
    }

    /// Parse `data` against the slot's schema.
    ///
    /// # Errors
    ///
    /// `ValidateError::Schema` for an invalid slot, `ValidateError::Invalid`
    /// carrying one record per issue when the data does not match.
    pub fn validate(&self, slot: &SchemaSlot, data: &Value) -> Result<Value, ValidateError> {
        let node = resolve_schema(slot)?;
        self.parser.safe_parse(node, data).map_err(|issues| {
            debug!(count = issues.issues.len(), "request validation failed");
            ValidateError::Invalid(RequestValidationError {
                issues: create_validation_error(&issues),
            })
        })
    }
}

/// Transforms a value during serialization, the way `JSON.stringify`
/// replacers do. Called with the key (`""` for the root, the index for
/// array items) and the value; the returned value is serialized instead.
pub type Replacer = Box<dyn Fn(&str, Value) -> Value + Send + Sync>;

/// Options for [`ResponseSerializer`].
#[derive(Default)]
pub struct SerializerOptions {
    pub replacer: Option<Replacer>,
}

impl SerializerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replacer(mut self, replacer: impl Fn(&str, Value) -> Value + Send + Sync + 'static) -> Self {
        self.replacer = Some(Box::new(replacer));
        self
    }
}

impl fmt::Debug for SerializerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializerOptions")
            .field("replacer", &self.replacer.as_ref().map(|_| "Fn"))
            .finish()
    }
}

/// Checks response data and encodes it as JSON.
#[derive(Debug)]
pub struct ResponseSerializer<P> {
    parser: P,
    options: SerializerOptions,
}

impl<P: SafeParse> ResponseSerializer<P> {
    pub fn new(parser: P) -> Self {
        Self::with_options(parser, SerializerOptions::default())
    }

    pub fn with_options(parser: P, options: SerializerOptions) -> Self {
        Self { parser, options }
    }

    /// Parse `data` against the slot's schema and encode the result.
    ///
    /// # Errors
    ///
    /// `SerializeError::Response` with the route's method and url when the
    /// data does not match, `SerializeError::Schema` for an invalid slot.
    pub fn serialize(
        &self,
        slot: &SchemaSlot,
        method: &str,
        url: &str,
        data: &Value,
    ) -> Result<String, SerializeError> {
        let node = resolve_schema(slot)?;
        let parsed = self
            .parser
            .safe_parse(node, data)
            .map_err(|cause| ResponseSerializationError {
                method: method.to_string(),
                url: url.to_string(),
                cause,
            })?;

        let value = match &self.options.replacer {
            Some(replacer) => apply_replacer(replacer.as_ref(), "", parsed),
            None => parsed,
        };
        Ok(serde_json::to_string(&value)?)
    }
}

/// Apply `replacer` to a value, then to each of its children.
fn apply_replacer(replacer: &(dyn Fn(&str, Value) -> Value + Send + Sync), key: &str, value: Value) -> Value {
    match replacer(key, value) {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| {
                    let v = apply_replacer(replacer, &k, v);
                    (k, v)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .enumerate()
                .map(|(i, v)| apply_replacer(replacer, &i.to_string(), v))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{has_schema_validation_errors, is_response_serialization_error};
    use crate::registry::Metadata;
    use crate::schema::StringChecks;

    fn query_schema(graph: &mut SchemaGraph) -> SchemaRef {
        let name = graph.string_with(StringChecks::new().min_length(4));
        graph.object([("name", name)])
    }

    #[test]
    fn resolve_schema_slots() {
        let mut graph = SchemaGraph::new();
        let node = graph.string();

        assert_eq!(resolve_schema(&SchemaSlot::Node(node)).unwrap(), node);
        assert_eq!(
            resolve_schema(&SchemaSlot::Wrapped { properties: node }).unwrap(),
            node
        );
        let err = resolve_schema(&SchemaSlot::Json(json!("string"))).unwrap_err();
        assert_eq!(err.to_string(), r#"invalid schema passed: "string""#);
    }

    #[test]
    fn parser_accepts_valid_data() {
        let mut graph = SchemaGraph::new();
        let query = query_schema(&mut graph);
        let registry = Registry::new();
        let parser = JsonSchemaParser::new(&graph, &registry);

        let data = json!({ "name": "test" });
        assert_eq!(parser.safe_parse(query, &data).unwrap(), data);
    }

    #[test]
    fn parser_reports_code_and_path() {
        let mut graph = SchemaGraph::new();
        let query = query_schema(&mut graph);
        let registry = Registry::new();
        let parser = JsonSchemaParser::new(&graph, &registry);

        let issues = parser.safe_parse(query, &json!({ "name": "abc" })).unwrap_err();
        assert_eq!(issues.issues.len(), 1);
        assert_eq!(issues.issues[0].code, "minLength");
        assert_eq!(issues.issues[0].path, vec![PathSegment::Key("name".into())]);
        assert_eq!(issues.issues[0].params["instance"], json!("abc"));
    }

    #[test]
    fn parser_follows_registered_refs() {
        let mut graph = SchemaGraph::new();
        let token = graph.string_with(StringChecks::new().length(12));
        let tokens = graph.array(token);
        let body = graph.object([("tokens", tokens)]);

        let mut registry = Registry::new();
        registry.add(token, Metadata::with_id("Token")).unwrap();
        registry.add(body, Metadata::with_id("Body")).unwrap();
        let parser = JsonSchemaParser::new(&graph, &registry);

        assert!(parser
            .safe_parse(body, &json!({ "tokens": ["aaaaaaaaaaaa"] }))
            .is_ok());

        let issues = parser
            .safe_parse(body, &json!({ "tokens": ["aaaaaaaaaaaa", "short"] }))
            .unwrap_err();
        assert_eq!(
            issues.issues[0].path,
            vec![PathSegment::Key("tokens".into()), PathSegment::Index(1)]
        );
    }

    #[test]
    fn parser_reports_foreign_nodes_as_issue() {
        let mut other = SchemaGraph::new();
        let node = other.string();
        let graph = SchemaGraph::new();
        let registry = Registry::new();

        let issues = JsonSchemaParser::new(&graph, &registry)
            .safe_parse(node, &json!("x"))
            .unwrap_err();
        assert_eq!(issues.issues[0].code, "invalid_schema");
    }

    #[test]
    fn validation_error_records() {
        let issues = ParseIssues {
            issues: vec![Issue {
                code: "too_small".into(),
                path: vec![PathSegment::Key("name".into())],
                message: "String must contain at least 4 character(s)".into(),
                params: [("minimum".to_string(), json!(4))].into_iter().collect(),
            }],
        };

        let records = create_validation_error(&issues);
        assert_eq!(
            serde_json::to_value(&records).unwrap(),
            json!([{
                "keyword": "too_small",
                "instancePath": "/name",
                "schemaPath": "#/name/too_small",
                "message": "String must contain at least 4 character(s)",
                "params": { "minimum": 4 }
            }])
        );
    }

    #[test]
    fn request_validator_marks_errors() {
        let mut graph = SchemaGraph::new();
        let query = query_schema(&mut graph);
        let registry = Registry::new();
        let validator = RequestValidator::new(JsonSchemaParser::new(&graph, &registry));

        let ok = validator.validate(&query.into(), &json!({ "name": "test" }));
        assert!(ok.is_ok());

        let err = validator
            .validate(&query.into(), &json!({ "name": "abc" }))
            .unwrap_err();
        assert!(has_schema_validation_errors(&err));
        assert_eq!(err.status_code(), 400);
        match err {
            ValidateError::Invalid(e) => {
                assert_eq!(e.issues[0].instance_path, "/name");
                assert_eq!(e.issues[0].schema_path, "#/name/minLength");
            }
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn request_validator_rejects_invalid_slot() {
        let graph = SchemaGraph::new();
        let registry = Registry::new();
        let validator = RequestValidator::new(JsonSchemaParser::new(&graph, &registry));

        let err = validator
            .validate(&SchemaSlot::Json(json!({})), &json!({}))
            .unwrap_err();
        assert!(matches!(
            err,
            ValidateError::Schema(TransformError::InvalidSchema { .. })
        ));
        assert!(!has_schema_validation_errors(&err));
    }

    #[test]
    fn serializer_encodes_valid_response() {
        let mut graph = SchemaGraph::new();
        let name = graph.string();
        let user = graph.object([("name", name)]);
        let registry = Registry::new();
        let serializer = ResponseSerializer::new(JsonSchemaParser::new(&graph, &registry));

        let out = serializer
            .serialize(&user.into(), "GET", "/users", &json!({ "name": "test" }))
            .unwrap();
        assert_eq!(out, r#"{"name":"test"}"#);
    }

    #[test]
    fn serializer_applies_replacer() {
        let mut graph = SchemaGraph::new();
        let name = graph.string();
        let tags = graph.array(name);
        let user = graph.object([("name", name), ("tags", tags)]);
        let registry = Registry::new();

        let options = SerializerOptions::new().replacer(|key, value| match value {
            Value::String(s) if key != "name" => Value::String(s.to_uppercase()),
            other => other,
        });
        let serializer =
            ResponseSerializer::with_options(JsonSchemaParser::new(&graph, &registry), options);

        let out = serializer
            .serialize(
                &user.into(),
                "GET",
                "/users",
                &json!({ "name": "test", "tags": ["a", "b"] }),
            )
            .unwrap();
        assert_eq!(out, r#"{"name":"test","tags":["A","B"]}"#);
    }

    #[test]
    fn serializer_failure_carries_route() {
        let mut graph = SchemaGraph::new();
        let name = graph.string();
        let user = graph.object([("name", name)]);
        let registry = Registry::new();
        let serializer = ResponseSerializer::new(JsonSchemaParser::new(&graph, &registry));

        let err = serializer
            .serialize(&user.into(), "GET", "/users", &json!({ "name": 1 }))
            .unwrap_err();

        assert!(is_response_serialization_error(&err));
        match err {
            SerializeError::Response(e) => {
                assert_eq!(e.method, "GET");
                assert_eq!(e.url, "/users");
                assert_eq!(e.cause.issues[0].code, "type");
            }
            other => panic!("expected response error, got {other}"),
        }
    }

    #[test]
    fn pointer_parsing() {
        assert!(parse_pointer("").is_empty());
        assert_eq!(
            parse_pointer("/a~1b/0/c~0d"),
            vec![
                PathSegment::Key("a/b".into()),
                PathSegment::Index(0),
                PathSegment::Key("c~d".into())
            ]
        );
    }
}
