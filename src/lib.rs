//! Schema to OpenAPI conversion
//!
//! Renders validation schemas as JSON Schema fragments for OpenAPI 3.0 and
//! 3.1 documents, and checks request/response data against the same schemas.
//!
//! Schemas are nodes of a [`SchemaGraph`]. A [`Registry`] attaches metadata
//! to nodes by identity; a node registered with an `id` becomes a named
//! component under `#/components/schemas/` and is referenced with `$ref`
//! everywhere else.
//!
//! Every schema is rendered for a [`Direction`]: what callers send
//! (`Input`, components named `<id>Input`) or what they receive (`Output`,
//! components named `<id>`). The two can differ, e.g. a field with a default
//! is optional on input but always present on output.
//!
//! # Example
//!
//! ```
//! use schema_openapi::{
//!     Metadata, Registry, RouteSchema, SchemaGraph, SchemaTransform, StringChecks,
//! };
//! use serde_json::json;
//!
//! let mut graph = SchemaGraph::new();
//! let name = graph.string_with(StringChecks::new().min_length(4));
//! let query = graph.object([("name", name)]);
//! let user_name = graph.string();
//! let user = graph.object([("name", user_name)]);
//!
//! let mut registry = Registry::new();
//! registry.add(user, Metadata::with_id("User")).unwrap();
//!
//! let document = json!({ "openapi": "3.1.0", "paths": {} });
//! let transform = SchemaTransform::new(&graph, &registry);
//!
//! let route = RouteSchema::new().querystring(query).response("200", user);
//! let rendered = transform
//!     .transform_route(Some(&route), "/users", &document)
//!     .unwrap()
//!     .unwrap();
//!
//! assert_eq!(rendered["querystring"]["properties"]["name"]["minLength"], 4);
//! assert_eq!(
//!     rendered["response"]["200"],
//!     json!({ "$ref": "#/components/schemas/User" })
//! );
//! ```
//!
//! # Dialects
//!
//! | Version | Rewrites |
//! |---------|----------|
//! | 3.1 | `$schema`, `$id`, `id` removed |
//! | 3.0 | `null` union branches become `nullable: true`, tuples become `items.oneOf`, `const` becomes `enum`, numeric exclusive bounds become `minimum`/`maximum`, keywords without a 3.0 form removed |

mod convert;
mod error;
mod generator;
mod loader;
mod normalize;
mod prune;
mod registry;
mod schema;
mod transform;
mod types;
mod validator;

pub use convert::{registry_to_json, schema_to_json};
pub use error::{
    has_schema_validation_errors, is_response_serialization_error, Issue, LoadError, ParseIssues,
    PathSegment, RequestValidationError, ResponseSerializationError, SchemaError,
    SchemaValidationIssue, SerializeError, TransformError, ValidateError,
};
pub use generator::{generate, Cycles, GenerateOptions, OverrideContext, Unrepresentable};
pub use loader::{is_url, load_json, load_json_auto, load_json_str};
pub use normalize::{normalize, normalize_in_place};
pub use prune::{collect_refs, prune, resolve_transitive_refs, used_schema_names};
pub use registry::{global_registry, Metadata, Registry};
pub use schema::{NumberChecks, SchemaGraph, SchemaKind, SchemaRef, StringChecks, UnknownKeys};
pub use transform::{openapi_version, RouteSchema, SchemaTransform};
pub use types::{
    is_skipped, reference_uri, Direction, OpenApiVersion, TransformOptions,
    COMPONENTS_SCHEMAS_PREFIX, DEFAULT_SKIP_LIST, INPUT_SUFFIX,
};
pub use validator::{
    create_validation_error, resolve_schema, JsonSchemaParser, Replacer, RequestValidator,
    ResponseSerializer, SafeParse, SchemaSlot, SerializerOptions,
};

#[cfg(feature = "remote")]
pub use loader::load_json_url;
