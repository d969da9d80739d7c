//! Schema-to-JSON conversion for a single node and for a whole registry.

use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::error::SchemaError;
use crate::generator::{generate, GenerateOptions, OverrideContext};
use crate::normalize::normalize_in_place;
use crate::registry::{Metadata, Registry};
use crate::schema::{SchemaGraph, SchemaKind, SchemaRef};
use crate::types::{is_truthy, Direction, OpenApiVersion};

/// Id of the single entry of the scratch name registry used for inline
/// conversion.
const SCRATCH_ID: &str = "__inline__";

/// Prefix of the `$ref`s the generator emits during inline conversion.
/// Every one of them is rewritten before the fragment is returned.
const PLACEHOLDER_PREFIX: &str = "urn:schema-openapi:placeholder:";

/// Convert one node into a JSON Schema fragment for an OpenAPI document.
///
/// A node registered in `registry` with an id converts to nothing but a
/// `$ref` to its component. Anything else is expanded inline; named nodes
/// reached from it still become `$ref`s for `direction`.
///
/// # Errors
///
/// Returns `SchemaError::ForeignNode` when an expanded node does not belong
/// to `graph`.
pub fn schema_to_json(
    graph: &SchemaGraph,
    node: SchemaRef,
    registry: &Registry,
    direction: Direction,
    version: OpenApiVersion,
) -> Result<Value, SchemaError> {
    if let Some(id) = registry.id_of(node) {
        return Ok(json!({ "$ref": direction.reference_uri(id) }));
    }

    let mut scratch = Registry::new();
    scratch.add(node, Metadata::with_id(SCRATCH_ID))?;

    let options = GenerateOptions::new(direction)
        .metadata(registry)
        .uri(|id| format!("{}{}", PLACEHOLDER_PREFIX, id))
        .override_hook(|ctx| apply_overrides(ctx, registry, direction));

    let mut schemas = generate(graph, &scratch, &options)?;
    let mut fragment = schemas.remove(SCRATCH_ID).unwrap_or_else(|| json!({}));

    let mut expanding = vec![SCRATCH_ID.to_string()];
    rewrite_refs(&mut fragment, direction, &schemas, &mut expanding);
    normalize_in_place(&mut fragment, version);

    debug!(%node, %direction, %version, "converted schema inline");
    Ok(fragment)
}

/// Convert every named entry of `registry` in one generation pass.
///
/// Keys are component names: the bare id for output, `<id>Input` for
/// input. Cross-references between entries point at the same direction's
/// components.
///
/// # Errors
///
/// Returns `SchemaError::ForeignNode` when a registered node does not
/// belong to `graph`.
pub fn registry_to_json(
    graph: &SchemaGraph,
    registry: &Registry,
    direction: Direction,
    version: OpenApiVersion,
) -> Result<Map<String, Value>, SchemaError> {
    let options = GenerateOptions::new(direction)
        .uri(move |id| direction.reference_uri(id))
        .override_hook(|ctx| apply_overrides(ctx, registry, direction));

    let schemas = generate(graph, registry, &options)?;

    let mut components = Map::new();
    for (id, mut schema) in schemas {
        normalize_in_place(&mut schema, version);
        components.insert(direction.schema_name(&id), schema);
    }

    debug!(
        %direction,
        %version,
        count = components.len(),
        "converted registry"
    );
    Ok(components)
}

/// Copy description and example onto the fragment, and render dates and
/// `undefined` the way they travel on the wire for output.
fn apply_overrides(ctx: &mut OverrideContext<'_>, registry: &Registry, direction: Direction) {
    let meta = registry
        .get(ctx.node)
        .or_else(|| ctx.graph.local_meta(ctx.node));

    if let Some(meta) = meta {
        if let Some(description) = &meta.description {
            ctx.json
                .insert("description".into(), Value::String(description.clone()));
        }
        if let Some(example) = meta.example.as_ref().filter(|e| is_truthy(e)) {
            ctx.json.insert("example".into(), example.clone());
        }
    }

    if direction == Direction::Input {
        return;
    }

    match ctx.kind {
        SchemaKind::Date => {
            ctx.json.insert("type".into(), json!("string"));
            ctx.json.insert("format".into(), json!("date-time"));
        }
        SchemaKind::Undefined => {
            ctx.json.insert("type".into(), json!("null"));
        }
        _ => {}
    }
}

/// Turn placeholder `$ref`s into component references.
///
/// Refs to definitions that only exist inside this generation pass (the
/// converted node itself, or an unnamed cycle) have nowhere to point in
/// the document: they are expanded once, and a recursive occurrence below
/// that is left unconstrained.
fn rewrite_refs(
    value: &mut Value,
    direction: Direction,
    internal: &Map<String, Value>,
    expanding: &mut Vec<String>,
) {
    match value {
        Value::Object(map) => {
            let target = map
                .get("$ref")
                .and_then(Value::as_str)
                .and_then(|r| r.strip_prefix(PLACEHOLDER_PREFIX))
                .map(str::to_string);

            let mut pushed = false;
            if let Some(id) = target {
                if expanding.contains(&id) {
                    warn!(
                        schema = %id,
                        "unnamed recursive schema cannot be referenced inline; register it with an id"
                    );
                    map.remove("$ref");
                } else if let Some(Value::Object(def)) = internal.get(&id) {
                    map.remove("$ref");
                    for (k, v) in def {
                        map.entry(k.clone()).or_insert_with(|| v.clone());
                    }
                    expanding.push(id);
                    pushed = true;
                } else {
                    map.insert("$ref".into(), Value::String(direction.reference_uri(&id)));
                }
            }

            for child in map.values_mut() {
                rewrite_refs(child, direction, internal, expanding);
            }

            if pushed {
                expanding.pop();
            }
        }
        Value::Array(items) => {
            for item in items {
                rewrite_refs(item, direction, internal, expanding);
            }
        }
        _ => {}
    }
}
