//! JSON Schema generation over a [`SchemaGraph`].
//!
//! Produces draft 2020-12 fragments, one definition per named entry of a
//! name-source registry. Named nodes met below a definition's root become
//! `$ref`s built by the caller's `uri` callback; everything else is inlined,
//! including repeated occurrences of the same node.

use std::collections::{HashMap, HashSet};

use serde_json::{json, Map, Number, Value};

use crate::error::SchemaError;
use crate::registry::{Metadata, Registry};
use crate::schema::{SchemaGraph, SchemaKind, SchemaRef, UnknownKeys};
use crate::types::Direction;

/// What to do with node types that have no JSON Schema form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Unrepresentable {
    /// Emit an unconstrained `{}` schema.
    #[default]
    Any,
    /// Fail with `SchemaError::Unrepresentable`.
    Throw,
}

/// What to do when a node is reached again while it is being expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cycles {
    /// Point back at the defining node with a `$ref`.
    #[default]
    Ref,
    /// Fail with `SchemaError::Cycle`.
    Throw,
}

/// Per-node view handed to the override hook after a node is generated.
pub struct OverrideContext<'a> {
    pub graph: &'a SchemaGraph,
    pub node: SchemaRef,
    pub kind: &'a SchemaKind,
    pub json: &'a mut Map<String, Value>,
}

type UriFn<'a> = Box<dyn Fn(&str) -> String + 'a>;
type OverrideFn<'a> = Box<dyn Fn(&mut OverrideContext<'_>) + 'a>;

/// Options for [`generate`].
pub struct GenerateOptions<'a> {
    pub direction: Direction,
    /// Where descriptions, examples and extra keys come from. Defaults to
    /// the name-source registry.
    pub metadata: Option<&'a Registry>,
    pub unrepresentable: Unrepresentable,
    pub cycles: Cycles,
    uri: UriFn<'a>,
    override_hook: Option<OverrideFn<'a>>,
}

impl<'a> GenerateOptions<'a> {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            metadata: None,
            unrepresentable: Unrepresentable::default(),
            cycles: Cycles::default(),
            uri: Box::new(|id| format!("#/$defs/{}", id)),
            override_hook: None,
        }
    }

    pub fn metadata(mut self, registry: &'a Registry) -> Self {
        self.metadata = Some(registry);
        self
    }

    pub fn unrepresentable(mut self, policy: Unrepresentable) -> Self {
        self.unrepresentable = policy;
        self
    }

    pub fn cycles(mut self, policy: Cycles) -> Self {
        self.cycles = policy;
        self
    }

    /// Build the `$ref` value for a named definition.
    pub fn uri(mut self, uri: impl Fn(&str) -> String + 'a) -> Self {
        self.uri = Box::new(uri);
        self
    }

    /// Run `hook` on every generated node, after its metadata is applied.
    pub fn override_hook(mut self, hook: impl Fn(&mut OverrideContext<'_>) + 'a) -> Self {
        self.override_hook = Some(Box::new(hook));
        self
    }
}

/// Prefix of the names given to unnamed nodes that had to be extracted to
/// break a cycle.
pub const HOISTED_PREFIX: &str = "__schema";

/// Generate one definition per entry of `names` that has an id.
///
/// Unnamed nodes that sit on a cycle are extracted into extra definitions
/// named `__schema<N>`. The result keeps registration order, followed by
/// the extracted definitions.
///
/// # Errors
///
/// Returns `SchemaError::ForeignNode` if a node does not belong to `graph`,
/// and `Cycle`/`Unrepresentable` when the matching policy is `Throw`.
pub fn generate(
    graph: &SchemaGraph,
    names: &Registry,
    options: &GenerateOptions<'_>,
) -> Result<Map<String, Value>, SchemaError> {
    let mut generator = Generator {
        graph,
        names,
        options,
        in_progress: Vec::new(),
        hoisted: HashMap::new(),
        hoisted_defs: Map::new(),
    };

    let mut schemas = Map::new();
    for (node, meta) in names.iter() {
        let Some(id) = meta.non_empty_id() else {
            continue;
        };
        let json = generator.process(node, &format!("/{}", id), true)?;
        schemas.insert(id.to_string(), Value::Object(json));
    }

    for (name, def) in generator.hoisted_defs {
        schemas.insert(name, def);
    }

    Ok(schemas)
}

struct Generator<'g, 'o> {
    graph: &'g SchemaGraph,
    names: &'g Registry,
    options: &'o GenerateOptions<'o>,
    in_progress: Vec<SchemaRef>,
    hoisted: HashMap<SchemaRef, String>,
    hoisted_defs: Map<String, Value>,
}

impl Generator<'_, '_> {
    fn process(
        &mut self,
        node: SchemaRef,
        path: &str,
        is_root: bool,
    ) -> Result<Map<String, Value>, SchemaError> {
        let graph = self.graph;
        let kind = graph.kind(node)?;

        if !is_root {
            if let Some(id) = self.name_of(node) {
                return Ok(self.reference(&id));
            }
            if let Some(name) = self.hoisted.get(&node) {
                let name = name.clone();
                return Ok(self.reference(&name));
            }
        }

        if self.in_progress.contains(&node) {
            return match self.options.cycles {
                Cycles::Throw => Err(SchemaError::Cycle {
                    path: path.to_string(),
                }),
                Cycles::Ref => {
                    let name = self.hoisted_name();
                    self.hoisted.insert(node, name.clone());
                    Ok(self.reference(&name))
                }
            };
        }

        self.in_progress.push(node);
        let result = self.process_kind(kind, path);
        self.in_progress.pop();
        let mut json = result?;

        if let Some(meta) = self.metadata_for(node) {
            for (key, value) in &meta.extra {
                json.insert(key.clone(), value.clone());
            }
        }

        if let Some(hook) = &self.options.override_hook {
            hook(&mut OverrideContext {
                graph,
                node,
                kind,
                json: &mut json,
            });
        }

        // A node extracted while it was being expanded is defined once and
        // referenced from its own position too.
        if let Some(name) = self.hoisted.get(&node).cloned() {
            self.hoisted_defs.insert(name.clone(), Value::Object(json));
            return Ok(self.reference(&name));
        }

        Ok(json)
    }

    fn process_kind(
        &mut self,
        kind: &SchemaKind,
        path: &str,
    ) -> Result<Map<String, Value>, SchemaError> {
        let mut json = Map::new();

        match kind {
            SchemaKind::String(checks) => {
                json.insert("type".into(), json!("string"));
                if let Some(n) = checks.min_length {
                    json.insert("minLength".into(), json!(n));
                }
                if let Some(n) = checks.max_length {
                    json.insert("maxLength".into(), json!(n));
                }
                if let Some(format) = &checks.format {
                    json.insert("format".into(), json!(format));
                }
                if let Some(pattern) = &checks.pattern {
                    json.insert("pattern".into(), json!(pattern));
                }
            }
            SchemaKind::Number(checks) => {
                let ty = if checks.integer { "integer" } else { "number" };
                json.insert("type".into(), json!(ty));
                let bounds = [
                    ("minimum", checks.minimum),
                    ("maximum", checks.maximum),
                    ("exclusiveMinimum", checks.exclusive_minimum),
                    ("exclusiveMaximum", checks.exclusive_maximum),
                    ("multipleOf", checks.multiple_of),
                ];
                for (key, bound) in bounds {
                    if let Some(n) = bound {
                        json.insert(key.into(), number_value(n));
                    }
                }
            }
            SchemaKind::Boolean => {
                json.insert("type".into(), json!("boolean"));
            }
            SchemaKind::Null => {
                json.insert("type".into(), json!("null"));
            }
            SchemaKind::Any | SchemaKind::Unknown => {}
            SchemaKind::Never => {
                json.insert("not".into(), json!({}));
            }
            SchemaKind::Literal(values) => {
                json = literal_schema(values);
            }
            SchemaKind::Enum(values) => {
                json.insert("type".into(), json!("string"));
                json.insert("enum".into(), json!(values));
            }
            SchemaKind::Object {
                shape,
                unknown_keys,
            } => {
                let mut properties = Map::new();
                let mut required = Vec::new();
                for (key, child) in shape {
                    let child_path = format!("{}/properties/{}", path, key);
                    let child_json = self.process(*child, &child_path, false)?;
                    properties.insert(key.clone(), Value::Object(child_json));
                    if !self.is_optional(*child)? {
                        required.push(Value::String(key.clone()));
                    }
                }

                json.insert("type".into(), json!("object"));
                json.insert("properties".into(), Value::Object(properties));
                if !required.is_empty() {
                    json.insert("required".into(), Value::Array(required));
                }

                match unknown_keys {
                    UnknownKeys::Strict => {
                        json.insert("additionalProperties".into(), json!(false));
                    }
                    UnknownKeys::Strip => {
                        // Extra keys are dropped before they reach the wire.
                        if self.options.direction == Direction::Output {
                            json.insert("additionalProperties".into(), json!(false));
                        }
                    }
                    UnknownKeys::Passthrough => {}
                    UnknownKeys::Catchall(schema) => {
                        let child_path = format!("{}/additionalProperties", path);
                        let catchall = self.process(*schema, &child_path, false)?;
                        json.insert("additionalProperties".into(), Value::Object(catchall));
                    }
                }
            }
            SchemaKind::Array {
                item,
                min_items,
                max_items,
            } => {
                let items = self.process(*item, &format!("{}/items", path), false)?;
                json.insert("type".into(), json!("array"));
                json.insert("items".into(), Value::Object(items));
                if let Some(n) = min_items {
                    json.insert("minItems".into(), json!(n));
                }
                if let Some(n) = max_items {
                    json.insert("maxItems".into(), json!(n));
                }
            }
            SchemaKind::Tuple { items, rest } => {
                let mut prefix = Vec::new();
                for (i, item) in items.iter().enumerate() {
                    let item_path = format!("{}/prefixItems/{}", path, i);
                    prefix.push(Value::Object(self.process(*item, &item_path, false)?));
                }
                json.insert("type".into(), json!("array"));
                json.insert("prefixItems".into(), Value::Array(prefix));
                if let Some(rest) = rest {
                    let rest_json = self.process(*rest, &format!("{}/items", path), false)?;
                    json.insert("items".into(), Value::Object(rest_json));
                }
            }
            SchemaKind::Record { key, value } => {
                let key_json = self.process(*key, &format!("{}/propertyNames", path), false)?;
                let value_path = format!("{}/additionalProperties", path);
                let value_json = self.process(*value, &value_path, false)?;
                json.insert("type".into(), json!("object"));
                json.insert("propertyNames".into(), Value::Object(key_json));
                json.insert("additionalProperties".into(), Value::Object(value_json));
            }
            SchemaKind::Union { options, exclusive } => {
                let keyword = if *exclusive { "oneOf" } else { "anyOf" };
                let mut branches = Vec::new();
                for (i, option) in options.iter().enumerate() {
                    let option_path = format!("{}/{}/{}", path, keyword, i);
                    branches.push(Value::Object(self.process(*option, &option_path, false)?));
                }
                json.insert(keyword.into(), Value::Array(branches));
            }
            SchemaKind::Intersection { left, right } => {
                let left = self.process(*left, &format!("{}/allOf/0", path), false)?;
                let right = self.process(*right, &format!("{}/allOf/1", path), false)?;
                json.insert(
                    "allOf".into(),
                    Value::Array(vec![Value::Object(left), Value::Object(right)]),
                );
            }
            SchemaKind::Optional(inner) => {
                json = self.process(*inner, path, false)?;
            }
            SchemaKind::Nullable(inner) => {
                let inner = self.process(*inner, &format!("{}/anyOf/0", path), false)?;
                json.insert(
                    "anyOf".into(),
                    json!([Value::Object(inner), { "type": "null" }]),
                );
            }
            SchemaKind::Default { inner, value } => {
                json = self.process(*inner, path, false)?;
                json.insert("default".into(), value.clone());
            }
            SchemaKind::Readonly(inner) => {
                json = self.process(*inner, path, false)?;
                json.insert("readOnly".into(), json!(true));
            }
            SchemaKind::Pipe { input, output } => {
                let side = match self.options.direction {
                    Direction::Input => *input,
                    Direction::Output => *output,
                };
                json = self.process(side, path, false)?;
            }
            SchemaKind::Date
            | SchemaKind::Undefined
            | SchemaKind::BigInt
            | SchemaKind::Transform
            | SchemaKind::Pending => {
                if self.options.unrepresentable == Unrepresentable::Throw {
                    return Err(SchemaError::Unrepresentable {
                        kind: kind.type_name(),
                        path: path.to_string(),
                    });
                }
            }
        }

        Ok(json)
    }

    /// Whether an object property holding `node` may be absent, for the
    /// current direction.
    fn is_optional(&self, node: SchemaRef) -> Result<bool, SchemaError> {
        let mut current = node;
        let mut seen = HashSet::new();
        loop {
            if !seen.insert(current) {
                return Ok(false);
            }
            match self.graph.kind(current)? {
                SchemaKind::Optional(_) | SchemaKind::Undefined => return Ok(true),
                SchemaKind::Default { .. } => {
                    return Ok(self.options.direction == Direction::Input)
                }
                SchemaKind::Nullable(inner) | SchemaKind::Readonly(inner) => current = *inner,
                SchemaKind::Pipe { input, output } => {
                    current = match self.options.direction {
                        Direction::Input => *input,
                        Direction::Output => *output,
                    };
                }
                _ => return Ok(false),
            }
        }
    }

    fn name_of(&self, node: SchemaRef) -> Option<String> {
        self.names
            .id_of(node)
            .or_else(|| self.options.metadata.and_then(|m| m.id_of(node)))
            .map(str::to_string)
    }

    /// First `__schema<N>` name not used by a registered id or an earlier
    /// extraction.
    fn hoisted_name(&self) -> String {
        let taken = |name: &str| {
            let registered = |registry: &Registry| {
                registry
                    .iter()
                    .any(|(_, meta)| meta.non_empty_id() == Some(name))
            };
            registered(self.names)
                || self.options.metadata.is_some_and(registered)
                || self.hoisted.values().any(|h| h == name)
        };

        (self.hoisted.len()..)
            .map(|n| format!("{}{}", HOISTED_PREFIX, n))
            .find(|name| !taken(name))
            .unwrap_or_else(|| HOISTED_PREFIX.to_string())
    }

    fn metadata_for(&self, node: SchemaRef) -> Option<&Metadata> {
        let source = self.options.metadata.unwrap_or(self.names);
        source.get(node).or_else(|| self.graph.local_meta(node))
    }

    fn reference(&self, id: &str) -> Map<String, Value> {
        let mut json = Map::new();
        json.insert("$ref".into(), Value::String((self.options.uri)(id)));
        json
    }
}

fn literal_schema(values: &[Value]) -> Map<String, Value> {
    let mut json = Map::new();

    let types: HashSet<&str> = values.iter().filter_map(literal_type).collect();
    if types.len() == 1 && values.iter().all(|v| literal_type(v).is_some()) {
        if let Some(ty) = types.into_iter().next() {
            json.insert("type".into(), json!(ty));
        }
    }

    match values {
        [single] => {
            json.insert("const".into(), single.clone());
        }
        _ => {
            json.insert("enum".into(), Value::Array(values.to_vec()));
        }
    }
    json
}

fn literal_type(value: &Value) -> Option<&'static str> {
    match value {
        Value::Null => Some("null"),
        Value::Bool(_) => Some("boolean"),
        Value::Number(_) => Some("number"),
        Value::String(_) => Some("string"),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Whole numbers are written as integers so `1.0` renders as `1`.
fn number_value(n: f64) -> Value {
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE {
        Value::from(n as i64)
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{NumberChecks, StringChecks};

    fn named(graph_node: SchemaRef, id: &str) -> Registry {
        let mut registry = Registry::new();
        registry.add(graph_node, Metadata::with_id(id)).unwrap();
        registry
    }

    #[test]
    fn string_and_number_checks() {
        let mut graph = SchemaGraph::new();
        let name = graph.string_with(StringChecks::new().max_length(32));
        let code = graph.number_with(NumberChecks::new().gt(1.0).lt(10_000.0));
        let seed = graph.number_with(NumberChecks::new().int().min(1.0).max(1000.0));
        let login = graph.object([("name", name), ("code", code), ("seed", seed)]);

        let names = named(login, "Login");
        let schemas = generate(&graph, &names, &GenerateOptions::new(Direction::Input)).unwrap();

        assert_eq!(
            schemas["Login"],
            json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "maxLength": 32 },
                    "code": { "type": "number", "exclusiveMinimum": 1, "exclusiveMaximum": 10000 },
                    "seed": { "type": "integer", "minimum": 1, "maximum": 1000 }
                },
                "required": ["name", "code", "seed"]
            })
        );
    }

    #[test]
    fn default_is_required_only_on_output() {
        let mut graph = SchemaGraph::new();
        let inner = graph.string();
        let id = graph.with_default(inner, "1");
        let obj = graph.object([("id", id)]);
        let names = named(obj, "Obj");

        let input = generate(&graph, &names, &GenerateOptions::new(Direction::Input)).unwrap();
        assert!(input["Obj"].get("required").is_none());
        assert!(input["Obj"].get("additionalProperties").is_none());
        assert_eq!(input["Obj"]["properties"]["id"]["default"], json!("1"));

        let output = generate(&graph, &names, &GenerateOptions::new(Direction::Output)).unwrap();
        assert_eq!(output["Obj"]["required"], json!(["id"]));
        assert_eq!(output["Obj"]["additionalProperties"], json!(false));
    }

    #[test]
    fn named_children_become_refs() {
        let mut graph = SchemaGraph::new();
        let token = graph.string_with(StringChecks::new().length(12));
        let body = graph.object([("access_token", token), ("refresh_token", token)]);

        let mut names = Registry::new();
        names.add(token, Metadata::with_id("Token")).unwrap();
        names.add(body, Metadata::with_id("Body")).unwrap();

        let options = GenerateOptions::new(Direction::Input).uri(|id| format!("#/x/{}", id));
        let schemas = generate(&graph, &names, &options).unwrap();

        assert_eq!(
            schemas["Token"],
            json!({ "type": "string", "minLength": 12, "maxLength": 12 })
        );
        assert_eq!(
            schemas["Body"]["properties"]["access_token"],
            json!({ "$ref": "#/x/Token" })
        );
    }

    #[test]
    fn ids_from_metadata_registry_also_become_refs() {
        let mut graph = SchemaGraph::new();
        let token = graph.string();
        let body = graph.object([("token", token)]);

        let names = named(body, "Scratch");
        let metadata = named(token, "Token");
        let options = GenerateOptions::new(Direction::Output).metadata(&metadata);
        let schemas = generate(&graph, &names, &options).unwrap();

        assert_eq!(
            schemas["Scratch"]["properties"]["token"],
            json!({ "$ref": "#/$defs/Token" })
        );
        assert!(schemas.get("Token").is_none());
    }

    #[test]
    fn named_self_reference_points_back() {
        let mut graph = SchemaGraph::new();
        let group = graph.declare();
        let id = graph.string();
        let subgroups = graph.array(group);
        graph
            .define(
                group,
                SchemaKind::Object {
                    shape: vec![("id".into(), id), ("subgroups".into(), subgroups)],
                    unknown_keys: UnknownKeys::Strip,
                },
            )
            .unwrap();

        let names = named(group, "Group");
        let schemas = generate(&graph, &names, &GenerateOptions::new(Direction::Input)).unwrap();

        assert_eq!(
            schemas["Group"]["properties"]["subgroups"]["items"],
            json!({ "$ref": "#/$defs/Group" })
        );
        assert_eq!(schemas.len(), 1);
    }

    #[test]
    fn unnamed_cycle_is_hoisted() {
        let mut graph = SchemaGraph::new();
        let node = graph.declare();
        let children = graph.array(node);
        graph
            .define(
                node,
                SchemaKind::Object {
                    shape: vec![("children".into(), children)],
                    unknown_keys: UnknownKeys::Passthrough,
                },
            )
            .unwrap();
        let tree = graph.object([("root", node)]);

        let names = named(tree, "Tree");
        let schemas = generate(&graph, &names, &GenerateOptions::new(Direction::Input)).unwrap();

        assert_eq!(
            schemas["Tree"]["properties"]["root"],
            json!({ "$ref": "#/$defs/__schema0" })
        );
        assert_eq!(
            schemas["__schema0"]["properties"]["children"]["items"],
            json!({ "$ref": "#/$defs/__schema0" })
        );
    }

    #[test]
    fn hoisted_name_skips_registered_ids() {
        let mut graph = SchemaGraph::new();
        let node = graph.declare();
        let children = graph.array(node);
        graph
            .define(
                node,
                SchemaKind::Object {
                    shape: vec![("children".into(), children)],
                    unknown_keys: UnknownKeys::Passthrough,
                },
            )
            .unwrap();
        let tree = graph.object([("root", node)]);
        let count = graph.number();

        let mut names = named(tree, "Tree");
        names.add(count, Metadata::with_id("__schema0")).unwrap();
        let schemas = generate(&graph, &names, &GenerateOptions::new(Direction::Output)).unwrap();

        assert_eq!(schemas["__schema0"], json!({ "type": "number" }));
        assert_eq!(
            schemas["Tree"]["properties"]["root"],
            json!({ "$ref": "#/$defs/__schema1" })
        );
        assert_eq!(
            schemas["__schema1"]["properties"]["children"]["items"],
            json!({ "$ref": "#/$defs/__schema1" })
        );
    }

    #[test]
    fn cycle_throw_policy() {
        let mut graph = SchemaGraph::new();
        let node = graph.declare();
        let children = graph.array(node);
        graph
            .define(
                node,
                SchemaKind::Object {
                    shape: vec![("children".into(), children)],
                    unknown_keys: UnknownKeys::Strip,
                },
            )
            .unwrap();
        let tree = graph.object([("root", node)]);

        let names = named(tree, "Tree");
        let options = GenerateOptions::new(Direction::Input).cycles(Cycles::Throw);
        let result = generate(&graph, &names, &options);

        assert!(matches!(
            result,
            Err(SchemaError::Cycle { path }) if path == "/Tree/properties/root/properties/children/items"
        ));
    }

    #[test]
    fn unrepresentable_policies() {
        let mut graph = SchemaGraph::new();
        let date = graph.date();
        let obj = graph.object([("at", date)]);
        let names = named(obj, "Event");

        let schemas = generate(&graph, &names, &GenerateOptions::new(Direction::Input)).unwrap();
        assert_eq!(schemas["Event"]["properties"]["at"], json!({}));

        let options = GenerateOptions::new(Direction::Input).unrepresentable(Unrepresentable::Throw);
        let result = generate(&graph, &names, &options);
        assert!(matches!(
            result,
            Err(SchemaError::Unrepresentable { kind: "date", .. })
        ));
    }

    #[test]
    fn nullable_tuple_and_literals() {
        let mut graph = SchemaGraph::new();
        let admin = graph.literal("admin");
        let role = graph.nullable(admin);
        let read = graph.literal("read");
        let write = graph.literal("write");
        let null = graph.null();
        let scopes = graph.tuple(vec![read, write, null]);
        let obj = graph.object([("required_role", role), ("scopes", scopes)]);
        let names = named(obj, "Unauthorized");

        let schemas = generate(&graph, &names, &GenerateOptions::new(Direction::Output)).unwrap();
        let props = &schemas["Unauthorized"]["properties"];

        assert_eq!(
            props["required_role"],
            json!({ "anyOf": [{ "type": "string", "const": "admin" }, { "type": "null" }] })
        );
        assert_eq!(
            props["scopes"],
            json!({
                "type": "array",
                "prefixItems": [
                    { "type": "string", "const": "read" },
                    { "type": "string", "const": "write" },
                    { "type": "null" }
                ]
            })
        );
    }

    #[test]
    fn pipe_renders_side_for_direction() {
        let mut graph = SchemaGraph::new();
        let raw = graph.string();
        let parsed = graph.transform(raw);
        let obj = graph.object([("value", parsed)]);
        let names = named(obj, "Obj");

        let input = generate(&graph, &names, &GenerateOptions::new(Direction::Input)).unwrap();
        assert_eq!(input["Obj"]["properties"]["value"], json!({ "type": "string" }));

        let output = generate(&graph, &names, &GenerateOptions::new(Direction::Output)).unwrap();
        assert_eq!(output["Obj"]["properties"]["value"], json!({}));
    }

    #[test]
    fn metadata_extra_keys_and_override_hook() {
        let mut graph = SchemaGraph::new();
        let name = graph.string();
        let obj = graph.object([("name", name)]);

        let mut names = named(obj, "User");
        let mut meta = Metadata::default();
        meta.extra.insert("deprecated".into(), json!(true));
        names.add(name, meta).unwrap();

        let options = GenerateOptions::new(Direction::Input).override_hook(|ctx| {
            if ctx.kind.type_name() == "string" {
                ctx.json.insert("x-seen".into(), json!(true));
            }
        });
        let schemas = generate(&graph, &names, &options).unwrap();

        assert_eq!(
            schemas["User"]["properties"]["name"],
            json!({ "type": "string", "deprecated": true, "x-seen": true })
        );
    }

    #[test]
    fn foreign_nodes_fail() {
        let mut one = SchemaGraph::new();
        let two = SchemaGraph::new();
        let node = one.string();
        let names = named(node, "Name");

        let result = generate(&two, &names, &GenerateOptions::new(Direction::Input));
        assert!(matches!(result, Err(SchemaError::ForeignNode { .. })));
    }

    #[test]
    fn number_values_render_whole_numbers_as_integers() {
        assert_eq!(number_value(4.0), json!(4));
        assert_eq!(number_value(-2.0), json!(-2));
        assert_eq!(number_value(0.5), json!(0.5));
        assert_eq!(number_value(f64::NAN), Value::Null);
    }
}
