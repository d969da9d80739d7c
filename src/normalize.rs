//! OpenAPI dialect normalization for generated schema fragments.
//!
//! 3.1 speaks JSON Schema 2020-12 and only needs generator bookkeeping
//! keys removed. 3.0 is a JSON Schema subset with its own `nullable`
//! keyword, so unions with `null`, tuples, `const` and numeric exclusive
//! bounds are rewritten.
//!
//! Normalization is idempotent: running it on its own output changes
//! nothing.

use serde_json::{json, Map, Value};

use crate::types::OpenApiVersion;

/// Keys 3.0 has no counterpart for.
const UNSUPPORTED_IN_3_0: &[&str] = &[
    "$schema",
    "$id",
    "unevaluatedProperties",
    "dependentSchemas",
    "patternProperties",
    "propertyNames",
    "contentEncoding",
    "contentMediaType",
];

/// Keys holding a single subschema.
const SINGLE_SUBSCHEMA: &[&str] = &["not", "if", "then", "else", "contains"];

/// Keys holding a list of subschemas.
const SUBSCHEMA_LISTS: &[&str] = &["allOf", "anyOf", "oneOf", "prefixItems"];

/// Keys holding a name-to-subschema map.
const SUBSCHEMA_MAPS: &[&str] = &["properties", "patternProperties", "$defs"];

/// Return `schema` rewritten for `version`. The input is left untouched.
pub fn normalize(schema: &Value, version: OpenApiVersion) -> Value {
    let mut out = schema.clone();
    normalize_in_place(&mut out, version);
    out
}

/// Rewrite `schema` for `version` in place.
pub fn normalize_in_place(schema: &mut Value, version: OpenApiVersion) {
    let Value::Object(map) = schema else {
        return;
    };

    match version {
        OpenApiVersion::V3_1 => strip_identifiers(map),
        OpenApiVersion::V3_0 => downgrade(map),
    }

    for_each_subschema(map, |child| normalize_in_place(child, version));
}

fn strip_identifiers(map: &mut Map<String, Value>) {
    map.remove("$schema");
    map.remove("$id");
    if map.get("id").is_some_and(Value::is_string) {
        map.remove("id");
    }
}

fn downgrade(map: &mut Map<String, Value>) {
    // Flattening can surface a nested union that itself holds `null`.
    loop {
        let lifted = lift_null_branch(map, "anyOf") | lift_null_branch(map, "oneOf");
        if !lifted {
            break;
        }
    }
    lift_null_type(map);

    if matches!(map.get("prefixItems"), Some(Value::Array(_))) {
        tuple_to_items(map);
    }

    if let Some(value) = map.remove("const") {
        map.insert("enum".into(), json!([value]));
    }

    for (exclusive, inclusive) in [
        ("exclusiveMinimum", "minimum"),
        ("exclusiveMaximum", "maximum"),
    ] {
        if map.get(exclusive).is_some_and(Value::is_number) {
            if let Some(bound) = map.remove(exclusive) {
                map.insert(inclusive.into(), bound);
            }
        }
    }

    for key in UNSUPPORTED_IN_3_0 {
        map.remove(*key);
    }
    strip_identifiers(map);
}

fn is_null_schema(schema: &Value) -> bool {
    schema.get("type").and_then(Value::as_str) == Some("null")
}

/// Drop `{type: null}` branches from `map[key]` and mark the schema
/// nullable. A two-branch union is merged into its parent, and a union of
/// nothing but `null` loses the combinator.
fn lift_null_branch(map: &mut Map<String, Value>, key: &str) -> bool {
    let Some(Value::Array(branches)) = map.get(key) else {
        return false;
    };
    if !branches.iter().any(is_null_schema) {
        return false;
    }

    let total = branches.len();
    let mut rest: Vec<Value> = branches
        .iter()
        .filter(|branch| !is_null_schema(branch))
        .cloned()
        .collect();

    if rest.is_empty() {
        map.remove(key);
    } else if total == 2 && rest.len() == 1 {
        map.remove(key);
        if let Some(Value::Object(branch)) = rest.pop() {
            for (k, v) in branch {
                map.insert(k, v);
            }
        }
    } else {
        map.insert(key.to_string(), Value::Array(rest));
    }
    map.insert("nullable".into(), json!(true));
    true
}

/// `type: ["string", "null"]` becomes `type: "string", nullable: true`.
fn lift_null_type(map: &mut Map<String, Value>) {
    let Some(Value::Array(types)) = map.get("type") else {
        return;
    };
    if !types.iter().any(|t| t == "null") {
        return;
    }
    let mut rest: Vec<Value> = types.iter().filter(|t| *t != "null").cloned().collect();
    let ty = match rest.len() {
        0 => return,
        1 => rest.remove(0),
        _ => Value::Array(rest),
    };
    map.insert("type".into(), ty);
    map.insert("nullable".into(), json!(true));
}

/// Positional `prefixItems` become `items: {oneOf: [...]}` with the tuple
/// length as item-count bounds. A rest schema joins the `oneOf` and lifts
/// the upper bound.
fn tuple_to_items(map: &mut Map<String, Value>) {
    let Some(Value::Array(mut branches)) = map.remove("prefixItems") else {
        return;
    };
    let len = branches.len();
    let rest = map.remove("items").filter(Value::is_object);
    let has_rest = rest.is_some();
    branches.extend(rest);

    map.entry("minItems").or_insert_with(|| json!(len));
    if !has_rest {
        map.entry("maxItems").or_insert_with(|| json!(len));
    }
    map.insert("items".into(), json!({ "oneOf": branches }));
}

/// Visit every subschema position of `map`.
fn for_each_subschema(map: &mut Map<String, Value>, mut f: impl FnMut(&mut Value)) {
    for key in SUBSCHEMA_MAPS {
        if let Some(Value::Object(children)) = map.get_mut(*key) {
            children.values_mut().for_each(&mut f);
        }
    }

    if let Some(items) = map.get_mut("items").filter(|v| v.is_object()) {
        f(items);
    }
    if let Some(extra) = map.get_mut("additionalProperties").filter(|v| v.is_object()) {
        f(extra);
    }

    for key in SINGLE_SUBSCHEMA {
        if let Some(child) = map.get_mut(*key) {
            f(child);
        }
    }

    for key in SUBSCHEMA_LISTS {
        if let Some(Value::Array(children)) = map.get_mut(*key) {
            children.iter_mut().for_each(&mut f);
        }
    }
}
