//! Removal of unreferenced component schemas from an OpenAPI document.
//!
//! A mark-and-sweep over `$ref`s: everything outside `components` is a
//! root, definitions reachable from a root are marked, and the remaining
//! entries of `components.schemas` are swept.

use std::collections::BTreeSet;

use serde_json::Value;
use tracing::debug;

use crate::types::COMPONENTS_SCHEMAS_PREFIX;

/// Every `$ref` string in `value`.
///
/// With `skip_components`, the top-level `components` section of `value`
/// is not walked, so definitions referencing each other do not count as
/// usage. Nested keys named `components` (e.g. a property) are walked.
pub fn collect_refs(value: &Value, skip_components: bool) -> BTreeSet<String> {
    let mut refs = BTreeSet::new();
    match value {
        Value::Object(map) if skip_components => {
            if let Some(Value::String(reference)) = map.get("$ref") {
                refs.insert(reference.clone());
            }
            for (_, child) in map.iter().filter(|(key, _)| key.as_str() != "components") {
                collect_into(child, &mut refs);
            }
        }
        _ => collect_into(value, &mut refs),
    }
    refs
}

fn collect_into(value: &Value, refs: &mut BTreeSet<String>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(reference)) = map.get("$ref") {
                refs.insert(reference.clone());
            }
            for child in map.values() {
                collect_into(child, refs);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_into(item, refs);
            }
        }
        _ => {}
    }
}

/// Grow `initial` with every ref reachable through the definitions in
/// `components.schemas` of `document`.
///
/// Each ref is expanded at most once, so reference cycles between
/// definitions terminate.
pub fn resolve_transitive_refs(document: &Value, initial: BTreeSet<String>) -> BTreeSet<String> {
    let schemas = document.pointer("/components/schemas");
    let mut pending: Vec<String> = initial.iter().cloned().collect();
    let mut all = initial;

    while let Some(reference) = pending.pop() {
        let Some(name) = reference.strip_prefix(COMPONENTS_SCHEMAS_PREFIX) else {
            continue;
        };
        let Some(definition) = schemas.and_then(|s| s.get(name)) else {
            continue;
        };
        for found in collect_refs(definition, false) {
            if all.insert(found.clone()) {
                pending.push(found);
            }
        }
    }

    all
}

/// Names of the `components.schemas` entries `document` actually uses.
pub fn used_schema_names(document: &Value) -> BTreeSet<String> {
    let direct = collect_refs(document, true);
    resolve_transitive_refs(document, direct)
        .into_iter()
        .filter_map(|r| r.strip_prefix(COMPONENTS_SCHEMAS_PREFIX).map(str::to_string))
        .collect()
}

/// Return a copy of `document` without unused `components.schemas`
/// entries. Other `components` sections are left alone.
pub fn prune(document: &Value) -> Value {
    let used = used_schema_names(document);
    let mut pruned = document.clone();

    if let Some(Value::Object(schemas)) = pruned.pointer_mut("/components/schemas") {
        let before = schemas.len();
        schemas.retain(|name, _| used.contains(name));
        debug!(
            kept = schemas.len(),
            removed = before - schemas.len(),
            "pruned component schemas"
        );
    }

    pruned
}
