//! Identity-keyed metadata registries.
//!
//! A [`Registry`] maps schema node identity to [`Metadata`]. Nodes with an
//! `id` become named components and are referenced with `$ref` instead of
//! being inlined.

use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SchemaError;
use crate::schema::SchemaRef;

/// Metadata a registry (or a node itself) carries for a schema node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Component name. Empty ids are treated as absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    /// Any other keys, copied verbatim into generated schemas.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Metadata {
    /// Metadata carrying only an id.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn example(mut self, example: impl Into<Value>) -> Self {
        self.example = Some(example.into());
        self
    }

    /// The id, if present and non-empty.
    pub fn non_empty_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Insertion-ordered store of node metadata, keyed by node identity.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<(SchemaRef, Metadata)>,
    index: HashMap<SchemaRef, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `node` with `meta`, replacing any previous entry for it.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::DuplicateId` if another node already uses the
    /// same non-empty id.
    pub fn add(&mut self, node: SchemaRef, meta: Metadata) -> Result<(), SchemaError> {
        if let Some(id) = meta.non_empty_id() {
            let taken = self
                .entries
                .iter()
                .any(|(other, m)| *other != node && m.non_empty_id() == Some(id));
            if taken {
                return Err(SchemaError::DuplicateId { id: id.to_string() });
            }
        }

        match self.index.get(&node) {
            Some(&i) => self.entries[i].1 = meta,
            None => {
                self.index.insert(node, self.entries.len());
                self.entries.push((node, meta));
            }
        }
        Ok(())
    }

    pub fn get(&self, node: SchemaRef) -> Option<&Metadata> {
        self.index.get(&node).map(|&i| &self.entries[i].1)
    }

    pub fn has(&self, node: SchemaRef) -> bool {
        self.index.contains_key(&node)
    }

    /// Non-empty id registered for `node`.
    pub fn id_of(&self, node: SchemaRef) -> Option<&str> {
        self.get(node).and_then(Metadata::non_empty_id)
    }

    /// Remove the entry for `node`, returning its metadata.
    pub fn remove(&mut self, node: SchemaRef) -> Option<Metadata> {
        let i = self.index.remove(&node)?;
        let (_, meta) = self.entries.remove(i);
        for slot in self.index.values_mut() {
            if *slot > i {
                *slot -= 1;
            }
        }
        Some(meta)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (SchemaRef, &Metadata)> {
        self.entries.iter().map(|(node, meta)| (*node, meta))
    }
}

static GLOBAL_REGISTRY: OnceLock<RwLock<Registry>> = OnceLock::new();

/// Process-wide default registry.
///
/// Created on first use and never torn down. Register schemas before
/// serving; the lock only keeps access memory-safe, it does not order
/// registration against concurrent conversions.
pub fn global_registry() -> &'static RwLock<Registry> {
    GLOBAL_REGISTRY.get_or_init(|| RwLock::new(Registry::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaGraph;
    use serde_json::json;

    #[test]
    fn add_and_get_by_identity() {
        let mut graph = SchemaGraph::new();
        let a = graph.string();
        let b = graph.string();

        let mut registry = Registry::new();
        registry.add(a, Metadata::with_id("Token")).unwrap();

        assert_eq!(registry.id_of(a), Some("Token"));
        assert!(registry.get(b).is_none());
    }

    #[test]
    fn duplicate_id_rejected() {
        let mut graph = SchemaGraph::new();
        let a = graph.string();
        let b = graph.string();

        let mut registry = Registry::new();
        registry.add(a, Metadata::with_id("Token")).unwrap();
        let result = registry.add(b, Metadata::with_id("Token"));

        assert!(matches!(result, Err(SchemaError::DuplicateId { id }) if id == "Token"));
    }

    #[test]
    fn re_adding_same_node_replaces() {
        let mut graph = SchemaGraph::new();
        let a = graph.string();

        let mut registry = Registry::new();
        registry.add(a, Metadata::with_id("Token")).unwrap();
        registry
            .add(a, Metadata::with_id("Token").description("A token"))
            .unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get(a).unwrap().description.as_deref(),
            Some("A token")
        );
    }

    #[test]
    fn empty_id_is_not_an_id() {
        let mut graph = SchemaGraph::new();
        let a = graph.string();

        let mut registry = Registry::new();
        registry.add(a, Metadata::with_id("")).unwrap();
        assert!(registry.has(a));
        assert_eq!(registry.id_of(a), None);
    }

    #[test]
    fn remove_keeps_order() {
        let mut graph = SchemaGraph::new();
        let a = graph.string();
        let b = graph.number();
        let c = graph.boolean();

        let mut registry = Registry::new();
        registry.add(a, Metadata::with_id("A")).unwrap();
        registry.add(b, Metadata::with_id("B")).unwrap();
        registry.add(c, Metadata::with_id("C")).unwrap();

        assert!(registry.remove(a).is_some());
        let ids: Vec<_> = registry.iter().filter_map(|(_, m)| m.id.clone()).collect();
        assert_eq!(ids, vec!["B", "C"]);
        assert_eq!(registry.id_of(c), Some("C"));
        assert!(registry.remove(a).is_none());
    }

    #[test]
    fn metadata_extra_keys_flatten() {
        let meta: Metadata = serde_json::from_value(json!({
            "id": "User",
            "description": "A user",
            "deprecated": true
        }))
        .unwrap();

        assert_eq!(meta.id.as_deref(), Some("User"));
        assert_eq!(meta.extra.get("deprecated"), Some(&json!(true)));
    }

    #[test]
    fn global_registry_is_shared() {
        let mut graph = SchemaGraph::new();
        let node = graph.string();

        global_registry()
            .write()
            .unwrap()
            .add(node, Metadata::with_id("GlobalRegistryTestNode"))
            .unwrap();
        assert!(global_registry().read().unwrap().has(node));

        global_registry().write().unwrap().remove(node);
        assert!(!global_registry().read().unwrap().has(node));
    }
}
