//! Arena-backed schema graph.
//!
//! Nodes live in a [`SchemaGraph`] and are addressed by [`SchemaRef`]
//! handles. Identity is the handle, never the structure: two identical
//! `string()` nodes are distinct, which is what registries key on.
//! Recursive schemas are built with [`SchemaGraph::declare`] followed by
//! [`SchemaGraph::define`], so a cycle is just an index pointing back.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use serde_json::Value;

use crate::error::SchemaError;
use crate::registry::Metadata;

static NEXT_GRAPH_ID: AtomicU32 = AtomicU32::new(1);

/// Identity handle for one node of a [`SchemaGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaRef {
    graph: u32,
    index: u32,
}

impl SchemaRef {
    /// Id of the graph that owns this node.
    pub fn graph_id(&self) -> u32 {
        self.graph
    }

    pub fn index(&self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}:{}", self.graph, self.index)
    }
}

/// Constraints on a string schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringChecks {
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,
    pub format: Option<String>,
}

impl StringChecks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_length(mut self, n: u64) -> Self {
        self.min_length = Some(n);
        self
    }

    pub fn max_length(mut self, n: u64) -> Self {
        self.max_length = Some(n);
        self
    }

    /// Exact length: sets both bounds.
    pub fn length(self, n: u64) -> Self {
        self.min_length(n).max_length(n)
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }
}

/// Constraints on a number schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumberChecks {
    pub integer: bool,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
    pub exclusive_maximum: Option<f64>,
    pub multiple_of: Option<f64>,
}

impl NumberChecks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn int(mut self) -> Self {
        self.integer = true;
        self
    }

    /// Inclusive lower bound.
    pub fn min(mut self, n: f64) -> Self {
        self.minimum = Some(n);
        self
    }

    /// Inclusive upper bound.
    pub fn max(mut self, n: f64) -> Self {
        self.maximum = Some(n);
        self
    }

    /// Exclusive lower bound.
    pub fn gt(mut self, n: f64) -> Self {
        self.exclusive_minimum = Some(n);
        self
    }

    /// Exclusive upper bound.
    pub fn lt(mut self, n: f64) -> Self {
        self.exclusive_maximum = Some(n);
        self
    }

    pub fn multiple_of(mut self, n: f64) -> Self {
        self.multiple_of = Some(n);
        self
    }
}

/// What an object does with keys that are not in its shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownKeys {
    /// Unknown keys are dropped when parsing.
    #[default]
    Strip,
    /// Unknown keys are rejected.
    Strict,
    /// Unknown keys are kept as-is.
    Passthrough,
    /// Unknown keys must match the given schema.
    Catchall(SchemaRef),
}

/// The rule a node represents.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    String(StringChecks),
    Number(NumberChecks),
    Boolean,
    Null,
    Undefined,
    Date,
    BigInt,
    Any,
    Unknown,
    Never,
    /// One or more literal values.
    Literal(Vec<Value>),
    /// A closed set of strings.
    Enum(Vec<String>),
    Object {
        shape: Vec<(String, SchemaRef)>,
        unknown_keys: UnknownKeys,
    },
    Array {
        item: SchemaRef,
        min_items: Option<u64>,
        max_items: Option<u64>,
    },
    Tuple {
        items: Vec<SchemaRef>,
        rest: Option<SchemaRef>,
    },
    Record {
        key: SchemaRef,
        value: SchemaRef,
    },
    /// `exclusive` unions render as `oneOf`, the rest as `anyOf`.
    Union {
        options: Vec<SchemaRef>,
        exclusive: bool,
    },
    Intersection {
        left: SchemaRef,
        right: SchemaRef,
    },
    Optional(SchemaRef),
    Nullable(SchemaRef),
    Default {
        inner: SchemaRef,
        value: Value,
    },
    Readonly(SchemaRef),
    /// Parses with `input`, then feeds the result to `output`.
    Pipe {
        input: SchemaRef,
        output: SchemaRef,
    },
    /// An opaque value transformation.
    Transform,
    /// Reserved by [`SchemaGraph::declare`] and not yet defined.
    Pending,
}

impl SchemaKind {
    /// Runtime type name of the node.
    pub fn type_name(&self) -> &'static str {
        match self {
            SchemaKind::String(_) => "string",
            SchemaKind::Number(_) => "number",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Null => "null",
            SchemaKind::Undefined => "undefined",
            SchemaKind::Date => "date",
            SchemaKind::BigInt => "bigint",
            SchemaKind::Any => "any",
            SchemaKind::Unknown => "unknown",
            SchemaKind::Never => "never",
            SchemaKind::Literal(_) => "literal",
            SchemaKind::Enum(_) => "enum",
            SchemaKind::Object { .. } => "object",
            SchemaKind::Array { .. } => "array",
            SchemaKind::Tuple { .. } => "tuple",
            SchemaKind::Record { .. } => "record",
            SchemaKind::Union { .. } => "union",
            SchemaKind::Intersection { .. } => "intersection",
            SchemaKind::Optional(_) => "optional",
            SchemaKind::Nullable(_) => "nullable",
            SchemaKind::Default { .. } => "default",
            SchemaKind::Readonly(_) => "readonly",
            SchemaKind::Pipe { .. } => "pipe",
            SchemaKind::Transform => "transform",
            SchemaKind::Pending => "pending",
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    kind: SchemaKind,
    meta: Option<Metadata>,
}

/// Arena owning every node of a set of schemas.
///
/// Nodes are immutable once defined, apart from node-local metadata.
#[derive(Debug)]
pub struct SchemaGraph {
    id: u32,
    nodes: Vec<Node>,
}

impl SchemaGraph {
    pub fn new() -> Self {
        Self {
            id: NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed),
            nodes: Vec::new(),
        }
    }

    /// Process-unique id of this graph.
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns true if `node` was created by this graph.
    pub fn contains(&self, node: SchemaRef) -> bool {
        node.graph == self.id && node.index() < self.nodes.len()
    }

    /// Add a node of the given kind.
    pub fn add(&mut self, kind: SchemaKind) -> SchemaRef {
        let index = self.nodes.len() as u32;
        self.nodes.push(Node { kind, meta: None });
        SchemaRef {
            graph: self.id,
            index,
        }
    }

    /// Kind of `node`.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::ForeignNode` if `node` belongs to another graph.
    pub fn kind(&self, node: SchemaRef) -> Result<&SchemaKind, SchemaError> {
        self.node(node).map(|n| &n.kind)
    }

    /// Metadata attached to the node itself, if any.
    pub fn local_meta(&self, node: SchemaRef) -> Option<&Metadata> {
        self.node(node).ok().and_then(|n| n.meta.as_ref())
    }

    /// Attach metadata to the node itself.
    ///
    /// This metadata is only a fallback: a registry entry for the same node
    /// takes precedence, and registering the node elsewhere does not carry
    /// it along.
    pub fn meta(&mut self, node: SchemaRef, meta: Metadata) -> Result<(), SchemaError> {
        self.node_mut(node)?.meta = Some(meta);
        Ok(())
    }

    /// Set the node-local description, keeping other node-local metadata.
    pub fn describe(
        &mut self,
        node: SchemaRef,
        description: impl Into<String>,
    ) -> Result<(), SchemaError> {
        let slot = self.node_mut(node)?;
        slot.meta.get_or_insert_with(Metadata::default).description = Some(description.into());
        Ok(())
    }

    /// Reserve a node to be defined later, for recursive schemas.
    pub fn declare(&mut self) -> SchemaRef {
        self.add(SchemaKind::Pending)
    }

    /// Define a node reserved with [`declare`](Self::declare).
    ///
    /// Defining an already-defined node replaces it.
    pub fn define(&mut self, node: SchemaRef, kind: SchemaKind) -> Result<(), SchemaError> {
        self.node_mut(node)?.kind = kind;
        Ok(())
    }

    fn node(&self, node: SchemaRef) -> Result<&Node, SchemaError> {
        if node.graph != self.id {
            return Err(SchemaError::ForeignNode {
                node,
                graph: self.id,
            });
        }
        self.nodes.get(node.index()).ok_or(SchemaError::ForeignNode {
            node,
            graph: self.id,
        })
    }

    fn node_mut(&mut self, node: SchemaRef) -> Result<&mut Node, SchemaError> {
        let graph = self.id;
        if node.graph != graph {
            return Err(SchemaError::ForeignNode { node, graph });
        }
        self.nodes
            .get_mut(node.index())
            .ok_or(SchemaError::ForeignNode { node, graph })
    }

    // --- Builders ---

    pub fn string(&mut self) -> SchemaRef {
        self.add(SchemaKind::String(StringChecks::default()))
    }

    pub fn string_with(&mut self, checks: StringChecks) -> SchemaRef {
        self.add(SchemaKind::String(checks))
    }

    pub fn number(&mut self) -> SchemaRef {
        self.add(SchemaKind::Number(NumberChecks::default()))
    }

    pub fn int(&mut self) -> SchemaRef {
        self.add(SchemaKind::Number(NumberChecks::new().int()))
    }

    pub fn number_with(&mut self, checks: NumberChecks) -> SchemaRef {
        self.add(SchemaKind::Number(checks))
    }

    pub fn boolean(&mut self) -> SchemaRef {
        self.add(SchemaKind::Boolean)
    }

    pub fn null(&mut self) -> SchemaRef {
        self.add(SchemaKind::Null)
    }

    pub fn undefined(&mut self) -> SchemaRef {
        self.add(SchemaKind::Undefined)
    }

    pub fn date(&mut self) -> SchemaRef {
        self.add(SchemaKind::Date)
    }

    pub fn bigint(&mut self) -> SchemaRef {
        self.add(SchemaKind::BigInt)
    }

    pub fn any(&mut self) -> SchemaRef {
        self.add(SchemaKind::Any)
    }

    pub fn unknown(&mut self) -> SchemaRef {
        self.add(SchemaKind::Unknown)
    }

    pub fn never(&mut self) -> SchemaRef {
        self.add(SchemaKind::Never)
    }

    pub fn literal(&mut self, value: impl Into<Value>) -> SchemaRef {
        self.add(SchemaKind::Literal(vec![value.into()]))
    }

    pub fn enumeration<I, S>(&mut self, values: I) -> SchemaRef
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add(SchemaKind::Enum(values.into_iter().map(Into::into).collect()))
    }

    /// Object that strips unknown keys.
    pub fn object<I, K>(&mut self, shape: I) -> SchemaRef
    where
        I: IntoIterator<Item = (K, SchemaRef)>,
        K: Into<String>,
    {
        self.object_with(shape, UnknownKeys::Strip)
    }

    /// Object that rejects unknown keys.
    pub fn strict_object<I, K>(&mut self, shape: I) -> SchemaRef
    where
        I: IntoIterator<Item = (K, SchemaRef)>,
        K: Into<String>,
    {
        self.object_with(shape, UnknownKeys::Strict)
    }

    pub fn object_with<I, K>(&mut self, shape: I, unknown_keys: UnknownKeys) -> SchemaRef
    where
        I: IntoIterator<Item = (K, SchemaRef)>,
        K: Into<String>,
    {
        self.add(SchemaKind::Object {
            shape: shape.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            unknown_keys,
        })
    }

    pub fn array(&mut self, item: SchemaRef) -> SchemaRef {
        self.add(SchemaKind::Array {
            item,
            min_items: None,
            max_items: None,
        })
    }

    pub fn tuple(&mut self, items: Vec<SchemaRef>) -> SchemaRef {
        self.add(SchemaKind::Tuple { items, rest: None })
    }

    pub fn record(&mut self, key: SchemaRef, value: SchemaRef) -> SchemaRef {
        self.add(SchemaKind::Record { key, value })
    }

    pub fn union(&mut self, options: Vec<SchemaRef>) -> SchemaRef {
        self.add(SchemaKind::Union {
            options,
            exclusive: false,
        })
    }

    pub fn exclusive_union(&mut self, options: Vec<SchemaRef>) -> SchemaRef {
        self.add(SchemaKind::Union {
            options,
            exclusive: true,
        })
    }

    pub fn intersection(&mut self, left: SchemaRef, right: SchemaRef) -> SchemaRef {
        self.add(SchemaKind::Intersection { left, right })
    }

    pub fn optional(&mut self, inner: SchemaRef) -> SchemaRef {
        self.add(SchemaKind::Optional(inner))
    }

    pub fn nullable(&mut self, inner: SchemaRef) -> SchemaRef {
        self.add(SchemaKind::Nullable(inner))
    }

    pub fn with_default(&mut self, inner: SchemaRef, value: impl Into<Value>) -> SchemaRef {
        self.add(SchemaKind::Default {
            inner,
            value: value.into(),
        })
    }

    pub fn readonly(&mut self, inner: SchemaRef) -> SchemaRef {
        self.add(SchemaKind::Readonly(inner))
    }

    pub fn pipe(&mut self, input: SchemaRef, output: SchemaRef) -> SchemaRef {
        self.add(SchemaKind::Pipe { input, output })
    }

    /// `input` followed by an opaque transformation.
    pub fn transform(&mut self, input: SchemaRef) -> SchemaRef {
        let output = self.add(SchemaKind::Transform);
        self.pipe(input, output)
    }
}

impl Default for SchemaGraph {
    fn default() -> Self {
        Self::new()
    }
}
