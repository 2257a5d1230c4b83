//! Immutable parse tree.
//!
//! Nodes are stored flat. Containers point at a contiguous run of child ids
//! (arrays) or key/value pairs (objects), so a subtree never needs to be
//! copied to be shared: a view is just an `Arc<Arena>` plus a node id.

mod builder;
mod de;
mod parse;
mod ser;

use std::{fmt, sync::Arc};

use smol_str::SmolStr;

use crate::error::{Error, Result};

pub(crate) use builder::ArenaBuilder;
pub(crate) use parse::TreeSeed;
pub(crate) use ser::to_tree;

pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl ValueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "boolean",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        }
    }

    pub fn is_container(self) -> bool {
        matches!(self, ValueKind::Array | ValueKind::Object)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeData {
    None,
    Bool(bool),
    String(usize),
    Number(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Pair {
    pub key: usize,
    pub value: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Node {
    pub kind: ValueKind,
    pub first_child: usize,
    pub child_len: usize,
    pub data: NodeData,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Arena {
    pub(crate) nodes: Vec<Node>,
    pub(crate) strings: Vec<String>,
    pub(crate) numbers: Vec<SmolStr>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) pairs: Vec<Pair>,
    pub(crate) keys: Vec<SmolStr>,
    pub(crate) root: NodeId,
}

impl Arena {
    /// Parses UTF-8 JSON text, rejecting nesting deeper than `max_depth`.
    pub fn parse(input: &[u8], max_depth: usize) -> Result<Self> {
        parse::parse_slice(input, max_depth)
    }

    /// Copies an in-memory value. Nodes are laid out exactly as
    /// [`Arena::parse`] lays out the same JSON text, and number text is kept
    /// as the value holds it.
    pub fn from_value(value: &serde_json::Value) -> Self {
        let mut arena = Self::default();
        arena.root = arena.push_value(value);
        arena
    }

    fn push_value(&mut self, value: &serde_json::Value) -> NodeId {
        let (kind, data) = match value {
            serde_json::Value::Null => (ValueKind::Null, NodeData::None),
            serde_json::Value::Bool(b) => (ValueKind::Bool, NodeData::Bool(*b)),
            serde_json::Value::Number(n) => {
                self.numbers.push(SmolStr::new(n.to_string()));
                (ValueKind::Number, NodeData::Number(self.numbers.len() - 1))
            }
            serde_json::Value::String(s) => {
                self.strings.push(s.clone());
                (ValueKind::String, NodeData::String(self.strings.len() - 1))
            }
            serde_json::Value::Array(items) => {
                let ids: Vec<NodeId> = items.iter().map(|item| self.push_value(item)).collect();
                let first_child = self.children.len();
                self.children.extend_from_slice(&ids);
                return self.push_node(ValueKind::Array, first_child, ids.len(), NodeData::None);
            }
            serde_json::Value::Object(map) => {
                let mut pairs = Vec::with_capacity(map.len());
                for (key, item) in map {
                    self.keys.push(SmolStr::new(key));
                    let key = self.keys.len() - 1;
                    pairs.push(Pair {
                        key,
                        value: self.push_value(item),
                    });
                }
                let first_child = self.pairs.len();
                self.pairs.extend_from_slice(&pairs);
                return self.push_node(ValueKind::Object, first_child, pairs.len(), NodeData::None);
            }
        };
        self.push_node(kind, 0, 0, data)
    }

    fn push_node(
        &mut self,
        kind: ValueKind,
        first_child: usize,
        child_len: usize,
        data: NodeData,
    ) -> NodeId {
        self.nodes.push(Node {
            kind,
            first_child,
            child_len,
            data,
        });
        self.nodes.len() - 1
    }

    pub fn null() -> Self {
        Self {
            nodes: vec![Node {
                kind: ValueKind::Null,
                first_child: 0,
                child_len: 0,
                data: NodeData::None,
            }],
            ..Self::default()
        }
    }

    pub fn root(&self) -> NodeView<'_> {
        NodeView {
            arena: self,
            id: self.root,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn view(&self, id: NodeId) -> NodeView<'_> {
        NodeView { arena: self, id }
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub(crate) fn get_str(&self, index: usize) -> Option<&str> {
        self.strings.get(index).map(String::as_str)
    }

    pub(crate) fn get_num_str(&self, index: usize) -> Option<&str> {
        self.numbers.get(index).map(SmolStr::as_str)
    }

    pub(crate) fn get_key(&self, index: usize) -> Option<&str> {
        self.keys.get(index).map(SmolStr::as_str)
    }
}

/// Scalar content of a node, borrowed from its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar<'a> {
    Null,
    Bool(bool),
    Number(&'a str),
    String(&'a str),
}

/// Borrowed handle to one node of an arena.
#[derive(Clone, Copy)]
pub struct NodeView<'a> {
    arena: &'a Arena,
    id: NodeId,
}

impl<'a> NodeView<'a> {
    pub fn id(self) -> NodeId {
        self.id
    }

    pub fn arena(self) -> &'a Arena {
        self.arena
    }

    pub fn kind(self) -> ValueKind {
        self.arena
            .node(self.id)
            .map_or(ValueKind::Null, |node| node.kind)
    }

    /// Scalar content. Containers report `None`.
    pub fn scalar(self) -> Option<Scalar<'a>> {
        let node = self.arena.node(self.id)?;
        match (node.kind, node.data) {
            (ValueKind::Bool, NodeData::Bool(value)) => Some(Scalar::Bool(value)),
            (ValueKind::Number, NodeData::Number(index)) => {
                self.arena.get_num_str(index).map(Scalar::Number)
            }
            (ValueKind::String, NodeData::String(index)) => {
                self.arena.get_str(index).map(Scalar::String)
            }
            (ValueKind::Array | ValueKind::Object, _) => None,
            _ => Some(Scalar::Null),
        }
    }

    pub fn as_bool(self) -> Option<bool> {
        match self.scalar()? {
            Scalar::Bool(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_str(self) -> Option<&'a str> {
        match self.scalar()? {
            Scalar::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn number_text(self) -> Option<&'a str> {
        match self.scalar()? {
            Scalar::Number(text) => Some(text),
            _ => None,
        }
    }

    /// Child count for containers, zero for scalars.
    pub fn len(self) -> usize {
        match self.arena.node(self.id) {
            Some(node) if node.kind.is_container() => node.child_len,
            _ => 0,
        }
    }

    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    pub(crate) fn pairs(self) -> &'a [Pair] {
        match self.arena.node(self.id) {
            Some(node) if node.kind == ValueKind::Object => self
                .arena
                .pairs
                .get(node.first_child..node.first_child + node.child_len)
                .unwrap_or_default(),
            _ => &[],
        }
    }

    pub(crate) fn children(self) -> &'a [NodeId] {
        match self.arena.node(self.id) {
            Some(node) if node.kind == ValueKind::Array => self
                .arena
                .children
                .get(node.first_child..node.first_child + node.child_len)
                .unwrap_or_default(),
            _ => &[],
        }
    }

    /// Object members in document order, duplicates included.
    pub fn properties(self) -> impl Iterator<Item = (&'a str, NodeView<'a>)> + 'a {
        let arena = self.arena;
        self.pairs().iter().map(move |pair| {
            (
                arena.get_key(pair.key).unwrap_or_default(),
                arena.view(pair.value),
            )
        })
    }

    pub fn elements(self) -> impl Iterator<Item = NodeView<'a>> + 'a {
        let arena = self.arena;
        self.children().iter().map(move |&id| arena.view(id))
    }

    /// Looks up a member by name. When the name occurs more than once the
    /// last occurrence wins, as it does for serde_json maps.
    pub fn property(self, name: &str) -> Option<NodeView<'a>> {
        self.pairs()
            .iter()
            .rev()
            .find(|pair| self.arena.get_key(pair.key) == Some(name))
            .map(|pair| self.arena.view(pair.value))
    }

    pub fn index(self, index: usize) -> Option<NodeView<'a>> {
        self.children().get(index).map(|&id| self.arena.view(id))
    }

    pub(crate) fn expect_kind(self, expected: ValueKind, path: &str) -> Result<Self> {
        let found = self.kind();
        if found == expected {
            Ok(self)
        } else {
            Err(Error::type_mismatch(path, expected.as_str(), found.as_str()))
        }
    }
}

impl fmt::Debug for NodeView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeView")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .finish()
    }
}

/// Owned handle to one node of a shared arena.
#[derive(Debug, Clone)]
pub(crate) struct NodeRef {
    tree: Arc<Arena>,
    id: NodeId,
}

impl NodeRef {
    pub fn root(tree: Arc<Arena>) -> Self {
        let id = tree.root;
        Self { tree, id }
    }

    pub fn view(&self) -> NodeView<'_> {
        self.tree.view(self.id)
    }

    pub fn child(&self, child: NodeView<'_>) -> Self {
        Self {
            tree: Arc::clone(&self.tree),
            id: child.id,
        }
    }

    pub fn is_root(&self) -> bool {
        self.id == self.tree.root
    }

    pub fn tree(&self) -> &Arc<Arena> {
        &self.tree
    }
}
