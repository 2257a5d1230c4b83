use smallvec::SmallVec;
use smol_str::SmolStr;

use super::{Arena, Node, NodeData, NodeId, Pair, ValueKind};
use crate::error::{Error, Result};

enum Frame {
    Array(SmallVec<[NodeId; 16]>),
    Object {
        pairs: SmallVec<[Pair; 16]>,
        key: Option<usize>,
    },
}

/// Event-driven arena construction. Containers collect their children on a
/// stack and are laid out contiguously when they close, so children always
/// precede their parent and the root is the last node pushed.
pub(crate) struct ArenaBuilder {
    arena: Arena,
    stack: Vec<Frame>,
    max_depth: usize,
    root: Option<NodeId>,
}

impl ArenaBuilder {
    pub fn new(max_depth: usize) -> Self {
        Self {
            arena: Arena::default(),
            stack: Vec::new(),
            max_depth,
            root: None,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(usize::MAX)
    }

    pub fn finish(self) -> Result<Arena> {
        if !self.stack.is_empty() {
            return Err(Error::serialize("unterminated container"));
        }
        let root = self
            .root
            .ok_or_else(|| Error::serialize("no value was written"))?;
        let mut arena = self.arena;
        arena.root = root;
        Ok(arena)
    }

    pub fn null(&mut self) -> Result<()> {
        self.leaf(ValueKind::Null, NodeData::None)
    }

    pub fn bool(&mut self, value: bool) -> Result<()> {
        self.leaf(ValueKind::Bool, NodeData::Bool(value))
    }

    pub fn number(&mut self, text: &str) -> Result<()> {
        let index = self.arena.numbers.len();
        self.arena.numbers.push(SmolStr::new(text));
        self.leaf(ValueKind::Number, NodeData::Number(index))
    }

    pub fn string(&mut self, value: &str) -> Result<()> {
        let index = self.arena.strings.len();
        self.arena.strings.push(value.to_owned());
        self.leaf(ValueKind::String, NodeData::String(index))
    }

    pub fn key(&mut self, key: &str) -> Result<()> {
        let index = self.arena.keys.len();
        match self.stack.last_mut() {
            Some(Frame::Object { key: slot, .. }) if slot.is_none() => {
                *slot = Some(index);
            }
            _ => return Err(Error::serialize("key written outside of an object")),
        }
        self.arena.keys.push(SmolStr::new(key));
        Ok(())
    }

    pub fn begin_array(&mut self) -> Result<()> {
        self.check_depth()?;
        self.stack.push(Frame::Array(SmallVec::new()));
        Ok(())
    }

    pub fn begin_object(&mut self) -> Result<()> {
        self.check_depth()?;
        self.stack.push(Frame::Object {
            pairs: SmallVec::new(),
            key: None,
        });
        Ok(())
    }

    pub fn end_array(&mut self) -> Result<()> {
        let Some(Frame::Array(items)) = self.stack.pop() else {
            return Err(Error::serialize("mismatched end of array"));
        };
        let first_child = self.arena.children.len();
        self.arena.children.extend_from_slice(&items);
        self.container(ValueKind::Array, first_child, items.len())
    }

    pub fn end_object(&mut self) -> Result<()> {
        let Some(Frame::Object { pairs, key: None }) = self.stack.pop() else {
            return Err(Error::serialize("mismatched end of object"));
        };
        let first_child = self.arena.pairs.len();
        self.arena.pairs.extend_from_slice(&pairs);
        self.container(ValueKind::Object, first_child, pairs.len())
    }

    fn check_depth(&self) -> Result<()> {
        if self.stack.len() >= self.max_depth {
            return Err(Error::serialize(format!(
                "maximum nesting depth of {} exceeded",
                self.max_depth
            )));
        }
        Ok(())
    }

    fn leaf(&mut self, kind: ValueKind, data: NodeData) -> Result<()> {
        let id = self.push(Node {
            kind,
            first_child: 0,
            child_len: 0,
            data,
        });
        self.attach(id)
    }

    fn container(&mut self, kind: ValueKind, first_child: usize, child_len: usize) -> Result<()> {
        let id = self.push(Node {
            kind,
            first_child,
            child_len,
            data: NodeData::None,
        });
        self.attach(id)
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = self.arena.nodes.len();
        self.arena.nodes.push(node);
        id
    }

    fn attach(&mut self, id: NodeId) -> Result<()> {
        match self.stack.last_mut() {
            None if self.root.is_none() => {
                self.root = Some(id);
                Ok(())
            }
            None => Err(Error::serialize("more than one top-level value")),
            Some(Frame::Array(items)) => {
                items.push(id);
                Ok(())
            }
            Some(Frame::Object { pairs, key }) => {
                let key = key
                    .take()
                    .ok_or_else(|| Error::serialize("object value written without a key"))?;
                pairs.push(Pair { key, value: id });
                Ok(())
            }
        }
    }
}
