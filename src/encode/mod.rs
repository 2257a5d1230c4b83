//! Merged serialization.
//!
//! Output is produced by walking the parse tree and consulting the change
//! log at every member. Subtrees with no visible change below them are
//! copied straight from the arena; everything else is rebuilt member by
//! member. The same walk drives both the JSON text writer and the arena
//! builder used to materialize a merged subtree.

pub(crate) mod pool;
pub(crate) mod writer;

use std::sync::Arc;

use crate::{
    arena::{Arena, ArenaBuilder, NodeRef, NodeView, Scalar, ValueKind},
    changes::{Change, ChangeKind, LogState, Window},
    error::Result,
    num,
    options::Indent,
    path,
    value::{self, Value},
};

pub(crate) use writer::JsonWriter;

/// Sink for a stream of JSON events.
pub(crate) trait Emit {
    fn null(&mut self) -> Result<()>;
    fn bool(&mut self, value: bool) -> Result<()>;
    fn number(&mut self, text: &str) -> Result<()>;
    fn string(&mut self, value: &str) -> Result<()>;
    fn begin_array(&mut self) -> Result<()>;
    fn end_array(&mut self) -> Result<()>;
    fn begin_object(&mut self) -> Result<()>;
    fn key(&mut self, key: &str) -> Result<()>;
    fn end_object(&mut self) -> Result<()>;

    /// Copies a parse-tree node verbatim.
    fn node(&mut self, node: NodeView<'_>) -> Result<()> {
        match node.kind() {
            ValueKind::Array => {
                self.begin_array()?;
                for element in node.elements() {
                    self.node(element)?;
                }
                self.end_array()
            }
            ValueKind::Object => {
                self.begin_object()?;
                for (key, value) in node.properties() {
                    self.key(key)?;
                    self.node(value)?;
                }
                self.end_object()
            }
            _ => match node.scalar() {
                Some(Scalar::Bool(value)) => self.bool(value),
                Some(Scalar::Number(text)) => self.number(text),
                Some(Scalar::String(value)) => self.string(value),
                Some(Scalar::Null) | None => self.null(),
            },
        }
    }

    fn scalar(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Null => self.null(),
            Value::Bool(v) => self.bool(*v),
            Value::String(v) => self.string(v),
            Value::I8(v) => self.number(&num::integer_text(*v)),
            Value::I16(v) => self.number(&num::integer_text(*v)),
            Value::I32(v) => self.number(&num::integer_text(*v)),
            Value::I64(v) => self.number(&num::integer_text(*v)),
            Value::U8(v) => self.number(&num::integer_text(*v)),
            Value::U16(v) => self.number(&num::integer_text(*v)),
            Value::U32(v) => self.number(&num::integer_text(*v)),
            Value::U64(v) => self.number(&num::integer_text(*v)),
            Value::F32(v) => match num::f32_text(*v) {
                Some(text) => self.number(&text),
                None => self.null(),
            },
            Value::F64(v) => match num::f64_text(*v) {
                Some(text) => self.number(&text),
                None => self.null(),
            },
            Value::Decimal(v) => self.number(&v.to_string()),
            Value::DateTime(v) => self.string(&value::date_time_text(v)),
            Value::Uuid(v) => {
                let mut buf = uuid::Uuid::encode_buffer();
                self.string(v.hyphenated().encode_lower(&mut buf))
            }
            Value::Tree(tree) => self.node(tree.root()),
        }
    }
}

impl Emit for ArenaBuilder {
    fn null(&mut self) -> Result<()> {
        ArenaBuilder::null(self)
    }

    fn bool(&mut self, value: bool) -> Result<()> {
        ArenaBuilder::bool(self, value)
    }

    fn number(&mut self, text: &str) -> Result<()> {
        ArenaBuilder::number(self, text)
    }

    fn string(&mut self, value: &str) -> Result<()> {
        ArenaBuilder::string(self, value)
    }

    fn begin_array(&mut self) -> Result<()> {
        ArenaBuilder::begin_array(self)
    }

    fn end_array(&mut self) -> Result<()> {
        ArenaBuilder::end_array(self)
    }

    fn begin_object(&mut self) -> Result<()> {
        ArenaBuilder::begin_object(self)
    }

    fn key(&mut self, key: &str) -> Result<()> {
        ArenaBuilder::key(self, key)
    }

    fn end_object(&mut self) -> Result<()> {
        ArenaBuilder::end_object(self)
    }
}

/// Emits `node` (the resolved content at `path`) with every change visible
/// in `window` applied beneath it.
pub(crate) fn emit_merged<E: Emit>(
    out: &mut E,
    log: &LogState,
    path: &str,
    node: NodeView<'_>,
    window: Window,
) -> Result<()> {
    if !log.descendant_changed(path, window) {
        return out.node(node);
    }
    match node.kind() {
        ValueKind::Object => {
            out.begin_object()?;
            for (name, value) in node.properties() {
                let child_path = path::push_property(path, name);
                match log.try_get_change(&child_path, window) {
                    Some(change) if change.kind() == ChangeKind::PropertyRemoval => {}
                    Some(change) => {
                        out.key(name)?;
                        emit_change(out, log, &child_path, change, window)?;
                    }
                    None => {
                        out.key(name)?;
                        emit_merged(out, log, &child_path, value, window)?;
                    }
                }
            }
            for name in log.added_properties(path, window) {
                if node.property(&name).is_some() {
                    continue;
                }
                let child_path = path::push_property(path, &name);
                match log.try_get_change(&child_path, window) {
                    Some(change) if change.kind() != ChangeKind::PropertyRemoval => {
                        out.key(&name)?;
                        emit_change(out, log, &child_path, change, window)?;
                    }
                    _ => {}
                }
            }
            out.end_object()
        }
        ValueKind::Array => {
            out.begin_array()?;
            for (index, element) in node.elements().enumerate() {
                let child_path = path::push_index(path, index);
                match log.try_get_change(&child_path, window) {
                    Some(change) => emit_change(out, log, &child_path, change, window)?,
                    None => emit_merged(out, log, &child_path, element, window)?,
                }
            }
            out.end_array()
        }
        _ => out.node(node),
    }
}

fn emit_change<E: Emit>(
    out: &mut E,
    log: &LogState,
    path: &str,
    change: &Change,
    window: Window,
) -> Result<()> {
    match change.value() {
        Value::Tree(tree) => emit_merged(
            out,
            log,
            path,
            tree.root(),
            window.rebase(change.sequence_index()),
        ),
        value => out.scalar(value),
    }
}

pub(crate) fn write_json(
    log: &LogState,
    path: &str,
    node: NodeView<'_>,
    window: Window,
    indent: Indent,
    buffer: Vec<u8>,
) -> Result<Vec<u8>> {
    let mut writer = JsonWriter::with_buffer(buffer, indent);
    tracing::trace!(
        path,
        merged = log.descendant_changed(path, window),
        "writing element"
    );
    emit_merged(&mut writer, log, path, node, window)?;
    Ok(writer.finish_bytes())
}

/// Merged content at `path` as a standalone arena. A whole, unchanged tree
/// is shared rather than copied.
pub(crate) fn materialize(
    log: &LogState,
    path: &str,
    node: &NodeRef,
    window: Window,
) -> Result<Arc<Arena>> {
    if node.is_root() && !log.descendant_changed(path, window) {
        return Ok(Arc::clone(node.tree()));
    }
    let mut builder = ArenaBuilder::unbounded();
    emit_merged(&mut builder, log, path, node.view(), window)?;
    Ok(Arc::new(builder.finish()?))
}
