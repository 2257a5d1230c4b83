//! Views into a document.
//!
//! An [`Element`] is a cheap handle: the document it belongs to, the parse
//! node it was read from, its canonical path and the log window it observes.
//! Every read first checks that nothing above the element was replaced, then
//! resolves the latest visible entry at its own path.

mod accessors;
mod iter;

use std::{fmt, io, sync::Arc, sync::RwLockReadGuard};

use serde::{de::DeserializeOwned, Serialize};
use smol_str::SmolStr;

use crate::{
    arena::{self, Arena, NodeRef, NodeView, ValueKind},
    changes::{Change, ChangeKind, HighWaterMark, LogState, Window},
    document::Document,
    encode::{self, pool},
    error::{Error, Result},
    options::Indent,
    path::{self, Segment},
    value::Value,
};

pub use accessors::FromScalar;
pub use iter::{ArrayIter, ObjectIter, Property};

#[derive(Clone)]
pub struct Element<'a> {
    document: &'a Document,
    node: NodeRef,
    path: SmolStr,
    window: Window,
}

/// The content an element currently stands for.
pub(crate) struct Resolved {
    node: NodeRef,
    window: Window,
    change: Option<Arc<Change>>,
}

impl Resolved {
    fn view(&self) -> NodeView<'_> {
        self.node.view()
    }
}

impl<'a> Element<'a> {
    pub(crate) fn new(document: &'a Document, node: NodeRef, path: SmolStr, window: Window) -> Self {
        Self {
            document,
            node,
            path,
            window,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn window(&self) -> Window {
        self.window
    }

    pub fn high_water_mark(&self) -> HighWaterMark {
        self.window.high_water_mark
    }

    pub fn document(&self) -> &'a Document {
        self.document
    }

    /// Returns a copy of this view that ignores every change appended after
    /// this call. Elements navigated from the copy inherit the pin.
    pub fn pin(&self) -> Element<'a> {
        let mark = self.document.changes().len() as u64;
        Element {
            window: self.window.pinned_at(mark),
            ..self.clone()
        }
    }

    fn log(&self) -> RwLockReadGuard<'a, LogState> {
        self.document.changes().read()
    }

    fn ensure_valid_in(&self, log: &LogState) -> Result<()> {
        let container = self.node.view().kind().is_container();
        let stale = log.ancestor_changed(&self.path, self.window)
            || log.any_at(&self.path, self.window, |change| match change.kind() {
                ChangeKind::PropertyRemoval => true,
                ChangeKind::Modification => container,
                ChangeKind::PropertyAddition => false,
            });
        if stale {
            tracing::debug!(path = %self.path, base = self.window.base, "rejected stale element");
            return Err(Error::stale(&self.path));
        }
        Ok(())
    }

    pub(crate) fn resolve_in(&self, log: &LogState) -> Result<Resolved> {
        self.ensure_valid_in(log)?;
        Ok(match log.try_get_change(&self.path, self.window) {
            Some(change) => Resolved {
                node: NodeRef::root(change.tree()),
                window: self.window.rebase(change.sequence_index()),
                change: Some(Arc::clone(change)),
            },
            None => Resolved {
                node: self.node.clone(),
                window: self.window,
                change: None,
            },
        })
    }

    /// Child at `path`, preferring the latest visible entry over the parse
    /// tree. A removed property has no child.
    pub(crate) fn child_in(
        &self,
        log: &LogState,
        resolved: &Resolved,
        path: SmolStr,
        original: Option<NodeView<'_>>,
    ) -> Option<Element<'a>> {
        if let Some(change) = log.try_get_change(&path, resolved.window) {
            if change.kind() == ChangeKind::PropertyRemoval {
                return None;
            }
            let window = resolved.window.rebase(change.sequence_index());
            return Some(Element::new(
                self.document,
                NodeRef::root(change.tree()),
                path,
                window,
            ));
        }
        let original = original?;
        Some(Element::new(
            self.document,
            resolved.node.child(original),
            path,
            resolved.window,
        ))
    }

    pub fn value_kind(&self) -> Result<ValueKind> {
        let log = self.log();
        Ok(self.resolve_in(&log)?.view().kind())
    }

    pub fn try_get_property(&self, name: &str) -> Result<Option<Element<'a>>> {
        let log = self.log();
        let resolved = self.resolve_in(&log)?;
        let object = resolved
            .view()
            .expect_kind(ValueKind::Object, &self.path)?;
        let path = path::push_property(&self.path, name);
        Ok(self.child_in(&log, &resolved, path, object.property(name)))
    }

    pub fn get_property(&self, name: &str) -> Result<Element<'a>> {
        self.try_get_property(name)?
            .ok_or_else(|| Error::property_not_found(&self.path, name))
    }

    pub fn get_index(&self, index: usize) -> Result<Element<'a>> {
        let log = self.log();
        let resolved = self.resolve_in(&log)?;
        let array = resolved
            .view()
            .expect_kind(ValueKind::Array, &self.path)?;
        let out_of_bounds = || Error::index_out_of_bounds(&self.path, index, array.len());
        let element = array.index(index).ok_or_else(out_of_bounds)?;
        let path = path::push_index(&self.path, index);
        self.child_in(&log, &resolved, path, Some(element))
            .ok_or_else(out_of_bounds)
    }

    pub fn array_length(&self) -> Result<usize> {
        let log = self.log();
        let resolved = self.resolve_in(&log)?;
        let array = resolved
            .view()
            .expect_kind(ValueKind::Array, &self.path)?;
        Ok(array.len())
    }

    /// Follows a relative selector such as `items[2].name`.
    pub fn select(&self, selector: &str) -> Result<Element<'a>> {
        let mut current = self.clone();
        for segment in path::parse(selector)? {
            current = match segment {
                Segment::Property(name) => current.get_property(&name)?,
                Segment::Index(index) => current.get_index(index)?,
            };
        }
        Ok(current)
    }

    pub fn enumerate_object(&self) -> Result<ObjectIter<'a>> {
        let log = self.log();
        let resolved = self.resolve_in(&log)?;
        let object = resolved
            .view()
            .expect_kind(ValueKind::Object, &self.path)?;
        let added: Vec<SmolStr> = log
            .added_properties(&self.path, resolved.window)
            .into_iter()
            .filter(|name| object.property(name).is_none())
            .collect();
        drop(log);
        Ok(ObjectIter::new(self.clone(), resolved, added))
    }

    pub fn enumerate_array(&self) -> Result<ArrayIter<'a>> {
        let log = self.log();
        let resolved = self.resolve_in(&log)?;
        let len = resolved
            .view()
            .expect_kind(ValueKind::Array, &self.path)?
            .len();
        drop(log);
        Ok(ArrayIter::new(self.clone(), resolved, len))
    }

    /// Replaces the value at this element's path.
    pub fn set(&self, value: impl Into<Value>) -> Result<()> {
        {
            let log = self.log();
            self.ensure_valid_in(&log)?;
        }
        self.document.changes().add_change(
            self.path.clone(),
            value.into(),
            ChangeKind::Modification,
            None,
        );
        Ok(())
    }

    /// Re-encodes `value` with the document's naming policy and stores the
    /// resulting subtree at this element's path.
    pub fn set_serialized<T>(&self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let tree = arena::to_tree(value, self.document.options())
            .map_err(|err| err.with_path(self.path.as_str()))?;
        self.set(Value::Tree(Arc::new(tree)))
    }

    /// Sets an existing property or adds a new one at the end of the object.
    pub fn set_property(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        match self.try_get_property(name)? {
            Some(child) => child.set(value),
            None => {
                self.document.changes().add_change(
                    path::push_property(&self.path, name),
                    value.into(),
                    ChangeKind::PropertyAddition,
                    Some(SmolStr::new(name)),
                );
                Ok(())
            }
        }
    }

    pub fn set_property_serialized<T>(&self, name: &str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let tree = arena::to_tree(value, self.document.options())
            .map_err(|err| err.with_path(path::push_property(&self.path, name).as_str()))?;
        self.set_property(name, Value::Tree(Arc::new(tree)))
    }

    /// Removes a property that exists in this object's parse tree. Properties
    /// that were only ever added, or are already removed, are rejected.
    pub fn remove_property(&self, name: &str) -> Result<()> {
        let path = {
            let log = self.log();
            let resolved = self.resolve_in(&log)?;
            let object = resolved
                .view()
                .expect_kind(ValueKind::Object, &self.path)?;
            let path = path::push_property(&self.path, name);
            let removed = log
                .try_get_change(&path, resolved.window)
                .is_some_and(|change| change.kind() == ChangeKind::PropertyRemoval);
            if object.property(name).is_none() || removed {
                return Err(Error::invalid_removal(&self.path, name));
            }
            path
        };
        self.document.changes().add_change(
            path,
            Value::Null,
            ChangeKind::PropertyRemoval,
            Some(SmolStr::new(name)),
        );
        Ok(())
    }

    fn render(&self, buffer: Vec<u8>, indent: Indent) -> Result<Vec<u8>> {
        let log = self.log();
        let resolved = self.resolve_in(&log)?;
        encode::write_json(
            &log,
            &self.path,
            resolved.view(),
            resolved.window,
            indent,
            buffer,
        )
    }

    pub fn to_json_vec(&self) -> Result<Vec<u8>> {
        self.render(Vec::new(), self.document.options().indent)
    }

    pub fn to_json_string(&self) -> Result<String> {
        self.to_json_string_with(self.document.options().indent)
    }

    pub fn to_json_string_with(&self, indent: Indent) -> Result<String> {
        let bytes = self.render(Vec::new(), indent)?;
        String::from_utf8(bytes).map_err(|err| Error::serialize(err.to_string()))
    }

    pub fn write_to<W: io::Write>(&self, mut writer: W) -> Result<()> {
        let bytes = self.render(pool::take_buffer(), self.document.options().indent)?;
        writer.write_all(&bytes)?;
        pool::put_buffer(bytes);
        Ok(())
    }

    /// The merged content of this element as a standalone tree.
    pub fn to_tree(&self) -> Result<Arc<Arena>> {
        let log = self.log();
        let resolved = self.resolve_in(&log)?;
        encode::materialize(&log, &self.path, &resolved.node, resolved.window)
    }

    pub fn to_value(&self) -> Result<serde_json::Value> {
        let tree = self.to_tree()?;
        serde_json::to_value(&*tree).map_err(|err| Error::serialize(err.to_string()))
    }

    /// Reads the merged content of this element into a typed model.
    pub fn deserialize_into<T: DeserializeOwned>(&self) -> Result<T> {
        let tree = self.to_tree()?;
        T::deserialize(tree.root()).map_err(|err| err.with_path(self.path.as_str()))
    }
}

impl fmt::Debug for Element<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("path", &self.path)
            .field("window", &self.window)
            .finish()
    }
}

impl Serialize for Element<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let tree = self
            .to_tree()
            .map_err(<S::Error as serde::ser::Error>::custom)?;
        tree.root().serialize(serializer)
    }
}
