use smol_str::SmolStr;

use super::{Element, Resolved};
use crate::path;

/// One member of an object: its name and a view of its value.
#[derive(Debug, Clone)]
pub struct Property<'a> {
    name: SmolStr,
    value: Element<'a>,
}

impl<'a> Property<'a> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Element<'a> {
        &self.value
    }

    pub fn into_parts(self) -> (SmolStr, Element<'a>) {
        (self.name, self.value)
    }
}

/// Members of an object with removals applied: parse-tree members in
/// document order, then added members in the order they were first added.
pub struct ObjectIter<'a> {
    parent: Element<'a>,
    resolved: Resolved,
    position: usize,
    added: std::vec::IntoIter<SmolStr>,
}

impl<'a> ObjectIter<'a> {
    pub(super) fn new(parent: Element<'a>, resolved: Resolved, added: Vec<SmolStr>) -> Self {
        Self {
            parent,
            resolved,
            position: 0,
            added: added.into_iter(),
        }
    }
}

impl<'a> Iterator for ObjectIter<'a> {
    type Item = Property<'a>;

    fn next(&mut self) -> Option<Property<'a>> {
        let log = self.parent.log();
        let object = self.resolved.view();
        let pairs = object.pairs();
        while let Some(pair) = pairs.get(self.position) {
            self.position += 1;
            let name = object.arena().get_key(pair.key).unwrap_or_default();
            let child_path = path::push_property(&self.parent.path, name);
            let original = object.arena().view(pair.value);
            if let Some(value) =
                self.parent
                    .child_in(&log, &self.resolved, child_path, Some(original))
            {
                return Some(Property {
                    name: SmolStr::new(name),
                    value,
                });
            }
        }
        for name in self.added.by_ref() {
            let child_path = path::push_property(&self.parent.path, &name);
            if let Some(value) = self.parent.child_in(&log, &self.resolved, child_path, None) {
                return Some(Property { name, value });
            }
        }
        None
    }
}

pub struct ArrayIter<'a> {
    parent: Element<'a>,
    resolved: Resolved,
    index: usize,
    len: usize,
}

impl<'a> ArrayIter<'a> {
    pub(super) fn new(parent: Element<'a>, resolved: Resolved, len: usize) -> Self {
        Self {
            parent,
            resolved,
            index: 0,
            len,
        }
    }
}

impl<'a> Iterator for ArrayIter<'a> {
    type Item = Element<'a>;

    fn next(&mut self) -> Option<Element<'a>> {
        if self.index >= self.len {
            return None;
        }
        let index = self.index;
        self.index += 1;
        let log = self.parent.log();
        let original = self.resolved.view().index(index);
        let child_path = path::push_index(&self.parent.path, index);
        self.parent
            .child_in(&log, &self.resolved, child_path, original)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ArrayIter<'_> {}
