//! Append-only change log.
//!
//! Entries are numbered from 1 in append order and indexed by canonical
//! path. Readers always see the log through a [`Window`]: entries at or below
//! the window's base are already folded into the reader's snapshot, and
//! entries above a pinned high-water mark happened after the reader was
//! pinned.

use std::{
    collections::{BTreeMap, HashMap},
    ops::Bound,
    sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard},
};

use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::{
    arena::{Arena, ArenaBuilder, ValueKind},
    encode::Emit,
    path,
    value::Value,
};

pub type Seq = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Modification,
    PropertyAddition,
    PropertyRemoval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HighWaterMark {
    #[default]
    Unbounded,
    Pinned(Seq),
}

impl HighWaterMark {
    pub fn admits(self, seq: Seq) -> bool {
        match self {
            HighWaterMark::Unbounded => true,
            HighWaterMark::Pinned(mark) => seq <= mark,
        }
    }
}

/// The slice of the log a view may observe: `base < seq` and admitted by the
/// high-water mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Window {
    pub base: Seq,
    pub high_water_mark: HighWaterMark,
}

impl Window {
    pub fn new(base: Seq, high_water_mark: HighWaterMark) -> Self {
        Self {
            base,
            high_water_mark,
        }
    }

    pub fn admits(self, seq: Seq) -> bool {
        seq > self.base && self.high_water_mark.admits(seq)
    }

    pub fn rebase(self, seq: Seq) -> Self {
        Self { base: seq, ..self }
    }

    pub fn pinned_at(self, mark: Seq) -> Self {
        Self {
            high_water_mark: HighWaterMark::Pinned(mark),
            ..self
        }
    }
}

#[derive(Debug)]
pub struct Change {
    path: SmolStr,
    value: Value,
    kind: ChangeKind,
    seq: Seq,
    property_name: Option<SmolStr>,
    tree: OnceLock<Arc<Arena>>,
}

impl Change {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    pub fn sequence_index(&self) -> Seq {
        self.seq
    }

    pub fn property_name(&self) -> Option<&str> {
        self.property_name.as_deref()
    }

    pub fn value_kind(&self) -> ValueKind {
        self.value.kind()
    }

    /// The value as a subtree. Scalars are encoded on first use and cached.
    pub fn tree(&self) -> Arc<Arena> {
        if let Value::Tree(tree) = &self.value {
            return Arc::clone(tree);
        }
        Arc::clone(self.tree.get_or_init(|| {
            let mut builder = ArenaBuilder::unbounded();
            match builder.scalar(&self.value).and_then(|()| builder.finish()) {
                Ok(arena) => Arc::new(arena),
                Err(_) => Arc::new(Arena::null()),
            }
        }))
    }
}

#[derive(Debug, Default)]
pub(crate) struct LogState {
    entries: Vec<Arc<Change>>,
    by_path: BTreeMap<SmolStr, SmallVec<[Seq; 2]>>,
    additions: HashMap<SmolStr, Vec<Seq>>,
}

impl LogState {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn entry(&self, seq: Seq) -> Option<&Arc<Change>> {
        let index = usize::try_from(seq).ok()?.checked_sub(1)?;
        self.entries.get(index)
    }

    fn visible<'s>(
        &'s self,
        seqs: &'s [Seq],
        window: Window,
    ) -> impl DoubleEndedIterator<Item = &'s Arc<Change>> + 's {
        seqs.iter()
            .copied()
            .filter(move |&seq| window.admits(seq))
            .filter_map(move |seq| self.entry(seq))
    }

    /// Latest entry recorded at exactly `path` inside `window`.
    pub fn try_get_change(&self, path: &str, window: Window) -> Option<&Arc<Change>> {
        let seqs = self.by_path.get(path)?;
        self.visible(seqs, window).next_back()
    }

    pub fn any_at(&self, path: &str, window: Window, pred: impl Fn(&Change) -> bool) -> bool {
        self.by_path
            .get(path)
            .is_some_and(|seqs| self.visible(seqs, window).any(|change| pred(change.as_ref())))
    }

    /// True when a proper ancestor of `path` was replaced or removed inside
    /// `window`.
    pub fn ancestor_changed(&self, path: &str, window: Window) -> bool {
        path::ancestors(path).any(|ancestor| {
            self.any_at(ancestor, window, |change| {
                change.kind != ChangeKind::PropertyAddition
            })
        })
    }

    /// True when any strict descendant of `path` has an entry inside `window`.
    pub fn descendant_changed(&self, path: &str, window: Window) -> bool {
        // Every path sharing the prefix sorts directly after `path`; siblings
        // such as `.ab` for `.a` are skipped by the segment check.
        self.by_path
            .range::<str, _>((Bound::Excluded(path), Bound::Unbounded))
            .take_while(|(candidate, _)| candidate.starts_with(path))
            .filter(|(candidate, _)| path::is_descendant(candidate, path))
            .any(|(_, seqs)| seqs.iter().any(|&seq| window.admits(seq)))
    }

    /// Names added under the object at `parent` inside `window`, in the
    /// order they were first added.
    pub fn added_properties(&self, parent: &str, window: Window) -> Vec<SmolStr> {
        let Some(seqs) = self.additions.get(parent) else {
            return Vec::new();
        };
        let mut names: Vec<SmolStr> = Vec::new();
        for change in self.visible(seqs, window) {
            if let Some(name) = &change.property_name {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
        names
    }

    fn push(
        &mut self,
        path: SmolStr,
        value: Value,
        kind: ChangeKind,
        property_name: Option<SmolStr>,
    ) -> Seq {
        let seq = self.entries.len() as Seq + 1;
        if kind == ChangeKind::PropertyAddition {
            if let Some(parent) = path::parent(&path) {
                self.additions
                    .entry(SmolStr::new(parent))
                    .or_default()
                    .push(seq);
            }
        }
        self.by_path.entry(path.clone()).or_default().push(seq);
        self.entries.push(Arc::new(Change {
            path,
            value,
            kind,
            seq,
            property_name,
            tree: OnceLock::new(),
        }));
        seq
    }
}

/// Thread-safe append-only log shared by every view of a document.
#[derive(Debug, Default)]
pub struct ChangeLog {
    state: RwLock<LogState>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, LogState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends an entry and returns its sequence index.
    pub fn add_change(
        &self,
        path: SmolStr,
        value: Value,
        kind: ChangeKind,
        property_name: Option<SmolStr>,
    ) -> Seq {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let shown = path.clone();
        let seq = state.push(path, value, kind, property_name);
        tracing::debug!(seq, path = %shown, ?kind, "recorded change");
        seq
    }

    pub fn try_get_change(&self, path: &str, window: Window) -> Option<Arc<Change>> {
        self.read().try_get_change(path, window).cloned()
    }

    pub fn ancestor_changed(&self, path: &str, window: Window) -> bool {
        self.read().ancestor_changed(path, window)
    }

    pub fn descendant_changed(&self, path: &str, window: Window) -> bool {
        self.read().descendant_changed(path, window)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every entry in append order.
    pub fn history(&self) -> Vec<Arc<Change>> {
        self.read().entries.clone()
    }
}
