//! Collector-facing capabilities.
//!
//! A collector marks through [`StrongRootSource`]s during its mark phase
//! and prunes [`WeaklyHeldCollection`]s during its sweep phase, once per
//! cycle per table, in that order.

use crate::object::StrHandle;
use crate::table::Table;
use hashbrown::HashSet;

/// Receives reachability during the mark phase.
pub trait Marker<V: ?Sized> {
    fn mark_string(&mut self, string: StrHandle);
    fn mark_value(&mut self, value: &V);
}

/// Something whose contents are strong GC roots.
pub trait StrongRootSource<V> {
    fn mark_roots(&self, marker: &mut dyn Marker<V>);
}

/// Something that holds strings weakly and must drop the dead ones after
/// marking.
pub trait WeaklyHeldCollection {
    /// Remove every entry whose key is not marked; returns how many went.
    fn remove_unmarked(&mut self, is_marked: &dyn Fn(StrHandle) -> bool) -> usize;
}

impl<V: Copy> StrongRootSource<V> for Table<V> {
    fn mark_roots(&self, marker: &mut dyn Marker<V>) {
        self.mark_table(marker);
    }
}

impl<V: Copy> WeaklyHeldCollection for Table<V> {
    fn remove_unmarked(&mut self, is_marked: &dyn Fn(StrHandle) -> bool) -> usize {
        self.remove_white(is_marked)
    }
}

/// Values report the strings they keep alive.
pub trait Trace {
    fn trace(&self, marks: &mut MarkSet);
}

impl Trace for () {
    fn trace(&self, _marks: &mut MarkSet) {}
}

impl Trace for StrHandle {
    fn trace(&self, marks: &mut MarkSet) {
        marks.mark(*self);
    }
}

impl<T: Trace> Trace for Option<T> {
    fn trace(&self, marks: &mut MarkSet) {
        if let Some(inner) = self {
            inner.trace(marks);
        }
    }
}

/// Set of strings found reachable in the current cycle.
#[derive(Debug, Default)]
pub struct MarkSet {
    marked: HashSet<StrHandle>,
}

impl MarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `string` was not already marked.
    pub fn mark(&mut self, string: StrHandle) -> bool {
        self.marked.insert(string)
    }

    pub fn is_marked(&self, string: StrHandle) -> bool {
        self.marked.contains(&string)
    }

    pub fn len(&self) -> usize {
        self.marked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marked.is_empty()
    }

    /// Forget all marks, ready for the next cycle.
    pub fn clear(&mut self) {
        self.marked.clear();
    }
}

impl<V: Trace + ?Sized> Marker<V> for MarkSet {
    fn mark_string(&mut self, string: StrHandle) {
        self.mark(string);
    }

    fn mark_value(&mut self, value: &V) {
        value.trace(self);
    }
}
