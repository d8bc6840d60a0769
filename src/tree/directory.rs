use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::model::ClassCoverage;

use super::{Metric, NodeId};

/// Composite node: an ordered list of children plus two index views into
/// it, one per child kind.
#[derive(Debug, Default)]
pub struct DirectoryNode {
    children: Vec<NodeId>,
    directories: Vec<NodeId>,
    files: Vec<NodeId>,
    cache: AggregateCache,
}

impl DirectoryNode {
    /// All children in insertion order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Subdirectories in insertion order.
    pub fn directories(&self) -> &[NodeId] {
        &self.directories
    }

    /// Files in insertion order.
    pub fn files(&self) -> &[NodeId] {
        &self.files
    }

    pub(crate) fn push_directory(&mut self, id: NodeId) {
        self.children.push(id);
        self.directories.push(id);
    }

    pub(crate) fn push_file(&mut self, id: NodeId) {
        self.children.push(id);
        self.files.push(id);
    }

    pub(crate) fn cache(&self) -> &AggregateCache {
        &self.cache
    }

    pub(crate) fn invalidate(&mut self) {
        self.cache = AggregateCache::default();
    }
}

/// Memoized aggregates of a directory. Every slot is independent and starts
/// out unset.
#[derive(Debug, Default)]
pub(crate) struct AggregateCache {
    counts: [Cell<Option<u64>>; Metric::COUNT],
    classes: RefCell<Option<Rc<[ClassCoverage]>>>,
}

impl AggregateCache {
    pub(crate) fn count(&self, metric: Metric) -> Option<u64> {
        self.counts[metric.index()].get()
    }

    pub(crate) fn store_count(&self, metric: Metric, value: u64) {
        self.counts[metric.index()].set(Some(value));
    }

    pub(crate) fn classes(&self) -> Option<Rc<[ClassCoverage]>> {
        self.classes.borrow().clone()
    }

    pub(crate) fn store_classes(&self, classes: Rc<[ClassCoverage]>) {
        *self.classes.borrow_mut() = Some(classes);
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.counts.iter().all(|c| c.get().is_none()) && self.classes.borrow().is_none()
    }
}
