//! The coverage node tree.
//!
//! Nodes live in an arena owned by [`CoverageTree`] and refer to each other
//! through [`NodeId`] handles. A directory owns its children; a child only
//! keeps its parent's handle, used to build its identifier and to walk up
//! when a cache has to be dropped.
//!
//! Directory aggregates are computed lazily, by summing over the children,
//! and memoized per directory and per metric. Adding a file drops the
//! memoized values of the receiving directory and of all its ancestors.
//! Mutation requires `&mut CoverageTree`, so no aggregate can be read while
//! the tree is being changed.

mod directory;
mod file;
mod summary;

#[cfg(test)]
use std::cell::Cell;
use std::rc::Rc;

pub use directory::DirectoryNode;
pub use file::FileNode;
pub use summary::NodeSummary;

use crate::error::{CovtreeError, Result};
use crate::model::{percent, ClassCoverage, FileCoverage};

/// Identifier of the synthetic root directory.
pub const ROOT_ID: &str = "index";

/// Handle to a node inside a [`CoverageTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// The six scalar aggregates every node exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    ExecutableLines,
    ExecutedLines,
    Classes,
    CalledClasses,
    Methods,
    CalledMethods,
}

impl Metric {
    pub const COUNT: usize = 6;

    pub const ALL: [Metric; Metric::COUNT] = [
        Metric::ExecutableLines,
        Metric::ExecutedLines,
        Metric::Classes,
        Metric::CalledClasses,
        Metric::Methods,
        Metric::CalledMethods,
    ];

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// Directory or file payload of a node.
#[derive(Debug)]
pub enum NodeKind {
    Directory(DirectoryNode),
    File(FileNode),
}

/// Identity shared by both node kinds.
#[derive(Debug)]
pub struct Node {
    name: String,
    id: String,
    parent: Option<NodeId>,
    kind: NodeKind,
}

impl Node {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path-like identifier built from the ancestor names. Used as the
    /// output filename stem.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn as_directory(&self) -> Option<&DirectoryNode> {
        match &self.kind {
            NodeKind::Directory(dir) => Some(dir),
            NodeKind::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileNode> {
        match &self.kind {
            NodeKind::File(file) => Some(file),
            NodeKind::Directory(_) => None,
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.kind, NodeKind::Directory(_))
    }
}

/// Arena holding every node of one report run, rooted at a synthetic
/// directory.
#[derive(Debug)]
pub struct CoverageTree {
    nodes: Vec<Node>,
    #[cfg(test)]
    recomputations: Cell<usize>,
}

impl CoverageTree {
    /// Create a tree containing only an empty root directory.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            nodes: vec![Node {
                name: root_name.into(),
                id: ROOT_ID.to_string(),
                parent: None,
                kind: NodeKind::Directory(DirectoryNode::default()),
            }],
            #[cfg(test)]
            recomputations: Cell::new(0),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Look up a node. Panics if `id` came from another tree.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A tree always has its root, so it is never empty.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Create, append and return a new empty subdirectory. An empty subtree
    /// adds zero to every sum, so no cache is touched.
    pub fn add_directory(&mut self, parent: NodeId, name: &str) -> Result<NodeId> {
        let kind = NodeKind::Directory(DirectoryNode::default());
        let id = self.push_child(parent, name, kind)?;
        self.directory_mut(parent)?.push_directory(id);
        Ok(id)
    }

    /// Build a file node from its raw coverage table and append it.
    ///
    /// Fails if the table is malformed, or if `parent` is a file. On success
    /// the memoized aggregates of `parent` and of every ancestor are dropped.
    pub fn add_file(
        &mut self,
        parent: NodeId,
        name: &str,
        coverage: FileCoverage,
    ) -> Result<NodeId> {
        self.directory_mut(parent)?;
        let file = FileNode::new(coverage)?;
        let id = self.push_child(parent, name, NodeKind::File(file))?;
        self.directory_mut(parent)?.push_file(id);

        let mut current = Some(parent);
        while let Some(dir_id) = current {
            self.directory_mut(dir_id)?.invalidate();
            current = self.node(dir_id).parent;
        }
        Ok(id)
    }

    fn push_child(&mut self, parent: NodeId, name: &str, kind: NodeKind) -> Result<NodeId> {
        let parent_node = self.node(parent);
        if !parent_node.is_directory() {
            return Err(CovtreeError::NotADirectory(parent_node.id.clone()));
        }
        let id = if parent_node.parent.is_none() {
            name.to_string()
        } else {
            format!("{}_{}", parent_node.id, name)
        };

        let handle = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name: name.to_string(),
            id,
            parent: Some(parent),
            kind,
        });
        Ok(handle)
    }

    fn directory_mut(&mut self, id: NodeId) -> Result<&mut DirectoryNode> {
        let node = &mut self.nodes[id.0];
        match &mut node.kind {
            NodeKind::Directory(dir) => Ok(dir),
            NodeKind::File(_) => Err(CovtreeError::NotADirectory(node.id.clone())),
        }
    }

    /// Children of a directory in insertion order; empty for a file.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.node(id).as_directory() {
            Some(dir) => dir.children(),
            None => &[],
        }
    }

    pub fn directories(&self, id: NodeId) -> &[NodeId] {
        match self.node(id).as_directory() {
            Some(dir) => dir.directories(),
            None => &[],
        }
    }

    pub fn files(&self, id: NodeId) -> &[NodeId] {
        match self.node(id).as_directory() {
            Some(dir) => dir.files(),
            None => &[],
        }
    }

    /// Find a direct child of `dir` by name.
    pub fn find_child(&self, dir: NodeId, name: &str) -> Option<NodeId> {
        self.children(dir)
            .iter()
            .copied()
            .find(|&child| self.node(child).name == name)
    }

    /// Strict ancestors of a node, root first.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = self.node(id).parent;
        while let Some(parent) = current {
            chain.push(parent);
            current = self.node(parent).parent;
        }
        chain.reverse();
        chain
    }

    /// Value of one aggregate. Files answer from their frozen counts;
    /// directories sum over their children once and memoize the result.
    pub fn count(&self, id: NodeId, metric: Metric) -> u64 {
        match &self.node(id).kind {
            NodeKind::File(file) => file.count(metric),
            NodeKind::Directory(dir) => {
                if let Some(value) = dir.cache().count(metric) {
                    return value;
                }
                #[cfg(test)]
                self.recomputations.set(self.recomputations.get() + 1);

                let total = dir
                    .children()
                    .iter()
                    .map(|&child| self.count(child, metric))
                    .sum();
                dir.cache().store_count(metric, total);
                total
            }
        }
    }

    pub fn num_executable_lines(&self, id: NodeId) -> u64 {
        self.count(id, Metric::ExecutableLines)
    }

    pub fn num_executed_lines(&self, id: NodeId) -> u64 {
        self.count(id, Metric::ExecutedLines)
    }

    pub fn num_classes(&self, id: NodeId) -> u64 {
        self.count(id, Metric::Classes)
    }

    /// Number of classes of which at least one method was called.
    pub fn num_called_classes(&self, id: NodeId) -> u64 {
        self.count(id, Metric::CalledClasses)
    }

    pub fn num_methods(&self, id: NodeId) -> u64 {
        self.count(id, Metric::Methods)
    }

    pub fn num_called_methods(&self, id: NodeId) -> u64 {
        self.count(id, Metric::CalledMethods)
    }

    /// Class records of the whole subtree, concatenated in child order.
    pub fn classes(&self, id: NodeId) -> Rc<[ClassCoverage]> {
        match &self.node(id).kind {
            NodeKind::File(file) => file.shared_classes(),
            NodeKind::Directory(dir) => {
                if let Some(classes) = dir.cache().classes() {
                    return classes;
                }
                #[cfg(test)]
                self.recomputations.set(self.recomputations.get() + 1);

                let mut all = Vec::new();
                for &child in dir.children() {
                    all.extend(self.classes(child).iter().cloned());
                }
                let all: Rc<[ClassCoverage]> = all.into();
                dir.cache().store_classes(Rc::clone(&all));
                all
            }
        }
    }

    pub fn called_classes_percent(&self, id: NodeId) -> f64 {
        percent(self.num_called_classes(id), self.num_classes(id))
    }

    pub fn called_methods_percent(&self, id: NodeId) -> f64 {
        percent(self.num_called_methods(id), self.num_methods(id))
    }

    pub fn line_executed_percent(&self, id: NodeId) -> f64 {
        percent(self.num_executed_lines(id), self.num_executable_lines(id))
    }
}
