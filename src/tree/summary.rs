use serde::Serialize;

use super::{CoverageTree, NodeId};

/// Serializable snapshot of a subtree's aggregates.
#[derive(Debug, Serialize)]
pub struct NodeSummary {
    pub name: String,
    pub id: String,
    pub kind: &'static str,
    pub num_executable_lines: u64,
    pub num_executed_lines: u64,
    pub num_classes: u64,
    pub num_called_classes: u64,
    pub num_methods: u64,
    pub num_called_methods: u64,
    pub line_executed_percent: f64,
    pub called_classes_percent: f64,
    pub called_methods_percent: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSummary>,
}

impl CoverageTree {
    /// Snapshot `id` and everything below it. Subdirectories come before
    /// files, matching the rendered pages.
    pub fn summary(&self, id: NodeId) -> NodeSummary {
        let node = self.node(id);
        let children = self
            .directories(id)
            .iter()
            .chain(self.files(id))
            .map(|&child| self.summary(child))
            .collect();

        NodeSummary {
            name: node.name().to_string(),
            id: node.id().to_string(),
            kind: if node.is_directory() { "directory" } else { "file" },
            num_executable_lines: self.num_executable_lines(id),
            num_executed_lines: self.num_executed_lines(id),
            num_classes: self.num_classes(id),
            num_called_classes: self.num_called_classes(id),
            num_methods: self.num_methods(id),
            num_called_methods: self.num_called_methods(id),
            line_executed_percent: self.line_executed_percent(id),
            called_classes_percent: self.called_classes_percent(id),
            called_methods_percent: self.called_methods_percent(id),
            children,
        }
    }
}
