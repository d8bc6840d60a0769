//! Variable sets handed to the template engine. Field names are the slot
//! names used by the templates, so they must not be renamed.

use serde::Serialize;

use crate::level::{Level, Thresholds};
use crate::model::{FunctionCoverage, LineCoverage};
use crate::tree::{CoverageTree, NodeId};

/// Slots shared by every page.
#[derive(Debug, Serialize)]
pub struct PageVars {
    pub title: String,
    pub charset: String,
    /// Breadcrumb trail from the root to the current node.
    pub link: String,
    pub date: String,
    pub generator: &'static str,
}

/// One percentage broken down for a progress bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Breakdown {
    pub color: &'static str,
    pub level: Level,
    /// Floored percentage.
    pub width: u64,
    /// Percentage with two decimals.
    pub percent: String,
    /// `100 - width`.
    pub not_width: u64,
}

impl Breakdown {
    pub fn new(percent: f64, thresholds: &Thresholds) -> Self {
        let (color, level) = thresholds.color_level(percent);
        let width = percent.floor().clamp(0.0, 100.0) as u64;
        Self {
            color,
            level,
            width,
            percent: format!("{percent:.2}"),
            not_width: 100 - width,
        }
    }
}

/// Summary of a directory page, totals for its whole subtree.
#[derive(Debug, Serialize)]
pub struct DirectoryVars {
    #[serde(flatten)]
    pub page: PageVars,

    pub total_classes_color: &'static str,
    pub total_classes_level: Level,
    pub total_classes_called_width: u64,
    pub total_classes_called_percent: String,
    pub total_classes_not_called_width: u64,
    pub total_num_called_classes: u64,
    pub total_num_classes: u64,

    pub total_methods_color: &'static str,
    pub total_methods_level: Level,
    pub total_methods_called_width: u64,
    pub total_methods_called_percent: String,
    pub total_methods_not_called_width: u64,
    pub total_num_called_methods: u64,
    pub total_num_methods: u64,

    pub total_lines_executed_color: &'static str,
    pub total_lines_executed_level: Level,
    pub total_lines_executed_width: u64,
    pub total_lines_executed_percent: String,
    pub total_lines_not_executed_width: u64,
    pub total_num_executed_lines: u64,
    pub total_num_executable_lines: u64,

    /// Pre-rendered child rows.
    pub items: String,
    pub low_upper_bound: u32,
    pub high_lower_bound: u32,
}

impl DirectoryVars {
    pub fn new(
        tree: &CoverageTree,
        id: NodeId,
        page: PageVars,
        items: String,
        thresholds: &Thresholds,
    ) -> Self {
        let classes = Breakdown::new(tree.called_classes_percent(id), thresholds);
        let methods = Breakdown::new(tree.called_methods_percent(id), thresholds);
        let lines = Breakdown::new(tree.line_executed_percent(id), thresholds);

        Self {
            page,

            total_classes_color: classes.color,
            total_classes_level: classes.level,
            total_classes_called_width: classes.width,
            total_classes_called_percent: classes.percent,
            total_classes_not_called_width: classes.not_width,
            total_num_called_classes: tree.num_called_classes(id),
            total_num_classes: tree.num_classes(id),

            total_methods_color: methods.color,
            total_methods_level: methods.level,
            total_methods_called_width: methods.width,
            total_methods_called_percent: methods.percent,
            total_methods_not_called_width: methods.not_width,
            total_num_called_methods: tree.num_called_methods(id),
            total_num_methods: tree.num_methods(id),

            total_lines_executed_color: lines.color,
            total_lines_executed_level: lines.level,
            total_lines_executed_width: lines.width,
            total_lines_executed_percent: lines.percent,
            total_lines_not_executed_width: lines.not_width,
            total_num_executed_lines: tree.num_executed_lines(id),
            total_num_executable_lines: tree.num_executable_lines(id),

            items,
            low_upper_bound: thresholds.low_upper_bound(),
            high_lower_bound: thresholds.high_lower_bound(),
        }
    }
}

/// One row of a directory listing, computed from the child's own
/// aggregates. The row color follows the child's line coverage.
#[derive(Debug, Serialize)]
pub struct ItemVars {
    pub link: String,
    pub color: &'static str,
    pub level: Level,

    pub classes_called_width: u64,
    pub classes_called_percent: String,
    pub classes_not_called_width: u64,
    pub num_classes: u64,
    pub num_called_classes: u64,

    pub methods_called_width: u64,
    pub methods_called_percent: String,
    pub methods_not_called_width: u64,
    pub num_methods: u64,
    pub num_called_methods: u64,

    pub lines_executed_width: u64,
    pub lines_executed_percent: String,
    pub lines_not_executed_width: u64,
    pub num_executable_lines: u64,
    pub num_executed_lines: u64,
}

impl ItemVars {
    pub fn new(tree: &CoverageTree, child: NodeId, link: String, thresholds: &Thresholds) -> Self {
        let classes = Breakdown::new(tree.called_classes_percent(child), thresholds);
        let methods = Breakdown::new(tree.called_methods_percent(child), thresholds);
        let lines = Breakdown::new(tree.line_executed_percent(child), thresholds);

        Self {
            link,
            color: lines.color,
            level: lines.level,

            classes_called_width: classes.width,
            classes_called_percent: classes.percent,
            classes_not_called_width: classes.not_width,
            num_classes: tree.num_classes(child),
            num_called_classes: tree.num_called_classes(child),

            methods_called_width: methods.width,
            methods_called_percent: methods.percent,
            methods_not_called_width: methods.not_width,
            num_methods: tree.num_methods(child),
            num_called_methods: tree.num_called_methods(child),

            lines_executed_width: lines.width,
            lines_executed_percent: lines.percent,
            lines_not_executed_width: lines.not_width,
            num_executable_lines: tree.num_executable_lines(child),
            num_executed_lines: tree.num_executed_lines(child),
        }
    }
}

/// Leaf page of a single file.
#[derive(Debug, Serialize)]
pub struct FileVars {
    #[serde(flatten)]
    pub page: PageVars,

    pub lines_executed_color: &'static str,
    pub lines_executed_level: Level,
    pub lines_executed_width: u64,
    pub lines_executed_percent: String,
    pub lines_not_executed_width: u64,
    pub num_executed_lines: u64,
    pub num_executable_lines: u64,

    /// Pre-rendered method rows.
    pub methods: String,
    /// Pre-rendered line rows.
    pub lines: String,
}

impl FileVars {
    pub fn new(
        tree: &CoverageTree,
        id: NodeId,
        page: PageVars,
        methods: String,
        lines: String,
        thresholds: &Thresholds,
    ) -> Self {
        let executed = Breakdown::new(tree.line_executed_percent(id), thresholds);
        Self {
            page,
            lines_executed_color: executed.color,
            lines_executed_level: executed.level,
            lines_executed_width: executed.width,
            lines_executed_percent: executed.percent,
            lines_not_executed_width: executed.not_width,
            num_executed_lines: tree.num_executed_lines(id),
            num_executable_lines: tree.num_executable_lines(id),
            methods,
            lines,
        }
    }
}

fn status(hit_count: u64) -> &'static str {
    if hit_count > 0 {
        "covered"
    } else {
        "uncovered"
    }
}

#[derive(Debug, Serialize)]
pub struct LineVars {
    pub status: &'static str,
    pub line_number: u32,
    pub hit_count: u64,
}

impl From<&LineCoverage> for LineVars {
    fn from(line: &LineCoverage) -> Self {
        Self {
            status: status(line.hit_count),
            line_number: line.line_number,
            hit_count: line.hit_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MethodVars {
    pub status: &'static str,
    pub class: String,
    pub method: String,
    pub line: String,
    pub hit_count: u64,
}

impl MethodVars {
    pub fn new(class: String, method: &FunctionCoverage) -> Self {
        Self {
            status: status(method.hit_count),
            class,
            method: super::escape_html(&method.name),
            line: method.start_line.map(|l| l.to_string()).unwrap_or_default(),
            hit_count: method.hit_count,
        }
    }
}
