//! Command handler functions for the covtree CLI.
//!
//! Each `cmd_*` function returns its output as a `String`, making them easy
//! to test without capturing stdout.

use std::fmt::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::detect::Format;
use crate::level::Thresholds;
use crate::render::{Report, ReportOptions, Templates};
use crate::tree::{CoverageTree, NodeId};

/// Write the HTML report for `tree` into `output`.
pub fn cmd_render(
    tree: &CoverageTree,
    format: Format,
    output: &Path,
    options: &ReportOptions,
    template_dir: Option<&Path>,
) -> Result<String> {
    let engine = match template_dir {
        Some(dir) => Templates::with_dir(dir),
        None => Templates::builtin(),
    };
    let pages = Report::new(tree, &engine, options)
        .render(output)
        .with_context(|| format!("Failed to write report to {}", output.display()))?;

    Ok(format!(
        "Rendered {} pages from {} coverage into {}\n",
        pages,
        format,
        output.display(),
    ))
}

/// Coverage of the root and each of its immediate children, as a text table
/// or as the full JSON tree.
pub fn cmd_summary(tree: &CoverageTree, thresholds: &Thresholds, json: bool) -> Result<String> {
    let root = tree.root();
    if json {
        let mut out = serde_json::to_string_pretty(&tree.summary(root))?;
        out.push('\n');
        return Ok(out);
    }

    let mut out = String::new();
    writeln!(
        out,
        "{:<40} {:<5} {:>18} {:>18} {:>18}",
        "NAME", "LEVEL", "LINES", "METHODS", "CLASSES"
    )
    .unwrap();
    writeln!(out, "{}", "-".repeat(103)).unwrap();

    for &child in tree.directories(root).iter().chain(tree.files(root)) {
        let node = tree.node(child);
        let name = if node.is_directory() {
            format!("{}/", node.name())
        } else {
            node.name().to_string()
        };
        write_row(&mut out, tree, child, &name, thresholds);
    }

    writeln!(out, "{}", "-".repeat(103)).unwrap();
    write_row(&mut out, tree, root, "Total", thresholds);
    Ok(out)
}

fn write_row(
    out: &mut String,
    tree: &CoverageTree,
    id: NodeId,
    name: &str,
    thresholds: &Thresholds,
) {
    let lines = tree.line_executed_percent(id);
    writeln!(
        out,
        "{:<40} {:<5} {:>18} {:>18} {:>18}",
        name,
        thresholds.level(lines),
        ratio(tree.num_executed_lines(id), tree.num_executable_lines(id), lines),
        ratio(
            tree.num_called_methods(id),
            tree.num_methods(id),
            tree.called_methods_percent(id)
        ),
        ratio(
            tree.num_called_classes(id),
            tree.num_classes(id),
            tree.called_classes_percent(id)
        ),
    )
    .unwrap();
}

fn ratio(covered: u64, total: u64, percent: f64) -> String {
    format!("{covered}/{total} ({percent:.2}%)")
}
