//! Turns a flat list of per-file coverage records into a [`CoverageTree`].

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};

use crate::detect::{detect_format, parser_for, Format};
use crate::error::CovtreeError;
use crate::model::{CoverageData, FileCoverage};
use crate::tree::{CoverageTree, NodeId};

/// What to do with a file record that cannot become a file node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OnMalformed {
    /// Stop and return the error.
    #[default]
    Abort,
    /// Log a warning and leave the file out of the tree.
    Skip,
}

/// Read a coverage file, auto-detect its format (or use the override),
/// parse it and build the tree.
pub fn load(
    file_path: &Path,
    format_override: Option<&str>,
    on_malformed: OnMalformed,
) -> Result<(CoverageTree, Format)> {
    let content = std::fs::read(file_path)
        .with_context(|| format!("Failed to read {}", file_path.display()))?;

    let format = match format_override {
        Some(fmt_str) => fmt_str.parse::<Format>()?,
        None => detect_format(file_path, &content).ok_or(CovtreeError::UnknownFormat)?,
    };
    log::debug!("Parsing {} as {format}", file_path.display());

    let data = parser_for(format)
        .parse(&content)
        .with_context(|| format!("Failed to parse {} as {format}", file_path.display()))?;
    let tree = build_tree(data, on_malformed)?;
    Ok((tree, format))
}

/// Build a tree from parsed coverage data.
///
/// Records of the same path are merged first. Paths are then sorted and the
/// directory prefix they all share becomes the root, so the root page lists
/// the first level where they differ.
pub fn build_tree(
    data: CoverageData,
    on_malformed: OnMalformed,
) -> crate::error::Result<CoverageTree> {
    let mut by_path: BTreeMap<Vec<String>, FileCoverage> = BTreeMap::new();
    for file in data.files {
        let segments = split_path(&file.path);
        if segments.is_empty() {
            let reason = "empty source path".to_string();
            match on_malformed {
                OnMalformed::Abort => {
                    return Err(CovtreeError::MalformedCoverage {
                        path: file.path,
                        reason,
                    })
                }
                OnMalformed::Skip => {
                    log::warn!("Skipping '{}': {reason}", file.path);
                    continue;
                }
            }
        }
        match by_path.get_mut(&segments) {
            Some(existing) => {
                log::warn!("Merging repeated records for '{}'", file.path);
                existing.merge(file);
            }
            None => {
                by_path.insert(segments, file);
            }
        }
    }

    let prefix_len = common_dir_prefix(by_path.keys());
    let root_name = match by_path.keys().next() {
        Some(first) if prefix_len > 0 => first[..prefix_len].join("/"),
        _ => ".".to_string(),
    };

    let mut tree = CoverageTree::new(root_name);
    for (segments, coverage) in by_path {
        let (file_name, dirs) = match segments[prefix_len..].split_last() {
            Some(split) => split,
            None => continue,
        };

        let mut parent = tree.root();
        for dir in dirs {
            parent = ensure_directory(&mut tree, parent, dir)?;
        }

        let path = coverage.path.clone();
        match tree.add_file(parent, file_name, coverage) {
            Ok(_) => {}
            Err(err @ CovtreeError::MalformedCoverage { .. })
                if on_malformed == OnMalformed::Skip =>
            {
                log::warn!("Skipping '{path}': {err}");
            }
            Err(err) => return Err(err),
        }
    }

    Ok(tree)
}

/// Existing child directory called `name`, or a new one.
fn ensure_directory(
    tree: &mut CoverageTree,
    parent: NodeId,
    name: &str,
) -> crate::error::Result<NodeId> {
    match tree.find_child(parent, name) {
        Some(child) if tree.node(child).is_directory() => Ok(child),
        Some(child) => Err(CovtreeError::NotADirectory(tree.node(child).id().to_string())),
        None => tree.add_directory(parent, name),
    }
}

/// Path components, ignoring empty and `.` segments. Both `/` and `\` count
/// as separators.
fn split_path(path: &str) -> Vec<String> {
    path.split(['/', '\\'])
        .filter(|s| !s.is_empty() && *s != ".")
        .map(str::to_string)
        .collect()
}

/// Number of leading directory components shared by every path. The file
/// name itself never counts, so each path keeps at least one component.
fn common_dir_prefix<'a>(mut paths: impl Iterator<Item = &'a Vec<String>>) -> usize {
    let Some(first) = paths.next() else {
        return 0;
    };
    let mut len = first.len() - 1;
    for path in paths {
        len = len.min(path.len() - 1);
        len = first[..len]
            .iter()
            .zip(path.iter())
            .take_while(|(a, b)| a == b)
            .count();
    }
    len
}
