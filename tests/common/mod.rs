use std::path::PathBuf;
use tempfile::TempDir;

use covtree::model::{ClassCoverage, FileCoverage, FunctionCoverage, LineCoverage};

/// Copy `content` into a fresh temporary directory as `name`, returning the
/// dir handle and the file path.
/// The caller must hold onto `TempDir` to keep the temp directory alive.
pub fn write_input(name: &str, content: &[u8]) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    (dir, path)
}

/// A file with `executed` of `executable` lines hit, `called_classes` of
/// `classes` classes with one called method each, and `called_methods` of
/// `methods` free functions.
pub fn coverage(
    path: &str,
    (executed, executable): (u32, u32),
    (called_classes, classes): (u32, u32),
    (called_methods, methods): (u32, u32),
) -> FileCoverage {
    let mut cov = FileCoverage::new(path.to_string());
    cov.lines = (1..=executable)
        .map(|n| LineCoverage {
            line_number: n,
            hit_count: u64::from(n <= executed),
        })
        .collect();
    cov.classes = (0..classes)
        .map(|i| {
            let mut class = ClassCoverage::new(format!("Class{i}"));
            class.methods.push(FunctionCoverage {
                name: "run".to_string(),
                start_line: Some(1),
                hit_count: u64::from(i < called_classes),
            });
            class
        })
        .collect();
    cov.functions = (0..methods)
        .map(|i| FunctionCoverage {
            name: format!("fn{i}"),
            start_line: Some(i + 1),
            hit_count: u64::from(i < called_methods),
        })
        .collect();
    cov
}
