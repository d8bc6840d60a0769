use std::collections::HashSet;
use std::rc::Rc;

use crate::error::{CovtreeError, Result};
use crate::model::{ClassCoverage, FileCoverage, FunctionCoverage, LineCoverage};

use super::Metric;

/// Leaf of the coverage tree: one source file with its counts frozen at
/// construction.
#[derive(Debug)]
pub struct FileNode {
    path: String,
    lines: Vec<LineCoverage>,
    functions: Vec<FunctionCoverage>,
    classes: Rc<[ClassCoverage]>,
    counts: [u64; Metric::COUNT],
}

impl FileNode {
    /// Validate the raw table and derive the six base counts.
    pub(crate) fn new(coverage: FileCoverage) -> Result<Self> {
        validate(&coverage)?;

        let FileCoverage {
            path,
            mut lines,
            functions,
            classes,
        } = coverage;
        lines.sort_by_key(|l| l.line_number);

        let methods = || {
            classes
                .iter()
                .flat_map(|c| c.methods.iter())
                .chain(functions.iter())
        };

        let mut counts = [0; Metric::COUNT];
        counts[Metric::ExecutableLines.index()] = lines.len() as u64;
        counts[Metric::ExecutedLines.index()] =
            lines.iter().filter(|l| l.hit_count > 0).count() as u64;
        counts[Metric::Classes.index()] = classes.len() as u64;
        counts[Metric::CalledClasses.index()] =
            classes.iter().filter(|c| c.is_called()).count() as u64;
        counts[Metric::Methods.index()] = methods().count() as u64;
        counts[Metric::CalledMethods.index()] = methods().filter(|m| m.is_called()).count() as u64;

        Ok(Self {
            path,
            lines,
            functions,
            classes: classes.into(),
            counts,
        })
    }

    /// Path of the source file as it appeared in the coverage input.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Instrumentable lines, ordered by line number.
    pub fn lines(&self) -> &[LineCoverage] {
        &self.lines
    }

    /// Functions outside of any class.
    pub fn functions(&self) -> &[FunctionCoverage] {
        &self.functions
    }

    pub fn classes(&self) -> &[ClassCoverage] {
        &self.classes
    }

    pub(crate) fn shared_classes(&self) -> Rc<[ClassCoverage]> {
        Rc::clone(&self.classes)
    }

    #[must_use]
    pub fn count(&self, metric: Metric) -> u64 {
        self.counts[metric.index()]
    }
}

fn validate(coverage: &FileCoverage) -> Result<()> {
    let malformed = |reason: String| CovtreeError::MalformedCoverage {
        path: coverage.path.clone(),
        reason,
    };

    let mut seen = HashSet::with_capacity(coverage.lines.len());
    for line in &coverage.lines {
        if line.line_number == 0 {
            return Err(malformed("line numbers start at 1".to_string()));
        }
        if !seen.insert(line.line_number) {
            return Err(malformed(format!(
                "line {} is recorded more than once",
                line.line_number
            )));
        }
    }

    if coverage.classes.iter().any(|c| c.name.is_empty()) {
        return Err(malformed("class without a name".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(line_number: u32, hit_count: u64) -> LineCoverage {
        LineCoverage {
            line_number,
            hit_count,
        }
    }

    fn method(name: &str, hit_count: u64) -> FunctionCoverage {
        FunctionCoverage {
            name: name.to_string(),
            start_line: None,
            hit_count,
        }
    }

    #[test]
    fn test_counts() {
        let mut cov = FileCoverage::new("src/Foo.php".to_string());
        cov.lines = vec![line(3, 0), line(1, 2), line(2, 1)];
        let mut foo = ClassCoverage::new("Foo".to_string());
        foo.methods = vec![method("a", 1), method("b", 0)];
        let mut bar = ClassCoverage::new("Bar".to_string());
        bar.methods = vec![method("c", 0)];
        cov.classes = vec![foo, bar];
        cov.functions = vec![method("helper", 4)];

        let file = FileNode::new(cov).unwrap();

        assert_eq!(file.count(Metric::ExecutableLines), 3);
        assert_eq!(file.count(Metric::ExecutedLines), 2);
        assert_eq!(file.count(Metric::Classes), 2);
        assert_eq!(file.count(Metric::CalledClasses), 1);
        assert_eq!(file.count(Metric::Methods), 4);
        assert_eq!(file.count(Metric::CalledMethods), 2);
        // Lines come back sorted.
        assert_eq!(file.lines()[0].line_number, 1);
        assert_eq!(file.lines()[2].line_number, 3);
    }

    #[test]
    fn test_empty_file() {
        let file = FileNode::new(FileCoverage::new("empty.rs".to_string())).unwrap();
        for metric in Metric::ALL {
            assert_eq!(file.count(metric), 0);
        }
    }

    #[test]
    fn test_rejects_line_zero() {
        let mut cov = FileCoverage::new("bad.rs".to_string());
        cov.lines = vec![line(0, 1)];
        let err = FileNode::new(cov).unwrap_err();
        assert!(matches!(err, CovtreeError::MalformedCoverage { .. }));
    }

    #[test]
    fn test_rejects_duplicate_line() {
        let mut cov = FileCoverage::new("bad.rs".to_string());
        cov.lines = vec![line(4, 1), line(4, 0)];
        let err = FileNode::new(cov).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("bad.rs"), "{msg}");
        assert!(msg.contains("line 4"), "{msg}");
    }

    #[test]
    fn test_rejects_unnamed_class() {
        let mut cov = FileCoverage::new("bad.php".to_string());
        cov.classes = vec![ClassCoverage::new(String::new())];
        assert!(FileNode::new(cov).is_err());
    }
}
