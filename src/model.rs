//! Uniform in-memory representation of per-file coverage data, independent
//! of any specific input format. Parsers produce a `CoverageData` which is
//! then folded into a [`crate::tree::CoverageTree`].

use std::collections::HashMap;

use serde::Serialize;

/// Compute a coverage percentage in `[0, 100]`, returning 0.0 when the
/// total is zero.
#[must_use]
pub fn percent(covered: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        covered as f64 / total as f64 * 100.0
    }
}

/// A single line that was instrumentable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineCoverage {
    pub line_number: u32,
    pub hit_count: u64,
}

/// A function or method that was instrumentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionCoverage {
    pub name: String,
    pub start_line: Option<u32>,
    pub hit_count: u64,
}

impl FunctionCoverage {
    #[must_use]
    pub fn is_called(&self) -> bool {
        self.hit_count > 0
    }
}

/// A class and the methods declared in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassCoverage {
    pub name: String,
    pub methods: Vec<FunctionCoverage>,
}

impl ClassCoverage {
    pub fn new(name: String) -> Self {
        Self {
            name,
            methods: Vec::new(),
        }
    }

    /// A class counts as called once any of its methods ran.
    #[must_use]
    pub fn is_called(&self) -> bool {
        self.methods.iter().any(FunctionCoverage::is_called)
    }
}

/// Coverage data for a single source file.
#[derive(Debug, Clone, Default)]
pub struct FileCoverage {
    pub path: String,
    pub lines: Vec<LineCoverage>,
    /// Functions that do not belong to any class.
    pub functions: Vec<FunctionCoverage>,
    pub classes: Vec<ClassCoverage>,
}

impl FileCoverage {
    pub fn new(path: String) -> Self {
        Self {
            path,
            ..Default::default()
        }
    }

    /// Fold another record of the same file into this one, summing hit
    /// counts of matching lines and methods.
    pub fn merge(&mut self, other: FileCoverage) {
        let mut line_index: HashMap<u32, usize> = self
            .lines
            .iter()
            .enumerate()
            .map(|(i, l)| (l.line_number, i))
            .collect();
        for line in other.lines {
            match line_index.get(&line.line_number) {
                Some(&i) => self.lines[i].hit_count += line.hit_count,
                None => {
                    line_index.insert(line.line_number, self.lines.len());
                    self.lines.push(line);
                }
            }
        }
        self.lines.sort_by_key(|l| l.line_number);

        merge_functions(&mut self.functions, other.functions);

        for class in other.classes {
            match self.classes.iter_mut().find(|c| c.name == class.name) {
                Some(existing) => merge_functions(&mut existing.methods, class.methods),
                None => self.classes.push(class),
            }
        }
    }
}

fn merge_functions(into: &mut Vec<FunctionCoverage>, from: Vec<FunctionCoverage>) {
    for func in from {
        match into
            .iter_mut()
            .find(|f| f.name == func.name && f.start_line == func.start_line)
        {
            Some(existing) => existing.hit_count += func.hit_count,
            None => into.push(func),
        }
    }
}

/// The complete result of parsing a single coverage file.
#[derive(Debug, Clone, Default)]
pub struct CoverageData {
    pub files: Vec<FileCoverage>,
}

impl CoverageData {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn func(name: &str, start_line: Option<u32>, hit_count: u64) -> FunctionCoverage {
        FunctionCoverage {
            name: name.to_string(),
            start_line,
            hit_count,
        }
    }

    #[test]
    fn test_percent_zero_total() {
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(5, 0), 0.0);
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(1, 4), 25.0);
        assert_eq!(percent(4, 4), 100.0);
    }

    #[test]
    fn test_class_called_when_any_method_hit() {
        let mut class = ClassCoverage::new("Foo".to_string());
        assert!(!class.is_called());
        class.methods.push(func("a", Some(1), 0));
        assert!(!class.is_called());
        class.methods.push(func("b", Some(5), 2));
        assert!(class.is_called());
    }

    #[test]
    fn test_merge_sums_hit_counts() {
        let mut a = FileCoverage::new("src/lib.rs".to_string());
        a.lines.push(LineCoverage {
            line_number: 1,
            hit_count: 3,
        });
        a.lines.push(LineCoverage {
            line_number: 2,
            hit_count: 0,
        });
        a.functions.push(func("main", Some(1), 1));

        let mut b = FileCoverage::new("src/lib.rs".to_string());
        b.lines.push(LineCoverage {
            line_number: 2,
            hit_count: 4,
        });
        b.lines.push(LineCoverage {
            line_number: 3,
            hit_count: 1,
        });
        b.functions.push(func("main", Some(1), 2));
        b.functions.push(func("helper", Some(3), 0));

        a.merge(b);

        assert_eq!(a.lines.len(), 3);
        assert_eq!(a.lines[0].hit_count, 3);
        assert_eq!(a.lines[1].hit_count, 4);
        assert_eq!(a.lines[2].line_number, 3);
        assert_eq!(a.functions.len(), 2);
        assert_eq!(a.functions[0].hit_count, 3);
    }

    #[test]
    fn test_merge_classes_by_name() {
        let mut a = FileCoverage::new("Foo.php".to_string());
        let mut foo = ClassCoverage::new("Foo".to_string());
        foo.methods.push(func("bar", Some(4), 0));
        a.classes.push(foo);

        let mut b = FileCoverage::new("Foo.php".to_string());
        let mut foo = ClassCoverage::new("Foo".to_string());
        foo.methods.push(func("bar", Some(4), 1));
        b.classes.push(foo);
        b.classes.push(ClassCoverage::new("Baz".to_string()));

        a.merge(b);

        assert_eq!(a.classes.len(), 2);
        assert_eq!(a.classes[0].methods[0].hit_count, 1);
        assert!(a.classes[0].is_called());
    }
}
