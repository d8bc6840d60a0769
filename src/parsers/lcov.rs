/// Parser for the LCOV `.info` format.
///
/// Reference: https://ltp.sourceforge.net/coverage/lcov/geninfo.1.php
///
/// Records used:
///   SF:<path to source file>
///   FN:<line>,<function name>
///   FNDA:<execution count>,<function name>
///   DA:<line number>,<execution count>[,<checksum>]
///   end_of_record
///
/// LCOV has no notion of classes, so every function becomes a free
/// function of its file.
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use anyhow::{Context, Result};

use super::{CoverageParser, LineCollector};
use crate::detect::Format;
use crate::model::{FileCoverage, FunctionCoverage};

/// LCOV format parser.
pub struct LcovParser;

impl CoverageParser for LcovParser {
    fn format(&self) -> Format {
        Format::Lcov
    }

    fn can_parse(&self, path: &Path, content: &[u8]) -> bool {
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            let ext = ext.to_lowercase();
            if ext == "info" || ext == "lcov" {
                return true;
            }
        }

        // Content-based: lines starting with SF: and DA:/FN:
        let head = super::sniff_head(content);
        let has_sf = head.lines().any(|l| l.starts_with("SF:"));
        let has_da_or_fn = head
            .lines()
            .any(|l| l.starts_with("DA:") || l.starts_with("FN:"));
        has_sf && has_da_or_fn
    }

    fn parse_streaming(
        &self,
        reader: &mut dyn BufRead,
        emit: &mut dyn FnMut(FileCoverage) -> Result<()>,
    ) -> Result<()> {
        parse_streaming(reader, emit)
    }
}

/// Calls `emit` once per `end_of_record`, reading line by line.
fn parse_streaming(
    reader: &mut dyn BufRead,
    emit: &mut dyn FnMut(FileCoverage) -> Result<()>,
) -> Result<()> {
    let mut current_file: Option<FileCoverage> = None;
    let mut lines = LineCollector::default();

    // Function name -> start line, from FN records.
    let mut fn_defs: HashMap<String, u32> = HashMap::new();

    let mut raw_line = String::new();
    loop {
        raw_line.clear();
        let n = reader
            .read_line(&mut raw_line)
            .context("Invalid UTF-8 in LCOV data")?;
        if n == 0 {
            break;
        }

        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if line == "end_of_record" {
            if let Some(file) = current_file.take() {
                emit(finish(file, &fn_defs))?;
            }
            lines.clear();
            fn_defs.clear();
            continue;
        }

        let Some((tag, value)) = line.split_once(':') else {
            continue;
        };

        match tag {
            "SF" => {
                if let Some(file) = current_file.take() {
                    emit(finish(file, &fn_defs))?;
                }
                current_file = Some(FileCoverage::new(value.to_string()));
                lines.clear();
                fn_defs.clear();
            }
            "FN" => {
                // FN:<line>,<function_name>; newer lcov adds an end line:
                // FN:<line>,<end_line>,<function_name>
                // Names may contain commas (C++ templates), so the middle
                // field is an end line only when it is a number.
                if let Some((start, rest)) = value.split_once(',') {
                    let name = match rest.split_once(',') {
                        Some((end, name)) if end.parse::<u32>().is_ok() => name,
                        _ => rest,
                    };
                    if let Ok(start_line) = start.parse::<u32>() {
                        fn_defs.insert(name.to_string(), start_line);
                    }
                }
            }
            "FNDA" => {
                if let Some(file) = current_file.as_mut() {
                    if let Some((count_str, name)) = value.split_once(',') {
                        let hit_count = count_str.parse::<u64>().unwrap_or(0);
                        file.functions.push(FunctionCoverage {
                            name: name.to_string(),
                            start_line: fn_defs.get(name).copied(),
                            hit_count,
                        });
                    }
                }
            }
            "DA" => {
                // Negative counts mark non-instrumentable lines; skip them.
                if let Some(file) = current_file.as_mut() {
                    let parts: Vec<&str> = value.splitn(3, ',').collect();
                    if parts.len() >= 2 {
                        if let Ok(line_number) = parts[0].parse::<u32>() {
                            if let Ok(count) = parts[1].parse::<i64>() {
                                if count >= 0 {
                                    lines.push(file, line_number, count as u64);
                                }
                            }
                        }
                    }
                }
            }
            // TN, LF, LH, FNF, FNH, BRDA, BRF, BRH: derived or unused.
            _ => {}
        }
    }

    if let Some(file) = current_file.take() {
        emit(finish(file, &fn_defs))?;
    }

    Ok(())
}

/// Functions declared with FN but never reported by FNDA ran zero times.
fn finish(mut file: FileCoverage, fn_defs: &HashMap<String, u32>) -> FileCoverage {
    let mut missing: Vec<(&String, &u32)> = fn_defs
        .iter()
        .filter(|(name, _)| !file.functions.iter().any(|f| &f.name == *name))
        .collect();
    missing.sort_by_key(|&(name, line)| (*line, name.clone()));
    for (name, &start_line) in missing {
        file.functions.push(FunctionCoverage {
            name: name.clone(),
            start_line: Some(start_line),
            hit_count: 0,
        });
    }

    file.lines.sort_by_key(|l| l.line_number);
    file
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &[u8] = b"TN:test
SF:/src/lib.rs
FN:1,main
FN:7,helper
FNDA:5,main
FNDA:0,helper
DA:1,5
DA:2,5
DA:3,0
DA:7,0
DA:8,-1
LF:4
LH:2
end_of_record
SF:/src/util.rs
DA:2,1
DA:1,0
end_of_record
";

    #[test]
    fn test_parse_lcov() {
        let data = LcovParser.parse(SAMPLE).unwrap();

        assert_eq!(data.files.len(), 2);

        let lib = &data.files[0];
        assert_eq!(lib.path, "/src/lib.rs");
        // DA:8,-1 is skipped.
        assert_eq!(lib.lines.len(), 4);
        assert_eq!(lib.lines[0].hit_count, 5);
        assert_eq!(lib.lines[2].line_number, 3);
        assert_eq!(lib.lines[2].hit_count, 0);

        assert_eq!(lib.functions.len(), 2);
        assert_eq!(lib.functions[0].name, "main");
        assert_eq!(lib.functions[0].start_line, Some(1));
        assert_eq!(lib.functions[0].hit_count, 5);
        assert_eq!(lib.functions[1].name, "helper");
        assert_eq!(lib.functions[1].start_line, Some(7));
        assert!(lib.classes.is_empty());

        // Lines are sorted even when the input is not.
        let util = &data.files[1];
        assert_eq!(util.lines[0].line_number, 1);
        assert_eq!(util.lines[1].line_number, 2);
    }

    #[test]
    fn test_parse_lcov_duplicate_lines_are_summed() {
        let input = b"SF:a.rs\nDA:3,1\nDA:3,2\nend_of_record\n";
        let data = LcovParser.parse(input).unwrap();
        assert_eq!(data.files[0].lines.len(), 1);
        assert_eq!(data.files[0].lines[0].hit_count, 3);
    }

    #[test]
    fn test_parse_lcov_fn_with_end_line() {
        let input = b"SF:a.rs\nFN:4,9,run\nFNDA:2,run\nDA:4,2\nend_of_record\n";
        let data = LcovParser.parse(input).unwrap();
        assert_eq!(data.files[0].functions[0].name, "run");
        assert_eq!(data.files[0].functions[0].start_line, Some(4));
    }

    #[test]
    fn test_parse_lcov_fn_name_with_commas() {
        let input = b"SF:a.cpp\nFN:3,std::pair<int, int> make()\nFN:9,12,std::map<K, V> build()\n\
FNDA:1,std::pair<int, int> make()\nFNDA:0,std::map<K, V> build()\nDA:3,1\nend_of_record\n";
        let data = LcovParser.parse(input).unwrap();
        let functions = &data.files[0].functions;

        assert_eq!(functions.len(), 2);
        assert_eq!(functions[0].name, "std::pair<int, int> make()");
        assert_eq!(functions[0].start_line, Some(3));
        assert_eq!(functions[0].hit_count, 1);
        assert_eq!(functions[1].name, "std::map<K, V> build()");
        assert_eq!(functions[1].start_line, Some(9));
    }

    #[test]
    fn test_parse_lcov_fn_without_fnda_is_uncalled() {
        let input = b"SF:a.rs\nFN:9,late\nFN:2,early\nFNDA:1,early\nDA:2,1\nend_of_record\n";
        let data = LcovParser.parse(input).unwrap();
        let functions = &data.files[0].functions;
        assert_eq!(functions.len(), 2);
        assert_eq!(functions[1].name, "late");
        assert_eq!(functions[1].hit_count, 0);
    }

    #[test]
    fn test_parse_lcov_no_end_of_record() {
        let input = b"SF:/src/lib.rs\nDA:1,1\nDA:2,0\n";
        let data = LcovParser.parse(input).unwrap();
        assert_eq!(data.files.len(), 1);
        assert_eq!(data.files[0].lines.len(), 2);
    }

    #[test]
    fn test_parse_lcov_empty() {
        let data = LcovParser.parse(b"TN:test\n").unwrap();
        assert!(data.files.is_empty());
    }

    #[test]
    fn test_can_parse_lcov() {
        let parser = LcovParser;
        assert!(parser.can_parse(Path::new("coverage.info"), b""));
        assert!(parser.can_parse(Path::new("out.txt"), b"SF:a.rs\nDA:1,1\n"));
        assert!(!parser.can_parse(Path::new("out.txt"), b"hello"));
    }
}
