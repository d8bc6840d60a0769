/// Auto-detection of coverage file formats.
///
/// Strategy:
///   1. Check file extension for strong hints
///   2. Ask each parser whether the content looks like its format
///   3. Fall back to CLI --format override (handled by caller)
use std::path::Path;

use crate::error::CovtreeError;
use crate::parsers::{all_parsers, clover::CloverParser, lcov::LcovParser, CoverageParser};

/// Supported coverage formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Lcov,
    Clover,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Lcov => "lcov",
            Format::Clover => "clover",
        }
    }
}

impl std::str::FromStr for Format {
    type Err = CovtreeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lcov" => Ok(Format::Lcov),
            "clover" => Ok(Format::Clover),
            _ => Err(CovtreeError::Parse(format!(
                "Unknown format: '{}'. Supported: lcov, clover",
                s
            ))),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect the coverage format from filename and file content.
pub fn detect_format(path: &Path, content: &[u8]) -> Option<Format> {
    if let Some(fmt) = detect_by_extension(path) {
        return Some(fmt);
    }

    all_parsers()
        .into_iter()
        .find(|p| p.can_parse(path, content))
        .map(|p| p.format())
}

fn detect_by_extension(path: &Path) -> Option<Format> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "info" | "lcov" => Some(Format::Lcov),
        // Clover and Cobertura share the .xml extension.
        _ => None,
    }
}

/// The parser for an explicitly chosen format.
pub fn parser_for(format: Format) -> Box<dyn CoverageParser> {
    match format {
        Format::Lcov => Box::new(LcovParser),
        Format::Clover => Box::new(CloverParser),
    }
}
