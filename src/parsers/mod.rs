pub mod clover;
pub mod lcov;

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use anyhow::Result;
use quick_xml::events::BytesStart;
use quick_xml::reader::Reader;

use crate::detect::Format;
use crate::error::CovtreeError;
use crate::model::{CoverageData, FileCoverage, LineCoverage};

/// Every input format parser implements this trait.
pub trait CoverageParser {
    /// The format this parser handles.
    fn format(&self) -> Format;

    /// Whether `content` (read from `path`) looks like this format.
    fn can_parse(&self, path: &Path, content: &[u8]) -> bool;

    /// Parse from a reader, calling `emit` once per source file.
    fn parse_streaming(
        &self,
        reader: &mut dyn BufRead,
        emit: &mut dyn FnMut(FileCoverage) -> Result<()>,
    ) -> Result<()>;

    /// Parse the whole input into memory.
    fn parse(&self, input: &[u8]) -> Result<CoverageData> {
        let mut data = CoverageData::new();
        self.parse_streaming(&mut &*input, &mut |file| {
            data.files.push(file);
            Ok(())
        })?;
        Ok(data)
    }
}

/// All known parsers, in detection order.
pub fn all_parsers() -> Vec<Box<dyn CoverageParser>> {
    vec![Box::new(lcov::LcovParser), Box::new(clover::CloverParser)]
}

/// First few KB of the input, enough for format sniffing.
pub(crate) fn sniff_head(content: &[u8]) -> std::borrow::Cow<'_, str> {
    let head_len = content.len().min(4096);
    String::from_utf8_lossy(&content[..head_len])
}

pub(crate) fn looks_like_xml(head: &str) -> bool {
    head.contains("<?xml") || head.trim_start().starts_with('<')
}

pub(crate) fn xml_reader(reader: &mut dyn BufRead) -> Reader<&mut dyn BufRead> {
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(true);
    xml
}

/// Wrap a quick-xml error with the byte position it occurred at.
pub(crate) fn xml_err<R>(source: quick_xml::Error, reader: &Reader<R>) -> anyhow::Error {
    CovtreeError::Xml {
        source,
        position: reader.buffer_position(),
    }
    .into()
}

/// Unescaped value of one attribute, if present.
pub(crate) fn get_attr(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

/// Collects line records for one file, summing hits when a line shows up
/// more than once.
#[derive(Debug, Default)]
pub(crate) struct LineCollector {
    index: HashMap<u32, usize>,
}

impl LineCollector {
    pub(crate) fn push(&mut self, file: &mut FileCoverage, line_number: u32, hit_count: u64) {
        match self.index.get(&line_number) {
            Some(&i) => file.lines[i].hit_count += hit_count,
            None => {
                self.index.insert(line_number, file.lines.len());
                file.lines.push(LineCoverage {
                    line_number,
                    hit_count,
                });
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.index.clear();
    }
}
