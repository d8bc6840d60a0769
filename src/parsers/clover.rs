/// Parser for Clover XML coverage reports.
///
/// Clover XML structure (as produced by PHPUnit, OpenClover and
/// `jest --coverageReporters=clover`):
///
///   <coverage generated="..." clover="4.x.x">
///     <project timestamp="..." name="...">
///       <package name="...">
///         <file name="Foo.php" path="/absolute/path/to/Foo.php">
///           <class name="Foo" namespace="App"><metrics .../></class>
///           <line num="3" count="2" type="method" name="doStuff"/>
///           <line num="4" count="2" type="stmt"/>
///         </file>
///       </package>
///     </project>
///   </coverage>
///
/// Method lines are matched to classes as described on `PendingFile`; method
/// lines no class claims are free functions. Every `<line>` also counts as an
/// instrumentable line.
use std::io::BufRead;
use std::path::Path;

use anyhow::Result;
use quick_xml::events::Event;

use super::{get_attr, CoverageParser, LineCollector};
use crate::detect::Format;
use crate::model::{ClassCoverage, FileCoverage, FunctionCoverage};

/// Clover XML format parser.
pub struct CloverParser;

impl CoverageParser for CloverParser {
    fn format(&self) -> Format {
        Format::Clover
    }

    fn can_parse(&self, _path: &Path, content: &[u8]) -> bool {
        let head = super::sniff_head(content);
        // The `clover` attribute tells it apart from Cobertura, which also
        // uses <coverage> as root.
        super::looks_like_xml(&head) && head.contains("<coverage") && head.contains("clover=")
    }

    fn parse_streaming(
        &self,
        reader: &mut dyn BufRead,
        emit: &mut dyn FnMut(FileCoverage) -> Result<()>,
    ) -> Result<()> {
        parse_streaming(reader, emit)
    }
}

/// Calls `emit` once per `</file>`.
fn parse_streaming(
    reader: &mut dyn BufRead,
    emit: &mut dyn FnMut(FileCoverage) -> Result<()>,
) -> Result<()> {
    let mut xml = super::xml_reader(reader);
    let mut buf = Vec::new();

    let mut current: Option<PendingFile> = None;

    loop {
        let event = xml.read_event_into(&mut buf);
        match event {
            Err(e) => return Err(super::xml_err(e, &xml)),
            Ok(Event::Eof) => break,
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let is_start = matches!(event, Ok(Event::Start(_)));
                match e.name().as_ref() {
                    b"file" => {
                        // Prefer the absolute `path` over the bare `name`.
                        let file_path = get_attr(e, b"path")
                            .or_else(|| get_attr(e, b"name"))
                            .unwrap_or_default();
                        current = Some(PendingFile::new(file_path));
                    }
                    b"class" => {
                        if let Some(file) = current.as_mut() {
                            let name = get_attr(e, b"name").unwrap_or_default();
                            let name = match get_attr(e, b"namespace") {
                                Some(ns) if !ns.is_empty() && ns != "global" => {
                                    format!("{ns}\\{name}")
                                }
                                _ => name,
                            };
                            file.start_class(name, is_start);
                        }
                    }
                    b"metrics" => {
                        if let Some(file) = current.as_mut() {
                            let methods =
                                get_attr(e, b"methods").and_then(|v| v.parse::<usize>().ok());
                            file.class_metrics(methods);
                        }
                    }
                    b"line" => {
                        if let Some(file) = current.as_mut() {
                            let num = get_attr(e, b"num").and_then(|v| v.parse::<u32>().ok());
                            let count = get_attr(e, b"count")
                                .and_then(|v| v.parse::<u64>().ok())
                                .unwrap_or(0);

                            if let Some(line_number) = num {
                                let method = (get_attr(e, b"type").as_deref() == Some("method"))
                                    .then(|| FunctionCoverage {
                                        name: get_attr(e, b"name")
                                            .or_else(|| get_attr(e, b"signature"))
                                            .unwrap_or_else(|| {
                                                format!("<anonymous@{line_number}>")
                                            }),
                                        start_line: Some(line_number),
                                        hit_count: count,
                                    });
                                file.line(line_number, count, method);
                            }
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"class" => {
                    if let Some(file) = current.as_mut() {
                        file.in_class = false;
                    }
                }
                b"file" => {
                    if let Some(file) = current.take() {
                        emit(file.finish())?;
                    }
                }
                _ => {}
            },
            _ => {}
        }
        buf.clear();
    }

    // Handle unclosed file
    if let Some(file) = current.take() {
        emit(file.finish())?;
    }

    Ok(())
}

/// A `<file>` element being read.
///
/// PHPUnit and OpenClover write every `<class>` of a file first, each with a
/// `<metrics methods=".."/>` child, and then all `<line>` entries sorted by
/// number. Method lines are then handed out to the classes in order, each
/// taking as many as its metrics declare. Writers that put each class's lines
/// right after its `<class>` element are recognised by a `<line>` showing up
/// between two classes; there a method belongs to the class before it.
struct PendingFile {
    coverage: FileCoverage,
    lines: LineCollector,
    /// Method count declared by each class's `<metrics>`.
    declared: Vec<Option<usize>>,
    /// Method lines, with the index of the class read before them.
    methods: Vec<(Option<usize>, FunctionCoverage)>,
    in_class: bool,
    line_since_class: bool,
    interleaved: bool,
}

impl PendingFile {
    fn new(path: String) -> Self {
        Self {
            coverage: FileCoverage::new(path),
            lines: LineCollector::default(),
            declared: Vec::new(),
            methods: Vec::new(),
            in_class: false,
            line_since_class: false,
            interleaved: false,
        }
    }

    fn start_class(&mut self, name: String, has_children: bool) {
        if self.line_since_class {
            self.interleaved = true;
        }
        self.coverage.classes.push(ClassCoverage::new(name));
        self.declared.push(None);
        self.in_class = has_children;
        self.line_since_class = false;
    }

    /// File-level `<metrics>` are ignored.
    fn class_metrics(&mut self, methods: Option<usize>) {
        if self.in_class {
            if let Some(slot) = self.declared.last_mut() {
                *slot = methods;
            }
        }
    }

    fn line(&mut self, line_number: u32, count: u64, method: Option<FunctionCoverage>) {
        self.lines.push(&mut self.coverage, line_number, count);
        if !self.coverage.classes.is_empty() {
            self.line_since_class = true;
        }
        if let Some(method) = method {
            let owner = self.coverage.classes.len().checked_sub(1);
            self.methods.push((owner, method));
        }
    }

    fn finish(self) -> FileCoverage {
        let mut file = self.coverage;

        if self.interleaved || self.declared.iter().all(Option::is_none) {
            for (owner, method) in self.methods {
                match owner {
                    Some(i) => file.classes[i].methods.push(method),
                    None => file.functions.push(method),
                }
            }
        } else {
            let mut methods: Vec<FunctionCoverage> =
                self.methods.into_iter().map(|(_, m)| m).collect();
            methods.sort_by_key(|m| m.start_line);
            let mut methods = methods.into_iter();
            for (class, declared) in file.classes.iter_mut().zip(&self.declared) {
                class
                    .methods
                    .extend(methods.by_ref().take(declared.unwrap_or(0)));
            }
            // More method lines than the classes declare.
            file.functions.extend(methods);
        }

        file.lines.sort_by_key(|l| l.line_number);
        file
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<coverage generated="1700000000" clover="4.4.1">
  <project timestamp="1700000000">
    <package name="App">
      <file name="Cart.php" path="/home/user/app/src/Cart.php">
        <line num="3" count="4" type="method" name="helper"/>
        <class name="Cart" namespace="App">
          <metrics methods="2" coveredmethods="1"/>
        </class>
        <line num="10" count="2" type="method" name="add"/>
        <line num="11" count="2" type="stmt"/>
        <line num="20" count="0" type="method" name="remove"/>
        <line num="21" count="0" type="stmt"/>
        <class name="Item" namespace="global"/>
        <line num="30" count="1" type="method" name="price"/>
      </file>
    </package>
    <file name="util.js">
      <line num="2" count="1" type="stmt"/>
      <line num="1" count="0" type="stmt"/>
    </file>
  </project>
</coverage>"#;

    #[test]
    fn test_parse_clover() {
        let data = CloverParser.parse(SAMPLE).unwrap();
        assert_eq!(data.files.len(), 2);

        let cart = &data.files[0];
        assert_eq!(cart.path, "/home/user/app/src/Cart.php");
        assert_eq!(cart.lines.len(), 6);

        assert_eq!(cart.functions.len(), 1);
        assert_eq!(cart.functions[0].name, "helper");

        assert_eq!(cart.classes.len(), 2);
        assert_eq!(cart.classes[0].name, "App\\Cart");
        assert_eq!(cart.classes[0].methods.len(), 2);
        assert_eq!(cart.classes[0].methods[0].name, "add");
        assert_eq!(cart.classes[0].methods[0].start_line, Some(10));
        assert_eq!(cart.classes[0].methods[1].hit_count, 0);
        assert_eq!(cart.classes[1].name, "Item");
        assert_eq!(cart.classes[1].methods[0].name, "price");

        // Without a `path` attribute the bare name is used.
        let util = &data.files[1];
        assert_eq!(util.path, "util.js");
        assert_eq!(util.lines[0].line_number, 1);
        assert!(util.classes.is_empty());
    }

    /// PHPUnit layout: all classes first, then every line sorted by number.
    fn classes_first(add_count: u64, price_count: u64) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<coverage generated="1700000000" clover="4.4.1">
  <project timestamp="1700000000">
    <file name="/app/src/Cart.php">
      <class name="Cart" namespace="App">
        <metrics complexity="2" methods="1" coveredmethods="1" statements="2"/>
      </class>
      <class name="Item" namespace="App">
        <metrics complexity="1" methods="1" coveredmethods="0" statements="1"/>
      </class>
      <line num="5" type="method" name="add" visibility="public" complexity="1" crap="1" count="{add_count}"/>
      <line num="6" type="stmt" count="{add_count}"/>
      <line num="20" type="method" name="price" visibility="public" complexity="1" crap="2" count="{price_count}"/>
      <line num="21" type="stmt" count="{price_count}"/>
      <metrics loc="30" ncloc="24" classes="2" methods="2" coveredmethods="1"/>
    </file>
  </project>
</coverage>"#
        )
    }

    #[test]
    fn test_parse_clover_classes_first_layout() {
        let data = CloverParser.parse(classes_first(3, 0).as_bytes()).unwrap();
        let file = &data.files[0];

        assert_eq!(file.classes.len(), 2);
        assert_eq!(file.classes[0].name, "App\\Cart");
        assert_eq!(file.classes[0].methods.len(), 1);
        assert_eq!(file.classes[0].methods[0].name, "add");
        assert_eq!(file.classes[0].methods[0].hit_count, 3);
        assert!(file.classes[0].is_called());

        assert_eq!(file.classes[1].name, "App\\Item");
        assert_eq!(file.classes[1].methods.len(), 1);
        assert_eq!(file.classes[1].methods[0].name, "price");
        assert!(!file.classes[1].is_called());

        assert!(file.functions.is_empty());
        assert_eq!(file.lines.len(), 4);
    }

    #[test]
    fn test_parse_clover_classes_first_all_called() {
        let data = CloverParser.parse(classes_first(1, 2).as_bytes()).unwrap();
        let file = &data.files[0];
        assert!(file.classes.iter().all(|c| c.is_called()));
    }

    #[test]
    fn test_parse_clover_more_methods_than_declared() {
        let input = br#"<coverage clover="4.4.1"><project><file name="a.php">
            <class name="A"><metrics methods="1"/></class>
            <line num="2" count="1" type="method" name="one"/>
            <line num="8" count="0" type="method" name="helper"/>
        </file></project></coverage>"#;
        let data = CloverParser.parse(input).unwrap();
        let file = &data.files[0];
        assert_eq!(file.classes[0].methods[0].name, "one");
        assert_eq!(file.functions.len(), 1);
        assert_eq!(file.functions[0].name, "helper");
    }

    #[test]
    fn test_parse_clover_signature_fallback() {
        let input = br#"<coverage clover="4.4.1"><project><file name="m.py">
            <line num="5" count="3" type="method" signature="do_stuff()"/>
        </file></project></coverage>"#;
        let data = CloverParser.parse(input).unwrap();
        assert_eq!(data.files[0].functions[0].name, "do_stuff()");
        assert_eq!(data.files[0].functions[0].hit_count, 3);
    }

    #[test]
    fn test_parse_clover_empty() {
        let input = br#"<?xml version="1.0"?><coverage clover="4.4.1"><project/></coverage>"#;
        let data = CloverParser.parse(input).unwrap();
        assert!(data.files.is_empty());
    }

    #[test]
    fn test_parse_clover_malformed() {
        let input = br#"<?xml version="1.0"?><coverage clover="4.4.1"><project></file></coverage>"#;
        let err = CloverParser.parse(input).unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("position"), "Error should contain position info: {msg}");
    }

    #[test]
    fn test_can_parse_clover() {
        let parser = CloverParser;

        let content = br#"<?xml version="1.0"?><coverage generated="123" clover="4.4.1"><project>"#;
        assert!(parser.can_parse(Path::new("clover.xml"), content));

        // Cobertura has no clover= attribute.
        let content = br#"<?xml version="1.0"?><coverage version="1.0">"#;
        assert!(!parser.can_parse(Path::new("coverage.xml"), content));
    }
}
