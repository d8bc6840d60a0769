//! Template engine seam.
//!
//! Pages are produced by handing a named template and a slot→value map to a
//! [`TemplateEngine`]. [`Templates`] is the bundled engine: it fills
//! `{slot}` placeholders in the built-in templates, or in same-named files
//! from an override directory.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;

use crate::error::{CovtreeError, Result};

pub const DIRECTORY_TEMPLATE: &str = "coverage_directory.html";
pub const ITEM_TEMPLATE: &str = "coverage_item.html";
pub const FILE_TEMPLATE: &str = "coverage_file.html";
pub const LINE_TEMPLATE: &str = "coverage_line.html";
pub const METHOD_TEMPLATE: &str = "coverage_method.html";
pub const STYLESHEET: &str = "style.css";

/// Slot name → rendered value.
pub type TemplateVars = BTreeMap<String, String>;

static SLOT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").unwrap());

/// Turns a template name and its variables into page text.
pub trait TemplateEngine {
    /// Render the named template.
    fn render(&self, template: &str, vars: &TemplateVars) -> Result<String>;

    /// Render the named template and write it to `path`.
    fn render_to_file(&self, template: &str, vars: &TemplateVars, path: &Path) -> Result<()> {
        let page = self.render(template, vars)?;
        std::fs::write(path, page)?;
        Ok(())
    }
}

/// Flatten a serializable variable set into slot values. Field names are
/// the slot names.
pub fn to_vars<T: Serialize>(value: &T) -> Result<TemplateVars> {
    let json = serde_json::to_value(value)
        .map_err(|e| CovtreeError::Template(format!("Cannot serialize template variables: {e}")))?;
    let serde_json::Value::Object(map) = json else {
        return Err(CovtreeError::Template(
            "Template variables must serialize to a map".to_string(),
        ));
    };

    Ok(map
        .into_iter()
        .map(|(key, value)| {
            let text = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            };
            (key, text)
        })
        .collect())
}

/// Fill every `{slot}` that has a value. Unknown slots are left untouched.
/// Substituted values are not scanned again.
#[must_use]
pub fn fill(source: &str, vars: &TemplateVars) -> String {
    SLOT_RE
        .replace_all(source, |caps: &Captures| match vars.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

fn builtin(name: &str) -> Option<&'static str> {
    match name {
        DIRECTORY_TEMPLATE => Some(include_str!("../../templates/coverage_directory.html")),
        ITEM_TEMPLATE => Some(include_str!("../../templates/coverage_item.html")),
        FILE_TEMPLATE => Some(include_str!("../../templates/coverage_file.html")),
        LINE_TEMPLATE => Some(include_str!("../../templates/coverage_line.html")),
        METHOD_TEMPLATE => Some(include_str!("../../templates/coverage_method.html")),
        STYLESHEET => Some(include_str!("../../templates/style.css")),
        _ => None,
    }
}

/// The bundled `{slot}` substitution engine.
#[derive(Debug, Clone, Default)]
pub struct Templates {
    dir: Option<PathBuf>,
}

impl Templates {
    /// Use only the built-in templates.
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Prefer templates found in `dir`, falling back to the built-in ones.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    fn source(&self, name: &str) -> Result<Cow<'static, str>> {
        if let Some(dir) = &self.dir {
            let path = dir.join(name);
            if path.is_file() {
                return Ok(Cow::Owned(std::fs::read_to_string(&path)?));
            }
        }
        builtin(name)
            .map(Cow::Borrowed)
            .ok_or_else(|| CovtreeError::Template(format!("Template '{name}' not found")))
    }
}

impl TemplateEngine for Templates {
    fn render(&self, template: &str, vars: &TemplateVars) -> Result<String> {
        let source = self.source(template)?;
        Ok(fill(&source, vars))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> TemplateVars {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_fill_known_slots() {
        let out = fill("<a>{link}</a> {level}", &vars(&[("link", "x"), ("level", "Hi")]));
        assert_eq!(out, "<a>x</a> Hi");
    }

    #[test]
    fn test_fill_leaves_unknown_slots_and_css() {
        let out = fill("{missing} body { color: red; }", &vars(&[]));
        assert_eq!(out, "{missing} body { color: red; }");
    }

    #[test]
    fn test_fill_does_not_rescan_values() {
        let out = fill("{items}", &vars(&[("items", "{title}"), ("title", "nope")]));
        assert_eq!(out, "{title}");
    }

    #[test]
    fn test_to_vars_stringifies_values() {
        #[derive(Serialize)]
        struct Row {
            link: String,
            num_classes: u64,
            width: f64,
        }
        let vars = to_vars(&Row {
            link: "a".to_string(),
            num_classes: 3,
            width: 12.5,
        })
        .unwrap();
        assert_eq!(vars["link"], "a");
        assert_eq!(vars["num_classes"], "3");
        assert_eq!(vars["width"], "12.5");
    }

    #[test]
    fn test_to_vars_rejects_non_map() {
        assert!(to_vars(&42).is_err());
    }

    #[test]
    fn test_builtin_templates_present() {
        let engine = Templates::builtin();
        for name in [
            DIRECTORY_TEMPLATE,
            ITEM_TEMPLATE,
            FILE_TEMPLATE,
            LINE_TEMPLATE,
            METHOD_TEMPLATE,
            STYLESHEET,
        ] {
            assert!(engine.render(name, &TemplateVars::new()).is_ok(), "{name}");
        }
    }

    #[test]
    fn test_missing_template() {
        let err = Templates::builtin()
            .render("nope.html", &TemplateVars::new())
            .unwrap_err();
        assert!(err.to_string().contains("nope.html"));
    }

    #[test]
    fn test_override_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(LINE_TEMPLATE), "line {line_number}").unwrap();
        let engine = Templates::with_dir(dir.path());

        let out = engine
            .render(LINE_TEMPLATE, &vars(&[("line_number", "7")]))
            .unwrap();
        assert_eq!(out, "line 7");

        // Templates absent from the directory fall back to the built-in ones.
        let css = engine.render(STYLESHEET, &TemplateVars::new()).unwrap();
        assert!(css.contains("chameleon"));
    }
}
