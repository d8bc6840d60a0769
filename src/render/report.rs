use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use super::template::{
    to_vars, TemplateEngine, TemplateVars, Templates, DIRECTORY_TEMPLATE, FILE_TEMPLATE,
    ITEM_TEMPLATE, LINE_TEMPLATE, METHOD_TEMPLATE, STYLESHEET,
};
use super::vars::{DirectoryVars, FileVars, ItemVars, LineVars, MethodVars, PageVars};
use super::{escape_html, safe_filename};
use crate::error::{CovtreeError, Result};
use crate::level::Thresholds;
use crate::tree::{CoverageTree, FileNode, NodeId, NodeKind};

const GENERATOR: &str = concat!("covtree ", env!("CARGO_PKG_VERSION"));

/// Settings for one report run.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub title: String,
    pub charset: String,
    pub generated_at: DateTime<Utc>,
    pub thresholds: Thresholds,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            title: "Code Coverage".to_string(),
            charset: "UTF-8".to_string(),
            generated_at: Utc::now(),
            thresholds: Thresholds::default(),
        }
    }
}

/// Renders a fully built tree as linked pages.
///
/// The tree must not change while a report is alive; the shared borrow
/// guarantees that.
pub struct Report<'a, E: TemplateEngine + ?Sized = Templates> {
    tree: &'a CoverageTree,
    engine: &'a E,
    options: &'a ReportOptions,
}

impl<'a, E: TemplateEngine + ?Sized> Report<'a, E> {
    pub fn new(tree: &'a CoverageTree, engine: &'a E, options: &'a ReportOptions) -> Self {
        Self {
            tree,
            engine,
            options,
        }
    }

    /// Write the stylesheet and every page into `target`. Returns the number
    /// of pages written.
    ///
    /// Nothing is written if two nodes map to the same page file. Otherwise
    /// stops at the first failure; pages written before it are kept.
    pub fn render(&self, target: &Path) -> Result<usize> {
        self.check_page_names()?;
        std::fs::create_dir_all(target)?;
        self.engine
            .render_to_file(STYLESHEET, &TemplateVars::new(), &target.join(STYLESHEET))?;

        let mut pages = 0;
        self.render_node(self.tree.root(), target, &mut pages)?;
        Ok(pages)
    }

    /// Node ids are joined with `_` and then sanitized, so `index`,
    /// `a_b.rs` next to `a/b.rs` and similar names can land on one file.
    fn check_page_names(&self) -> Result<()> {
        let mut seen: HashMap<String, NodeId> = HashMap::new();
        let mut stack = vec![self.tree.root()];
        while let Some(id) = stack.pop() {
            let stem = safe_filename(self.tree.node(id).id());
            if let Some(&other) = seen.get(&stem) {
                return Err(CovtreeError::PageCollision {
                    page: format!("{stem}.html"),
                    first: self.display_path(other),
                    second: self.display_path(id),
                });
            }
            seen.insert(stem, id);
            stack.extend(self.tree.children(id).iter().rev());
        }
        Ok(())
    }

    /// Slash-separated path from the root, for messages.
    fn display_path(&self, id: NodeId) -> String {
        let mut parts: Vec<&str> = self
            .tree
            .ancestors(id)
            .into_iter()
            .skip(1)
            .map(|ancestor| self.tree.node(ancestor).name())
            .collect();
        if self.tree.node(id).parent().is_some() {
            parts.push(self.tree.node(id).name());
        }
        if parts.is_empty() {
            self.tree.node(id).name().to_string()
        } else {
            parts.join("/")
        }
    }

    /// Render `id`, then every node below it in member order.
    pub fn render_node(&self, id: NodeId, target: &Path, pages: &mut usize) -> Result<()> {
        match self.tree.node(id).kind() {
            NodeKind::Directory(dir) => {
                self.render_directory(id, target)?;
                *pages += 1;
                for &child in dir.children() {
                    self.render_node(child, target, pages)?;
                }
            }
            NodeKind::File(file) => {
                self.render_file(id, file, target)?;
                *pages += 1;
            }
        }
        Ok(())
    }

    /// Where the page of `id` goes.
    pub fn page_path(&self, target: &Path, id: NodeId) -> PathBuf {
        target.join(format!("{}.html", safe_filename(self.tree.node(id).id())))
    }

    fn link(&self, id: NodeId) -> String {
        let node = self.tree.node(id);
        format!(
            "<a href=\"{}.html\">{}</a>",
            safe_filename(node.id()),
            escape_html(node.name())
        )
    }

    /// Ancestors as links, the node itself as plain text.
    fn breadcrumbs(&self, id: NodeId) -> String {
        let mut parts: Vec<String> = self
            .tree
            .ancestors(id)
            .into_iter()
            .map(|ancestor| self.link(ancestor))
            .collect();
        parts.push(escape_html(self.tree.node(id).name()));
        parts.join(" / ")
    }

    fn page_vars(&self, id: NodeId) -> PageVars {
        PageVars {
            title: escape_html(&self.options.title),
            charset: self.options.charset.clone(),
            link: self.breadcrumbs(id),
            date: self
                .options
                .generated_at
                .format("%Y-%m-%d %H:%M:%S UTC")
                .to_string(),
            generator: GENERATOR,
        }
    }

    /// Rows for every direct child: subdirectories first, then files.
    pub fn render_items(&self, id: NodeId) -> Result<String> {
        let mut items = String::new();
        for &child in self.tree.directories(id).iter().chain(self.tree.files(id)) {
            let row = ItemVars::new(
                self.tree,
                child,
                self.link(child),
                &self.options.thresholds,
            );
            items.push_str(&self.engine.render(ITEM_TEMPLATE, &to_vars(&row)?)?);
        }
        Ok(items)
    }

    fn render_directory(&self, id: NodeId, target: &Path) -> Result<()> {
        let items = self.render_items(id)?;
        let vars = DirectoryVars::new(
            self.tree,
            id,
            self.page_vars(id),
            items,
            &self.options.thresholds,
        );
        let path = self.page_path(target, id);
        self.engine
            .render_to_file(DIRECTORY_TEMPLATE, &to_vars(&vars)?, &path)?;
        log::debug!("Wrote {}", path.display());
        Ok(())
    }

    fn render_file(&self, id: NodeId, file: &FileNode, target: &Path) -> Result<()> {
        let mut methods = String::new();
        for class in file.classes() {
            let class_name = escape_html(&class.name);
            for method in &class.methods {
                let row = MethodVars::new(class_name.clone(), method);
                methods.push_str(&self.engine.render(METHOD_TEMPLATE, &to_vars(&row)?)?);
            }
        }
        for function in file.functions() {
            let row = MethodVars::new(String::new(), function);
            methods.push_str(&self.engine.render(METHOD_TEMPLATE, &to_vars(&row)?)?);
        }

        let mut lines = String::new();
        for line in file.lines() {
            let row = LineVars::from(line);
            lines.push_str(&self.engine.render(LINE_TEMPLATE, &to_vars(&row)?)?);
        }

        let vars = FileVars::new(
            self.tree,
            id,
            self.page_vars(id),
            methods,
            lines,
            &self.options.thresholds,
        );
        let path = self.page_path(target, id);
        self.engine
            .render_to_file(FILE_TEMPLATE, &to_vars(&vars)?, &path)?;
        log::debug!("Wrote {}", path.display());
        Ok(())
    }
}
