//! HTML report generation: one page per directory and per file.

pub mod report;
pub mod template;
pub mod vars;

use std::sync::LazyLock;

use regex::Regex;

pub use report::{Report, ReportOptions};
pub use template::{TemplateEngine, TemplateVars, Templates};

static UNSAFE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]").unwrap());

/// Map a node id to something usable as a file name stem.
#[must_use]
pub fn safe_filename(id: &str) -> String {
    UNSAFE_RE.replace_all(id, "_").into_owned()
}

#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_filename() {
        assert_eq!(safe_filename("index"), "index");
        assert_eq!(safe_filename("src_util_Str.php"), "src_util_Str.php");
        assert_eq!(safe_filename("my dir_a/b:c"), "my_dir_a_b_c");
        assert_eq!(safe_filename("naïve"), "na_ve");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a<b>&\"'"), "a&lt;b&gt;&amp;&quot;&#39;");
        assert_eq!(escape_html("plain"), "plain");
    }
}
