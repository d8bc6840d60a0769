use thiserror::Error;

#[derive(Error, Debug)]
pub enum CovtreeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parse error at position {position}: {source}")]
    Xml {
        source: quick_xml::Error,
        position: usize,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Malformed coverage data for '{path}': {reason}")]
    MalformedCoverage { path: String, reason: String },

    #[error("Template error: {0}")]
    Template(String),

    #[error("Unknown coverage format")]
    UnknownFormat,

    #[error("Pages of '{first}' and '{second}' would both be written to {page}")]
    PageCollision {
        page: String,
        first: String,
        second: String,
    },

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CovtreeError>;
