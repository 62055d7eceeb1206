//! Error types for spec file handling.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for spec file operations.
pub type Result<T> = std::result::Result<T, SpecError>;

/// Errors raised while reading or querying a spec file.
#[derive(Debug, Error)]
pub enum SpecError {
    /// A `key = value` line appeared before any `[section]` header.
    #[error("line {line}: entry outside of any section")]
    MissingSection { line: usize },

    /// The same `[section]` header appeared twice.
    #[error("line {line}: duplicate section [{name}]")]
    DuplicateSection { line: usize, name: String },

    /// The same key appeared twice within one section.
    #[error("line {line}: duplicate key `{key}` in [{section}]")]
    DuplicateKey {
        line: usize,
        section: String,
        key: String,
    },

    /// A line that is neither a header, an entry nor a comment.
    #[error("line {line}: expected `key = value`, found `{text}`")]
    Syntax { line: usize, text: String },

    /// A boolean key holds something other than a boolean.
    #[error("[{section}] {key}: `{value}` is not a boolean")]
    InvalidBool {
        section: String,
        key: String,
        value: String,
    },

    /// A section name that would not read back as the same header.
    #[error("invalid section name `{name}`")]
    InvalidSection { name: String },

    /// A key that would not read back as the same key.
    #[error("[{section}] invalid key `{key}`")]
    InvalidKey { section: String, key: String },

    /// A value line that would read back as something else.
    #[error("[{section}] {key}: value line `{text}` would read back as a comment")]
    InvalidValue {
        section: String,
        key: String,
        text: String,
    },

    /// Reading or writing the file failed.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SpecError {
    /// Line the error refers to, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            SpecError::MissingSection { line }
            | SpecError::DuplicateSection { line, .. }
            | SpecError::DuplicateKey { line, .. }
            | SpecError::Syntax { line, .. } => Some(*line),
            _ => None,
        }
    }
}
