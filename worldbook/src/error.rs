//! Error types for world book conversion.

use thiserror::Error;

/// Result type alias for conversion operations.
pub type Result<T> = std::result::Result<T, WorldBookError>;

/// Errors raised while converting a world book.
#[derive(Debug, Error)]
pub enum WorldBookError {
    /// The input contained nothing but whitespace.
    #[error("请输入XML内容")]
    EmptyInput,

    /// The input contained no complete `<startl>...<endl>` entry.
    #[error("未找到有效的XML条目")]
    NoEntries,

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
