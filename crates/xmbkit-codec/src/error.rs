//! Error types for XMB decoding and encoding.

use thiserror::Error;

/// Errors that can occur when decoding or encoding XMB containers.
#[derive(Debug, Error)]
pub enum Error {
    /// Common library error (truncated buffer, bad magic, bad string).
    #[error("{0}")]
    Common(#[from] xmbkit_common::Error),

    /// Entry index out of bounds while linking the tree.
    #[error("entry index {index} out of bounds (total entries: {count})")]
    EntryIndexOutOfBounds { index: i32, count: usize },

    /// Operation not supported by this revision or by the write path.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// XML parsing or writing error.
    #[error("XML error: {0}")]
    Xml(String),
}

/// Result type for XMB operations.
pub type Result<T> = std::result::Result<T, Error>;
