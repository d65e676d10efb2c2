//! Error types for minh schema operations

use thiserror::Error;

/// Result type alias for minh operations
pub type Result<T> = std::result::Result<T, MinhError>;

/// Errors that can occur while reading or writing a minh file
#[derive(Error, Debug)]
pub enum MinhError {
    /// Underlying minnow container error
    #[error("minnow error: {0}")]
    Minnow(#[from] minnow::MinnowError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File is shorter than the fixed header, or the magic/version don't match
    #[error("invalid minh magic or version")]
    Open,

    /// Column name not found in the schema
    #[error("no such column: {0}")]
    ColumnNotFound(String),

    /// Column index out of range
    #[error("column index {0} out of range ({1} columns)")]
    ColumnIndex(usize, usize),

    /// Block index out of range
    #[error("block index {0} out of range ({1} blocks)")]
    BlockIndex(usize, usize),

    /// `block()` was called with the wrong number of columns, or a column's
    /// runtime payload disagrees with its descriptor
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A `file_type` code this crate does not produce or read was seen
    #[error("unsupported minh file_type {0}")]
    UnsupportedFileType(i64),
}
