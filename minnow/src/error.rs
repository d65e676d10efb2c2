//! Error types for minnow container operations

use thiserror::Error;

/// Result type alias for minnow operations
pub type Result<T> = std::result::Result<T, MinnowError>;

/// Errors that can occur while reading or writing a minnow container
#[derive(Error, Debug)]
pub enum MinnowError {
    /// File is shorter than the fixed header, or the magic/version don't match
    #[error("invalid minnow magic or version")]
    Open,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Header index out of range
    #[error("header index {0} out of range ({1} headers)")]
    HeaderIndex(usize, usize),

    /// Block index out of range
    #[error("block index {0} out of range ({1} blocks)")]
    BlockIndex(usize, usize),

    /// `data()` was called with no group currently open
    #[error("no group is open for data()")]
    NoOpenGroup,

    /// Payload type or length disagrees with the currently open group
    #[error("data payload incompatible with open group: {0}")]
    SchemaMismatch(String),

    /// `float_group` saw a non-finite value, or a log column saw a value `<= 0`
    #[error("invalid float_group value: {0}")]
    Domain(String),

    /// A group's footer tail record could not be parsed
    #[error("corrupt group tail at group {0}: {1}")]
    CorruptTail(usize, String),
}
