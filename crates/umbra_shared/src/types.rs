use crate::byte_stream::Location;
use thiserror::Error;

/// Convenience result type used throughout the engine
pub type Result<T> = anyhow::Result<T>;

/// A recoverable markup error observed during parsing. These are collected
/// and reported after the parse; they never abort it.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// Error message
    pub message: String,
    /// Location of the error in the source text
    pub location: Location,
}

/// Serious errors and errors from third-party libraries
#[derive(Error, Debug)]
pub enum Error {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid fragment context: {0}")]
    FragmentContext(String),

    #[error("utf8 conversion error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("document error: {0}")]
    Document(String),
}
