//! Foundation types shared by the umbra parsing engine and its consumers:
//! the resumable character stream, node identifiers, the shared document
//! handle and common error types.

pub mod byte_stream;
pub mod document;
pub mod node;
pub mod types;
