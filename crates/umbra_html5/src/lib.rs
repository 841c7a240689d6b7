//! HTML5 tokenizer and tree-construction engine.
//!
//! The tokenizer follows the WHATWG state machine and hands its tokens to the
//! tree builder, which assembles an arena-backed document. Both sides are
//! resumable: an open input stream can starve mid-parse and be resumed after
//! more input is appended.

pub mod document;
pub mod errors;
pub mod node;
pub mod parser;
pub mod tokenizer;
pub mod writer;

use crate::document::builder::DocumentBuilder;
use crate::document::document_impl::DocumentImpl;
use crate::parser::Html5Parser;
use umbra_shared::byte_stream::{ByteStream, Stream};
use umbra_shared::document::DocumentHandle;

/// Parses a complete HTML string into a document. Parse errors are recovered
/// from and discarded; use [`Html5Parser::parse_document`] directly to
/// inspect them.
pub fn parse_str(html: &str) -> DocumentHandle<DocumentImpl> {
    let mut stream = ByteStream::new(None);
    stream.read_from_str(html);
    stream.close();

    let doc_handle = DocumentBuilder::new_document(None);
    let _ = Html5Parser::parse_document(&mut stream, doc_handle.clone(), None);

    doc_handle
}
