pub mod comment;
pub mod doctype;
pub mod document;
pub mod element;
pub mod text;
