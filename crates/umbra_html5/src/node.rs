pub mod arena;
pub mod data;
pub mod elements;
pub mod node_impl;
pub mod visitor;

/// Namespace of regular HTML elements
pub const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";
/// Namespace of MathML elements
pub const MATHML_NAMESPACE: &str = "http://www.w3.org/1998/Math/MathML";
/// Namespace of SVG elements
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
/// XLink attribute namespace
pub const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";
/// XML attribute namespace
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
/// XMLNS attribute namespace
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";
