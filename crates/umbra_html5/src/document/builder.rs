use crate::document::document_impl::DocumentImpl;
use crate::node::node_impl::Node;
use umbra_shared::byte_stream::Location;
use umbra_shared::document::DocumentHandle;
use umbra_shared::types::{Error, Result};
use url::Url;

/// Constructs documents in a known-good initial state
pub struct DocumentBuilder;

impl DocumentBuilder {
    /// Creates a new document with a Document root node as node 0
    #[must_use]
    pub fn new_document(url: Option<Url>) -> DocumentHandle<DocumentImpl> {
        let mut doc = DocumentImpl::new(url);
        doc.register_node(Node::new_document(Location::default()));
        DocumentHandle::create(doc)
    }

    /// Creates the target document for fragment parsing. The fragment inherits
    /// the quirks mode of the context node's document; the parsed content ends
    /// up under a synthetic root element inserted by the parser.
    pub fn new_document_fragment(
        context_doc: &DocumentHandle<DocumentImpl>,
        context_node: &Node,
    ) -> Result<DocumentHandle<DocumentImpl>> {
        if !context_node.is_element_node() {
            return Err(Error::FragmentContext("context node is not an element".into()).into());
        }

        let mut doc = DocumentImpl::new(None);
        doc.set_quirks_mode(context_doc.get().quirks_mode());
        doc.register_node(Node::new_document(Location::default()));
        Ok(DocumentHandle::create(doc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::document_impl::QuirksMode;
    use crate::node::data::element::AttrMap;
    use crate::node::HTML_NAMESPACE;
    use umbra_shared::node::NodeId;

    #[test]
    fn new_document_has_root() {
        let handle = DocumentBuilder::new_document(None);
        let doc = handle.get();

        assert_eq!(doc.node_count(), 1);
        assert!(doc.node_by_id(NodeId::root()).unwrap().is_document_node());
        assert_eq!(doc.quirks_mode(), QuirksMode::NoQuirks);
    }

    #[test]
    fn fragment_inherits_quirks_mode() {
        let handle = DocumentBuilder::new_document(None);
        handle.get_mut().set_quirks_mode(QuirksMode::Quirks);

        let context = Node::new_element("td", Some(HTML_NAMESPACE), AttrMap::new(), Location::default());
        let fragment = DocumentBuilder::new_document_fragment(&handle, &context).unwrap();
        assert_eq!(fragment.get().quirks_mode(), QuirksMode::Quirks);
    }

    #[test]
    fn fragment_requires_element_context() {
        let handle = DocumentBuilder::new_document(None);
        let context = Node::new_text("nope", Location::default());
        assert!(DocumentBuilder::new_document_fragment(&handle, &context).is_err());
    }
}
