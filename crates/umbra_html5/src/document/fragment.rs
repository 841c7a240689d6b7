use crate::document::document_impl::DocumentImpl;
use umbra_shared::document::DocumentHandle;
use umbra_shared::node::NodeId;

/// The result of fragment parsing: a detached document whose synthetic root
/// element holds the parsed top-level nodes, plus the id of that root.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentFragment {
    /// Document holding the fragment tree
    pub handle: DocumentHandle<DocumentImpl>,
    /// Synthetic root element the parsed nodes hang off
    pub root: NodeId,
}

impl DocumentFragment {
    #[must_use]
    pub fn new(handle: DocumentHandle<DocumentImpl>, root: NodeId) -> Self {
        Self { handle, root }
    }

    /// Top-level node ids of the fragment, in document order
    pub fn children(&self) -> Vec<NodeId> {
        self.handle
            .get()
            .node_by_id(self.root)
            .map(|node| node.children().to_vec())
            .unwrap_or_default()
    }
}
