use crate::node::data::comment::CommentData;
use crate::node::data::doctype::DocTypeData;
use crate::node::data::document::DocumentData;
use crate::node::data::element::{AttrMap, ElementData};
use crate::node::data::text::TextData;
use umbra_shared::byte_stream::Location;
use umbra_shared::node::NodeId;

/// Payload of a node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Document(DocumentData),
    DocType(DocTypeData),
    Text(TextData),
    Comment(CommentData),
    Element(ElementData),
}

/// A node in the document tree. Parent and children are arena ids, never
/// owning references, so the logical bidirectionality of the tree never
/// creates an ownership cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Arena id; assigned when the node is registered
    pub id: NodeId,
    /// Parent node id, None for detached nodes and the root
    pub parent: Option<NodeId>,
    /// Child ids in document order
    pub children: Vec<NodeId>,
    /// Kind-specific payload
    pub data: NodeData,
    /// True once the node is owned by an arena
    pub registered: bool,
    /// Source position the node was created from
    pub location: Location,
}

impl Node {
    fn new(data: NodeData, location: Location) -> Self {
        Self {
            id: NodeId::default(),
            parent: None,
            children: Vec::new(),
            data,
            registered: false,
            location,
        }
    }

    #[must_use]
    pub fn new_document(location: Location) -> Self {
        Self::new(NodeData::Document(DocumentData::new()), location)
    }

    #[must_use]
    pub fn new_doctype(name: &str, pub_identifier: &str, sys_identifier: &str, location: Location) -> Self {
        Self::new(
            NodeData::DocType(DocTypeData::new(name, pub_identifier, sys_identifier)),
            location,
        )
    }

    #[must_use]
    pub fn new_element(name: &str, namespace: Option<&str>, attributes: AttrMap, location: Location) -> Self {
        Self::new(NodeData::Element(ElementData::new(name, namespace, attributes)), location)
    }

    #[must_use]
    pub fn new_text(value: &str, location: Location) -> Self {
        Self::new(NodeData::Text(TextData::with_value(value)), location)
    }

    #[must_use]
    pub fn new_comment(value: &str, location: Location) -> Self {
        Self::new(NodeData::Comment(CommentData::with_value(value)), location)
    }

    /// Creates a fresh, unregistered copy of an element node (no id, no
    /// parent, no children). Used when reconstructing formatting elements.
    #[must_use]
    pub fn new_from_node(org: &Self) -> Self {
        Self::new(org.data.clone(), org.location)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn set_id(&mut self, id: NodeId) {
        self.id = id;
    }

    pub fn parent_id(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    pub fn set_registered(&mut self, registered: bool) {
        self.registered = registered;
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_element_node(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    pub fn is_text_node(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    pub fn is_document_node(&self) -> bool {
        matches!(self.data, NodeData::Document(_))
    }

    pub fn get_element_data(&self) -> Option<&ElementData> {
        if let NodeData::Element(data) = &self.data {
            return Some(data);
        }
        None
    }

    pub fn get_element_data_mut(&mut self) -> Option<&mut ElementData> {
        if let NodeData::Element(data) = &mut self.data {
            return Some(data);
        }
        None
    }

    pub fn get_text_data(&self) -> Option<&TextData> {
        if let NodeData::Text(data) = &self.data {
            return Some(data);
        }
        None
    }

    pub fn get_text_data_mut(&mut self) -> Option<&mut TextData> {
        if let NodeData::Text(data) = &mut self.data {
            return Some(data);
        }
        None
    }

    pub fn get_comment_data(&self) -> Option<&CommentData> {
        if let NodeData::Comment(data) = &self.data {
            return Some(data);
        }
        None
    }

    pub fn get_doctype_data(&self) -> Option<&DocTypeData> {
        if let NodeData::DocType(data) = &self.data {
            return Some(data);
        }
        None
    }

    /// Inserts a child id at the given position, clamped to the child count
    pub fn insert_child_at(&mut self, child_id: NodeId, position: usize) {
        let position = position.min(self.children.len());
        self.children.insert(position, child_id);
    }

    pub fn push_child(&mut self, child_id: NodeId) {
        self.children.push(child_id);
    }

    pub fn remove_child(&mut self, child_id: NodeId) {
        self.children.retain(|&id| id != child_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::HTML_NAMESPACE;

    #[test]
    fn new_element_node() {
        let node = Node::new_element("div", Some(HTML_NAMESPACE), AttrMap::new(), Location::default());
        assert!(node.is_element_node());
        assert!(!node.is_registered());
        assert_eq!(node.get_element_data().unwrap().name(), "div");
        assert!(node.get_text_data().is_none());
    }

    #[test]
    fn child_management() {
        let mut node = Node::new_element("ul", Some(HTML_NAMESPACE), AttrMap::new(), Location::default());
        node.push_child(NodeId::from(1_usize));
        node.push_child(NodeId::from(3_usize));
        node.insert_child_at(NodeId::from(2_usize), 1);
        node.insert_child_at(NodeId::from(9_usize), 100);

        assert_eq!(
            node.children(),
            &[
                NodeId::from(1_usize),
                NodeId::from(2_usize),
                NodeId::from(3_usize),
                NodeId::from(9_usize)
            ]
        );

        node.remove_child(NodeId::from(2_usize));
        assert_eq!(node.children().len(), 3);
    }

    #[test]
    fn copy_is_detached() {
        let mut node = Node::new_element("b", Some(HTML_NAMESPACE), AttrMap::new(), Location::default());
        node.set_id(NodeId::from(5_usize));
        node.set_registered(true);
        node.push_child(NodeId::from(6_usize));

        let copy = Node::new_from_node(&node);
        assert!(!copy.is_registered());
        assert!(copy.children().is_empty());
        assert_eq!(copy.get_element_data().unwrap().name(), "b");
    }
}
