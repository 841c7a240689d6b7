use crate::node::arena::NodeArena;
use crate::node::node_impl::{Node, NodeData};
use crate::node::visitor::Visitor;
use std::collections::HashMap;
use std::fmt;
use url::Url;
use umbra_shared::node::NodeId;

/// Doctype-derived rendering mode of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuirksMode {
    Quirks,
    LimitedQuirks,
    NoQuirks,
}

/// The document: owner of the node arena plus document-wide state. Node
/// relationships (parent, children) only ever reference arena ids, so the
/// tree stays acyclic in ownership terms.
#[derive(Debug, PartialEq)]
pub struct DocumentImpl {
    /// URL the document was loaded from, if any
    pub url: Option<Url>,
    /// Holds and owns all nodes in the document
    pub arena: NodeArena,
    /// Elements indexed by their (valid) id attribute
    named_id_elements: HashMap<String, NodeId>,
    /// Quirks mode as determined from the doctype
    quirks_mode: QuirksMode,
}

impl DocumentImpl {
    #[must_use]
    pub fn new(url: Option<Url>) -> Self {
        Self {
            url,
            arena: NodeArena::new(),
            named_id_elements: HashMap::new(),
            quirks_mode: QuirksMode::NoQuirks,
        }
    }

    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    pub fn quirks_mode(&self) -> QuirksMode {
        self.quirks_mode
    }

    pub fn set_quirks_mode(&mut self, quirks_mode: QuirksMode) {
        self.quirks_mode = quirks_mode;
    }

    pub fn node_count(&self) -> usize {
        self.arena.node_count()
    }

    pub fn node_by_id(&self, node_id: NodeId) -> Option<&Node> {
        self.arena.node_ref(node_id)
    }

    pub fn cloned_node_by_id(&self, node_id: NodeId) -> Option<Node> {
        self.arena.node(node_id)
    }

    pub fn get_root_id(&self) -> NodeId {
        NodeId::root()
    }

    /// Returns the element registered under the given id attribute value
    pub fn get_node_by_named_id(&self, named_id: &str) -> Option<&Node> {
        let node_id = self.named_id_elements.get(named_id)?;
        self.arena.node_ref(*node_id)
    }

    /// Registers a node into the arena without attaching it to the tree
    pub fn register_node(&mut self, node: Node) -> NodeId {
        self.arena.register_node(node)
    }

    /// Registers a node and attaches it under the given parent
    pub fn register_node_at(&mut self, node: Node, parent_id: NodeId, position: Option<usize>) -> NodeId {
        let node_id = self.register_node(node);
        self.attach_node(node_id, parent_id, position);
        node_id
    }

    /// Attaches a registered node under a parent, optionally at a fixed
    /// position in the child list (clamped). Attaching a node to itself or
    /// to one of its own descendants is refused: tree consistency beats the
    /// incoming operation. A node has at most one parent, so an already
    /// attached node is removed from its old parent's child list first.
    pub fn attach_node(&mut self, node_id: NodeId, parent_id: NodeId, position: Option<usize>) {
        if node_id == parent_id || self.has_node_id_recursive(node_id, parent_id) {
            return;
        }

        let old_parent = self.arena.node_ref(node_id).and_then(Node::parent_id);
        if let Some(old_parent_id) = old_parent {
            if let Some(old_parent_node) = self.arena.node_mut(old_parent_id) {
                old_parent_node.remove_child(node_id);
            }
        }

        if let Some(parent) = self.arena.node_mut(parent_id) {
            match position {
                Some(position) => parent.insert_child_at(node_id, position),
                None => parent.push_child(node_id),
            }
        }
        if let Some(node) = self.arena.node_mut(node_id) {
            node.parent = Some(parent_id);
        }

        self.index_named_id(node_id);
    }

    /// Detaches a node from its parent; the node and its subtree stay in the
    /// arena and remain a valid (detached) tree
    pub fn detach_node(&mut self, node_id: NodeId) {
        let parent = self.arena.node_ref(node_id).and_then(Node::parent_id);
        if let Some(parent_id) = parent {
            if let Some(parent_node) = self.arena.node_mut(parent_id) {
                parent_node.remove_child(node_id);
            }
        }
        if let Some(node) = self.arena.node_mut(node_id) {
            node.parent = None;
        }

        self.named_id_elements.retain(|_, &mut id| id != node_id);
    }

    /// Moves a node (with its subtree) under a new parent. Detach and attach
    /// are a single operation here, so no observer ever sees the node in two
    /// child lists.
    pub fn relocate_node(&mut self, node_id: NodeId, new_parent_id: NodeId) {
        self.detach_node(node_id);
        self.attach_node(node_id, new_parent_id, None);
    }

    pub fn update_node(&mut self, node: Node) {
        self.arena.update_node(node);
    }

    pub fn delete_node(&mut self, node_id: NodeId) {
        self.detach_node(node_id);
        self.arena.delete_node(node_id);
    }

    pub fn get_next_sibling(&self, node_id: NodeId) -> Option<NodeId> {
        let parent_id = self.arena.node_ref(node_id)?.parent_id()?;
        let parent = self.arena.node_ref(parent_id)?;
        let position = parent.children().iter().position(|&id| id == node_id)?;
        parent.children().get(position + 1).copied()
    }

    /// True when `search_id` occurs in the subtree rooted at `node_id`
    fn has_node_id_recursive(&self, node_id: NodeId, search_id: NodeId) -> bool {
        let Some(node) = self.arena.node_ref(node_id) else {
            return false;
        };
        for &child_id in node.children() {
            if child_id == search_id || self.has_node_id_recursive(child_id, search_id) {
                return true;
            }
        }
        false
    }

    /// Adds the node to the named-id index when it carries a usable id
    /// attribute. The first element claiming an id keeps it.
    fn index_named_id(&mut self, node_id: NodeId) {
        let Some(node) = self.arena.node_ref(node_id) else {
            return;
        };
        let Some(data) = node.get_element_data() else {
            return;
        };
        let Some(value) = data.attributes().get("id") else {
            return;
        };
        if value.is_empty() || value.contains(char::is_whitespace) {
            return;
        }
        self.named_id_elements.entry(value.to_owned()).or_insert(node_id);
    }

    /// Walks the subtree rooted at `node_id` in document order, invoking the
    /// visitor's enter/leave callbacks
    pub fn visit_subtree(&self, node_id: NodeId, visitor: &mut dyn Visitor) {
        let Some(node) = self.arena.node_ref(node_id) else {
            return;
        };

        match &node.data {
            NodeData::Document(data) => visitor.document_enter(node, data),
            NodeData::DocType(data) => visitor.doctype_enter(node, data),
            NodeData::Text(data) => visitor.text_enter(node, data),
            NodeData::Comment(data) => visitor.comment_enter(node, data),
            NodeData::Element(data) => visitor.element_enter(node, data),
        }

        for &child_id in node.children() {
            self.visit_subtree(child_id, visitor);
        }

        match &node.data {
            NodeData::Document(data) => visitor.document_leave(node, data),
            NodeData::DocType(data) => visitor.doctype_leave(node, data),
            NodeData::Text(data) => visitor.text_leave(node, data),
            NodeData::Comment(data) => visitor.comment_leave(node, data),
            NodeData::Element(data) => visitor.element_leave(node, data),
        }
    }

    fn display_tree(&self, node_id: NodeId, prefix: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(node) = self.arena.node_ref(node_id) else {
            return Ok(());
        };

        match &node.data {
            NodeData::Document(_) => writeln!(f, "{prefix}Document")?,
            NodeData::DocType(data) => writeln!(f, "{prefix}{data}")?,
            NodeData::Text(data) => writeln!(f, "{prefix}\"{}\"", data.value())?,
            NodeData::Comment(data) => writeln!(f, "{prefix}<!-- {} -->", data.value())?,
            NodeData::Element(data) => {
                let mut open = format!("<{}", data.name());
                for (name, value) in data.attributes().iter() {
                    open.push_str(&format!(" {name}=\"{value}\""));
                }
                open.push('>');
                writeln!(f, "{prefix}{open}")?;
            }
        }

        let child_prefix = format!("{}└─ ", &prefix.replace("└─ ", "   "));
        for &child_id in node.children() {
            self.display_tree(child_id, &child_prefix, f)?;
        }
        Ok(())
    }
}

impl fmt::Display for DocumentImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.display_tree(NodeId::root(), "", f)
    }
}

/// Preorder (document order) iterator over the node ids of a tree
pub struct TreeIterator<'a> {
    document: &'a DocumentImpl,
    stack: Vec<NodeId>,
}

impl<'a> TreeIterator<'a> {
    #[must_use]
    pub fn new(document: &'a DocumentImpl, start: NodeId) -> Self {
        Self {
            document,
            stack: vec![start],
        }
    }
}

impl Iterator for TreeIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node_id = self.stack.pop()?;
        if let Some(node) = self.document.node_by_id(node_id) {
            for &child_id in node.children().iter().rev() {
                self.stack.push(child_id);
            }
        }
        Some(node_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::builder::DocumentBuilder;
    use crate::node::data::element::AttrMap;
    use crate::node::HTML_NAMESPACE;
    use umbra_shared::byte_stream::Location;

    fn element(name: &str) -> Node {
        Node::new_element(name, Some(HTML_NAMESPACE), AttrMap::new(), Location::default())
    }

    #[test]
    fn attach_detach() {
        let handle = DocumentBuilder::new_document(None);
        let mut doc = handle.get_mut();

        let html = doc.register_node_at(element("html"), NodeId::root(), None);
        let head = doc.register_node_at(element("head"), html, None);
        let body = doc.register_node_at(element("body"), html, None);

        assert_eq!(doc.node_by_id(html).unwrap().children(), &[head, body]);
        assert_eq!(doc.node_by_id(body).unwrap().parent_id(), Some(html));

        doc.detach_node(head);
        assert_eq!(doc.node_by_id(html).unwrap().children(), &[body]);
        assert_eq!(doc.node_by_id(head).unwrap().parent_id(), None);
    }

    #[test]
    fn attach_refuses_cycles() {
        let handle = DocumentBuilder::new_document(None);
        let mut doc = handle.get_mut();

        let outer = doc.register_node_at(element("div"), NodeId::root(), None);
        let inner = doc.register_node_at(element("span"), outer, None);

        // Attaching an ancestor under its own descendant must not happen
        doc.attach_node(outer, inner, None);
        assert_eq!(doc.node_by_id(outer).unwrap().parent_id(), Some(NodeId::root()));
        assert!(doc.node_by_id(inner).unwrap().children().is_empty());

        doc.attach_node(outer, outer, None);
        assert_eq!(doc.node_by_id(outer).unwrap().parent_id(), Some(NodeId::root()));
    }

    #[test]
    fn attach_never_leaves_two_parents() {
        let handle = DocumentBuilder::new_document(None);
        let mut doc = handle.get_mut();

        let first = doc.register_node_at(element("div"), NodeId::root(), None);
        let second = doc.register_node_at(element("div"), NodeId::root(), None);
        let child = doc.register_node_at(element("span"), first, None);

        // Attaching without an explicit detach moves the node
        doc.attach_node(child, second, None);
        assert!(doc.node_by_id(first).unwrap().children().is_empty());
        assert_eq!(doc.node_by_id(second).unwrap().children(), &[child]);
        assert_eq!(doc.node_by_id(child).unwrap().parent_id(), Some(second));
    }

    #[test]
    fn relocate_node() {
        let handle = DocumentBuilder::new_document(None);
        let mut doc = handle.get_mut();

        let html = doc.register_node_at(element("html"), NodeId::root(), None);
        let div1 = doc.register_node_at(element("div"), html, None);
        let div2 = doc.register_node_at(element("div"), html, None);
        let p = doc.register_node_at(element("p"), div1, None);

        doc.relocate_node(p, div2);
        assert!(doc.node_by_id(div1).unwrap().children().is_empty());
        assert_eq!(doc.node_by_id(div2).unwrap().children(), &[p]);
        assert_eq!(doc.node_by_id(p).unwrap().parent_id(), Some(div2));
    }

    #[test]
    fn attach_position_is_clamped() {
        let handle = DocumentBuilder::new_document(None);
        let mut doc = handle.get_mut();

        let parent = doc.register_node_at(element("ul"), NodeId::root(), None);
        let a = doc.register_node_at(element("li"), parent, None);
        let b = doc.register_node_at(element("li"), parent, Some(100));
        let c = doc.register_node_at(element("li"), parent, Some(0));

        assert_eq!(doc.node_by_id(parent).unwrap().children(), &[c, a, b]);
    }

    #[test]
    fn named_id_index() {
        let handle = DocumentBuilder::new_document(None);
        let mut doc = handle.get_mut();

        let node = Node::new_element(
            "div",
            Some(HTML_NAMESPACE),
            AttrMap::from([("id", "main")]),
            Location::default(),
        );
        let div = doc.register_node_at(node, NodeId::root(), None);
        assert_eq!(doc.get_node_by_named_id("main").unwrap().id(), div);

        // Second element with the same id does not replace the first
        let node = Node::new_element(
            "p",
            Some(HTML_NAMESPACE),
            AttrMap::from([("id", "main")]),
            Location::default(),
        );
        doc.register_node_at(node, NodeId::root(), None);
        assert_eq!(doc.get_node_by_named_id("main").unwrap().id(), div);

        // Invalid ids are not indexed
        let node = Node::new_element(
            "p",
            Some(HTML_NAMESPACE),
            AttrMap::from([("id", "has space")]),
            Location::default(),
        );
        doc.register_node_at(node, NodeId::root(), None);
        assert!(doc.get_node_by_named_id("has space").is_none());

        doc.detach_node(div);
        assert!(doc.get_node_by_named_id("main").is_none());
    }

    #[test]
    fn tree_iterator_order() {
        let handle = DocumentBuilder::new_document(None);
        let mut doc = handle.get_mut();

        let html = doc.register_node_at(element("html"), NodeId::root(), None);
        let head = doc.register_node_at(element("head"), html, None);
        let title = doc.register_node_at(element("title"), head, None);
        let body = doc.register_node_at(element("body"), html, None);

        let order: Vec<NodeId> = TreeIterator::new(&doc, NodeId::root()).collect();
        assert_eq!(order, vec![NodeId::root(), html, head, title, body]);
    }

    #[test]
    fn display_renders_tree() {
        let handle = DocumentBuilder::new_document(None);
        {
            let mut doc = handle.get_mut();
            let html = doc.register_node_at(element("html"), NodeId::root(), None);
            let body = doc.register_node_at(element("body"), html, None);
            let text = Node::new_text("hello", Location::default());
            doc.register_node_at(text, body, None);
        }

        let rendered = format!("{}", handle.get());
        assert_eq!(rendered, "Document\n└─ <html>\n   └─ <body>\n      └─ \"hello\"\n");
    }
}
