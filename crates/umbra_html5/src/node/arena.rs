use crate::node::node_impl::Node;
use std::collections::HashMap;
use umbra_shared::node::NodeId;

/// The node arena is the single owner of every node in a document (or
/// fragment). All tree structure is expressed as ids into the arena.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeArena {
    /// Current nodes stored as <id, node>
    nodes: HashMap<NodeId, Node>,
    /// Next node id to hand out
    next_id: NodeId,
}

impl NodeArena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_ref(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    pub fn node(&self, node_id: NodeId) -> Option<Node> {
        self.nodes.get(&node_id).cloned()
    }

    pub fn delete_node(&mut self, node_id: NodeId) {
        self.nodes.remove(&node_id);
    }

    /// Replaces the stored node with the given one, keyed by its id
    pub fn update_node(&mut self, node: Node) {
        self.nodes.insert(node.id(), node);
    }

    /// Registers an unregistered node into the arena and returns its new id
    pub fn register_node(&mut self, mut node: Node) -> NodeId {
        assert!(!node.is_registered(), "node is already attached to an arena");

        let id = self.next_id;
        self.next_id = id.next();

        node.set_id(id);
        node.set_registered(true);

        self.nodes.insert(id, node);
        id
    }

    pub fn nodes(&self) -> &HashMap<NodeId, Node> {
        &self.nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::data::element::AttrMap;
    use crate::node::HTML_NAMESPACE;
    use umbra_shared::byte_stream::Location;

    fn element(name: &str) -> Node {
        Node::new_element(name, Some(HTML_NAMESPACE), AttrMap::new(), Location::default())
    }

    #[test]
    fn register_node() {
        let mut arena = NodeArena::new();
        let id = arena.register_node(element("test"));

        assert_eq!(arena.node_count(), 1);
        assert_eq!(id, NodeId::root());
        assert!(arena.node_ref(id).unwrap().is_registered());
    }

    #[test]
    #[should_panic(expected = "node is already attached to an arena")]
    fn register_node_twice() {
        let mut arena = NodeArena::new();
        let id = arena.register_node(element("test"));

        let registered = arena.node(id).unwrap();
        arena.register_node(registered);
    }

    #[test]
    fn ids_are_monotonic() {
        let mut arena = NodeArena::new();
        let a = arena.register_node(element("a"));
        let b = arena.register_node(element("b"));
        arena.delete_node(a);
        let c = arena.register_node(element("c"));

        assert_eq!(b, a.next());
        assert_eq!(c, b.next());
        assert!(arena.node_ref(a).is_none());
    }

    #[test]
    fn update_node() {
        let mut arena = NodeArena::new();
        let id = arena.register_node(element("div"));

        let mut node = arena.node(id).unwrap();
        node.get_element_data_mut().unwrap().add_attribute("id", "main");
        arena.update_node(node);

        assert_eq!(
            arena.node_ref(id).unwrap().get_element_data().unwrap().attributes().get("id"),
            Some("main")
        );
    }
}
