use derive_more::Display;

/// Identifier of a node inside a document arena. Id 0 always refers to the
/// document root node.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, PartialOrd, Ord, Display)]
pub struct NodeId(usize);

impl From<NodeId> for usize {
    fn from(value: NodeId) -> Self {
        value.0
    }
}

impl From<usize> for NodeId {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

impl From<NodeId> for u64 {
    fn from(value: NodeId) -> Self {
        value.0 as u64
    }
}

impl NodeId {
    pub const ROOT_NODE: usize = 0;

    #[must_use]
    pub fn root() -> Self {
        Self(Self::ROOT_NODE)
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0 == Self::ROOT_NODE
    }

    #[must_use]
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }

    #[must_use]
    pub fn prev(&self) -> Self {
        Self(self.0.saturating_sub(1))
    }

    #[must_use]
    pub fn as_usize(&self) -> usize {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_node() {
        assert!(NodeId::root().is_root());
        assert_eq!(NodeId::root().as_usize(), 0);
    }

    #[test]
    fn next_and_prev() {
        let id = NodeId::from(3_usize);
        assert_eq!(id.next(), NodeId::from(4_usize));
        assert_eq!(id.prev(), NodeId::from(2_usize));
        assert_eq!(NodeId::root().prev(), NodeId::root());
    }

    #[test]
    fn display() {
        assert_eq!(format!("{}", NodeId::from(42_usize)), "42");
    }
}
