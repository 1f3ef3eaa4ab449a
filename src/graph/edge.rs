//! Undirected edges.

use super::NodeId;
use serde::{Deserialize, Serialize};

/// An unordered connection between two nodes.
///
/// `age` is only advanced by GNG; every other network leaves it at zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// One endpoint.
    pub a: NodeId,
    /// The other endpoint.
    pub b: NodeId,
    /// Steps since the edge was last confirmed.
    pub age: u32,
    /// Presentation flag.
    pub selected: bool,
}

impl Edge {
    /// Creates an edge of age zero.
    pub fn new(a: NodeId, b: NodeId) -> Self {
        Self {
            a,
            b,
            age: 0,
            selected: false,
        }
    }

    /// True if this edge joins `x` and `y` in either direction.
    #[inline]
    pub fn joins(&self, x: NodeId, y: NodeId) -> bool {
        (self.a == x && self.b == y) || (self.a == y && self.b == x)
    }

    /// True if `id` is an endpoint.
    #[inline]
    pub fn touches(&self, id: NodeId) -> bool {
        self.a == id || self.b == id
    }

    /// The endpoint opposite `id`, or `None` if `id` is not an endpoint.
    #[inline]
    pub fn other(&self, id: NodeId) -> Option<NodeId> {
        if self.a == id {
            Some(self.b)
        } else if self.b == id {
            Some(self.a)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_is_unordered() {
        let e = Edge::new(NodeId(1), NodeId(2));
        assert!(e.joins(NodeId(2), NodeId(1)));
        assert!(!e.joins(NodeId(1), NodeId(3)));
        assert_eq!(e.other(NodeId(2)), Some(NodeId(1)));
        assert_eq!(e.other(NodeId(9)), None);
        assert_eq!(e.age, 0);
    }
}
