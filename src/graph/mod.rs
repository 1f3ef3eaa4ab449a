//! Undirected topology of reference vectors.
//!
//! [`Graph`] is the structure every network trains: an ordered node set plus
//! an edge list. It is intentionally simple (most queries scan the edge
//! list) since networks rarely exceed a few hundred nodes.
//!
//! [`SimplexGraph`] wraps a graph with a set of triangles for Growing Cell
//! Structures and keeps the edge set equal to the union of triangle edges.

mod edge;
mod node;
pub(crate) mod search;
mod simplex;

pub use edge::Edge;
pub use node::{Node, NodeId, Unit};
pub use simplex::{Simplex, SimplexGraph};

use crate::error::{Result, TopogasError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A set of nodes and the edges between them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Graph {
    nodes: BTreeMap<NodeId, Node>,
    edges: Vec<Edge>,
    next_id: u64,
    revision: u64,
}

impl Graph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new node at `position` and returns its id.
    ///
    /// The node is labelled with its ordinal: "0", "1", ... in insertion
    /// order, never reused.
    pub fn insert(&mut self, position: Vec<f64>, unit: Unit) -> NodeId {
        let id = NodeId(self.next_id);
        let mut node = Node::new(id, position, unit);
        node.label = id.0.to_string();
        self.add_node(node);
        id
    }

    /// Adds a prepared node, keeping its id.
    ///
    /// A node with the same id replaces the previous one.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        self.next_id = self.next_id.max(id.0 + 1);
        self.nodes.insert(id, node);
        self.touch();
        id
    }

    /// Removes a node together with every edge that touches it.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node> {
        let node = self.nodes.remove(&id).ok_or_else(|| missing_node(id))?;
        self.edges.retain(|e| !e.touches(id));
        self.touch();
        Ok(node)
    }

    /// Adds an edge between two existing nodes.
    ///
    /// Duplicates are not rejected here; callers that need a simple graph
    /// check [`Graph::are_connected`] first.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId) -> Result<()> {
        self.require(a)?;
        self.require(b)?;
        self.edges.push(Edge::new(a, b));
        self.touch();
        Ok(())
    }

    /// Removes one edge joining `a` and `b`.
    pub fn remove_edge(&mut self, a: NodeId, b: NodeId) -> Result<Edge> {
        let pos = self
            .edges
            .iter()
            .position(|e| e.joins(a, b))
            .ok_or_else(|| TopogasError::NotFound(format!("edge {}-{}", a, b)))?;
        let edge = self.edges.swap_remove(pos);
        self.touch();
        Ok(edge)
    }

    /// Drops every edge for which `keep` returns false. Returns how many went.
    pub fn retain_edges<F: FnMut(&Edge) -> bool>(&mut self, keep: F) -> usize {
        let before = self.edges.len();
        self.edges.retain(keep);
        let removed = before - self.edges.len();
        if removed > 0 {
            self.touch();
        }
        removed
    }

    /// Removes every node without incident edges and returns their ids.
    pub fn remove_isolated(&mut self) -> Vec<NodeId> {
        let isolated: Vec<NodeId> = self
            .nodes
            .keys()
            .copied()
            .filter(|id| !self.edges.iter().any(|e| e.touches(*id)))
            .collect();
        for id in &isolated {
            self.nodes.remove(id);
        }
        if !isolated.is_empty() {
            self.touch();
        }
        isolated
    }

    /// Looks up a node.
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(&id).ok_or_else(|| missing_node(id))
    }

    /// Looks up a node for mutation.
    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(&id).ok_or_else(|| missing_node(id))
    }

    /// True if the node is a member.
    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Mutable nodes in insertion order.
    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }

    /// Node ids in insertion order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().collect()
    }

    /// All edges.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of nodes.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// True if there are no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes joined to `id` by an edge, in edge order.
    pub fn neighbors(&self, id: NodeId) -> Result<Vec<NodeId>> {
        self.require(id)?;
        Ok(self.edges.iter().filter_map(|e| e.other(id)).collect())
    }

    /// Edges that touch `id`.
    pub fn incident_edges(&self, id: NodeId) -> Result<Vec<&Edge>> {
        self.require(id)?;
        Ok(self.edges.iter().filter(|e| e.touches(id)).collect())
    }

    /// Mutable access to the edges that touch `id`.
    pub fn incident_edges_mut(&mut self, id: NodeId) -> Result<impl Iterator<Item = &mut Edge>> {
        self.require(id)?;
        Ok(self.edges.iter_mut().filter(move |e| e.touches(id)))
    }

    /// Number of incident edges.
    pub fn degree(&self, id: NodeId) -> Result<usize> {
        self.require(id)?;
        Ok(self.edges.iter().filter(|e| e.touches(id)).count())
    }

    /// The edge joining `a` and `b`, if any.
    ///
    /// Fails with `AmbiguousConnection` when more than one edge joins the
    /// pair, which means an invariant was broken upstream.
    pub fn connection(&self, a: NodeId, b: NodeId) -> Result<Option<&Edge>> {
        let mut found = self.edges.iter().filter(|e| e.joins(a, b));
        let first = found.next();
        if found.next().is_some() {
            return Err(TopogasError::AmbiguousConnection(a.0, b.0));
        }
        Ok(first)
    }

    /// Mutable variant of [`Graph::connection`].
    pub fn connection_mut(&mut self, a: NodeId, b: NodeId) -> Result<Option<&mut Edge>> {
        if self.edges.iter().filter(|e| e.joins(a, b)).count() > 1 {
            return Err(TopogasError::AmbiguousConnection(a.0, b.0));
        }
        Ok(self.edges.iter_mut().find(|e| e.joins(a, b)))
    }

    /// True if at least one edge joins `a` and `b`.
    pub fn are_connected(&self, a: NodeId, b: NodeId) -> bool {
        self.edges.iter().any(|e| e.joins(a, b))
    }

    /// A copy of the node set with no edges.
    pub fn without_edges(&self) -> Graph {
        Graph {
            nodes: self.nodes.clone(),
            edges: Vec::new(),
            next_id: self.next_id,
            revision: 0,
        }
    }

    /// Structural revision, bumped on every node or edge insertion/removal.
    ///
    /// Observers poll this to decide whether to redraw; it carries no other
    /// guarantee.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[inline]
    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    fn require(&self, id: NodeId) -> Result<()> {
        if self.nodes.contains_key(&id) {
            Ok(())
        } else {
            Err(missing_node(id))
        }
    }
}

fn missing_node(id: NodeId) -> TopogasError {
    TopogasError::NotFound(format!("node {}", id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> (Graph, [NodeId; 3]) {
        let mut g = Graph::new();
        let a = g.insert(vec![0.0, 0.0], Unit::Plain);
        let b = g.insert(vec![1.0, 0.0], Unit::Plain);
        let c = g.insert(vec![0.0, 1.0], Unit::Plain);
        g.add_edge(a, b).unwrap();
        g.add_edge(b, c).unwrap();
        g.add_edge(c, a).unwrap();
        (g, [a, b, c])
    }

    #[test]
    fn test_add_edge_connects() {
        let (g, [a, b, c]) = triangle();
        assert!(g.are_connected(a, b));
        assert!(g.are_connected(b, a));
        assert!(g.neighbors(a).unwrap().contains(&b));
        assert_eq!(g.degree(c).unwrap(), 2);
        assert_eq!(g.incident_edges(b).unwrap().len(), 2);
    }

    #[test]
    fn test_add_edge_requires_members() {
        let (mut g, [a, _, _]) = triangle();
        assert!(matches!(g.add_edge(a, NodeId(99)), Err(TopogasError::NotFound(_))));
    }

    #[test]
    fn test_remove_node_drops_incident_edges() {
        let (mut g, [a, b, c]) = triangle();
        g.remove_node(a).unwrap();
        assert_eq!(g.node_count(), 2);
        assert!(g.edges().iter().all(|e| !e.touches(a)));
        assert!(g.are_connected(b, c));
        assert!(matches!(g.remove_node(a), Err(TopogasError::NotFound(_))));
    }

    #[test]
    fn test_remove_edge() {
        let (mut g, [a, b, _]) = triangle();
        g.remove_edge(b, a).unwrap();
        assert!(!g.are_connected(a, b));
        assert!(g.remove_edge(a, b).is_err());
    }

    #[test]
    fn test_connection_ambiguity() {
        let (mut g, [a, b, c]) = triangle();
        assert!(g.connection(a, b).unwrap().is_some());
        g.add_edge(a, b).unwrap();
        assert!(matches!(
            g.connection(a, b),
            Err(TopogasError::AmbiguousConnection(_, _))
        ));
        g.remove_edge(b, c).unwrap();
        assert!(g.connection(b, c).unwrap().is_none());
    }

    #[test]
    fn test_remove_isolated() {
        let (mut g, [a, b, _]) = triangle();
        let lonely = g.insert(vec![5.0, 5.0], Unit::Plain);
        let removed = g.remove_isolated();
        assert_eq!(removed, vec![lonely]);
        assert!(g.contains(a) && g.contains(b));
    }

    #[test]
    fn test_revision_tracks_structure() {
        let (mut g, [a, _, _]) = triangle();
        let before = g.revision();
        g.node_mut(a).unwrap().position[0] = 3.0;
        assert_eq!(g.revision(), before);
        g.insert(vec![1.0, 1.0], Unit::Plain);
        assert!(g.revision() > before);
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut g = Graph::new();
        let a = g.insert(vec![0.0], Unit::Plain);
        g.remove_node(a).unwrap();
        let b = g.insert(vec![0.0], Unit::Plain);
        assert_ne!(a, b);
    }

    #[test]
    fn test_insert_labels_by_ordinal() {
        let mut g = Graph::new();
        let a = g.insert(vec![0.0], Unit::Plain);
        let b = g.insert(vec![1.0], Unit::Plain);
        g.remove_node(a).unwrap();
        let c = g.insert(vec![2.0], Unit::Plain);
        assert_eq!(g.node(b).unwrap().label, "1");
        assert_eq!(g.node(c).unwrap().label, "2");
    }
}
