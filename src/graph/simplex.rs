//! Triangle bookkeeping for Growing Cell Structures.

use super::{Graph, Node, NodeId, Unit};
use crate::error::{Result, TopogasError};
use log::debug;
use serde::{Deserialize, Serialize};

/// A 2-simplex: three mutually connected nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Simplex([NodeId; 3]);

impl Simplex {
    /// Creates a simplex over three nodes.
    pub fn new(a: NodeId, b: NodeId, c: NodeId) -> Self {
        Self([a, b, c])
    }

    /// The corners.
    #[inline]
    pub fn vertices(&self) -> [NodeId; 3] {
        self.0
    }

    /// True if `id` is a corner.
    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.0.contains(&id)
    }

    /// True if both `a` and `b` are corners.
    #[inline]
    pub fn has_edge(&self, a: NodeId, b: NodeId) -> bool {
        a != b && self.contains(a) && self.contains(b)
    }

    /// The three sides.
    pub fn sides(&self) -> [(NodeId, NodeId); 3] {
        let [a, b, c] = self.0;
        [(a, b), (b, c), (c, a)]
    }

    /// True if both simplices have the same corners in any order.
    pub fn same_corners(&self, other: &Simplex) -> bool {
        other.0.iter().all(|v| self.contains(*v))
    }
}

/// A graph whose edges are exactly the sides of a set of triangles.
///
/// Topology only changes through [`SimplexGraph::add_simplex`] and
/// [`SimplexGraph::remove_simplex`], which keep the invariant that an edge
/// (or a node) exists iff some live simplex uses it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimplexGraph {
    graph: Graph,
    simplices: Vec<Simplex>,
}

impl SimplexGraph {
    /// Creates an empty structure.
    pub fn new() -> Self {
        Self::default()
    }

    /// The underlying graph.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Live simplices.
    pub fn simplices(&self) -> &[Simplex] {
        &self.simplices
    }

    /// Inserts a node. It becomes part of the topology once a simplex uses it.
    pub fn insert_node(&mut self, position: Vec<f64>, unit: Unit) -> NodeId {
        self.graph.insert(position, unit)
    }

    /// Mutable node access. Positions and units may change freely.
    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.graph.node_mut(id)
    }

    /// Mutable iteration over all nodes.
    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.graph.nodes_mut()
    }

    /// Adds a triangle over existing nodes, creating any missing sides.
    pub fn add_simplex(&mut self, a: NodeId, b: NodeId, c: NodeId) -> Result<()> {
        if a == b || b == c || a == c {
            return Err(TopogasError::invalid(format!(
                "degenerate simplex {} {} {}",
                a, b, c
            )));
        }
        for id in [a, b, c] {
            self.graph.node(id)?;
        }
        let simplex = Simplex::new(a, b, c);
        for (x, y) in simplex.sides() {
            if !self.graph.are_connected(x, y) {
                self.graph.add_edge(x, y)?;
            }
        }
        self.simplices.push(simplex);
        Ok(())
    }

    /// Removes the simplex at `index` plus every side and corner no other
    /// simplex uses.
    ///
    /// The last remaining simplex is never removed; `Ok(false)` is returned
    /// instead.
    pub fn remove_simplex(&mut self, index: usize) -> Result<bool> {
        if index >= self.simplices.len() {
            return Err(TopogasError::NotFound(format!("simplex {}", index)));
        }
        if self.simplices.len() == 1 {
            debug!("refusing to remove the only simplex");
            return Ok(false);
        }
        let removed = self.simplices.swap_remove(index);

        for (x, y) in removed.sides() {
            if !self.simplices.iter().any(|s| s.has_edge(x, y)) {
                self.graph.remove_edge(x, y)?;
            }
        }
        for v in removed.vertices() {
            if !self.simplices.iter().any(|s| s.contains(v)) {
                self.graph.remove_node(v)?;
            }
        }
        Ok(true)
    }

    /// Removes the simplex with the given corners, if present.
    pub fn remove_simplex_with(&mut self, a: NodeId, b: NodeId, c: NodeId) -> Result<bool> {
        let wanted = Simplex::new(a, b, c);
        match self.simplices.iter().position(|s| s.same_corners(&wanted)) {
            Some(index) => self.remove_simplex(index),
            None => Ok(false),
        }
    }

    /// Removes every simplex that has `id` as a corner, stopping early if
    /// the last simplex would go. Returns how many were removed.
    pub fn remove_simplices_containing(&mut self, id: NodeId) -> Result<usize> {
        let mut removed = 0;
        while let Some(index) = self.simplices.iter().position(|s| s.contains(id)) {
            if !self.remove_simplex(index)? {
                break;
            }
            removed += 1;
        }
        Ok(removed)
    }

    /// True if every edge is a side of a live simplex, every simplex side
    /// is exactly one edge, and every node is a corner of some simplex.
    pub fn is_consistent(&self) -> bool {
        let edges_covered = self
            .graph
            .edges()
            .iter()
            .all(|e| self.simplices.iter().any(|s| s.has_edge(e.a, e.b)));
        let sides_present = self.simplices.iter().all(|s| {
            s.sides()
                .iter()
                .all(|(x, y)| matches!(self.graph.connection(*x, *y), Ok(Some(_))))
        });
        let nodes_used = self
            .graph
            .nodes()
            .all(|n| self.simplices.iter().any(|s| s.contains(n.id)));
        edges_covered && sides_present && nodes_used
    }
}
