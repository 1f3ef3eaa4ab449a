//! Traversals: connected components and hop distances.

use super::{Graph, NodeId};
use crate::error::Result;
use std::collections::{HashMap, VecDeque};

impl Graph {
    /// Adjacency lists keyed by node, in edge order.
    pub(crate) fn adjacency(&self) -> HashMap<NodeId, Vec<NodeId>> {
        let mut adj: HashMap<NodeId, Vec<NodeId>> =
            self.nodes.keys().map(|id| (*id, Vec::new())).collect();
        for e in &self.edges {
            if let Some(list) = adj.get_mut(&e.a) {
                list.push(e.b);
            }
            if let Some(list) = adj.get_mut(&e.b) {
                list.push(e.a);
            }
        }
        adj
    }

    /// Splits the graph into maximal connected subgraphs.
    ///
    /// Uses a depth-first walk over the nodes' `visited` flags, which are
    /// cleared before the walk. Each component keeps the same node ids
    /// and the edges among its members.
    pub fn connected_components(&mut self) -> Vec<Graph> {
        for node in self.nodes.values_mut() {
            node.visited = false;
        }
        let adj = self.adjacency();
        let order: Vec<NodeId> = self.nodes.keys().copied().collect();
        let mut components = Vec::new();

        for start in order {
            if self.nodes.get(&start).map_or(true, |n| n.visited) {
                continue;
            }
            let mut members = Vec::new();
            let mut stack = vec![start];
            while let Some(id) = stack.pop() {
                let Some(node) = self.nodes.get_mut(&id) else { continue };
                if node.visited {
                    continue;
                }
                node.visited = true;
                members.push(id);
                if let Some(next) = adj.get(&id) {
                    stack.extend(next.iter().rev().copied());
                }
            }

            let mut component = Graph::new();
            for id in &members {
                if let Some(node) = self.nodes.get(id) {
                    component.add_node(node.clone());
                }
            }
            component.edges = self
                .edges
                .iter()
                .filter(|e| component.contains(e.a) && component.contains(e.b))
                .cloned()
                .collect();
            components.push(component);
        }
        components
    }

    /// Breadth-first hop count from `from` to every reachable node.
    pub fn hop_distances(&self, from: NodeId) -> Result<HashMap<NodeId, usize>> {
        self.require(from)?;
        Ok(bfs(&self.adjacency(), from))
    }

    /// Shortest hop count between `a` and `b`, or `None` if unreachable.
    pub fn path_length(&self, a: NodeId, b: NodeId) -> Result<Option<usize>> {
        self.require(b)?;
        Ok(self.hop_distances(a)?.get(&b).copied())
    }

    /// Shortest hop count between `a` and `b`.
    ///
    /// Returns 0 both for `a == b` and when no path exists; the correlation
    /// metric depends on that. Use [`Graph::path_length`] to tell the two
    /// apart.
    pub fn distance(&self, a: NodeId, b: NodeId) -> Result<usize> {
        Ok(self.path_length(a, b)?.unwrap_or(0))
    }
}

pub(crate) fn bfs(adj: &HashMap<NodeId, Vec<NodeId>>, from: NodeId) -> HashMap<NodeId, usize> {
    let mut dist = HashMap::new();
    dist.insert(from, 0);
    let mut queue = VecDeque::from([from]);
    while let Some(id) = queue.pop_front() {
        let d = dist[&id];
        for next in adj.get(&id).into_iter().flatten() {
            if !dist.contains_key(next) {
                dist.insert(*next, d + 1);
                queue.push_back(*next);
            }
        }
    }
    dist
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Unit;

    /// a - b - c   d - e   f
    fn forest() -> (Graph, Vec<NodeId>) {
        let mut g = Graph::new();
        let ids: Vec<NodeId> = (0..6).map(|i| g.insert(vec![i as f64], Unit::Plain)).collect();
        g.add_edge(ids[0], ids[1]).unwrap();
        g.add_edge(ids[1], ids[2]).unwrap();
        g.add_edge(ids[3], ids[4]).unwrap();
        (g, ids)
    }

    #[test]
    fn test_connected_components() {
        let (mut g, ids) = forest();
        let comps = g.connected_components();
        assert_eq!(comps.len(), 3);
        assert_eq!(comps[0].node_ids(), vec![ids[0], ids[1], ids[2]]);
        assert_eq!(comps[0].edge_count(), 2);
        assert_eq!(comps[1].node_count(), 2);
        assert_eq!(comps[1].edge_count(), 1);
        assert_eq!(comps[2].node_ids(), vec![ids[5]]);

        // A second call starts from cleared flags.
        assert_eq!(g.connected_components().len(), 3);
    }

    #[test]
    fn test_distance() {
        let (g, ids) = forest();
        assert_eq!(g.distance(ids[0], ids[2]).unwrap(), 2);
        assert_eq!(g.distance(ids[0], ids[0]).unwrap(), 0);
        // Unreachable collapses to zero.
        assert_eq!(g.distance(ids[0], ids[3]).unwrap(), 0);
        assert_eq!(g.path_length(ids[0], ids[3]).unwrap(), None);
        assert_eq!(g.path_length(ids[2], ids[0]).unwrap(), Some(2));
    }

    #[test]
    fn test_distance_unknown_node() {
        let (g, ids) = forest();
        assert!(g.distance(ids[0], NodeId(42)).is_err());
    }

    #[test]
    fn test_hop_distances_on_cycle() {
        let mut g = Graph::new();
        let ids: Vec<NodeId> = (0..5).map(|i| g.insert(vec![i as f64], Unit::Plain)).collect();
        for i in 0..5 {
            g.add_edge(ids[i], ids[(i + 1) % 5]).unwrap();
        }
        let d = g.hop_distances(ids[0]).unwrap();
        assert_eq!(d[&ids[1]], 1);
        assert_eq!(d[&ids[2]], 2);
        assert_eq!(d[&ids[3]], 2);
        assert_eq!(d[&ids[4]], 1);
    }
}
