//! Growing Neural Gas.
//!
//! Starts from two connected nodes. Every step the winner accumulates
//! error, edges around it age, and the winner/runner-up edge is refreshed.
//! Stale edges and the nodes they strand are removed, and every
//! `insertion_period` steps a node is inserted between the node with the
//! largest error and its worst neighbour.

use super::{Adaptation, Initializer, StepContext};
use crate::config::{AlgorithmKind, GngConfig};
use crate::error::{Result, TopogasError};
use crate::graph::{Graph, NodeId, Unit};
use crate::metric::{midpoint, move_toward};
use crate::ranking::ErrorTable;
use log::debug;

/// Growing Neural Gas network.
pub struct GrowingNeuralGas {
    graph: Graph,
    config: GngConfig,
    table: ErrorTable,
}

impl GrowingNeuralGas {
    /// Creates the two initial nodes and joins them.
    pub fn new(config: &GngConfig, init: &mut Initializer) -> Result<Self> {
        let mut graph = Graph::new();
        let ids: Vec<NodeId> = init
            .positions(2)?
            .into_iter()
            .map(|p| graph.insert(p, Unit::gas()))
            .collect();
        graph.add_edge(ids[0], ids[1])?;
        Ok(Self {
            graph,
            config: config.clone(),
            table: ErrorTable::new(),
        })
    }

    fn error(&self, id: NodeId) -> Result<f64> {
        Ok(self.graph.node(id)?.error().unwrap_or(0.0))
    }

    fn set_error(&mut self, id: NodeId, value: f64) -> Result<()> {
        if let Some(error) = self.graph.node_mut(id)?.error_mut() {
            *error = value;
        }
        Ok(())
    }

    /// Removes edges older than the limit and any node left without edges.
    /// Skipped while only two nodes remain.
    fn prune(&mut self) {
        if self.graph.node_count() <= 2 {
            return;
        }
        let max_age = self.config.max_edge_age;
        let edges = self.graph.retain_edges(|e| e.age <= max_age);
        let nodes = self.graph.remove_isolated();
        if edges > 0 || !nodes.is_empty() {
            debug!("GNG pruned {} edges and {} nodes", edges, nodes.len());
        }
    }

    /// Inserts a node halfway between the largest-error node and its
    /// largest-error neighbour.
    fn insert(&mut self) -> Result<()> {
        let mut q: Option<(NodeId, f64)> = None;
        for node in self.graph.nodes() {
            let e = node.error().unwrap_or(0.0);
            if q.map_or(true, |(_, best)| e > best) {
                q = Some((node.id, e));
            }
        }
        let (q, q_error) = q.ok_or_else(|| TopogasError::Empty("no node to grow from".into()))?;

        let mut f: Option<(NodeId, f64)> = None;
        for id in self.graph.neighbors(q)? {
            let e = self.error(id)?;
            if f.map_or(true, |(_, best)| e > best) {
                f = Some((id, e));
            }
        }
        let (f, f_error) =
            f.ok_or_else(|| TopogasError::Empty(format!("largest-error node {} has no neighbour", q)))?;

        let position = midpoint(&self.graph.node(q)?.position, &self.graph.node(f)?.position)?;
        let r = self.graph.insert(position, Unit::gas());
        self.graph.add_edge(q, r)?;
        self.graph.add_edge(r, f)?;
        self.graph.remove_edge(q, f)?;

        let alpha = self.config.alpha;
        self.set_error(q, q_error - alpha * q_error)?;
        self.set_error(f, f_error - alpha * f_error)?;
        self.set_error(r, (q_error + f_error) / 2.0)?;
        debug!(
            "GNG inserted {} between {} and {} ({} nodes)",
            r,
            q,
            f,
            self.graph.node_count()
        );
        Ok(())
    }
}

impl Adaptation for GrowingNeuralGas {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::Gng
    }

    fn graph(&self) -> &Graph {
        &self.graph
    }

    fn adapt(&mut self, input: &[f64], ctx: &StepContext) -> Result<()> {
        self.table.build(self.graph.nodes(), input, ctx.metric)?;
        let s1 = self.table.first()?;
        let s2 = self.table.second()?;

        let winner = self.graph.node_mut(s1.node)?;
        if let Some(error) = winner.error_mut() {
            *error += s1.distance * s1.distance;
        }
        move_toward(&mut winner.position, input, self.config.winner_rate);

        for edge in self.graph.incident_edges_mut(s1.node)? {
            edge.age += 1;
        }
        for id in self.graph.neighbors(s1.node)? {
            let node = self.graph.node_mut(id)?;
            move_toward(&mut node.position, input, self.config.neighbour_rate);
        }

        match self.graph.connection_mut(s1.node, s2.node)? {
            Some(edge) => edge.age = 0,
            None => self.graph.add_edge(s1.node, s2.node)?,
        }

        self.prune();

        if self.graph.node_count() < self.config.max_nodes
            && ctx.iteration % self.config.insertion_period == 0
        {
            self.insert()?;
        }

        let beta = self.config.beta;
        for node in self.graph.nodes_mut() {
            if let Some(error) = node.error_mut() {
                *error *= beta;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::Metric;
    use std::collections::HashSet;

    fn gng(positions: Vec<Vec<f64>>, config: GngConfig) -> GrowingNeuralGas {
        let dim = positions[0].len();
        let mut init = Initializer::explicit(dim, positions);
        GrowingNeuralGas::new(&config, &mut init).unwrap()
    }

    fn ctx(iteration: u64) -> StepContext {
        StepContext {
            iteration,
            metric: Metric::default(),
        }
    }

    fn assert_simple(graph: &Graph) {
        let mut pairs = HashSet::new();
        for e in graph.edges() {
            let key = if e.a < e.b { (e.a, e.b) } else { (e.b, e.a) };
            assert!(pairs.insert(key), "duplicate edge {:?}", key);
        }
    }

    #[test]
    fn test_starts_with_one_edge() {
        let net = gng(vec![vec![0.0], vec![1.0]], GngConfig::default());
        assert_eq!(net.graph().node_count(), 2);
        assert_eq!(net.graph().edge_count(), 1);
    }

    #[test]
    fn test_winner_and_neighbour_move() {
        let config = GngConfig {
            winner_rate: 0.5,
            neighbour_rate: 0.1,
            beta: 1.0,
            ..GngConfig::default()
        };
        let mut net = gng(vec![vec![0.0], vec![1.0]], config);
        net.adapt(&[0.2], &ctx(1)).unwrap();
        let nodes: Vec<_> = net.graph().nodes().collect();
        assert!((nodes[0].position[0] - 0.1).abs() < 1e-10);
        assert!((nodes[1].position[0] - 0.92).abs() < 1e-10);
        // Winner error grows by the square of the table distance 0.04.
        assert!((nodes[0].error().unwrap() - 0.0016).abs() < 1e-12);
        // The refreshed winner/runner-up edge has age zero.
        assert_eq!(net.graph().edges()[0].age, 0);
    }

    #[test]
    fn test_winner_error_is_squared_distance() {
        let config = GngConfig {
            beta: 1.0,
            ..GngConfig::default()
        };
        let mut net = gng(vec![vec![0.0], vec![10.0]], config.clone());
        // Table distance is 4 under power 2.
        net.adapt(&[2.0], &ctx(1)).unwrap();
        let winner = net.graph().nodes().next().unwrap();
        assert!((winner.error().unwrap() - 16.0).abs() < 1e-10);

        let mut net = gng(vec![vec![0.0], vec![10.0]], config);
        let manhattan = StepContext {
            iteration: 1,
            metric: Metric::new(1.0).unwrap(),
        };
        net.adapt(&[2.0], &manhattan).unwrap();
        let winner = net.graph().nodes().next().unwrap();
        assert!((winner.error().unwrap() - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_insertion_needs_a_neighbour() {
        let mut net = gng(vec![vec![0.0], vec![1.0]], GngConfig::default());
        let lonely = net.graph.insert(vec![5.0], Unit::gas());
        net.set_error(lonely, 10.0).unwrap();
        assert!(matches!(net.insert(), Err(TopogasError::Empty(_))));
        assert_eq!(net.graph().node_count(), 3);
    }

    #[test]
    fn test_grows_on_insertion_period() {
        let config = GngConfig {
            insertion_period: 2,
            ..GngConfig::default()
        };
        let mut net = gng(vec![vec![0.0, 0.0], vec![3.0, 0.0]], config);
        net.adapt(&[1.0, 0.0], &ctx(1)).unwrap();
        assert_eq!(net.graph().node_count(), 2);
        net.adapt(&[2.0, 0.0], &ctx(2)).unwrap();
        assert_eq!(net.graph().node_count(), 3);
        assert_eq!(net.graph().edge_count(), 2);
        assert_simple(net.graph());
    }

    #[test]
    fn test_respects_max_nodes() {
        let config = GngConfig {
            max_nodes: 3,
            insertion_period: 1,
            ..GngConfig::default()
        };
        let mut net = gng(vec![vec![0.0], vec![1.0]], config);
        for i in 1..=50 {
            net.adapt(&[(i % 7) as f64 / 7.0], &ctx(i)).unwrap();
            assert!(net.graph().node_count() <= 3);
            assert_simple(net.graph());
        }
        assert_eq!(net.graph().node_count(), 3);
    }

    #[test]
    fn test_old_edges_are_removed() {
        let config = GngConfig {
            max_edge_age: 2,
            ..GngConfig::default()
        };
        let mut net = gng(vec![vec![0.0], vec![1.0]], config);
        let ids = net.graph.node_ids();
        let far = net.graph.insert(vec![10.0], Unit::gas());
        net.graph.add_edge(ids[0], far).unwrap();

        // The winner's edge to `far` ages every step and is never refreshed.
        for i in 1..=2 {
            net.adapt(&[0.0], &ctx(i)).unwrap();
            assert!(net.graph().contains(far));
        }
        net.adapt(&[0.0], &ctx(3)).unwrap();
        assert!(!net.graph().contains(far));
        assert_eq!(net.graph().edge_count(), 1);
        assert!(net.graph().edges().iter().all(|e| e.age <= 2));
    }

    #[test]
    fn test_insertion_error_bookkeeping() {
        let config = GngConfig {
            insertion_period: 1,
            alpha: 0.5,
            beta: 1.0,
            ..GngConfig::default()
        };
        let mut net = gng(vec![vec![0.0], vec![4.0]], config);
        // Winner is node 0 at table distance 1; its only neighbour is node 1.
        net.adapt(&[1.0], &ctx(1)).unwrap();
        let errors: Vec<f64> = net.graph().nodes().map(|n| n.error().unwrap()).collect();
        assert_eq!(errors.len(), 3);
        assert!((errors[0] - 0.5).abs() < 1e-10);
        assert!((errors[1] - 0.0).abs() < 1e-10);
        assert!((errors[2] - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_single_node_is_fatal() {
        let mut net = gng(vec![vec![0.0], vec![1.0]], GngConfig::default());
        let ids = net.graph.node_ids();
        net.graph.remove_node(ids[1]).unwrap();
        assert!(matches!(net.adapt(&[0.0], &ctx(1)), Err(TopogasError::Empty(_))));
    }
}
