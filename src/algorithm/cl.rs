//! Winner-take-all competitive learning.

use super::{Adaptation, Initializer, StepContext};
use crate::config::{AlgorithmKind, ClConfig};
use crate::error::Result;
use crate::graph::{Graph, Unit};
use crate::metric::move_toward;
use crate::ranking::ErrorTable;

/// A fixed set of unconnected nodes where only the winner learns.
pub struct CompetitiveLearning {
    graph: Graph,
    learning_rate: f64,
    table: ErrorTable,
}

impl CompetitiveLearning {
    /// Creates `config.nodes` nodes from `init`.
    pub fn new(config: &ClConfig, init: &mut Initializer) -> Result<Self> {
        let mut graph = Graph::new();
        for position in init.positions(config.nodes)? {
            graph.insert(position, Unit::gas());
        }
        Ok(Self::from_graph(graph, config.learning_rate))
    }

    /// Trains an existing node set.
    pub fn from_graph(graph: Graph, learning_rate: f64) -> Self {
        Self {
            graph,
            learning_rate,
            table: ErrorTable::new(),
        }
    }
}

impl Adaptation for CompetitiveLearning {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::Cl
    }

    fn graph(&self) -> &Graph {
        &self.graph
    }

    fn adapt(&mut self, input: &[f64], ctx: &StepContext) -> Result<()> {
        self.table.build(self.graph.nodes(), input, ctx.metric)?;
        let winner = self.table.first()?;
        let node = self.graph.node_mut(winner.node)?;
        if let Some(error) = node.error_mut() {
            *error += winner.distance * winner.distance;
        }
        move_toward(&mut node.position, input, self.learning_rate);
        Ok(())
    }
}
