//! Neural Gas: every node learns, weighted by its distance rank.

use super::{Adaptation, Initializer, Schedule, StepContext};
use crate::config::{AlgorithmKind, NgConfig};
use crate::error::Result;
use crate::graph::{Graph, Unit};
use crate::metric::move_toward;
use crate::ranking::ErrorTable;

/// Neural Gas network with a fixed node count and no edges.
pub struct NeuralGas {
    graph: Graph,
    schedule: Schedule,
    table: ErrorTable,
}

impl NeuralGas {
    /// Creates `config.nodes` nodes; `total_steps` is the length of the run
    /// the schedule decays over.
    pub fn new(config: &NgConfig, total_steps: u64, init: &mut Initializer) -> Result<Self> {
        let mut graph = Graph::new();
        for position in init.positions(config.nodes)? {
            graph.insert(position, Unit::gas());
        }
        Ok(Self {
            graph,
            schedule: Schedule::new(&config.schedule, total_steps),
            table: ErrorTable::new(),
        })
    }

    /// The decay schedule.
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }
}

impl Adaptation for NeuralGas {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::Ng
    }

    fn graph(&self) -> &Graph {
        &self.graph
    }

    fn adapt(&mut self, input: &[f64], ctx: &StepContext) -> Result<()> {
        self.table.build(self.graph.nodes(), input, ctx.metric)?;
        let winner = self.table.first()?;
        let lambda = self.schedule.neighbourhood(ctx.iteration);
        let epsilon = self.schedule.learning_rate(ctx.iteration);

        for (rank, entry) in self.table.entries().iter().enumerate() {
            let node = self.graph.node_mut(entry.node)?;
            if entry.node == winner.node {
                if let Some(error) = node.error_mut() {
                    *error += entry.distance * entry.distance;
                }
            }
            let rate = epsilon * (-(rank as f64) / lambda).exp();
            move_toward(&mut node.position, input, rate);
        }
        Ok(())
    }
}
