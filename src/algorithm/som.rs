//! Self-Organising Map on a rectangular lattice.

use super::{Adaptation, Initializer, Schedule, StepContext};
use crate::config::{AlgorithmKind, SomConfig};
use crate::error::{Result, TopogasError};
use crate::graph::{Graph, Node, NodeId, Unit};
use crate::metric::move_toward;
use crate::ranking::ErrorTable;

/// A `rows × columns` grid of cells joined to their four lattice neighbours.
pub struct SelfOrganisingMap {
    graph: Graph,
    rows: usize,
    columns: usize,
    schedule: Schedule,
    table: ErrorTable,
}

impl SelfOrganisingMap {
    /// Builds the lattice; `total_steps` is the length of the run the
    /// schedule decays over.
    pub fn new(config: &SomConfig, total_steps: u64, init: &mut Initializer) -> Result<Self> {
        let (rows, columns) = (config.rows, config.columns);
        let count = config.node_count()?;
        let mut positions = init.positions(count)?.into_iter();
        let mut graph = Graph::new();
        let mut ids: Vec<NodeId> = Vec::with_capacity(count);

        for row in 0..rows {
            for col in 0..columns {
                let position = positions
                    .next()
                    .ok_or_else(|| TopogasError::Empty("ran out of lattice positions".into()))?;
                ids.push(graph.insert(position, Unit::Lattice { row, col }));
            }
        }
        for row in 0..rows {
            for col in 0..columns {
                let here = ids[row * columns + col];
                if col + 1 < columns {
                    graph.add_edge(here, ids[row * columns + col + 1])?;
                }
                if row + 1 < rows {
                    graph.add_edge(here, ids[(row + 1) * columns + col])?;
                }
            }
        }

        Ok(Self {
            graph,
            rows,
            columns,
            schedule: Schedule::new(&config.schedule, total_steps),
            table: ErrorTable::new(),
        })
    }

    /// Lattice shape as `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.columns)
    }

    /// The decay schedule.
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }
}

/// Manhattan distance between two cells on the lattice.
fn lattice_distance(a: (usize, usize), b: (usize, usize)) -> usize {
    a.0.abs_diff(b.0) + a.1.abs_diff(b.1)
}

fn grid_of(node: &Node) -> Result<(usize, usize)> {
    node.grid()
        .ok_or_else(|| TopogasError::NotFound(format!("lattice coordinate of {}", node.id)))
}

impl Adaptation for SelfOrganisingMap {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::Som
    }

    fn graph(&self) -> &Graph {
        &self.graph
    }

    fn adapt(&mut self, input: &[f64], ctx: &StepContext) -> Result<()> {
        self.table.build(self.graph.nodes(), input, ctx.metric)?;
        let bmu = grid_of(self.graph.node(self.table.first()?.node)?)?;
        let lambda = self.schedule.neighbourhood(ctx.iteration);
        let epsilon = self.schedule.learning_rate(ctx.iteration);
        let width = 2.0 * lambda * lambda;

        for node in self.graph.nodes_mut() {
            let d = lattice_distance(grid_of(node)?, bmu) as f64;
            let h = (-(d * d) / width).exp();
            move_toward(&mut node.position, input, epsilon * h);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScheduleConfig;
    use crate::metric::Metric;

    fn flat_schedule() -> ScheduleConfig {
        ScheduleConfig {
            neighbourhood_initial: 1.0,
            neighbourhood_final: 1.0,
            learning_initial: 0.5,
            learning_final: 0.5,
        }
    }

    #[test]
    fn test_lattice_edges() {
        let config = SomConfig {
            rows: 3,
            columns: 4,
            schedule: flat_schedule(),
        };
        let som = SelfOrganisingMap::new(&config, 10, &mut Initializer::diagonal(2)).unwrap();
        assert_eq!(som.graph().node_count(), 12);
        // 3 rows × 3 horizontal + 2 × 4 vertical.
        assert_eq!(som.graph().edge_count(), 17);
        let corner = som.graph().node_ids()[0];
        assert_eq!(som.graph().degree(corner).unwrap(), 2);
        let inner = som.graph().node_ids()[5];
        assert_eq!(som.graph().degree(inner).unwrap(), 4);
    }

    #[test]
    fn test_neighbourhood_weighting() {
        let config = SomConfig {
            rows: 1,
            columns: 3,
            schedule: flat_schedule(),
        };
        let mut init = Initializer::explicit(1, vec![vec![0.0], vec![1.0], vec![2.0]]);
        let mut som = SelfOrganisingMap::new(&config, 10, &mut init).unwrap();
        let ctx = StepContext {
            iteration: 1,
            metric: Metric::default(),
        };
        som.adapt(&[0.0], &ctx).unwrap();
        let p: Vec<f64> = som.graph().nodes().map(|n| n.position[0]).collect();
        assert!((p[0] - 0.0).abs() < 1e-10);
        assert!((p[1] - (1.0 - 0.5 * (-0.5f64).exp())).abs() < 1e-10);
        assert!((p[2] - (2.0 - 2.0 * 0.5 * (-2.0f64).exp())).abs() < 1e-10);
    }

    #[test]
    fn test_lattice_distance() {
        assert_eq!(lattice_distance((0, 0), (2, 3)), 5);
        assert_eq!(lattice_distance((4, 1), (1, 1)), 3);
    }

    #[test]
    fn test_oversized_lattice_rejected() {
        let config = SomConfig {
            rows: usize::MAX,
            columns: 3,
            schedule: flat_schedule(),
        };
        let mut init = Initializer::random(1, Some(1));
        assert!(matches!(
            SelfOrganisingMap::new(&config, 10, &mut init),
            Err(TopogasError::InvalidParameter(_))
        ));
    }
}
