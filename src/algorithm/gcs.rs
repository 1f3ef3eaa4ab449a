//! Growing Cell Structures.
//!
//! The topology is a set of triangles. Growth splits the side between the
//! most frequently winning cell and its farthest neighbour; pruning drops
//! every triangle around the cell whose neighbours are farthest away on
//! average.

use super::{Adaptation, Initializer, StepContext};
use crate::config::{AlgorithmKind, GcsConfig};
use crate::error::{Result, TopogasError};
use crate::graph::{Graph, NodeId, SimplexGraph, Unit};
use crate::metric::{midpoint, move_toward, Metric};
use log::debug;

/// Growing Cell Structures network.
pub struct GrowingCellStructures {
    cells: SimplexGraph,
    config: GcsConfig,
}

impl GrowingCellStructures {
    /// Creates one triangle from three initial positions.
    pub fn new(config: &GcsConfig, init: &mut Initializer) -> Result<Self> {
        let mut cells = SimplexGraph::new();
        let ids: Vec<NodeId> = init
            .positions(3)?
            .into_iter()
            .map(|p| cells.insert_node(p, Unit::cell()))
            .collect();
        cells.add_simplex(ids[0], ids[1], ids[2])?;
        Ok(Self {
            cells,
            config: config.clone(),
        })
    }

    /// The triangle structure behind [`Adaptation::graph`].
    pub fn cells(&self) -> &SimplexGraph {
        &self.cells
    }

    fn nearest(&self, input: &[f64], metric: Metric) -> Result<(NodeId, f64)> {
        let mut best: Option<(NodeId, f64)> = None;
        for node in self.cells.graph().nodes() {
            let d = metric.distance(input, &node.position)?;
            if best.map_or(true, |(_, b)| d < b) {
                best = Some((node.id, d));
            }
        }
        best.ok_or_else(|| TopogasError::Empty("no cell to win".into()))
    }

    fn grow(&mut self, metric: Metric) -> Result<()> {
        let graph = self.cells.graph();

        let mut hq: Option<(NodeId, f64)> = None;
        for node in graph.nodes() {
            let tau = node.signal_counter().unwrap_or(0.0);
            if hq.map_or(true, |(_, best)| tau > best) {
                hq = Some((node.id, tau));
            }
        }
        let (hq, _) = hq.ok_or_else(|| TopogasError::Empty("no cell to grow from".into()))?;

        let hq_position = &graph.node(hq)?.position;
        let mut farthest: Option<(NodeId, f64)> = None;
        for id in distinct(graph.neighbors(hq)?) {
            let d = metric.distance(hq_position, &graph.node(id)?.position)?;
            if farthest.map_or(true, |(_, best)| d > best) {
                farthest = Some((id, d));
            }
        }
        let Some((f, _)) = farthest else {
            debug!("GCS cell {} has no neighbour, skipping growth", hq);
            return Ok(());
        };

        let f_neighbours = distinct(graph.neighbors(f)?);
        let shared: Vec<NodeId> = distinct(graph.neighbors(hq)?)
            .into_iter()
            .filter(|id| *id != f && f_neighbours.contains(id))
            .collect();
        if shared.is_empty() {
            debug!("GCS side {}-{} borders no triangle, skipping growth", hq, f);
            return Ok(());
        }

        let position = midpoint(hq_position, &graph.node(f)?.position)?;
        let r = self.cells.insert_node(position, Unit::cell());
        for s in &shared {
            self.cells.add_simplex(hq, r, *s)?;
            self.cells.add_simplex(f, r, *s)?;
            self.cells.remove_simplex_with(hq, f, *s)?;
        }

        // r takes a share of each new neighbour's signal counter.
        let neighbours = distinct(self.cells.graph().neighbors(r)?);
        let degree = self.cells.graph().degree(r)? as f64;
        let mut taken = 0.0;
        for id in neighbours {
            if let Some(tau) = self.cells.node_mut(id)?.signal_counter_mut() {
                let share = *tau / degree;
                *tau -= share;
                taken += share;
            }
        }
        if let Some(tau) = self.cells.node_mut(r)?.signal_counter_mut() {
            *tau = taken;
        }
        debug!(
            "GCS grew {} between {} and {} ({} cells, {} triangles)",
            r,
            hq,
            f,
            self.cells.graph().node_count(),
            self.cells.simplices().len()
        );
        Ok(())
    }

    fn prune(&mut self, metric: Metric) -> Result<()> {
        let graph = self.cells.graph();
        let mut worst: Option<(NodeId, f64)> = None;
        for node in graph.nodes() {
            let neighbours = graph.neighbors(node.id)?;
            if neighbours.is_empty() {
                continue;
            }
            let mut total = 0.0;
            for id in &neighbours {
                total += metric.distance(&node.position, &graph.node(*id)?.position)?;
            }
            let mean = total / neighbours.len() as f64;
            if worst.map_or(true, |(_, best)| mean > best) {
                worst = Some((node.id, mean));
            }
        }
        if let Some((victim, mean)) = worst {
            let removed = self.cells.remove_simplices_containing(victim)?;
            debug!(
                "GCS pruned {} triangles around {} (mean neighbour distance {:.4})",
                removed, victim, mean
            );
        }
        Ok(())
    }
}

fn distinct(mut ids: Vec<NodeId>) -> Vec<NodeId> {
    let mut seen = Vec::with_capacity(ids.len());
    ids.retain(|id| {
        if seen.contains(id) {
            false
        } else {
            seen.push(*id);
            true
        }
    });
    ids
}

impl Adaptation for GrowingCellStructures {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::Gcs
    }

    fn graph(&self) -> &Graph {
        self.cells.graph()
    }

    fn adapt(&mut self, input: &[f64], ctx: &StepContext) -> Result<()> {
        let (s1, distance) = self.nearest(input, ctx.metric)?;

        let winner = self.cells.node_mut(s1)?;
        move_toward(&mut winner.position, input, self.config.winner_rate);
        if let Some(tau) = winner.signal_counter_mut() {
            *tau += if self.config.error_minimising { distance } else { 1.0 };
        }
        for id in self.cells.graph().neighbors(s1)? {
            let node = self.cells.node_mut(id)?;
            move_toward(&mut node.position, input, self.config.neighbour_rate);
        }

        let alpha = self.config.alpha;
        for node in self.cells.nodes_mut() {
            if let Some(tau) = node.signal_counter_mut() {
                *tau -= alpha * *tau;
            }
        }

        if ctx.iteration % self.config.insertion_period == 0
            && self.cells.graph().node_count() <= self.config.max_nodes
        {
            self.grow(ctx.metric)?;
        }
        if ctx.iteration % self.config.pruning_period == 0 {
            self.prune(ctx.metric)?;
        }
        Ok(())
    }
}
