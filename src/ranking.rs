//! Distance ranking of nodes against a query vector.

use crate::error::{Result, TopogasError};
use crate::graph::{Node, NodeId};
use crate::metric::Metric;

/// One ranked node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entry {
    /// The node.
    pub node: NodeId,
    /// Its distance to the query.
    pub distance: f64,
}

/// Nodes ordered by ascending distance to a query.
///
/// Ties are broken by the order the nodes were supplied in, so two nodes at
/// the same distance are both kept.
#[derive(Debug, Clone, Default)]
pub struct ErrorTable {
    entries: Vec<Entry>,
}

impl ErrorTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the contents with the ranking of `nodes` against `query`.
    pub fn build<'a, I>(&mut self, nodes: I, query: &[f64], metric: Metric) -> Result<()>
    where
        I: IntoIterator<Item = &'a Node>,
    {
        self.entries.clear();
        for node in nodes {
            let distance = metric.distance(query, &node.position)?;
            self.entries.push(Entry {
                node: node.id,
                distance,
            });
        }
        // Stable sort keeps input order among equal distances.
        self.entries.sort_by(|x, y| x.distance.total_cmp(&y.distance));
        Ok(())
    }

    /// Convenience constructor around [`ErrorTable::build`].
    pub fn ranked<'a, I>(nodes: I, query: &[f64], metric: Metric) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Node>,
    {
        let mut table = Self::new();
        table.build(nodes, query, metric)?;
        Ok(table)
    }

    /// The nearest node.
    pub fn first(&self) -> Result<Entry> {
        self.entries
            .first()
            .copied()
            .ok_or_else(|| TopogasError::Empty("no winner: ranking is empty".into()))
    }

    /// The second-nearest node.
    pub fn second(&self) -> Result<Entry> {
        self.entries
            .get(1)
            .copied()
            .ok_or_else(|| TopogasError::Empty("no runner-up: fewer than two nodes".into()))
    }

    /// Distance recorded for `node`.
    pub fn error_of(&self, node: NodeId) -> Option<f64> {
        self.entries.iter().find(|e| e.node == node).map(|e| e.distance)
    }

    /// All entries, nearest first.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no node was ranked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
