//! Nodes: reference vectors living in a network graph.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a node within one graph.
///
/// Two nodes at the same position are still different nodes; only the id
/// decides identity. Ids are handed out in increasing order, so ordering by
/// id is ordering by insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Per-algorithm state carried by a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Unit {
    /// No extra state.
    Plain,
    /// Accumulated local error (GNG, NG, CL).
    Gas {
        /// Accumulated quantization error.
        error: f64,
    },
    /// Decaying win frequency (GCS).
    Cell {
        /// Signal counter.
        signal_counter: f64,
    },
    /// Fixed lattice coordinate (SOM).
    Lattice {
        /// Row on the grid.
        row: usize,
        /// Column on the grid.
        col: usize,
    },
}

impl Unit {
    /// A gas unit with zero error.
    pub const fn gas() -> Self {
        Unit::Gas { error: 0.0 }
    }

    /// A cell unit with a zero signal counter.
    pub const fn cell() -> Self {
        Unit::Cell { signal_counter: 0.0 }
    }
}

/// A vertex of a network graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Identity.
    pub id: NodeId,
    /// Reference vector, moved in place during training.
    pub position: Vec<f64>,
    /// Opaque label. [`crate::graph::Graph::insert`] sets it to the ordinal.
    pub label: String,
    /// Scratch flag for traversals.
    pub visited: bool,
    /// Presentation flag.
    pub selected: bool,
    /// Algorithm-specific state.
    pub unit: Unit,
}

impl Node {
    /// Creates a node with empty label and cleared flags.
    pub fn new(id: NodeId, position: Vec<f64>, unit: Unit) -> Self {
        Self {
            id,
            position,
            label: String::new(),
            visited: false,
            selected: false,
            unit,
        }
    }

    /// Dimension of the reference vector.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.position.len()
    }

    /// Accumulated error, if this is a gas unit.
    pub fn error(&self) -> Option<f64> {
        match self.unit {
            Unit::Gas { error } => Some(error),
            _ => None,
        }
    }

    /// Mutable accumulated error, if this is a gas unit.
    pub fn error_mut(&mut self) -> Option<&mut f64> {
        match &mut self.unit {
            Unit::Gas { error } => Some(error),
            _ => None,
        }
    }

    /// Signal counter, if this is a GCS cell.
    pub fn signal_counter(&self) -> Option<f64> {
        match self.unit {
            Unit::Cell { signal_counter } => Some(signal_counter),
            _ => None,
        }
    }

    /// Mutable signal counter, if this is a GCS cell.
    pub fn signal_counter_mut(&mut self) -> Option<&mut f64> {
        match &mut self.unit {
            Unit::Cell { signal_counter } => Some(signal_counter),
            _ => None,
        }
    }

    /// Lattice coordinate, if this is a SOM cell.
    pub fn grid(&self) -> Option<(usize, usize)> {
        match self.unit {
            Unit::Lattice { row, col } => Some((row, col)),
            _ => None,
        }
    }
}
