//! Training inputs: the vectors, the epoch dealer and the data-file loader.

mod dealer;
mod loader;

pub use dealer::{DealOrder, Dealer};
pub use loader::{load_vectors, mean, parse_vectors, LoadOptions};

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One input sample.
///
/// Networks only read inputs; the flags are for presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    /// Coordinates.
    pub position: Vec<f64>,
    /// Opaque label, never used for training.
    pub label: String,
    /// Traversal scratch flag.
    pub visited: bool,
    /// Presentation flag.
    pub selected: bool,
}

impl Vector {
    /// Creates an input with an empty label.
    pub fn new(position: Vec<f64>) -> Self {
        Self::labelled(position, String::new())
    }

    /// Creates an input with a label.
    pub fn labelled(position: Vec<f64>, label: impl Into<String>) -> Self {
        Self {
            position,
            label: label.into(),
            visited: false,
            selected: false,
        }
    }

    /// Number of coordinates.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.position.len()
    }
}

/// Shared, read-only input set.
pub type Inputs = Arc<[Vector]>;

/// Wraps raw coordinate rows as an [`Inputs`] set.
pub fn from_rows<I>(rows: I) -> Inputs
where
    I: IntoIterator<Item = Vec<f64>>,
{
    rows.into_iter().map(Vector::new).collect()
}
