//! Starting positions for new networks.

use crate::error::{Result, TopogasError};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

enum Mode {
    Random(ChaCha8Rng),
    Diagonal,
    Explicit(Vec<Vec<f64>>),
}

/// Supplies the positions of a network's initial nodes.
///
/// Random mode draws every coordinate uniformly from [0, 1). Deterministic
/// mode puts node `i` of `n` at `(i + 1) / (n + 1)` on every axis. Explicit
/// positions override both and must match the node count exactly.
pub struct Initializer {
    mode: Mode,
    dimension: usize,
}

impl Initializer {
    /// Random positions from a seeded (or entropy-seeded) generator.
    pub fn random(dimension: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            mode: Mode::Random(rng),
            dimension,
        }
    }

    /// Fixed diagonal positions.
    pub fn diagonal(dimension: usize) -> Self {
        Self {
            mode: Mode::Diagonal,
            dimension,
        }
    }

    /// Caller-supplied positions.
    pub fn explicit(dimension: usize, positions: Vec<Vec<f64>>) -> Self {
        Self {
            mode: Mode::Explicit(positions),
            dimension,
        }
    }

    /// Dimension of the positions produced.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Produces `count` starting positions.
    pub fn positions(&mut self, count: usize) -> Result<Vec<Vec<f64>>> {
        let dimension = self.dimension;
        match &mut self.mode {
            Mode::Random(rng) => Ok((0..count)
                .map(|_| (0..dimension).map(|_| rng.gen::<f64>()).collect())
                .collect()),
            Mode::Diagonal => Ok((0..count)
                .map(|i| vec![(i + 1) as f64 / (count + 1) as f64; dimension])
                .collect()),
            Mode::Explicit(positions) => {
                if positions.len() != count {
                    return Err(TopogasError::invalid(format!(
                        "expected {} initial positions, got {}",
                        count,
                        positions.len()
                    )));
                }
                if let Some(bad) = positions.iter().find(|p| p.len() != dimension) {
                    return Err(TopogasError::dimension(dimension, bad.len()));
                }
                Ok(positions.clone())
            }
        }
    }
}
