//! # Topogas - Topology-Learning Neural Networks
//!
//! Topogas trains unsupervised competitive-learning networks that learn both
//! where a data distribution lives and how it is connected.
//!
//! ## Overview
//!
//! Each network is a graph of reference vectors. Inputs are presented one at
//! a time; the nodes nearest to each input move toward it and, depending on
//! the algorithm, edges age, nodes are inserted or whole regions are pruned.
//!
//! ## Algorithms
//!
//! - **Competitive Learning (CL)**: winner-take-all, fixed node count
//! - **Growing Neural Gas (GNG)**: grows nodes where error accumulates and
//!   learns edges by competitive Hebbian learning
//! - **Growing Cell Structures (GCS)**: grows and prunes a triangle mesh
//! - **Neural Gas (NG)**: rank-weighted updates with decaying neighbourhood
//! - **Self-Organising Map (SOM)**: fixed lattice with Gaussian neighbourhood
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use topogas::{from_rows, AlgorithmConfig, Config, GngConfig, Network};
//!
//! let inputs = from_rows(vec![vec![0.0, 0.0], vec![1.0, 1.0]]);
//! let config = Config::new(AlgorithmConfig::Gng(GngConfig::default()));
//!
//! let mut network = Network::new(&config, inputs)?;
//! network.run_to_completion()?;
//!
//! println!("SSE: {}", network.sse()?);
//! println!("Correlation: {:?}", network.topological_correlation()?);
//! ```
//!
//! ## Architecture
//!
//! - [`metric`] - Minkowski distances and vector helpers
//! - [`graph`] - node/edge graph and the triangle mesh used by GCS
//! - [`input`] - input vectors, the epoch dealer and the data-file loader
//! - [`ranking`] - per-step distance ranking of nodes
//! - [`algorithm`] - the five networks and the step state machine
//! - [`quality`] - SSE, induced Delaunay triangulation, topological correlation
//! - [`runner`] - background trainer with pause/resume/stop and progress events
//! - [`config`] - typed configs and the flat parameter map
//!
//! ## Training in the Background
//!
//! ```rust,ignore
//! use topogas::{ProgressEvent, Trainer, TrainerOptions};
//!
//! let (trainer, events) = Trainer::spawn(network, TrainerOptions::default())?;
//! trainer.start();
//! for event in events {
//!     if let ProgressEvent::Snapshot { iteration, sse, .. } = event {
//!         println!("{}: {}", iteration, sse);
//!     }
//! }
//! let steps = trainer.join()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algorithm;
pub mod config;
pub mod error;
pub mod graph;
pub mod input;
pub mod metric;
pub mod quality;
pub mod ranking;
pub mod runner;

// Re-export commonly used types
pub use algorithm::{
    Adaptation, CompetitiveLearning, GrowingCellStructures, GrowingNeuralGas, NeuralGas, Network,
    RunState, SelfOrganisingMap, StepContext, StepOutcome,
};
pub use config::{
    AlgorithmConfig, AlgorithmKind, ClConfig, Config, GcsConfig, GngConfig, NgConfig, ParameterMap,
    RunConfig, ScheduleConfig, SomConfig,
};
pub use error::{Result, TopogasError};
pub use graph::{Edge, Graph, Node, NodeId, Simplex, SimplexGraph, Unit};
pub use input::{from_rows, load_vectors, DealOrder, Dealer, Inputs, LoadOptions, Vector};
pub use metric::{midpoint, minkowski, Metric};
pub use quality::{induced_delaunay_triangulation, sse, topological_correlation};
pub use ranking::ErrorTable;
pub use runner::{Counter, FinishReason, ProgressEvent, Trainer, TrainerOptions};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Minkowski power at or above which distances are Chebyshev.
pub const CHEBYSHEV_POWER: f64 = metric::CHEBYSHEV_THRESHOLD;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_constants() {
        assert!((CHEBYSHEV_POWER - 99.9).abs() < 1e-10);
    }
}
