//! Competitive-learning networks and the step machine that drives them.
//!
//! Every algorithm implements [`Adaptation`]: given one input it moves nodes
//! and edits topology. [`Network`] wraps an adaptation with the shared
//! pieces, namely the input dealer, the iteration counter and the
//! `Paused → Running → Stopped` state machine.
//!
//! - [`cl`] - winner-take-all competitive learning
//! - [`gng`] - Growing Neural Gas
//! - [`gcs`] - Growing Cell Structures
//! - [`ng`] - Neural Gas
//! - [`som`] - Self-Organising Map

pub mod cl;
pub mod gcs;
pub mod gng;
mod init;
pub mod ng;
pub mod schedule;
pub mod som;

pub use cl::CompetitiveLearning;
pub use gcs::GrowingCellStructures;
pub use gng::GrowingNeuralGas;
pub use init::Initializer;
pub use ng::NeuralGas;
pub use schedule::{ExponentialDecay, Schedule};
pub use som::SelfOrganisingMap;

use crate::config::{AlgorithmConfig, AlgorithmKind, Config};
use crate::error::{Result, TopogasError};
use crate::graph::Graph;
use crate::input::{DealOrder, Dealer, Inputs};
use crate::metric::Metric;
use crate::quality;
use crate::runner::Counter;
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Per-step information handed to an [`Adaptation`].
#[derive(Debug, Clone, Copy)]
pub struct StepContext {
    /// Iteration number of this step, starting at 1.
    pub iteration: u64,
    /// Distance metric of the run.
    pub metric: Metric,
}

/// One algorithm's update rule.
pub trait Adaptation: Send {
    /// Which algorithm this is.
    fn kind(&self) -> AlgorithmKind;

    /// The trained topology.
    fn graph(&self) -> &Graph;

    /// Applies one input.
    fn adapt(&mut self, input: &[f64], ctx: &StepContext) -> Result<()>;
}

/// Lifecycle of a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    /// Not consuming inputs. Initial state.
    Paused,
    /// Consuming inputs.
    Running,
    /// Finished or cancelled. Terminal.
    Stopped,
}

/// What a call to [`Network::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// No inputs were left; the network is now stopped.
    Exhausted,
    /// Paused; nothing was consumed.
    Idle,
    /// Already stopped.
    Stopped,
    /// One input was applied.
    Adapted {
        /// Iteration number of the step that ran.
        iteration: u64,
    },
}

/// A trainable network: an adaptation plus its inputs and clock.
pub struct Network {
    model: Box<dyn Adaptation>,
    dealer: Dealer,
    counter: Counter,
    metric: Metric,
    state: RunState,
}

impl Network {
    /// Builds the network described by `config` over `inputs`.
    ///
    /// All inputs must share one dimension, which becomes the dimension of
    /// every node.
    pub fn new(config: &Config, inputs: Inputs) -> Result<Self> {
        Self::with_counter(config, inputs, Counter::new())
    }

    /// Like [`Network::new`] but advancing an existing counter.
    pub fn with_counter(config: &Config, inputs: Inputs, counter: Counter) -> Result<Self> {
        config.validate()?;
        let dimension = input_dimension(&inputs)?;
        let metric = Metric::new(config.run.minkowski_power)?;

        let mut init = match (&config.initial_positions, config.run.deterministic) {
            (Some(positions), _) => Initializer::explicit(dimension, positions.clone()),
            (None, true) => Initializer::diagonal(dimension),
            (None, false) => Initializer::random(dimension, config.run.seed),
        };
        let order = if config.run.deterministic {
            DealOrder::Sequential
        } else {
            DealOrder::Shuffled
        };
        // Keep shuffling independent of initialisation while staying seeded.
        let deal_seed = config.run.seed.map(|s| s.wrapping_add(1));
        let dealer = Dealer::new(inputs, config.run.epochs, order, deal_seed);
        let total = dealer.total_draws() as u64;

        let model: Box<dyn Adaptation> = match &config.algorithm {
            AlgorithmConfig::Cl(c) => Box::new(CompetitiveLearning::new(c, &mut init)?),
            AlgorithmConfig::Gng(c) => Box::new(GrowingNeuralGas::new(c, &mut init)?),
            AlgorithmConfig::Gcs(c) => Box::new(GrowingCellStructures::new(c, &mut init)?),
            AlgorithmConfig::Ng(c) => Box::new(NeuralGas::new(c, total, &mut init)?),
            AlgorithmConfig::Som(c) => Box::new(SelfOrganisingMap::new(c, total, &mut init)?),
        };

        info!(
            "Created {} network: {} nodes, {} inputs of dimension {}, {} epochs",
            model.kind(),
            model.graph().node_count(),
            dealer.inputs().len(),
            dimension,
            config.run.epochs
        );

        Ok(Self {
            model,
            dealer,
            counter,
            metric,
            state: RunState::Paused,
        })
    }

    /// Assembles a network from an already built adaptation.
    pub fn from_model(model: Box<dyn Adaptation>, dealer: Dealer, metric: Metric) -> Self {
        Self {
            model,
            dealer,
            counter: Counter::new(),
            metric,
            state: RunState::Paused,
        }
    }

    /// Which algorithm this network runs.
    pub fn kind(&self) -> AlgorithmKind {
        self.model.kind()
    }

    /// Current topology.
    pub fn graph(&self) -> &Graph {
        self.model.graph()
    }

    /// Training inputs.
    pub fn inputs(&self) -> &Inputs {
        self.dealer.inputs()
    }

    /// The shared iteration counter.
    pub fn counter(&self) -> &Counter {
        &self.counter
    }

    /// Iteration number the next step will carry.
    pub fn iteration(&self) -> u64 {
        self.counter.get()
    }

    /// Distance metric of the run.
    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// True while inputs remain to be dealt.
    pub fn has_next(&self) -> bool {
        self.dealer.has_next()
    }

    /// Paused → Running.
    pub fn start(&mut self) {
        if self.state == RunState::Paused {
            self.state = RunState::Running;
        }
    }

    /// Running → Paused.
    pub fn pause(&mut self) {
        if self.state == RunState::Running {
            self.state = RunState::Paused;
        }
    }

    /// Paused → Running.
    pub fn resume(&mut self) {
        self.start();
    }

    /// Any state → Stopped.
    pub fn stop(&mut self) {
        self.state = RunState::Stopped;
    }

    /// Executes one step of the state machine.
    ///
    /// A failing update stops the network before the error is returned.
    pub fn step(&mut self) -> Result<StepOutcome> {
        if self.state == RunState::Stopped {
            return Ok(StepOutcome::Stopped);
        }
        if !self.dealer.has_next() {
            self.state = RunState::Stopped;
            return Ok(StepOutcome::Exhausted);
        }
        if self.state == RunState::Paused {
            return Ok(StepOutcome::Idle);
        }

        let Some(index) = self.dealer.next() else {
            self.state = RunState::Stopped;
            return Ok(StepOutcome::Exhausted);
        };
        let ctx = StepContext {
            iteration: self.counter.get(),
            metric: self.metric,
        };
        let input = &self.dealer.inputs()[index].position;
        if let Err(e) = self.model.adapt(input, &ctx) {
            warn!("{} step {} failed: {}", self.model.kind(), ctx.iteration, e);
            self.state = RunState::Stopped;
            return Err(e);
        }
        self.counter.increment();
        Ok(StepOutcome::Adapted {
            iteration: ctx.iteration,
        })
    }

    /// Starts the network and steps until it stops. Returns the number of
    /// steps taken by this call.
    pub fn run_to_completion(&mut self) -> Result<u64> {
        self.start();
        let mut steps = 0;
        while let StepOutcome::Adapted { .. } = self.step()? {
            steps += 1;
        }
        info!(
            "{} training finished after {} steps: {} nodes, {} edges",
            self.kind(),
            self.counter.completed(),
            self.graph().node_count(),
            self.graph().edge_count()
        );
        Ok(steps)
    }

    /// Sum of squared errors of the inputs against the current nodes.
    pub fn sse(&self) -> Result<f64> {
        quality::sse(self.graph(), self.inputs())
    }

    /// Induced Delaunay triangulation of the current nodes.
    pub fn triangulation(&self) -> Result<Graph> {
        quality::induced_delaunay_triangulation(self.graph(), self.inputs())
    }

    /// Topological correlation between the network and its triangulation.
    pub fn topological_correlation(&self) -> Result<Option<f64>> {
        let triangulation = self.triangulation()?;
        quality::topological_correlation(self.graph(), &triangulation)
    }
}

fn input_dimension(inputs: &Inputs) -> Result<usize> {
    let first = inputs
        .first()
        .ok_or_else(|| TopogasError::Empty("no input vectors".into()))?;
    let dimension = first.dimension();
    if dimension == 0 {
        return Err(TopogasError::invalid("input vectors have no coordinates"));
    }
    if let Some(bad) = inputs.iter().find(|v| v.dimension() != dimension) {
        return Err(TopogasError::dimension(dimension, bad.dimension()));
    }
    Ok(dimension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClConfig;
    use crate::input::from_rows;

    fn cl_config(epochs: usize) -> Config {
        let mut config = Config::new(AlgorithmConfig::Cl(ClConfig {
            nodes: 1,
            learning_rate: 0.5,
        }));
        config.run.epochs = epochs;
        config.run.deterministic = true;
        config
    }

    #[test]
    fn test_paused_network_does_not_consume() {
        let inputs = from_rows(vec![vec![0.0, 0.0], vec![1.0, 1.0]]);
        let mut net = Network::new(&cl_config(1), inputs).unwrap();
        assert_eq!(net.state(), RunState::Paused);
        assert_eq!(net.step().unwrap(), StepOutcome::Idle);
        assert_eq!(net.iteration(), 1);

        net.start();
        assert_eq!(net.step().unwrap(), StepOutcome::Adapted { iteration: 1 });
        net.pause();
        assert_eq!(net.step().unwrap(), StepOutcome::Idle);
        net.resume();
        assert_eq!(net.step().unwrap(), StepOutcome::Adapted { iteration: 2 });
        assert_eq!(net.step().unwrap(), StepOutcome::Exhausted);
        assert_eq!(net.state(), RunState::Stopped);
        assert_eq!(net.step().unwrap(), StepOutcome::Stopped);
    }

    #[test]
    fn test_stop_is_terminal() {
        let inputs = from_rows(vec![vec![0.0], vec![1.0]]);
        let mut net = Network::new(&cl_config(5), inputs).unwrap();
        net.start();
        net.step().unwrap();
        net.stop();
        net.start();
        assert_eq!(net.state(), RunState::Stopped);
        assert_eq!(net.step().unwrap(), StepOutcome::Stopped);
    }

    #[test]
    fn test_run_to_completion_counts_steps() {
        let inputs = from_rows(vec![vec![0.0], vec![1.0], vec![2.0]]);
        let mut net = Network::new(&cl_config(4), inputs).unwrap();
        assert_eq!(net.run_to_completion().unwrap(), 12);
        assert_eq!(net.counter().completed(), 12);
        assert!(!net.has_next());
    }

    #[test]
    fn test_inputs_must_share_dimension() {
        let inputs = from_rows(vec![vec![0.0, 1.0], vec![1.0]]);
        assert!(matches!(
            Network::new(&cl_config(1), inputs),
            Err(TopogasError::DimensionMismatch { .. })
        ));
        let empty = from_rows(Vec::<Vec<f64>>::new());
        assert!(matches!(
            Network::new(&cl_config(1), empty),
            Err(TopogasError::Empty(_))
        ));
    }

    #[test]
    fn test_failed_step_stops_network() {
        let inputs = from_rows(vec![vec![0.0, 0.0]]);
        let dealer = Dealer::new(inputs, 3, DealOrder::Sequential, None);
        let model = CompetitiveLearning::from_graph(Graph::new(), 0.5);
        let mut net = Network::from_model(Box::new(model), dealer, Metric::default());
        net.start();
        assert!(matches!(net.step(), Err(TopogasError::Empty(_))));
        assert_eq!(net.state(), RunState::Stopped);
        assert_eq!(net.iteration(), 1);
    }
}
