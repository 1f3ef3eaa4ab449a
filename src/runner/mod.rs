//! Background training.
//!
//! A [`Trainer`] moves a [`Network`] onto its own worker thread. The worker
//! is the only thread that mutates the network; callers steer it with
//! [`Trainer::start`], [`Trainer::pause`], [`Trainer::resume`] and
//! [`Trainer::stop`] and observe it through the shared [`Counter`] and a
//! bounded stream of [`ProgressEvent`]s.
//!
//! Control changes take effect between steps. A paused worker sleeps on a
//! condition variable.

mod counter;

pub use counter::Counter;

use crate::algorithm::{Network, RunState, StepOutcome};
use crate::error::{Result, TopogasError};
use crate::graph::Graph;
use log::{debug, info, warn};
use parking_lot::{Condvar, Mutex};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Default capacity of the progress channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Why a training run ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// Every epoch was presented.
    Exhausted,
    /// [`Trainer::stop`] was called.
    Stopped,
}

/// Progress notification from the worker.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A step with this iteration number completed.
    Iteration(u64),
    /// Periodic copy of the topology with its quality measures.
    Snapshot {
        /// Iteration the snapshot was taken after.
        iteration: u64,
        /// The trained graph.
        network: Graph,
        /// Its induced Delaunay triangulation.
        triangulation: Graph,
        /// Sum of squared errors.
        sse: f64,
    },
    /// The run ended.
    Finished {
        /// Steps completed.
        iteration: u64,
        /// Why it ended.
        reason: FinishReason,
    },
    /// A step failed and the run was abandoned.
    Failed {
        /// The error, rendered.
        message: String,
    },
}

/// Trainer options.
#[derive(Debug, Clone)]
pub struct TrainerOptions {
    /// Emit a [`ProgressEvent::Snapshot`] every this many iterations; 0
    /// disables snapshots.
    ///
    /// Default: 100.
    pub display_stride: u64,

    /// Progress channel capacity. Events that do not fit are dropped.
    ///
    /// Default: 1024.
    pub channel_capacity: usize,
}

impl Default for TrainerOptions {
    fn default() -> Self {
        Self {
            display_stride: 100,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

struct Control {
    state: Mutex<RunState>,
    wake: Condvar,
}

impl Control {
    fn set(&self, next: RunState) {
        let mut state = self.state.lock();
        // Stopped is terminal.
        if *state != RunState::Stopped {
            *state = next;
        }
        self.wake.notify_all();
    }

    /// Blocks while paused; returns the state the worker should act on.
    fn wait_runnable(&self) -> RunState {
        let mut state = self.state.lock();
        while *state == RunState::Paused {
            self.wake.wait(&mut state);
        }
        *state
    }
}

struct Progress {
    sender: SyncSender<ProgressEvent>,
    dropped: u64,
}

impl Progress {
    fn emit(&mut self, event: ProgressEvent) {
        match self.sender.try_send(event) {
            Ok(()) | Err(TrySendError::Disconnected(_)) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                debug!("Progress channel full, dropped event ({} so far)", self.dropped);
            }
        }
    }
}

/// Owns the worker thread training one network.
pub struct Trainer {
    network: Arc<Mutex<Network>>,
    control: Arc<Control>,
    counter: Counter,
    handle: Option<JoinHandle<Result<u64>>>,
}

impl Trainer {
    /// Spawns a paused worker for `network`. Call [`Trainer::start`] to
    /// begin consuming inputs.
    pub fn spawn(network: Network, options: TrainerOptions) -> Result<(Self, Receiver<ProgressEvent>)> {
        let (sender, receiver) = sync_channel(options.channel_capacity.max(1));
        let counter = network.counter().clone();
        let network = Arc::new(Mutex::new(network));
        let control = Arc::new(Control {
            state: Mutex::new(RunState::Paused),
            wake: Condvar::new(),
        });

        let worker_network = Arc::clone(&network);
        let worker_control = Arc::clone(&control);
        let handle = thread::Builder::new()
            .name("topogas-trainer".into())
            .spawn(move || {
                let mut progress = Progress { sender, dropped: 0 };
                let result = work(&worker_network, &worker_control, &mut progress, options.display_stride);
                if progress.dropped > 0 {
                    warn!("Dropped {} progress events", progress.dropped);
                }
                result
            })?;

        Ok((
            Self {
                network,
                control,
                counter,
                handle: Some(handle),
            },
            receiver,
        ))
    }

    /// Paused → Running.
    pub fn start(&self) {
        self.control.set(RunState::Running);
    }

    /// Running → Paused. Takes effect after the current step.
    pub fn pause(&self) {
        self.control.set(RunState::Paused);
    }

    /// Paused → Running.
    pub fn resume(&self) {
        self.start();
    }

    /// Ends the run after the current step. Terminal.
    pub fn stop(&self) {
        self.control.set(RunState::Stopped);
    }

    /// Requested lifecycle state.
    pub fn state(&self) -> RunState {
        *self.control.state.lock()
    }

    /// The shared iteration counter.
    pub fn counter(&self) -> &Counter {
        &self.counter
    }

    /// Runs `f` on the network between steps.
    pub fn inspect<R>(&self, f: impl FnOnce(&Network) -> R) -> R {
        f(&self.network.lock())
    }

    /// Waits for the worker and returns the number of completed steps.
    pub fn join(mut self) -> Result<u64> {
        let handle = self
            .handle
            .take()
            .ok_or_else(|| TopogasError::Worker("trainer already joined".into()))?;
        handle
            .join()
            .map_err(|_| TopogasError::Worker("training thread panicked".into()))?
    }

    /// Waits for the worker and hands back the trained network.
    pub fn finish(self) -> Result<Network> {
        let network = Arc::clone(&self.network);
        self.join()?;
        Arc::try_unwrap(network)
            .map(Mutex::into_inner)
            .map_err(|_| TopogasError::Worker("network still shared".into()))
    }
}

impl Drop for Trainer {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.stop();
        }
    }
}

fn work(
    network: &Mutex<Network>,
    control: &Control,
    progress: &mut Progress,
    display_stride: u64,
) -> Result<u64> {
    network.lock().start();
    loop {
        if control.wait_runnable() == RunState::Stopped {
            let mut net = network.lock();
            net.stop();
            let iteration = net.counter().completed();
            info!("{} training stopped after {} steps", net.kind(), iteration);
            progress.emit(ProgressEvent::Finished {
                iteration,
                reason: FinishReason::Stopped,
            });
            return Ok(iteration);
        }

        let mut net = network.lock();
        let outcome = match net.step() {
            Ok(outcome) => outcome,
            Err(e) => {
                control.set(RunState::Stopped);
                progress.emit(ProgressEvent::Failed {
                    message: e.to_string(),
                });
                return Err(e);
            }
        };

        match outcome {
            StepOutcome::Adapted { iteration } => {
                progress.emit(ProgressEvent::Iteration(iteration));
                if display_stride > 0 && iteration % display_stride == 0 {
                    if let Err(e) = snapshot(&net, iteration, progress) {
                        control.set(RunState::Stopped);
                        progress.emit(ProgressEvent::Failed {
                            message: e.to_string(),
                        });
                        return Err(e);
                    }
                }
            }
            StepOutcome::Idle => {}
            StepOutcome::Exhausted | StepOutcome::Stopped => {
                control.set(RunState::Stopped);
                let iteration = net.counter().completed();
                info!(
                    "{} training finished after {} steps: {} nodes, {} edges",
                    net.kind(),
                    iteration,
                    net.graph().node_count(),
                    net.graph().edge_count()
                );
                progress.emit(ProgressEvent::Finished {
                    iteration,
                    reason: FinishReason::Exhausted,
                });
                return Ok(iteration);
            }
        }
    }
}

fn snapshot(net: &Network, iteration: u64, progress: &mut Progress) -> Result<()> {
    let triangulation = net.triangulation()?;
    let sse = net.sse()?;
    progress.emit(ProgressEvent::Snapshot {
        iteration,
        network: net.graph().clone(),
        triangulation,
        sse,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::CompetitiveLearning;
    use crate::config::{AlgorithmConfig, ClConfig, Config};
    use crate::input::{from_rows, DealOrder, Dealer};
    use crate::metric::Metric;
    use std::time::{Duration, Instant};

    fn network(epochs: usize) -> Network {
        let mut config = Config::new(AlgorithmConfig::Cl(ClConfig {
            nodes: 2,
            learning_rate: 0.1,
        }));
        config.run.epochs = epochs;
        config.run.deterministic = true;
        let inputs = from_rows(vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![0.5, 0.0]]);
        Network::new(&config, inputs).unwrap()
    }

    fn options(display_stride: u64) -> TrainerOptions {
        TrainerOptions {
            display_stride,
            channel_capacity: 4096,
        }
    }

    fn wait_for(counter: &Counter, value: u64) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while counter.completed() < value {
            assert!(Instant::now() < deadline, "worker made no progress");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_runs_to_exhaustion() {
        let (trainer, events) = Trainer::spawn(network(2), options(0)).unwrap();
        trainer.start();
        assert_eq!(trainer.join().unwrap(), 6);

        let events: Vec<ProgressEvent> = events.iter().collect();
        let iterations: Vec<u64> = events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Iteration(i) => Some(*i),
                _ => None,
            })
            .collect();
        assert_eq!(iterations, vec![1, 2, 3, 4, 5, 6]);
        assert!(matches!(
            events.last(),
            Some(ProgressEvent::Finished {
                iteration: 6,
                reason: FinishReason::Exhausted
            })
        ));
    }

    #[test]
    fn test_spawned_paused() {
        let (trainer, events) = Trainer::spawn(network(2), options(0)).unwrap();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(trainer.counter().get(), 1);
        assert_eq!(trainer.state(), RunState::Paused);

        trainer.stop();
        assert_eq!(trainer.join().unwrap(), 0);
        assert!(matches!(
            events.iter().last(),
            Some(ProgressEvent::Finished {
                reason: FinishReason::Stopped,
                ..
            })
        ));
    }

    #[test]
    fn test_pause_resume_stop() {
        let (trainer, _events) = Trainer::spawn(network(1_000_000), options(0)).unwrap();
        trainer.start();
        wait_for(trainer.counter(), 10);

        trainer.pause();
        thread::sleep(Duration::from_millis(10));
        let paused_at = trainer.counter().completed();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(trainer.counter().completed(), paused_at);

        trainer.resume();
        wait_for(trainer.counter(), paused_at + 10);

        trainer.stop();
        // Stop wins over a later start.
        trainer.start();
        assert_eq!(trainer.state(), RunState::Stopped);
        let steps = trainer.join().unwrap();
        assert!(steps >= paused_at + 10);
        assert!(steps < 3_000_000);
    }

    #[test]
    fn test_snapshots_follow_stride() {
        let (trainer, events) = Trainer::spawn(network(2), options(2)).unwrap();
        trainer.start();
        trainer.join().unwrap();

        let snapshots: Vec<(u64, usize, f64)> = events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Snapshot {
                    iteration,
                    network,
                    sse,
                    ..
                } => Some((iteration, network.node_count(), sse)),
                _ => None,
            })
            .collect();
        assert_eq!(snapshots.iter().map(|s| s.0).collect::<Vec<_>>(), vec![2, 4, 6]);
        assert!(snapshots.iter().all(|s| s.1 == 2 && s.2 >= 0.0));
    }

    #[test]
    fn test_full_channel_does_not_block() {
        let opts = TrainerOptions {
            display_stride: 0,
            channel_capacity: 1,
        };
        let (trainer, events) = Trainer::spawn(network(10), opts).unwrap();
        trainer.start();
        assert_eq!(trainer.join().unwrap(), 30);
        assert_eq!(events.iter().count(), 1);
    }

    #[test]
    fn test_failure_is_reported() {
        let inputs = from_rows(vec![vec![0.0]]);
        let dealer = Dealer::new(inputs, 1, DealOrder::Sequential, None);
        let model = CompetitiveLearning::from_graph(Graph::new(), 0.5);
        let net = Network::from_model(Box::new(model), dealer, Metric::default());

        let (trainer, events) = Trainer::spawn(net, options(0)).unwrap();
        trainer.start();
        assert!(matches!(trainer.join(), Err(TopogasError::Empty(_))));
        assert!(matches!(
            events.iter().last(),
            Some(ProgressEvent::Failed { .. })
        ));
    }

    #[test]
    fn test_finish_returns_network() {
        let (trainer, _events) = Trainer::spawn(network(1), options(0)).unwrap();
        trainer.start();
        let net = trainer.finish().unwrap();
        assert_eq!(net.counter().completed(), 3);
        assert_eq!(net.state(), RunState::Stopped);
    }
}
