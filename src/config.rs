//! Configuration for topogas networks.
//!
//! Typed configs ([`Config`] and the per-algorithm structs) are what the
//! library consumes. [`ParameterMap`] is the flat `KEY -> value` form used by
//! parameter files and the command line; [`Config::from_parameters`] turns one
//! into the other and rejects anything missing or out of range.

use crate::error::{Result, TopogasError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Main configuration for one training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Settings shared by every algorithm.
    pub run: RunConfig,

    /// The algorithm and its parameters.
    pub algorithm: AlgorithmConfig,

    /// Explicit starting positions, one per initial node.
    /// Overrides both random and deterministic initialisation.
    /// Default: None.
    #[serde(default)]
    pub initial_positions: Option<Vec<Vec<f64>>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            run: RunConfig::default(),
            algorithm: AlgorithmConfig::Gng(GngConfig::default()),
            initial_positions: None,
        }
    }
}

impl Config {
    /// Creates a config for `algorithm` with default run settings.
    pub fn new(algorithm: AlgorithmConfig) -> Self {
        Self {
            algorithm,
            ..Self::default()
        }
    }

    /// Checks every parameter, failing on the first bad one.
    pub fn validate(&self) -> Result<()> {
        self.run.validate()?;
        self.algorithm.validate()?;
        if let Some(positions) = &self.initial_positions {
            if positions.is_empty() {
                return Err(TopogasError::invalid("initial_positions must not be empty"));
            }
        }
        Ok(())
    }

    /// Builds a config from flat parameters.
    ///
    /// `ALGORITHM`, `EPOCH`, `MINKOWSKI` and every key of the chosen
    /// algorithm are required. `DEBUG`, `SEED` and `DISPLAY_UPDATE_RATE`
    /// are optional.
    pub fn from_parameters(params: &ParameterMap) -> Result<Self> {
        let kind: AlgorithmKind = params.get_str("ALGORITHM")?.parse()?;
        let run = RunConfig {
            epochs: params.get_usize("EPOCH")?,
            minkowski_power: params.get_f64("MINKOWSKI")?,
            deterministic: params.get_bool_or("DEBUG", false)?,
            seed: params.get_u64_opt("SEED")?,
            display_stride: params.get_u64_or("DISPLAY_UPDATE_RATE", RunConfig::default().display_stride)?,
        };

        let algorithm = match kind {
            AlgorithmKind::Cl => AlgorithmConfig::Cl(ClConfig {
                nodes: params.get_usize("CL_NODES")?,
                learning_rate: params.get_f64("CL_LEARNING_RATE")?,
            }),
            AlgorithmKind::Gng => {
                let defaults = GngConfig::default();
                AlgorithmConfig::Gng(GngConfig {
                    max_nodes: params.get_usize("GNG_NODES")?,
                    winner_rate: params.get_f64("GNG_BMU_LEARNING_RATE")?,
                    neighbour_rate: params.get_f64("GNG_NEIGHBOUR_LEARNING_RATE")?,
                    insertion_period: params.get_u64("GNG_NODE_INSERTION")?,
                    max_edge_age: u32::try_from(params.get_u64("GNG_EDGE_DELETION")?).map_err(|_| {
                        TopogasError::invalid("GNG_EDGE_DELETION does not fit in 32 bits")
                    })?,
                    alpha: params.get_f64_or("GNG_ALPHA", defaults.alpha)?,
                    beta: params.get_f64_or("GNG_BETA", defaults.beta)?,
                })
            }
            AlgorithmKind::Gcs => {
                let defaults = GcsConfig::default();
                AlgorithmConfig::Gcs(GcsConfig {
                    max_nodes: params.get_usize("GCS_NODES")?,
                    winner_rate: params.get_f64("GCS_BMU_LEARNING_RATE")?,
                    neighbour_rate: params.get_f64("GCS_NEIGHBOUR_LEARNING_RATE")?,
                    pruning_period: params.get_u64("GCS_NODE_DELETION")?,
                    insertion_period: params.get_u64("GCS_EDGE_INSERTION")?,
                    alpha: params.get_f64_or("GCS_ALPHA", defaults.alpha)?,
                    error_minimising: params.get_bool_or("GCS_ERROR_MINIMISING", defaults.error_minimising)?,
                })
            }
            AlgorithmKind::Ng => AlgorithmConfig::Ng(NgConfig {
                nodes: params.get_usize("NG_NODES")?,
                schedule: ScheduleConfig {
                    neighbourhood_initial: params.get_f64("NG_NEIGHBOURHOOD_INITIAL")?,
                    neighbourhood_final: params.get_f64("NG_NEIGHBOURHOOD_FINAL")?,
                    learning_initial: params.get_f64("NG_LEARNING_INITIAL")?,
                    learning_final: params.get_f64("NG_LEARNING_FINAL")?,
                },
            }),
            AlgorithmKind::Som => AlgorithmConfig::Som(SomConfig {
                rows: params.get_usize("SOM_ROWS")?,
                columns: params.get_usize("SOM_COLUMNS")?,
                schedule: ScheduleConfig {
                    neighbourhood_initial: params.get_f64("SOM_NEIGHBOURHOOD_INITIAL")?,
                    neighbourhood_final: params.get_f64("SOM_NEIGHBOURHOOD_FINAL")?,
                    learning_initial: params.get_f64("SOM_LEARNING_INITIAL")?,
                    learning_final: params.get_f64("SOM_LEARNING_FINAL")?,
                },
            }),
        };

        let config = Self {
            run,
            algorithm,
            initial_positions: None,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Settings shared by every algorithm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of full passes over the inputs.
    /// Default: 10.
    pub epochs: usize,

    /// Minkowski power of the distance metric (2 = squared Euclidean).
    /// Default: 2.0.
    pub minkowski_power: f64,

    /// Deal inputs in file order and place initial nodes on a fixed
    /// diagonal instead of at random.
    /// Default: false.
    pub deterministic: bool,

    /// Random seed for initialisation and shuffling.
    /// Default: None (random).
    pub seed: Option<u64>,

    /// Iterations between progress snapshots.
    /// Default: 100.
    pub display_stride: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            epochs: 10,
            minkowski_power: 2.0,
            deterministic: false,
            seed: None,
            display_stride: 100,
        }
    }
}

impl RunConfig {
    fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(TopogasError::invalid("EPOCH must be at least 1"));
        }
        if self.minkowski_power.is_nan() || self.minkowski_power <= 0.0 {
            return Err(TopogasError::invalid(format!(
                "MINKOWSKI must be positive, got {}",
                self.minkowski_power
            )));
        }
        if self.display_stride == 0 {
            return Err(TopogasError::invalid("DISPLAY_UPDATE_RATE must be at least 1"));
        }
        Ok(())
    }
}

/// Which network to train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlgorithmKind {
    /// Competitive learning, winner take all.
    Cl,
    /// Growing Neural Gas.
    Gng,
    /// Growing Cell Structures.
    Gcs,
    /// Neural Gas.
    Ng,
    /// Self-Organising Map.
    Som,
}

impl AlgorithmKind {
    /// Every kind, in display order.
    pub const ALL: [AlgorithmKind; 5] = [
        AlgorithmKind::Cl,
        AlgorithmKind::Gng,
        AlgorithmKind::Gcs,
        AlgorithmKind::Ng,
        AlgorithmKind::Som,
    ];

    /// Parameter-file name.
    pub fn name(&self) -> &'static str {
        match self {
            AlgorithmKind::Cl => "CL",
            AlgorithmKind::Gng => "GNG",
            AlgorithmKind::Gcs => "GCS",
            AlgorithmKind::Ng => "NG",
            AlgorithmKind::Som => "SOM",
        }
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AlgorithmKind {
    type Err = TopogasError;

    fn from_str(s: &str) -> Result<Self> {
        AlgorithmKind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| TopogasError::invalid(format!("unknown algorithm '{}'", s)))
    }
}

/// Algorithm selection plus its parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AlgorithmConfig {
    /// Competitive learning.
    Cl(ClConfig),
    /// Growing Neural Gas.
    Gng(GngConfig),
    /// Growing Cell Structures.
    Gcs(GcsConfig),
    /// Neural Gas.
    Ng(NgConfig),
    /// Self-Organising Map.
    Som(SomConfig),
}

impl AlgorithmConfig {
    /// The selected kind.
    pub fn kind(&self) -> AlgorithmKind {
        match self {
            AlgorithmConfig::Cl(_) => AlgorithmKind::Cl,
            AlgorithmConfig::Gng(_) => AlgorithmKind::Gng,
            AlgorithmConfig::Gcs(_) => AlgorithmKind::Gcs,
            AlgorithmConfig::Ng(_) => AlgorithmKind::Ng,
            AlgorithmConfig::Som(_) => AlgorithmKind::Som,
        }
    }

    /// Default parameters for `kind`.
    pub fn default_for(kind: AlgorithmKind) -> Self {
        match kind {
            AlgorithmKind::Cl => AlgorithmConfig::Cl(ClConfig::default()),
            AlgorithmKind::Gng => AlgorithmConfig::Gng(GngConfig::default()),
            AlgorithmKind::Gcs => AlgorithmConfig::Gcs(GcsConfig::default()),
            AlgorithmKind::Ng => AlgorithmConfig::Ng(NgConfig::default()),
            AlgorithmKind::Som => AlgorithmConfig::Som(SomConfig::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            AlgorithmConfig::Cl(c) => {
                at_least("CL_NODES", c.nodes, 1)?;
                unit_rate("CL_LEARNING_RATE", c.learning_rate)
            }
            AlgorithmConfig::Gng(c) => {
                at_least("GNG_NODES", c.max_nodes, 2)?;
                unit_rate("GNG_BMU_LEARNING_RATE", c.winner_rate)?;
                unit_rate("GNG_NEIGHBOUR_LEARNING_RATE", c.neighbour_rate)?;
                at_least("GNG_NODE_INSERTION", c.insertion_period as usize, 1)?;
                at_least("GNG_EDGE_DELETION", c.max_edge_age as usize, 1)?;
                fraction("GNG_ALPHA", c.alpha)?;
                fraction("GNG_BETA", c.beta)
            }
            AlgorithmConfig::Gcs(c) => {
                at_least("GCS_NODES", c.max_nodes, 3)?;
                unit_rate("GCS_BMU_LEARNING_RATE", c.winner_rate)?;
                unit_rate("GCS_NEIGHBOUR_LEARNING_RATE", c.neighbour_rate)?;
                at_least("GCS_EDGE_INSERTION", c.insertion_period as usize, 1)?;
                at_least("GCS_NODE_DELETION", c.pruning_period as usize, 1)?;
                fraction("GCS_ALPHA", c.alpha)
            }
            AlgorithmConfig::Ng(c) => {
                at_least("NG_NODES", c.nodes, 1)?;
                c.schedule.validate("NG")
            }
            AlgorithmConfig::Som(c) => {
                at_least("SOM_ROWS", c.rows, 1)?;
                at_least("SOM_COLUMNS", c.columns, 1)?;
                c.node_count()?;
                c.schedule.validate("SOM")
            }
        }
    }
}

/// Competitive learning parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClConfig {
    /// Number of nodes.
    /// Default: 10.
    pub nodes: usize,

    /// Winner learning rate.
    /// Default: 0.05.
    pub learning_rate: f64,
}

impl Default for ClConfig {
    fn default() -> Self {
        Self {
            nodes: 10,
            learning_rate: 0.05,
        }
    }
}

/// Growing Neural Gas parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GngConfig {
    /// Maximum number of nodes.
    /// Default: 100.
    pub max_nodes: usize,

    /// Learning rate of the winner.
    /// Default: 0.2.
    pub winner_rate: f64,

    /// Learning rate of the winner's neighbours.
    /// Default: 0.006.
    pub neighbour_rate: f64,

    /// Iterations between node insertions.
    /// Default: 100.
    pub insertion_period: u64,

    /// Edges older than this are deleted.
    /// Default: 50.
    pub max_edge_age: u32,

    /// Error reduction of the two nodes around an insertion.
    /// Default: 0.003.
    pub alpha: f64,

    /// Factor every error is multiplied by after each step.
    /// Default: 0.001.
    pub beta: f64,
}

impl Default for GngConfig {
    fn default() -> Self {
        Self {
            max_nodes: 100,
            winner_rate: 0.2,
            neighbour_rate: 0.006,
            insertion_period: 100,
            max_edge_age: 50,
            alpha: 0.003,
            beta: 0.001,
        }
    }
}

/// Growing Cell Structures parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcsConfig {
    /// Growth stops once the node count exceeds this.
    /// Default: 100.
    pub max_nodes: usize,

    /// Learning rate of the winner.
    /// Default: 0.06.
    pub winner_rate: f64,

    /// Learning rate of the winner's neighbours.
    /// Default: 0.002.
    pub neighbour_rate: f64,

    /// Iterations between growth phases.
    /// Default: 100.
    pub insertion_period: u64,

    /// Iterations between pruning phases.
    /// Default: 1000.
    pub pruning_period: u64,

    /// Signal counter decay per step.
    /// Default: 0.02.
    pub alpha: f64,

    /// Add the winning distance to the signal counter instead of 1.
    /// Default: false.
    pub error_minimising: bool,
}

impl Default for GcsConfig {
    fn default() -> Self {
        Self {
            max_nodes: 100,
            winner_rate: 0.06,
            neighbour_rate: 0.002,
            insertion_period: 100,
            pruning_period: 1000,
            alpha: 0.02,
            error_minimising: false,
        }
    }
}

/// Exponential decay endpoints shared by NG and SOM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Neighbourhood width at the start.
    /// Default: 10.0.
    pub neighbourhood_initial: f64,

    /// Neighbourhood width at the end.
    /// Default: 0.01.
    pub neighbourhood_final: f64,

    /// Learning rate at the start.
    /// Default: 0.5.
    pub learning_initial: f64,

    /// Learning rate at the end.
    /// Default: 0.005.
    pub learning_final: f64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            neighbourhood_initial: 10.0,
            neighbourhood_final: 0.01,
            learning_initial: 0.5,
            learning_final: 0.005,
        }
    }
}

impl ScheduleConfig {
    fn validate(&self, prefix: &str) -> Result<()> {
        for (name, value) in [
            ("NEIGHBOURHOOD_INITIAL", self.neighbourhood_initial),
            ("NEIGHBOURHOOD_FINAL", self.neighbourhood_final),
            ("LEARNING_INITIAL", self.learning_initial),
            ("LEARNING_FINAL", self.learning_final),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(TopogasError::invalid(format!(
                    "{}_{} must be positive, got {}",
                    prefix, name, value
                )));
            }
        }
        Ok(())
    }
}

/// Neural Gas parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NgConfig {
    /// Number of nodes.
    /// Default: 10.
    pub nodes: usize,

    /// Decay endpoints.
    pub schedule: ScheduleConfig,
}

impl Default for NgConfig {
    fn default() -> Self {
        Self {
            nodes: 10,
            schedule: ScheduleConfig::default(),
        }
    }
}

/// Self-Organising Map parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SomConfig {
    /// Lattice rows.
    /// Default: 10.
    pub rows: usize,

    /// Lattice columns.
    /// Default: 10.
    pub columns: usize,

    /// Decay endpoints. The neighbourhood is measured in lattice steps.
    pub schedule: ScheduleConfig,
}

impl Default for SomConfig {
    fn default() -> Self {
        Self {
            rows: 10,
            columns: 10,
            schedule: ScheduleConfig {
                neighbourhood_initial: 5.0,
                neighbourhood_final: 0.5,
                ..ScheduleConfig::default()
            },
        }
    }
}

impl SomConfig {
    /// Number of lattice nodes, `rows * columns`.
    ///
    /// Fails with `InvalidParameter` when the product overflows.
    pub fn node_count(&self) -> Result<usize> {
        self.rows.checked_mul(self.columns).ok_or_else(|| {
            TopogasError::invalid(format!(
                "SOM lattice {}x{} is too large",
                self.rows, self.columns
            ))
        })
    }
}

fn at_least(key: &str, value: usize, min: usize) -> Result<()> {
    if value < min {
        return Err(TopogasError::invalid(format!(
            "{} must be at least {}, got {}",
            key, min, value
        )));
    }
    Ok(())
}

fn unit_rate(key: &str, value: f64) -> Result<()> {
    if !(value > 0.0 && value <= 1.0) {
        return Err(TopogasError::invalid(format!(
            "{} must be in (0, 1], got {}",
            key, value
        )));
    }
    Ok(())
}

fn fraction(key: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(TopogasError::invalid(format!(
            "{} must be in [0, 1], got {}",
            key, value
        )));
    }
    Ok(())
}

/// Flat `KEY -> value` parameters, as found in parameter files.
///
/// Values may be JSON numbers, booleans or strings; strings are parsed on
/// access so property-style files (`"EPOCH": "10"`) work too.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterMap {
    values: BTreeMap<String, Value>,
}

impl ParameterMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every key with its default value, for all algorithms.
    pub fn defaults() -> Self {
        let run = RunConfig::default();
        let cl = ClConfig::default();
        let gng = GngConfig::default();
        let gcs = GcsConfig::default();
        let ng = NgConfig::default();
        let som = SomConfig::default();

        let mut map = Self::new();
        map.insert("ALGORITHM", AlgorithmKind::Gng.name());
        map.insert("EPOCH", run.epochs);
        map.insert("MINKOWSKI", run.minkowski_power);
        map.insert("DEBUG", run.deterministic);
        map.insert("DISPLAY_UPDATE_RATE", run.display_stride);
        map.insert("DIMENSIONALITY", 2);
        map.insert("LABELLED", false);
        map.insert("NORMALISED", false);

        map.insert("CL_NODES", cl.nodes);
        map.insert("CL_LEARNING_RATE", cl.learning_rate);

        map.insert("GNG_NODES", gng.max_nodes);
        map.insert("GNG_BMU_LEARNING_RATE", gng.winner_rate);
        map.insert("GNG_NEIGHBOUR_LEARNING_RATE", gng.neighbour_rate);
        map.insert("GNG_NODE_INSERTION", gng.insertion_period);
        map.insert("GNG_EDGE_DELETION", gng.max_edge_age);
        map.insert("GNG_ALPHA", gng.alpha);
        map.insert("GNG_BETA", gng.beta);

        map.insert("GCS_NODES", gcs.max_nodes);
        map.insert("GCS_BMU_LEARNING_RATE", gcs.winner_rate);
        map.insert("GCS_NEIGHBOUR_LEARNING_RATE", gcs.neighbour_rate);
        map.insert("GCS_NODE_DELETION", gcs.pruning_period);
        map.insert("GCS_EDGE_INSERTION", gcs.insertion_period);
        map.insert("GCS_ALPHA", gcs.alpha);
        map.insert("GCS_ERROR_MINIMISING", gcs.error_minimising);

        map.insert("NG_NODES", ng.nodes);
        map.insert("NG_NEIGHBOURHOOD_INITIAL", ng.schedule.neighbourhood_initial);
        map.insert("NG_NEIGHBOURHOOD_FINAL", ng.schedule.neighbourhood_final);
        map.insert("NG_LEARNING_INITIAL", ng.schedule.learning_initial);
        map.insert("NG_LEARNING_FINAL", ng.schedule.learning_final);

        map.insert("SOM_ROWS", som.rows);
        map.insert("SOM_COLUMNS", som.columns);
        map.insert("SOM_NEIGHBOURHOOD_INITIAL", som.schedule.neighbourhood_initial);
        map.insert("SOM_NEIGHBOURHOOD_FINAL", som.schedule.neighbourhood_final);
        map.insert("SOM_LEARNING_INITIAL", som.schedule.learning_initial);
        map.insert("SOM_LEARNING_FINAL", som.schedule.learning_final);
        map
    }

    /// Loads a JSON object of parameters.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parses a JSON object of parameters.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Sets a value, replacing any previous one.
    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.values.insert(key.to_string(), value.into());
    }

    /// Applies a `KEY=VALUE` override. The value is kept as text.
    pub fn set_override(&mut self, assignment: &str) -> Result<()> {
        let (key, value) = assignment.split_once('=').ok_or_else(|| {
            TopogasError::invalid(format!("override '{}' is not KEY=VALUE", assignment))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(TopogasError::invalid(format!("override '{}' has no key", assignment)));
        }
        self.insert(key, value.trim());
        Ok(())
    }

    /// Copies every entry of `other` over this map.
    pub fn merge(&mut self, other: ParameterMap) {
        self.values.extend(other.values);
    }

    /// Raw value lookup.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Pretty JSON form.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Required string value.
    pub fn get_str(&self, key: &str) -> Result<&str> {
        match self.require(key)? {
            Value::String(s) => Ok(s),
            other => Err(wrong_type(key, "a string", other)),
        }
    }

    /// Required floating point value.
    pub fn get_f64(&self, key: &str) -> Result<f64> {
        match self.require(key)? {
            Value::Number(n) => n.as_f64().ok_or_else(|| wrong_type(key, "a number", &Value::Number(n.clone()))),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| wrong_type(key, "a number", &Value::String(s.clone()))),
            other => Err(wrong_type(key, "a number", other)),
        }
    }

    /// Optional floating point value.
    pub fn get_f64_or(&self, key: &str, default: f64) -> Result<f64> {
        if self.values.contains_key(key) {
            self.get_f64(key)
        } else {
            Ok(default)
        }
    }

    /// Required non-negative integer.
    pub fn get_u64(&self, key: &str) -> Result<u64> {
        match self.require(key)? {
            Value::Number(n) => n.as_u64().ok_or_else(|| wrong_type(key, "a non-negative integer", &Value::Number(n.clone()))),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| wrong_type(key, "a non-negative integer", &Value::String(s.clone()))),
            other => Err(wrong_type(key, "a non-negative integer", other)),
        }
    }

    /// Optional non-negative integer.
    pub fn get_u64_or(&self, key: &str, default: u64) -> Result<u64> {
        Ok(self.get_u64_opt(key)?.unwrap_or(default))
    }

    /// Optional non-negative integer, `None` when absent.
    pub fn get_u64_opt(&self, key: &str) -> Result<Option<u64>> {
        if self.values.contains_key(key) {
            self.get_u64(key).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Required count.
    pub fn get_usize(&self, key: &str) -> Result<usize> {
        let value = self.get_u64(key)?;
        usize::try_from(value).map_err(|_| TopogasError::invalid(format!("{} is too large: {}", key, value)))
    }

    /// Required boolean. Accepts `true`/`false` in any case as text.
    pub fn get_bool(&self, key: &str) -> Result<bool> {
        match self.require(key)? {
            Value::Bool(b) => Ok(*b),
            Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Ok(true),
            Value::String(s) if s.trim().eq_ignore_ascii_case("false") => Ok(false),
            other => Err(wrong_type(key, "a boolean", other)),
        }
    }

    /// Optional boolean.
    pub fn get_bool_or(&self, key: &str, default: bool) -> Result<bool> {
        if self.values.contains_key(key) {
            self.get_bool(key)
        } else {
            Ok(default)
        }
    }

    fn require(&self, key: &str) -> Result<&Value> {
        self.values
            .get(key)
            .ok_or_else(|| TopogasError::invalid(format!("missing parameter {}", key)))
    }
}

fn wrong_type(key: &str, expected: &str, found: &Value) -> TopogasError {
    TopogasError::invalid(format!("{} must be {}, got {}", key, expected, found))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        for kind in AlgorithmKind::ALL {
            let c = Config::new(AlgorithmConfig::default_for(kind));
            assert!(c.validate().is_ok(), "{} defaults", kind);
        }
    }

    #[test]
    fn test_defaults_round_trip_through_parameters() {
        let mut params = ParameterMap::defaults();
        for kind in AlgorithmKind::ALL {
            params.insert("ALGORITHM", kind.name());
            let config = Config::from_parameters(&params).unwrap();
            assert_eq!(config.algorithm.kind(), kind);
        }
    }

    #[test]
    fn test_string_values_are_parsed() {
        let mut params = ParameterMap::defaults();
        params.set_override("ALGORITHM=som").unwrap();
        params.set_override("EPOCH = 3").unwrap();
        params.set_override("SOM_ROWS=4").unwrap();
        params.set_override("DEBUG=TRUE").unwrap();
        let config = Config::from_parameters(&params).unwrap();
        assert_eq!(config.run.epochs, 3);
        assert!(config.run.deterministic);
        match config.algorithm {
            AlgorithmConfig::Som(som) => assert_eq!(som.rows, 4),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_missing_parameter_fails_fast() {
        let mut params = ParameterMap::new();
        params.insert("ALGORITHM", "CL");
        params.insert("EPOCH", 1);
        params.insert("MINKOWSKI", 2.0);
        params.insert("CL_NODES", 3);
        let err = Config::from_parameters(&params).unwrap_err();
        assert!(err.to_string().contains("CL_LEARNING_RATE"));
    }

    #[test]
    fn test_out_of_domain_rejected() {
        let mut params = ParameterMap::defaults();
        params.insert("MINKOWSKI", 0.0);
        assert!(Config::from_parameters(&params).is_err());

        let mut params = ParameterMap::defaults();
        params.insert("GNG_BMU_LEARNING_RATE", 1.5);
        assert!(Config::from_parameters(&params).is_err());

        let mut params = ParameterMap::defaults();
        params.insert("GNG_NODES", "many");
        assert!(matches!(
            Config::from_parameters(&params),
            Err(TopogasError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_edge_age_must_fit() {
        let mut params = ParameterMap::defaults();
        params.insert("ALGORITHM", "GNG");
        params.insert("GNG_EDGE_DELETION", u64::from(u32::MAX) + 1);
        assert!(matches!(
            Config::from_parameters(&params),
            Err(TopogasError::InvalidParameter(_))
        ));

        params.insert("GNG_EDGE_DELETION", u64::from(u32::MAX));
        match Config::from_parameters(&params).unwrap().algorithm {
            AlgorithmConfig::Gng(c) => assert_eq!(c.max_edge_age, u32::MAX),
            other => panic!("unexpected {:?}", other.kind()),
        }
    }

    #[test]
    fn test_lattice_overflow_rejected() {
        let config = Config::new(AlgorithmConfig::Som(SomConfig {
            rows: usize::MAX,
            columns: 2,
            ..SomConfig::default()
        }));
        assert!(matches!(config.validate(), Err(TopogasError::InvalidParameter(_))));

        let som = SomConfig {
            rows: 4,
            columns: 5,
            ..SomConfig::default()
        };
        assert_eq!(som.node_count().unwrap(), 20);
    }

    #[test]
    fn test_unknown_algorithm() {
        assert!("gng".parse::<AlgorithmKind>().is_ok());
        assert!("kohonen".parse::<AlgorithmKind>().is_err());
    }

    #[test]
    fn test_bad_override() {
        let mut params = ParameterMap::new();
        assert!(params.set_override("NO_EQUALS").is_err());
        assert!(params.set_override("=3").is_err());
    }

    #[test]
    fn test_typed_config_serializes() {
        let config = Config::new(AlgorithmConfig::Gcs(GcsConfig::default()));
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"kind\":\"gcs\""));
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.algorithm.kind(), AlgorithmKind::Gcs);
    }
}
