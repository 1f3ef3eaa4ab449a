//! Whitespace-separated data files.
//!
//! A file is a flat stream of tokens. Every `dimension` numeric tokens form
//! one vector, optionally followed by a single label token. Line breaks carry
//! no meaning, so a record may span lines.

use super::{Inputs, Vector};
use crate::config::ParameterMap;
use crate::error::{Result, TopogasError};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How to read a data file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Coordinates per vector.
    /// Default: 2.
    pub dimension: usize,

    /// Whether each record ends with a label token.
    /// Default: false.
    pub labelled: bool,

    /// Rescale every attribute into [0, 1] with per-attribute min/max.
    /// Default: false.
    pub normalise: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            dimension: 2,
            labelled: false,
            normalise: false,
        }
    }
}

impl LoadOptions {
    /// Reads `DIMENSIONALITY`, `LABELLED` and `NORMALISED`, falling back to
    /// the defaults for absent keys.
    pub fn from_parameters(params: &ParameterMap) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            dimension: params.get_u64_or("DIMENSIONALITY", defaults.dimension as u64)? as usize,
            labelled: params.get_bool_or("LABELLED", defaults.labelled)?,
            normalise: params.get_bool_or("NORMALISED", defaults.normalise)?,
        })
    }
}

/// Reads a data file into a shared input set.
pub fn load_vectors<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<Inputs> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let vectors = parse_vectors(&text, options).map_err(|e| match e {
        TopogasError::Parse { message, .. } => TopogasError::Parse {
            path: path.to_path_buf(),
            message,
        },
        other => other,
    })?;
    info!("Loaded {} vectors of dimension {} from {}", vectors.len(), options.dimension, path.display());
    Ok(vectors.into())
}

/// Parses data-file text. Parse errors carry an empty path.
pub fn parse_vectors(text: &str, options: &LoadOptions) -> Result<Vec<Vector>> {
    if options.dimension == 0 {
        return Err(TopogasError::invalid("dimension must be at least 1"));
    }
    let stride = options.dimension + usize::from(options.labelled);
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() % stride != 0 {
        return Err(parse_error(format!(
            "{} tokens do not divide into records of {}",
            tokens.len(),
            stride
        )));
    }

    let mut vectors = Vec::with_capacity(tokens.len() / stride);
    for (ordinal, record) in tokens.chunks(stride).enumerate() {
        let position = record[..options.dimension]
            .iter()
            .map(|t| {
                t.parse::<f64>().map_err(|_| {
                    parse_error(format!("record {}: '{}' is not a number", ordinal, t))
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        let label = if options.labelled {
            record[options.dimension].to_string()
        } else {
            ordinal.to_string()
        };
        vectors.push(Vector::labelled(position, label));
    }

    if options.normalise {
        normalise(&mut vectors, options.dimension);
    }
    Ok(vectors)
}

/// Per-attribute min-max rescaling. Constant attributes map to 0.
fn normalise(vectors: &mut [Vector], dimension: usize) {
    let mut min = vec![f64::INFINITY; dimension];
    let mut max = vec![f64::NEG_INFINITY; dimension];
    for v in vectors.iter() {
        for (j, x) in v.position.iter().enumerate() {
            min[j] = min[j].min(*x);
            max[j] = max[j].max(*x);
        }
    }
    for v in vectors.iter_mut() {
        for (j, x) in v.position.iter_mut().enumerate() {
            let range = max[j] - min[j];
            *x = if range > 0.0 { (*x - min[j]) / range } else { 0.0 };
        }
    }
}

/// Arithmetic mean of a set of vectors, or `None` if it is empty.
pub fn mean(vectors: &[Vector]) -> Option<Vec<f64>> {
    let first = vectors.first()?;
    let mut sum = vec![0.0; first.dimension()];
    for v in vectors {
        for (s, x) in sum.iter_mut().zip(&v.position) {
            *s += x;
        }
    }
    let n = vectors.len() as f64;
    Some(sum.into_iter().map(|s| s / n).collect())
}

fn parse_error(message: String) -> TopogasError {
    TopogasError::Parse {
        path: Default::default(),
        message,
    }
}
