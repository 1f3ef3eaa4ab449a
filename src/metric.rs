//! Vector arithmetic used by every network: Minkowski distance and midpoints.
//!
//! The power-2 case returns the *squared* Euclidean distance. Winner
//! selection ranks on that value; error accumulation and SSE square it
//! once more.

use crate::error::{Result, TopogasError};
use serde::{Deserialize, Serialize};

/// Powers at or above this value select the Chebyshev (L-infinity) distance.
pub const CHEBYSHEV_THRESHOLD: f64 = 99.9;

/// Computes the Minkowski distance of order `power` between `a` and `b`.
///
/// - `power == 2.0`: sum of squared differences, no square root.
/// - `power >= 99.9`: maximum absolute difference.
/// - otherwise `(Σ|aᵢ - bᵢ|^p)^(1/p)`.
///
/// Fails with `InvalidParameter` for non-positive (or NaN) powers and with
/// `DimensionMismatch` when the slices differ in length.
pub fn minkowski(power: f64, a: &[f64], b: &[f64]) -> Result<f64> {
    check_power(power)?;
    check_dims(a, b)?;
    Ok(distance_unchecked(power, a, b))
}

/// Elementwise average of `a` and `b`.
pub fn midpoint(a: &[f64], b: &[f64]) -> Result<Vec<f64>> {
    check_dims(a, b)?;
    Ok(a.iter().zip(b).map(|(x, y)| (x + y) / 2.0).collect())
}

fn check_power(power: f64) -> Result<()> {
    if power.is_nan() || power <= 0.0 {
        return Err(TopogasError::invalid(format!(
            "Minkowski power must be positive, got {}",
            power
        )));
    }
    Ok(())
}

#[inline]
fn check_dims(a: &[f64], b: &[f64]) -> Result<()> {
    if a.len() != b.len() {
        return Err(TopogasError::dimension(a.len(), b.len()));
    }
    Ok(())
}

#[inline]
fn distance_unchecked(power: f64, a: &[f64], b: &[f64]) -> f64 {
    let diffs = a.iter().zip(b).map(|(x, y)| (x - y).abs());
    if power == 2.0 {
        diffs.map(|d| d * d).sum()
    } else if power >= CHEBYSHEV_THRESHOLD {
        diffs.fold(0.0, f64::max)
    } else {
        diffs.map(|d| d.powf(power)).sum::<f64>().powf(1.0 / power)
    }
}

/// A validated Minkowski power.
///
/// Networks build one of these at construction so that a bad power is
/// rejected once, before training starts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    power: f64,
}

impl Metric {
    /// Squared Euclidean distance (power 2).
    pub const SQUARED_EUCLIDEAN: Metric = Metric { power: 2.0 };

    /// Creates a metric, failing with `InvalidParameter` on a bad power.
    pub fn new(power: f64) -> Result<Self> {
        check_power(power)?;
        Ok(Self { power })
    }

    /// The Minkowski power.
    #[inline]
    pub fn power(&self) -> f64 {
        self.power
    }

    /// Distance between two vectors of equal length.
    #[inline]
    pub fn distance(&self, a: &[f64], b: &[f64]) -> Result<f64> {
        check_dims(a, b)?;
        Ok(distance_unchecked(self.power, a, b))
    }
}

impl Default for Metric {
    fn default() -> Self {
        Self::SQUARED_EUCLIDEAN
    }
}

/// Moves `position` toward `target` by `rate`: `p += rate * (t - p)`.
#[inline]
pub fn move_toward(position: &mut [f64], target: &[f64], rate: f64) {
    for (p, t) in position.iter_mut().zip(target) {
        *p += rate * (t - *p);
    }
}
