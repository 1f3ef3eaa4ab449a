//! Time-decayed parameters for Neural Gas and the SOM.

use crate::config::ScheduleConfig;

/// `initial * (final / initial)^t` for `t` in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialDecay {
    initial: f64,
    final_value: f64,
}

impl ExponentialDecay {
    /// Creates a decay between two positive endpoints.
    pub fn new(initial: f64, final_value: f64) -> Self {
        Self {
            initial,
            final_value,
        }
    }

    /// Value at run fraction `t`, clamped to [0, 1].
    #[inline]
    pub fn at(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        self.initial * (self.final_value / self.initial).powf(t)
    }
}

/// Neighbourhood width and learning rate over a run of `total` steps.
#[derive(Debug, Clone, Copy)]
pub struct Schedule {
    neighbourhood: ExponentialDecay,
    learning: ExponentialDecay,
    total: u64,
}

impl Schedule {
    /// Builds a schedule that reaches its final values after `total` steps.
    pub fn new(config: &ScheduleConfig, total: u64) -> Self {
        Self {
            neighbourhood: ExponentialDecay::new(config.neighbourhood_initial, config.neighbourhood_final),
            learning: ExponentialDecay::new(config.learning_initial, config.learning_final),
            total,
        }
    }

    /// Fraction of the run completed at `iteration`.
    #[inline]
    pub fn fraction(&self, iteration: u64) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        iteration as f64 / self.total as f64
    }

    /// Neighbourhood width at `iteration`.
    #[inline]
    pub fn neighbourhood(&self, iteration: u64) -> f64 {
        self.neighbourhood.at(self.fraction(iteration))
    }

    /// Learning rate at `iteration`.
    #[inline]
    pub fn learning_rate(&self, iteration: u64) -> f64 {
        self.learning.at(self.fraction(iteration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        let decay = ExponentialDecay::new(10.0, 0.1);
        assert!((decay.at(0.0) - 10.0).abs() < 1e-10);
        assert!((decay.at(1.0) - 0.1).abs() < 1e-10);
        assert!((decay.at(0.5) - 1.0).abs() < 1e-10);
        assert!((decay.at(2.0) - 0.1).abs() < 1e-10);
    }

    #[test]
    fn test_schedule_is_non_increasing() {
        let config = ScheduleConfig {
            neighbourhood_initial: 5.0,
            neighbourhood_final: 0.5,
            learning_initial: 0.5,
            learning_final: 0.5,
        };
        let schedule = Schedule::new(&config, 200);
        let mut last = (f64::INFINITY, f64::INFINITY);
        for i in 0..=200 {
            let now = (schedule.neighbourhood(i), schedule.learning_rate(i));
            assert!(now.0 <= last.0 + 1e-12);
            assert!(now.1 <= last.1 + 1e-12);
            last = now;
        }
        assert!((schedule.neighbourhood(200) - 0.5).abs() < 1e-10);
    }
}
