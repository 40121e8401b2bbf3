//! Configuration options for the CFR solver.
//!
//! This module provides the configuration struct that selects the learner
//! variant and its diagnostics cadence, plus the statistics a run records.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::Result;

/// Default number of CFR iterations.
pub const DEFAULT_ITERATIONS: u64 = 1000;

/// Which CFR variant to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CfrMode {
    /// Learn a strategy for `player` against an opponent playing uniformly.
    ///
    /// Tables are kept only for `player`'s information sets.
    Single {
        /// Target player id.
        player: String,
    },
    /// Both players learn simultaneously from one set of tables.
    Dual,
}

/// Configuration for the CFR solver.
///
/// # Example
/// ```
/// use efg_solver::cfr::{CFRConfig, CfrMode};
///
/// let config = CFRConfig::default();
/// assert_eq!(config.mode, CfrMode::Dual);
/// assert_eq!(config.iterations, 1000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CFRConfig {
    /// Learner variant.
    pub mode: CfrMode,

    /// Number of iterations run by [`CFRSolver::train_configured`].
    ///
    /// [`CFRSolver::train_configured`]: crate::cfr::CFRSolver::train_configured
    pub iterations: u64,

    /// Record the Nash gap of the average strategy every this many
    /// iterations.
    ///
    /// Each measurement walks the tree twice, so measuring every iteration
    /// makes a run quadratic in its length. `None` only measures once, when
    /// training ends.
    pub nash_gap_interval: Option<u64>,

    /// Random seed for sampled playouts.
    ///
    /// If `None`, playouts are seeded from entropy.
    pub seed: Option<u64>,
}

impl Default for CFRConfig {
    fn default() -> Self {
        Self {
            mode: CfrMode::Dual,
            iterations: DEFAULT_ITERATIONS,
            nash_gap_interval: None,
            seed: None,
        }
    }
}

impl CFRConfig {
    /// Create a new CFRConfig with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simultaneous dual-player CFR.
    pub fn dual() -> Self {
        Self::default()
    }

    /// CFR for `player` against a uniform opponent.
    pub fn single(player: impl Into<String>) -> Self {
        Self {
            mode: CfrMode::Single {
                player: player.into(),
            },
            ..Default::default()
        }
    }

    /// Load a configuration from a JSON file.
    ///
    /// Missing fields take their default values.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Builder method: set the number of iterations.
    pub fn with_iterations(mut self, iterations: u64) -> Self {
        self.iterations = iterations;
        self
    }

    /// Builder method: measure the Nash gap every `interval` iterations.
    pub fn with_nash_gap_interval(mut self, interval: u64) -> Self {
        self.nash_gap_interval = Some(interval);
        self
    }

    /// Builder method: set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validate the configuration and return any errors.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.iterations == 0 {
            return Err(ConfigError::NoIterations);
        }
        if self.nash_gap_interval == Some(0) {
            return Err(ConfigError::ZeroInterval);
        }
        if let CfrMode::Single { player } = &self.mode {
            if player.is_empty() {
                return Err(ConfigError::EmptyPlayer);
            }
        }
        Ok(())
    }
}

/// Errors that can occur when validating CFR configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The iteration count is zero.
    #[error("iteration count must be positive")]
    NoIterations,
    /// The Nash gap interval is zero.
    #[error("Nash gap interval must be positive")]
    ZeroInterval,
    /// Single-player mode without a target player.
    #[error("single-player mode needs a target player")]
    EmptyPlayer,
}

/// Statistics tracked during CFR training.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CFRStats {
    /// Total number of iterations completed.
    pub iterations: u64,

    /// Number of information sets with tables.
    pub info_sets: usize,

    /// Total time spent training (in seconds).
    pub elapsed_seconds: f64,

    /// Iterations per second.
    pub iterations_per_second: f64,

    /// Players whose root utilities are recorded, in column order.
    pub players: Vec<String>,

    /// Root utility of every iteration, one column per entry of `players`.
    pub utilities: Vec<Vec<f64>>,

    /// Latest Nash gap of the average strategy (if calculated).
    pub nash_gap: Option<f64>,

    /// History of Nash gap measurements.
    pub nash_gap_history: Vec<NashGapPoint>,
}

/// A single Nash gap measurement at a specific iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NashGapPoint {
    /// Iteration number when this measurement was taken.
    pub iteration: u64,
    /// Nash gap of the average strategy.
    pub nash_gap: f64,
}

impl CFRStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update iterations per second based on elapsed time.
    pub fn update_rate(&mut self) {
        if self.elapsed_seconds > 0.0 {
            self.iterations_per_second = self.iterations as f64 / self.elapsed_seconds;
        }
    }

    /// Record a Nash gap measurement.
    pub fn record_nash_gap(&mut self, iteration: u64, nash_gap: f64) {
        self.nash_gap = Some(nash_gap);
        if self.nash_gap_history.last().map(|p| p.iteration) != Some(iteration) {
            self.nash_gap_history.push(NashGapPoint {
                iteration,
                nash_gap,
            });
        }
    }

    /// Utility series of one player.
    ///
    /// `None` if the player is not recorded or a row lacks its column.
    pub fn utility_series(&self, player: &str) -> Option<Vec<f64>> {
        let column = self.players.iter().position(|p| p == player)?;
        self.utilities.iter().map(|u| u.get(column).copied()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(CFRConfig::default().validate().is_ok());
        assert_eq!(
            CFRConfig::default().with_iterations(0).validate(),
            Err(ConfigError::NoIterations)
        );
        assert_eq!(
            CFRConfig::single("1").with_nash_gap_interval(0).validate(),
            Err(ConfigError::ZeroInterval)
        );
        assert_eq!(CFRConfig::single("").validate(), Err(ConfigError::EmptyPlayer));
    }

    #[test]
    fn test_json_defaults() {
        let config: CFRConfig =
            serde_json::from_str(r#"{"mode": {"type": "single", "player": "2"}}"#).unwrap();

        assert_eq!(config.mode, CfrMode::Single { player: "2".to_string() });
        assert_eq!(config.iterations, DEFAULT_ITERATIONS);
        assert_eq!(config.nash_gap_interval, None);

        let json = serde_json::to_string(&CFRConfig::dual().with_seed(7)).unwrap();
        let back: CFRConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.seed, Some(7));
    }

    #[test]
    fn test_nash_gap_history() {
        let mut stats = CFRStats::new();
        stats.record_nash_gap(10, 0.5);
        stats.record_nash_gap(20, 0.25);
        stats.record_nash_gap(20, 0.25);

        assert_eq!(stats.nash_gap, Some(0.25));
        assert_eq!(stats.nash_gap_history.len(), 2);
    }

    #[test]
    fn test_utility_series() {
        let stats = CFRStats {
            players: vec!["1".to_string(), "2".to_string()],
            utilities: vec![vec![1.0, -1.0], vec![0.5, -0.5]],
            ..Default::default()
        };

        assert_eq!(stats.utility_series("2"), Some(vec![-1.0, -0.5]));
        assert_eq!(stats.utility_series("3"), None);
    }

    #[test]
    fn test_utility_series_with_short_rows() {
        let stats = CFRStats {
            players: vec!["1".to_string(), "2".to_string()],
            utilities: vec![vec![1.0, -1.0], vec![0.5]],
            ..Default::default()
        };

        assert_eq!(stats.utility_series("1"), Some(vec![1.0, 0.5]));
        assert_eq!(stats.utility_series("2"), None);
    }
}
