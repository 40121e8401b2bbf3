//! CFR (Counterfactual Regret Minimization) and best-response analysis.
//!
//! This module provides the solver engine that runs over an explicit
//! [`GameTree`](crate::tree::GameTree) and its
//! [`InfoSetRegistry`](crate::tree::InfoSetRegistry).
//!
//! # Overview
//!
//! CFR is an iterative algorithm that converges to Nash equilibrium by:
//! 1. Computing counterfactual regret for each action at each information set
//! 2. Updating strategies to minimize regret over time
//! 3. Averaging strategies across iterations to converge to equilibrium
//!
//! # Supported Variants
//!
//! - **Single**: one player learns against a uniformly random opponent
//! - **Dual**: both players learn at once; the average strategy approaches
//!   an equilibrium and its Nash gap approaches zero
//!
//! # Example
//!
//! ```
//! use efg_solver::cfr::{best_response_value, CFRConfig, CFRSolver};
//! use efg_solver::games;
//!
//! let game = games::bundled("kuhn").unwrap();
//!
//! // Best response of player 1 against a uniformly random player 2.
//! let value = best_response_value(&game.tree, &game.info_sets, "1", None).unwrap();
//! assert!((value - 0.5).abs() < 1e-9);
//!
//! // Learn an equilibrium.
//! let config = CFRConfig::dual().with_iterations(500);
//! let mut solver = CFRSolver::new(&game.tree, &game.info_sets, config).unwrap();
//! let stats = solver.train_configured().unwrap();
//! println!("nash gap after {} iterations: {:?}", stats.iterations, stats.nash_gap);
//! ```
//!
//! # Theory
//!
//! **Regret**: The difference between the value of an action and the value of the current strategy.
//! ```text
//! Regret(a) = Value(a) - Value(current_strategy)
//! ```
//!
//! **Regret Matching**: Set strategy proportional to positive regrets.
//! ```text
//! Strategy(a) = max(0, Regret(a)) / sum(max(0, Regret(a')))
//! ```
//!
//! **Nash gap**: The sum of both players' best-response values against a
//! strategy. It is zero exactly at a Nash equilibrium of a zero-sum game.
//!
//! # References
//!
//! - Zinkevich, M., et al. "Regret Minimization in Games with Incomplete Information" (2007)

pub mod best_response;
pub mod config;
pub mod diagnostics;
pub mod regret;
pub mod simulate;
pub mod solver;
pub mod storage;
pub mod strategy;

// Re-export main types for convenient access
pub use best_response::{best_response, best_response_value, BestResponse};
pub use config::{CFRConfig, CFRStats, CfrMode, ConfigError, NashGapPoint};
pub use diagnostics::{average_strategy, best_response_values, expected_value, nash_gap};
pub use regret::regret_matching;
pub use simulate::{estimate_payoffs, sample_playout};
pub use solver::{CFRSolver, SolverState};
pub use storage::{RegretStorage, StorageExport};
pub use strategy::Strategy;
