//! # efg-solver
//!
//! Best-response and Counterfactual Regret Minimization (CFR) analysis for
//! finite two-player extensive-form games with imperfect information.
//!
//! ## Features
//!
//! - **Explicit game trees**: decision, chance and terminal nodes with
//!   information sets kept in a separate registry
//! - **Best response**: memoized expectimax against a fixed or uniform
//!   opponent, one action per information set
//! - **CFR**: single-player against a uniform opponent, or both players at
//!   once with the Nash gap of the average strategy as diagnostic
//! - **Checkpointing**: Save and resume solver state
//! - **Game descriptions**: a small text format plus bundled Kuhn Poker and
//!   Rock-Paper-Superscissors
//!
//! ## Quick Start
//!
//! ```
//! use efg_solver::cfr::{CFRConfig, CFRSolver};
//! use efg_solver::games;
//!
//! // 1. Load a game
//! let game = games::bundled("kuhn").unwrap();
//!
//! // 2. Create a solver
//! let mut solver = CFRSolver::new(&game.tree, &game.info_sets, CFRConfig::dual()).unwrap();
//!
//! // 3. Train
//! solver.train(200).unwrap();
//!
//! // 4. Get strategies
//! let strategy = solver.average_strategy();
//! let call_with_king = strategy.get("K:b").unwrap()[1];
//! assert!(call_with_king > 0.5);
//! ```
//!
//! ## Modules
//!
//! - [`tree`]: Game tree model and information sets
//! - [`cfr`]: Best response, CFR solver and diagnostics
//! - [`games`]: Game description loader and built-in games
//! - [`error`]: Error type shared by all of the above
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐     ┌──────────────────────────────────┐
//! │  games (text, Kuhn,  │────▶│ tree: GameTree + InfoSetRegistry │
//! │  RPS)                │     └──────────────────────────────────┘
//! └──────────────────────┘                     │
//!                          ┌──────────────────┴──────────────┐
//!                          ▼                                 ▼
//!                 ┌─────────────────┐              ┌──────────────────┐
//!                 │  best response  │◀─────────────│   CFR solver     │
//!                 │  (expectimax)   │  nash gap    │ (single / dual)  │
//!                 └─────────────────┘              └──────────────────┘
//! ```

#![warn(missing_docs)]

/// CFR (Counterfactual Regret Minimization) and best-response module.
pub mod cfr;

/// Error type and result alias.
pub mod error;

/// Game descriptions and built-in games.
///
/// Contains the text loader and generators for Kuhn Poker and
/// Rock-Paper-Superscissors.
pub mod games;

/// Game tree model.
pub mod tree;

// Re-export commonly used types at crate root for convenience
pub use cfr::{CFRConfig, CFRSolver, CFRStats, Strategy};
pub use error::{Result, SolverError};
pub use games::Game;
pub use tree::{GameTree, InfoSetRegistry, NodeId, NodeKind, TreeBuilder};
