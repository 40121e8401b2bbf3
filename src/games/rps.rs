//! Rock-Paper-Superscissors.
//!
//! Both players pick rock, paper or scissors at once: player 2 moves without
//! seeing player 1's choice, so each player has a single information set.
//! A win by scissors is worth `scissors_payoff`, every other win 1.
//!
//! The equilibrium plays rock with probability `w / (w + 2)` and paper and
//! scissors with `1 / (w + 2)` each, where `w` is the scissors payoff.

use crate::error::Result;
use crate::games::Game;
use crate::tree::{NodeId, NodeKind, TreeBuilder};

/// Actions in declared order.
pub const ACTIONS: [&str; 3] = ["r", "p", "s"];

/// Rock-Paper-Scissors with a configurable scissors stake.
#[derive(Debug, Clone, PartialEq)]
pub struct RockPaperScissors {
    /// What a win with scissors pays.
    pub scissors_payoff: f64,
}

impl Default for RockPaperScissors {
    fn default() -> Self {
        Self {
            scissors_payoff: 1.0,
        }
    }
}

impl RockPaperScissors {
    /// Classic rules: every win pays 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scissors wins pay `scissors_payoff`.
    pub fn with_scissors_payoff(scissors_payoff: f64) -> Self {
        Self { scissors_payoff }
    }

    /// Payoff of player 1 when the players pick `first` and `second`.
    pub fn payoff(&self, first: &str, second: &str) -> f64 {
        match (first, second) {
            ("r", "s") | ("p", "r") => 1.0,
            ("s", "r") | ("r", "p") => -1.0,
            ("s", "p") => self.scissors_payoff,
            ("p", "s") => -self.scissors_payoff,
            _ => 0.0,
        }
    }

    /// Build the tree: player 1's choice, then player 2's under one
    /// information set.
    pub fn build(&self) -> Result<Game> {
        let mut builder = TreeBuilder::new(NodeKind::decision("1", ACTIONS));
        builder.set_info_set(NodeId::ROOT, "P1")?;
        for first in ACTIONS {
            let node = builder.add_child(NodeId::ROOT, first, NodeKind::decision("2", ACTIONS))?;
            builder.set_info_set(node, "P2")?;
            for second in ACTIONS {
                let value = self.payoff(first, second);
                builder.add_child(node, second, NodeKind::terminal([("1", value), ("2", -value)]))?;
            }
        }
        Game::from_tree("rock_paper_superscissors", builder.build()?)
    }
}
