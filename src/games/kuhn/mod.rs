//! Kuhn Poker as an explicit game tree.
//!
//! Kuhn Poker is a simplified poker game used to validate CFR implementations
//! because it has a known, mathematically proven Nash equilibrium.
//!
//! ## Game Rules
//!
//! - 3 cards: Jack, Queen, King
//! - 2 players, each antes 1 chip
//! - Each player receives 1 card
//! - Player 1 acts first: Pass or Bet (1 chip)
//! - Player 2 responds based on P1's action
//! - Higher card wins at showdown
//!
//! ## Game Tree
//!
//! ```text
//! Deal (6 outcomes, 1/6 each)
//! └── P1
//!     ├── Pass
//!     │   └── P2
//!     │       ├── Pass → Showdown (pot = 2)
//!     │       └── Bet
//!     │           └── P1
//!     │               ├── Pass → P2 wins (pot = 3)
//!     │               └── Bet → Showdown (pot = 4)
//!     └── Bet
//!         └── P2
//!             ├── Pass → P1 wins (pot = 3)
//!             └── Bet → Showdown (pot = 4)
//! ```
//!
//! Information sets are labelled `<card>:<history>`, e.g. `Q:b` is player 2
//! holding the Queen facing a bet.
//!
//! ## Known Nash Equilibrium
//!
//! - **Player 1 with Jack**: Bet with probability α ∈ [0, 1/3]
//! - **Player 1 with Queen**: Always Pass
//! - **Player 1 with King**: Bet with probability 3α
//! - **Player 2 facing Bet with Jack**: Always Fold
//! - **Player 2 facing Bet with Queen**: Call with probability 1/3
//! - **Player 2 facing Bet with King**: Always Call
//!
//! **Expected Value**: Player 1 EV = -1/18 ≈ -0.0556

use std::fmt;

use crate::error::Result;
use crate::games::Game;
use crate::tree::{NodeId, NodeKind, TreeBuilder};

/// Actions in Kuhn Poker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KuhnAction {
    /// Pass (check if no bet, fold if facing bet)
    Pass,
    /// Bet (or call if facing bet)
    Bet,
}

impl KuhnAction {
    /// Both actions in declared order.
    pub const ALL: [KuhnAction; 2] = [KuhnAction::Pass, KuhnAction::Bet];

    /// Edge label in the tree.
    pub fn label(self) -> &'static str {
        match self {
            KuhnAction::Pass => "p",
            KuhnAction::Bet => "b",
        }
    }
}

impl fmt::Display for KuhnAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KuhnAction::Pass => write!(f, "Pass"),
            KuhnAction::Bet => write!(f, "Bet"),
        }
    }
}

/// A card of the three-card deck, ordered by rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Card {
    /// Lowest card.
    Jack,
    /// Middle card.
    Queen,
    /// Highest card.
    King,
}

impl Card {
    /// The deck in rank order.
    pub const DECK: [Card; 3] = [Card::Jack, Card::Queen, Card::King];

    /// One-letter name used in labels.
    pub fn symbol(self) -> char {
        match self {
            Card::Jack => 'J',
            Card::Queen => 'Q',
            Card::King => 'K',
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Card::Jack => "Jack",
            Card::Queen => "Queen",
            Card::King => "King",
        };
        write!(f, "{}", name)
    }
}

/// Kuhn Poker tree generator.
#[derive(Debug, Clone, PartialEq)]
pub struct KuhnPoker {
    /// Chips each player puts in before the deal.
    pub ante: f64,
    /// Size of a bet or call.
    pub bet: f64,
}

impl Default for KuhnPoker {
    fn default() -> Self {
        Self { ante: 1.0, bet: 1.0 }
    }
}

impl KuhnPoker {
    /// Create a new Kuhn Poker game with ante 1 and bet 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the full tree: a chance node deals one of the six ordered card
    /// pairs, then the betting rounds follow.
    pub fn build(&self) -> Result<Game> {
        let deals: Vec<[Card; 2]> = Card::DECK
            .iter()
            .flat_map(|&a| Card::DECK.iter().filter(move |&&b| b != a).map(move |&b| [a, b]))
            .collect();
        let p = 1.0 / deals.len() as f64;

        let mut builder = TreeBuilder::new(NodeKind::chance(
            deals.iter().map(|cards| (deal_label(*cards), p)),
        ));
        for &cards in &deals {
            let node = builder.add_child(NodeId::ROOT, &deal_label(cards), decision("1"))?;
            builder.set_info_set(node, info_label(cards[0], ""))?;
            self.expand(&mut builder, node, cards, "")?;
        }

        Game::from_tree("kuhn", builder.build()?)
    }

    fn expand(
        &self,
        builder: &mut TreeBuilder,
        parent: NodeId,
        cards: [Card; 2],
        history: &str,
    ) -> Result<()> {
        for action in KuhnAction::ALL {
            let next = format!("{}{}", history, action.label());
            match self.payoff(cards, &next) {
                Some(value) => {
                    let payoffs = NodeKind::terminal([("1", value), ("2", -value)]);
                    builder.add_child(parent, action.label(), payoffs)?;
                }
                None => {
                    let actor = acting_player(&next);
                    let node = builder.add_child(parent, action.label(), decision(actor))?;
                    let card = if actor == "1" { cards[0] } else { cards[1] };
                    builder.set_info_set(node, info_label(card, &next))?;
                    self.expand(builder, node, cards, &next)?;
                }
            }
        }
        Ok(())
    }

    /// Payoff of player 1 at a terminal history, `None` if betting goes on.
    pub fn payoff(&self, cards: [Card; 2], history: &str) -> Option<f64> {
        let showdown = if cards[0] > cards[1] { 1.0 } else { -1.0 };
        match history {
            // Showdown after both pass
            "pp" => Some(showdown * self.ante),
            // Player 2 folded to a bet
            "bp" => Some(self.ante),
            // Player 1 folded to a bet
            "pbp" => Some(-self.ante),
            // Showdown after bet-call
            "bb" | "pbb" => Some(showdown * (self.ante + self.bet)),
            _ => None,
        }
    }
}

/// Player to act after a non-terminal `history`.
fn acting_player(history: &str) -> &'static str {
    match history {
        "" | "pb" => "1",
        _ => "2",
    }
}

fn decision(player: &str) -> NodeKind {
    NodeKind::decision(player, KuhnAction::ALL.map(KuhnAction::label))
}

fn deal_label(cards: [Card; 2]) -> String {
    format!("{}{}", cards[0].symbol(), cards[1].symbol())
}

fn info_label(card: Card, history: &str) -> String {
    format!("{}:{}", card.symbol(), history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfr::best_response;

    #[test]
    fn test_kuhn_game_tree() {
        let game = KuhnPoker::new().build().unwrap();

        // 1 deal + 6 × (4 decisions + 5 terminals)
        assert_eq!(game.tree.len(), 55);
        assert_eq!(game.tree.decision_nodes().count(), 24);
        assert_eq!(game.tree.depth(), 4);

        // There are 12 info sets: 3 cards × 4 possible histories
        assert_eq!(game.info_sets.len(), 12);
        for set in game.info_sets.iter() {
            assert_eq!(set.nodes().len(), 2, "{}", set.label());
            assert_eq!(set.actions(), ["p", "b"]);
        }
        assert_eq!(game.info_sets.owner_of("K:").unwrap(), "1");
        assert_eq!(game.info_sets.owner_of("Q:b").unwrap(), "2");
        assert_eq!(game.info_sets.owner_of("J:pb").unwrap(), "1");
    }

    #[test]
    fn test_kuhn_terminal_payoffs() {
        let kuhn = KuhnPoker::new();
        let (k, j) = (Card::King, Card::Jack);

        assert_eq!(kuhn.payoff([k, j], "pp"), Some(1.0)); // K wins
        assert_eq!(kuhn.payoff([j, k], "bp"), Some(1.0)); // J wins by fold
        assert_eq!(kuhn.payoff([k, j], "pbp"), Some(-1.0));
        assert_eq!(kuhn.payoff([j, k], "bb"), Some(-2.0)); // J loses showdown
        assert_eq!(kuhn.payoff([k, j], "pbb"), Some(2.0));
        assert_eq!(kuhn.payoff([k, j], "pb"), None);

        let game = kuhn.build().unwrap();
        let leaf = game.tree.find(&["QK", "p", "b", "b"]).unwrap();
        assert_eq!(game.tree.node(leaf).payoff("2"), Some(2.0));
    }

    #[test]
    fn test_kuhn_info_states() {
        let game = KuhnPoker::new().build().unwrap();

        // Player 2 holding the King after a pass, whatever player 1 holds.
        let members = game.info_sets.lookup("K:p").unwrap();
        let mut histories: Vec<Vec<&str>> =
            members.iter().map(|&id| game.tree.history(id)).collect();
        histories.sort();
        assert_eq!(histories, vec![vec!["JK", "p"], vec!["QK", "p"]]);
    }

    #[test]
    fn test_best_response_against_uniform() {
        let game = KuhnPoker::new().build().unwrap();

        let p1 = best_response(&game.tree, &game.info_sets, "1", None).unwrap();
        assert!((p1.value - 0.5).abs() < 1e-9, "player 1 value {}", p1.value);
        // Player 1 always calls with the King and folds the Jack.
        assert_eq!(p1.actions["K:pb"], "b");
        assert_eq!(p1.actions["J:pb"], "p");

        let p2 = best_response(&game.tree, &game.info_sets, "2", None).unwrap();
        assert!((p2.value - 5.0 / 12.0).abs() < 1e-9, "player 2 value {}", p2.value);
    }
}
