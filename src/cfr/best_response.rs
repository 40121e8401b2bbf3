//! Best-response evaluation (memoized expectimax).
//!
//! The acting player maximizes, every other party is a fixed stochastic
//! branch: chance nodes follow their declared probabilities, opponent
//! decisions follow a supplied strategy or play uniformly.
//!
//! Nodes of one information set are indistinguishable to the acting player,
//! so the best action is chosen once per set: each action is scored by
//! averaging its value uniformly over every member of the set, the winner is
//! memoized under the set's label, and every later visit to a member follows
//! the memoized action.

use std::collections::BTreeMap;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::cfr::strategy::Strategy;
use crate::error::{Result, SolverError};
use crate::tree::{GameTree, InfoSetRegistry, NodeId, NodeKind};

/// Outcome of one best-response evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct BestResponse {
    /// Expected payoff of the acting player at the root.
    pub value: f64,
    /// Chosen action for every information set the evaluation decided.
    pub actions: BTreeMap<String, String>,
}

/// Best response of `player` against `opponent` (uniform where it has no row).
///
/// The memo of chosen actions is local to this call, so repeated calls on the
/// same inputs return the same result.
pub fn best_response(
    tree: &GameTree,
    info_sets: &InfoSetRegistry,
    player: &str,
    opponent: Option<&Strategy>,
) -> Result<BestResponse> {
    if !tree.players().iter().any(|p| p == player) {
        return Err(SolverError::UnknownPlayer(player.to_string()));
    }

    let mut evaluator = Evaluator {
        tree,
        info_sets,
        player,
        opponent,
        memo: FxHashMap::default(),
        deciding: FxHashSet::default(),
    };
    let value = evaluator.value(tree.root())?;

    let actions: BTreeMap<String, String> = evaluator
        .memo
        .iter()
        .map(|(&label, &index)| -> Result<(String, String)> {
            let action = info_sets.actions_of(label)?[index].clone();
            Ok((label.to_string(), action))
        })
        .collect::<Result<_>>()?;

    Ok(BestResponse { value, actions })
}

/// Value of [`best_response`].
pub fn best_response_value(
    tree: &GameTree,
    info_sets: &InfoSetRegistry,
    player: &str,
    opponent: Option<&Strategy>,
) -> Result<f64> {
    best_response(tree, info_sets, player, opponent).map(|br| br.value)
}

struct Evaluator<'a> {
    tree: &'a GameTree,
    info_sets: &'a InfoSetRegistry,
    player: &'a str,
    opponent: Option<&'a Strategy>,
    /// Information set label -> index of the chosen action.
    memo: FxHashMap<&'a str, usize>,
    /// Sets whose action is being chosen right now.
    deciding: FxHashSet<&'a str>,
}

impl<'a> Evaluator<'a> {
    fn value(&mut self, id: NodeId) -> Result<f64> {
        let tree = self.tree;
        let node = tree.node(id);

        match node.kind() {
            NodeKind::Terminal { payoffs } => payoffs.get(self.player).copied().ok_or_else(|| {
                tree.structure_error(id, format!("no payoff for player `{}`", self.player))
            }),
            NodeKind::Decision { player, .. } if player == self.player => self.choose(id),
            NodeKind::Decision { actions, .. } => {
                let row = match (self.opponent, node.info_set()) {
                    (Some(strategy), Some(label)) => strategy.row_for(label, actions.len())?,
                    _ => None,
                };
                let uniform = 1.0 / actions.len() as f64;
                let mut total = 0.0;
                for (i, &child) in node.children().iter().enumerate() {
                    let p = row.map_or(uniform, |r| r[i]);
                    total += p * self.value(child)?;
                }
                Ok(total)
            }
            NodeKind::Chance { outcomes } => {
                let mut total = 0.0;
                for (&child, (_, p)) in node.children().iter().zip(outcomes) {
                    total += p * self.value(child)?;
                }
                Ok(total)
            }
        }
    }

    /// Value of a node owned by the acting player.
    fn choose(&mut self, id: NodeId) -> Result<f64> {
        let tree = self.tree;
        let node = tree.node(id);
        let label = node
            .info_set()
            .ok_or_else(|| tree.structure_error(id, "decision node has no information set"))?;

        if let Some(&best) = self.memo.get(label) {
            return self.value(node.children()[best]);
        }
        if !self.deciding.insert(label) {
            return Err(SolverError::InvalidInfoSet {
                label: label.to_string(),
                reason: format!(
                    "reached again at {} while choosing its action",
                    tree.path_string(id)
                ),
            });
        }

        let members = self.info_sets.lookup(label)?;
        let size = members.len() as f64;
        let mut best = 0;
        let mut best_value = f64::NEG_INFINITY;
        for action in 0..node.num_actions() {
            let mut value = 0.0;
            for &member in members {
                let child = tree
                    .get(member)
                    .and_then(|m| m.children().get(action).copied())
                    .ok_or_else(|| tree.structure_error(member, "member lacks a shared action"))?;
                value += self.value(child)? / size;
            }
            if value > best_value {
                best = action;
                best_value = value;
            }
        }

        log::trace!(
            "best response of {} at {}: {} ({:.4})",
            self.player,
            label,
            node.kind().action(best).unwrap_or_default(),
            best_value
        );
        self.deciding.remove(label);
        self.memo.insert(label, best);
        self.value(node.children()[best])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TreeBuilder;

    /// Nature picks L or R, player 1 acts without seeing it.
    fn blind_choice(payoffs: [f64; 4]) -> (GameTree, InfoSetRegistry) {
        let mut builder = TreeBuilder::new(NodeKind::chance([("L", 0.5), ("R", 0.5)]));
        let mut payoffs = payoffs.into_iter();
        for side in ["L", "R"] {
            let node = builder
                .add_child(NodeId::ROOT, side, NodeKind::decision("1", ["a", "b"]))
                .unwrap();
            builder.set_info_set(node, "I").unwrap();
            for action in ["a", "b"] {
                let v = payoffs.next().unwrap();
                builder
                    .add_child(node, action, NodeKind::terminal([("1", v), ("2", -v)]))
                    .unwrap();
            }
        }
        let tree = builder.build().unwrap();
        let registry = InfoSetRegistry::from_tree(&tree).unwrap();
        (tree, registry)
    }

    #[test]
    fn test_information_set_forces_one_action() {
        // Seeing the side would give 0.5 * 2 + 0.5 * 3 = 2.5.
        let (tree, registry) = blind_choice([2.0, 0.0, 0.0, 3.0]);
        let br = best_response(&tree, &registry, "1", None).unwrap();

        assert_eq!(br.value, 1.5);
        assert_eq!(br.actions["I"], "b");
    }

    #[test]
    fn test_ties_pick_the_first_declared_action() {
        let (tree, registry) = blind_choice([1.0, 0.0, 0.0, 1.0]);
        let br = best_response(&tree, &registry, "1", None).unwrap();

        assert_eq!(br.value, 0.5);
        assert_eq!(br.actions["I"], "a");
    }

    #[test]
    fn test_opponent_strategy_or_uniform() {
        let mut builder = TreeBuilder::new(NodeKind::decision("2", ["x", "y"]));
        builder.set_info_set(NodeId::ROOT, "J").unwrap();
        builder
            .add_child(NodeId::ROOT, "x", NodeKind::terminal([("1", 1.0), ("2", -1.0)]))
            .unwrap();
        builder
            .add_child(NodeId::ROOT, "y", NodeKind::terminal([("1", -1.0), ("2", 1.0)]))
            .unwrap();
        let tree = builder.build().unwrap();
        let registry = InfoSetRegistry::from_tree(&tree).unwrap();

        assert_eq!(best_response_value(&tree, &registry, "1", None).unwrap(), 0.0);

        let mut strategy = Strategy::new();
        strategy.insert("J", vec![0.75, 0.25]);
        assert_eq!(
            best_response_value(&tree, &registry, "1", Some(&strategy)).unwrap(),
            0.5
        );

        // A profile without a row for J leaves the opponent uniform.
        let mut other = Strategy::new();
        other.insert("K", vec![1.0]);
        assert_eq!(best_response_value(&tree, &registry, "1", Some(&other)).unwrap(), 0.0);

        strategy.insert("J", vec![1.0]);
        assert!(best_response_value(&tree, &registry, "1", Some(&strategy)).is_err());
    }

    #[test]
    fn test_repeated_calls_agree() {
        let (tree, registry) = blind_choice([2.0, 0.0, 0.0, 3.0]);

        let first = best_response(&tree, &registry, "1", None).unwrap();
        let second = best_response(&tree, &registry, "1", None).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_player() {
        let (tree, registry) = blind_choice([0.0; 4]);
        assert!(matches!(
            best_response(&tree, &registry, "3", None),
            Err(SolverError::UnknownPlayer(_))
        ));
    }

    #[test]
    fn test_non_acting_player_sees_chance_and_uniform_play() {
        let (tree, registry) = blind_choice([2.0, 0.0, 0.0, 3.0]);
        let br = best_response(&tree, &registry, "2", None).unwrap();

        assert_eq!(br.value, -(0.25 * 2.0 + 0.25 * 3.0));
        assert!(br.actions.is_empty());
    }
}
