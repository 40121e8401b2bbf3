//! Convergence diagnostics.
//!
//! The average strategy of a CFR run converges to a Nash equilibrium; the
//! Nash gap measures how far it still is. Both players' best responses
//! against the strategy are computed and summed: for a zero-sum game the sum
//! is non-negative and reaches zero exactly at an equilibrium.

use crate::cfr::best_response::best_response_value;
use crate::cfr::storage::RegretStorage;
use crate::cfr::strategy::Strategy;
use crate::error::{Result, SolverError};
use crate::tree::{GameTree, InfoSetRegistry, NodeId, NodeKind};

/// Average strategy of a learning run (normalized strategy sums).
pub fn average_strategy(storage: &RegretStorage) -> Strategy {
    storage.average_profile()
}

/// Best-response value of each player against `strategy`, in player order.
///
/// The two evaluations are independent read-only walks and run in parallel.
pub fn best_response_values(
    tree: &GameTree,
    info_sets: &InfoSetRegistry,
    strategy: &Strategy,
) -> Result<[(String, f64); 2]> {
    let [first, second] = two_players(tree)?;
    let (a, b) = rayon::join(
        || best_response_value(tree, info_sets, first, Some(strategy)),
        || best_response_value(tree, info_sets, second, Some(strategy)),
    );
    Ok([(first.to_string(), a?), (second.to_string(), b?)])
}

/// Nash gap of `strategy`: the sum of both players' best-response values.
pub fn nash_gap(tree: &GameTree, info_sets: &InfoSetRegistry, strategy: &Strategy) -> Result<f64> {
    let [(_, a), (_, b)] = best_response_values(tree, info_sets, strategy)?;
    Ok(a + b)
}

/// Expected payoff of `player` when everyone follows `strategy`.
///
/// Decision nodes whose information set has no row are played uniformly.
pub fn expected_value(tree: &GameTree, strategy: &Strategy, player: &str) -> Result<f64> {
    if !tree.players().iter().any(|p| p == player) {
        return Err(SolverError::UnknownPlayer(player.to_string()));
    }
    value_under(tree, strategy, player, tree.root())
}

fn value_under(tree: &GameTree, strategy: &Strategy, player: &str, id: NodeId) -> Result<f64> {
    let node = tree.node(id);
    match node.kind() {
        NodeKind::Terminal { payoffs } => payoffs
            .get(player)
            .copied()
            .ok_or_else(|| tree.structure_error(id, format!("no payoff for player `{}`", player))),
        NodeKind::Decision { actions, .. } => {
            let row = match node.info_set() {
                Some(label) => strategy.row_for(label, actions.len())?,
                None => None,
            };
            let uniform = 1.0 / actions.len() as f64;
            let mut total = 0.0;
            for (i, &child) in node.children().iter().enumerate() {
                let p = row.map_or(uniform, |r| r[i]);
                if p > 0.0 {
                    total += p * value_under(tree, strategy, player, child)?;
                }
            }
            Ok(total)
        }
        NodeKind::Chance { outcomes } => {
            let mut total = 0.0;
            for (&child, (_, p)) in node.children().iter().zip(outcomes) {
                total += p * value_under(tree, strategy, player, child)?;
            }
            Ok(total)
        }
    }
}

pub(crate) fn two_players(tree: &GameTree) -> Result<[&str; 2]> {
    match tree.players() {
        [first, second] => Ok([first.as_str(), second.as_str()]),
        players => Err(SolverError::PlayerCount(players.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TreeBuilder;

    /// Matching pennies with a hidden first move.
    fn pennies() -> (GameTree, InfoSetRegistry) {
        let mut builder = TreeBuilder::new(NodeKind::decision("1", ["h", "t"]));
        builder.set_info_set(NodeId::ROOT, "P1").unwrap();
        for first in ["h", "t"] {
            let node = builder
                .add_child(NodeId::ROOT, first, NodeKind::decision("2", ["h", "t"]))
                .unwrap();
            builder.set_info_set(node, "P2").unwrap();
            for second in ["h", "t"] {
                let v = if first == second { 1.0 } else { -1.0 };
                builder
                    .add_child(node, second, NodeKind::terminal([("1", v), ("2", -v)]))
                    .unwrap();
            }
        }
        let tree = builder.build().unwrap();
        let registry = InfoSetRegistry::from_tree(&tree).unwrap();
        (tree, registry)
    }

    #[test]
    fn test_equilibrium_has_zero_gap() {
        let (tree, registry) = pennies();
        let strategy = Strategy::uniform(&registry);

        assert_eq!(nash_gap(&tree, &registry, &strategy).unwrap(), 0.0);
        assert_eq!(expected_value(&tree, &strategy, "1").unwrap(), 0.0);
    }

    #[test]
    fn test_pure_strategy_is_exploitable() {
        let (tree, registry) = pennies();
        let mut strategy = Strategy::new();
        strategy.insert("P1", vec![1.0, 0.0]);
        strategy.insert("P2", vec![1.0, 0.0]);

        // Player 1 plays heads against "always heads" and wins.
        // Player 2 scores each action by averaging uniformly over both
        // members of P2, whatever player 1 actually plays. Heads and tails
        // then both score 0, the tie goes to heads, and player 2 loses.
        let [(p1, v1), (p2, v2)] = best_response_values(&tree, &registry, &strategy).unwrap();
        assert_eq!((p1.as_str(), v1), ("1", 1.0));
        assert_eq!((p2.as_str(), v2), ("2", -1.0));
        assert_eq!(nash_gap(&tree, &registry, &strategy).unwrap(), 0.0);
        assert_eq!(expected_value(&tree, &strategy, "1").unwrap(), 1.0);

        // Against an even mix the tie is harmless: player 2 breaks even.
        strategy.insert("P1", vec![0.5, 0.5]);
        let [(_, v1), (_, v2)] = best_response_values(&tree, &registry, &strategy).unwrap();
        assert_eq!(v1, 1.0);
        assert_eq!(v2, 0.0);
    }

    #[test]
    fn test_average_strategy_from_storage() {
        let (_, registry) = pennies();
        let mut storage = RegretStorage::for_info_sets(&registry, None);
        storage.update_strategy_sum("P1", &[1.0, 0.0], 3.0).unwrap();
        storage.update_strategy_sum("P1", &[0.0, 1.0], 1.0).unwrap();

        let average = average_strategy(&storage);
        assert_eq!(average.get("P1"), Some(&[0.75, 0.25][..]));
        assert_eq!(average.get("P2"), Some(&[0.5, 0.5][..]));
    }

    #[test]
    fn test_gap_needs_two_players() {
        let mut builder = TreeBuilder::new(NodeKind::decision("1", ["a"]));
        builder.set_info_set(NodeId::ROOT, "I").unwrap();
        builder
            .add_child(NodeId::ROOT, "a", NodeKind::terminal([("1", 1.0)]))
            .unwrap();
        let tree = builder.build().unwrap();
        let registry = InfoSetRegistry::from_tree(&tree).unwrap();

        assert!(matches!(
            nash_gap(&tree, &registry, &Strategy::new()),
            Err(SolverError::PlayerCount(1))
        ));
    }
}
