//! Sampled playouts.
//!
//! Monte Carlo estimates of what a strategy profile earns, by walking single
//! root-to-leaf paths. Useful as a sanity check on the exact values of
//! [`expected_value`](crate::cfr::diagnostics::expected_value).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;

use crate::cfr::strategy::Strategy;
use crate::error::{Result, SolverError};
use crate::tree::{GameTree, NodeKind};

/// Play one game to the end and return the payoffs of the reached terminal.
///
/// Chance outcomes follow their declared probabilities, decisions follow the
/// row of their information set in `strategy`, or are uniform without one.
pub fn sample_playout<R: Rng>(
    tree: &GameTree,
    strategy: &Strategy,
    rng: &mut R,
) -> Result<FxHashMap<String, f64>> {
    let mut id = tree.root();
    loop {
        let node = tree.node(id);
        let index = match node.kind() {
            NodeKind::Terminal { payoffs } => return Ok(payoffs.clone()),
            NodeKind::Decision { actions, .. } => {
                let row = match node.info_set() {
                    Some(label) => strategy.row_for(label, actions.len())?,
                    None => None,
                };
                match row {
                    Some(row) => sample_action(row, rng),
                    None => rng.gen_range(0..actions.len()),
                }
            }
            NodeKind::Chance { outcomes } => {
                let probs: Vec<f64> = outcomes.iter().map(|(_, p)| *p).collect();
                sample_action(&probs, rng)
            }
        };
        id = node.children()[index];
    }
}

/// Average payoffs of `samples` playouts.
///
/// With a `seed` the estimate is reproducible.
pub fn estimate_payoffs(
    tree: &GameTree,
    strategy: &Strategy,
    samples: usize,
    seed: Option<u64>,
) -> Result<FxHashMap<String, f64>> {
    if samples == 0 {
        return Err(SolverError::InvalidArgument(
            "cannot estimate payoffs from zero playouts".to_string(),
        ));
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut totals: FxHashMap<String, f64> = FxHashMap::default();
    for _ in 0..samples {
        for (player, payoff) in sample_playout(tree, strategy, &mut rng)? {
            *totals.entry(player).or_insert(0.0) += payoff;
        }
    }
    for total in totals.values_mut() {
        *total /= samples as f64;
    }
    log::debug!("estimated payoffs from {} playouts: {:?}", samples, totals);
    Ok(totals)
}

/// Sample an action index according to a probability distribution.
fn sample_action<R: Rng>(probs: &[f64], rng: &mut R) -> usize {
    let r: f64 = rng.gen();
    let mut cumsum = 0.0;

    for (i, &prob) in probs.iter().enumerate() {
        cumsum += prob;
        if r < cumsum {
            return i;
        }
    }

    // Rounding can leave the cumulative sum just under 1; fall back to the
    // last action that has any mass.
    probs.iter().rposition(|&p| p > 0.0).unwrap_or(probs.len() - 1)
}
