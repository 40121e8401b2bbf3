//! End-to-end CFR runs on Kuhn Poker.

use efg_solver::cfr::{best_response, expected_value, nash_gap, CFRConfig, CFRSolver, Strategy};
use efg_solver::games::{self, kuhn::KuhnPoker};

const PASS: usize = 0;
const BET: usize = 1;

#[test]
fn dual_cfr_finds_the_kuhn_equilibrium() {
    let game = KuhnPoker::new().build().unwrap();
    let config = CFRConfig::dual().with_iterations(10_000);
    let mut solver = CFRSolver::new(&game.tree, &game.info_sets, config).unwrap();

    let stats = solver.train_configured().unwrap();
    assert_eq!(stats.iterations, 10_000);
    assert_eq!(stats.utilities.len(), 10_000);
    let gap = stats.nash_gap.unwrap();
    assert!(gap < 0.05, "nash gap {}", gap);

    let strategy = solver.average_strategy();
    let prob = |label: &str, action: usize| strategy.probability(label, action).unwrap();

    // Player 2 facing a bet: fold the Jack, call the King, call 1/3 with the Queen.
    assert!(prob("J:b", PASS) > 0.9, "J:b fold {}", prob("J:b", PASS));
    assert!(prob("K:b", BET) > 0.9, "K:b call {}", prob("K:b", BET));
    assert!((prob("Q:b", BET) - 1.0 / 3.0).abs() < 0.1, "Q:b call {}", prob("Q:b", BET));

    // Player 1 never opens with the Queen and always calls with the King.
    assert!(prob("Q:", PASS) > 0.9);
    assert!(prob("K:pb", BET) > 0.9);

    let ev = expected_value(&game.tree, &strategy, "1").unwrap();
    assert!((ev + 1.0 / 18.0).abs() < 0.01, "player 1 value {}", ev);
}

#[test]
fn single_cfr_learns_to_exploit_uniform_play() {
    let game = KuhnPoker::new().build().unwrap();
    let config = CFRConfig::single("1").with_iterations(1000);
    let mut solver = CFRSolver::new(&game.tree, &game.info_sets, config).unwrap();
    solver.train_configured().unwrap();

    let strategy = solver.average_strategy();
    assert_eq!(strategy.len(), 6);

    // Against a uniform opponent the learned play approaches the best response.
    let learned = expected_value(&game.tree, &strategy, "1").unwrap();
    assert!((learned - 0.5).abs() < 0.02, "learned value {}", learned);

    let series = solver.stats().utility_series("1").unwrap();
    assert_eq!(series.len(), 1000);
    assert!(series[999] > series[0]);
}

#[test]
fn bundled_kuhn_best_responses() {
    let game = games::bundled("kuhn").unwrap();

    let p1 = best_response(&game.tree, &game.info_sets, "1", None).unwrap();
    let p2 = best_response(&game.tree, &game.info_sets, "2", None).unwrap();
    assert!((p1.value - 0.5).abs() < 1e-9);
    assert!((p2.value - 5.0 / 12.0).abs() < 1e-9);

    assert_eq!(p1.actions["J:pb"], "p");
    assert_eq!(p1.actions["K:pb"], "b");
    // Ties go to the first action.
    assert_eq!(p1.actions["K:"], "p");
    assert_eq!(p1.actions.len(), 6);
    assert_eq!(p2.actions.len(), 6);

    // Uniform play is far from an equilibrium.
    let gap = nash_gap(&game.tree, &game.info_sets, &Strategy::uniform(&game.info_sets)).unwrap();
    assert!((gap - 11.0 / 12.0).abs() < 1e-9, "gap {}", gap);
}
