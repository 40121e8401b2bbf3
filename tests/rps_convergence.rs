//! End-to-end CFR runs on Rock-Paper-Scissors variants.

use efg_solver::cfr::{CFRConfig, CFRSolver};
use efg_solver::games::{self, rps::RockPaperScissors};

#[test]
fn dual_cfr_on_bundled_rps() {
    let game = games::bundled("rps").unwrap();
    let config = CFRConfig::dual().with_iterations(1000).with_nash_gap_interval(100);
    let mut solver = CFRSolver::new(&game.tree, &game.info_sets, config).unwrap();

    let stats = solver.train_configured().unwrap();
    assert_eq!(stats.nash_gap_history.len(), 10);
    assert!(stats.nash_gap.unwrap().abs() < 0.05);

    let strategy = solver.average_strategy();
    for label in ["P1", "P2"] {
        for &p in strategy.get(label).unwrap() {
            assert!((p - 1.0 / 3.0).abs() < 0.05, "{} plays {}", label, p);
        }
    }
}

#[test]
fn dual_cfr_with_double_scissors() {
    let game = RockPaperScissors::with_scissors_payoff(2.0).build().unwrap();
    let config = CFRConfig::dual().with_iterations(20_000);
    let mut solver = CFRSolver::new(&game.tree, &game.info_sets, config).unwrap();
    solver.train_configured().unwrap();

    let strategy = solver.average_strategy();
    let expected = [0.5, 0.25, 0.25];
    for label in ["P1", "P2"] {
        let row = strategy.get(label).unwrap();
        for (p, e) in row.iter().zip(expected) {
            assert!((p - e).abs() < 0.05, "{}: {:?}", label, row);
        }
    }
    assert!(solver.nash_gap().unwrap() < 0.05);
}
