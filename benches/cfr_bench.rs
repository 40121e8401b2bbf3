//! Benchmarks for CFR solver.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use efg_solver::cfr::{best_response_value, nash_gap, CFRConfig, CFRSolver, Strategy};
use efg_solver::games::kuhn::KuhnPoker;

fn kuhn_iteration_benchmark(c: &mut Criterion) {
    let game = KuhnPoker::new().build().unwrap();
    let mut solver = CFRSolver::new(&game.tree, &game.info_sets, CFRConfig::dual()).unwrap();

    c.bench_function("kuhn_single_iteration", |b| {
        b.iter(|| {
            solver.run_iteration().unwrap();
            black_box(solver.iteration())
        })
    });
}

fn kuhn_1000_iterations_benchmark(c: &mut Criterion) {
    let game = KuhnPoker::new().build().unwrap();

    c.bench_function("kuhn_1000_iterations", |b| {
        b.iter(|| {
            let mut solver =
                CFRSolver::new(&game.tree, &game.info_sets, CFRConfig::dual()).unwrap();
            solver.train(black_box(1000)).unwrap().iterations
        })
    });
}

fn kuhn_best_response_benchmark(c: &mut Criterion) {
    let game = KuhnPoker::new().build().unwrap();
    let uniform = Strategy::uniform(&game.info_sets);

    c.bench_function("kuhn_best_response", |b| {
        b.iter(|| best_response_value(&game.tree, &game.info_sets, black_box("1"), None).unwrap())
    });
    c.bench_function("kuhn_nash_gap", |b| {
        b.iter(|| nash_gap(&game.tree, &game.info_sets, black_box(&uniform)).unwrap())
    });
}

criterion_group!(
    benches,
    kuhn_iteration_benchmark,
    kuhn_1000_iterations_benchmark,
    kuhn_best_response_benchmark
);
criterion_main!(benches);
