//! Search engine benchmarks.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rcgame::strategies::{AlphaBeta, AlphaBetaParams, Mcts, MctsParams, Strategy};
use rcgame::{Board, GameState};

fn opening(side: usize) -> GameState {
    let mut rng = ChaCha8Rng::seed_from_u64(side as u64);
    GameState::new(Board::random(side, &mut rng))
}

fn bench_alphabeta_budgets(c: &mut Criterion) {
    let mut group = c.benchmark_group("alphabeta_budget");
    let state = opening(8);

    for budget in [1_000u64, 10_000, 60_000] {
        group.bench_with_input(BenchmarkId::new("8x8", budget), &budget, |b, &budget| {
            let mut search = AlphaBeta::create(AlphaBetaParams {
                node_budget: budget,
                ..AlphaBetaParams::default()
            });
            b.iter(|| search.choose_action(black_box(&state)).unwrap());
        });
    }
    group.finish();
}

fn bench_alphabeta_pruning(c: &mut Criterion) {
    let mut group = c.benchmark_group("alphabeta_pruning");
    let state = opening(3);

    for pruning in [true, false] {
        group.bench_with_input(BenchmarkId::new("3x3_exhaustive", pruning), &pruning, |b, &pruning| {
            let mut search = AlphaBeta::create(AlphaBetaParams {
                pruning,
                ..AlphaBetaParams::default()
            });
            b.iter(|| search.choose_action(black_box(&state)).unwrap());
        });
    }
    group.finish();
}

fn bench_mcts_iterations(c: &mut Criterion) {
    let mut group = c.benchmark_group("mcts_iterations");
    group.sample_size(20);

    for side in [5usize, 9] {
        let state = opening(side);
        for iterations in [500u64, 2_000] {
            group.throughput(Throughput::Elements(iterations));
            group.bench_with_input(
                BenchmarkId::new(format!("{}x{}", side, side), iterations),
                &iterations,
                |b, &iterations| {
                    let mut mcts = Mcts::create(MctsParams {
                        max_iterations: iterations,
                        max_seconds: 60.0,
                        seed: Some(7),
                        ..MctsParams::default()
                    });
                    b.iter(|| mcts.choose_action(black_box(&state)).unwrap());
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_alphabeta_budgets, bench_alphabeta_pruning, bench_mcts_iterations);
criterion_main!(benches);
