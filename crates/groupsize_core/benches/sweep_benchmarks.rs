//! Criterion benchmarks for groupsize_core sweeps
//!
//! Run with: cargo bench -p groupsize_core

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use groupsize_core::model::normalize::normalized_rates;
use groupsize_core::model::{IndirectModel, StandardModel, StratificationParams};
use groupsize_core::sweep::{
    GridAxis, ParameterGrid, RunnerOptions, run_factorial, run_factorial_parallel,
};
use rand::SeedableRng;
use rand::rngs::SmallRng;

fn standard_grid() -> ParameterGrid {
    ParameterGrid::new()
        .axis(GridAxis::linspace("p", 0.01, 0.99, 99))
        .axis(GridAxis::linspace("d", 1.0, 10.0, 30))
        .axis(GridAxis::linspace("avg_rate", 50.0, 500.0, 100))
}

fn indirect_grid(sample_size: f64) -> ParameterGrid {
    ParameterGrid::new()
        .axis(GridAxis::linspace("p", 0.001, 0.99, 5))
        .axis(GridAxis::linspace("gamma", 0.1, 5.0, 5))
        .axis(GridAxis::fixed("mu_disadv", 0.2))
        .axis(GridAxis::values("z_position_gap", [0.0, 0.4, 0.8]))
        .axis(GridAxis::fixed("c_disadv", 20.0))
        .axis(GridAxis::fixed("c_adv", 20.0))
        .axis(GridAxis::fixed("sample_size", sample_size))
        .axis(GridAxis::fixed("target_avg_rate", 500.0))
        .axis(GridAxis::values("min_rate", [0.0, 250.0]))
}

fn bench_standard_sweep(c: &mut Criterion) {
    let grid = standard_grid();
    c.bench_function("standard_297k_points", |b| {
        b.iter(|| run_factorial::<StandardModel>(black_box(&grid), RunnerOptions::default()))
    });
}

fn bench_normalization(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalization");

    for sample_size in [1_000usize, 10_000, 100_000].iter() {
        let strat = StratificationParams {
            p: 0.2,
            mu_disadv: 0.2,
            z_position_gap: 0.4,
            c_disadv: 20.0,
            c_adv: 20.0,
            sample_size: *sample_size,
        };
        let sample = strat.sample(&mut SmallRng::seed_from_u64(1)).unwrap();

        group.bench_with_input(
            BenchmarkId::new("sample_size", sample_size),
            sample_size,
            |b, _| b.iter(|| normalized_rates(black_box(&sample), 2.0, 500.0, 250.0)),
        );
    }

    group.finish();
}

fn bench_indirect_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("indirect_sweep");
    let grid = indirect_grid(10_000.0);
    let options = RunnerOptions::seeded(42);

    group.bench_function("sequential", |b| {
        b.iter(|| run_factorial::<IndirectModel>(black_box(&grid), options))
    });
    group.bench_function("parallel", |b| {
        b.iter(|| run_factorial_parallel::<IndirectModel>(black_box(&grid), options))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_standard_sweep,
    bench_normalization,
    bench_indirect_modes,
);
criterion_main!(benches);
