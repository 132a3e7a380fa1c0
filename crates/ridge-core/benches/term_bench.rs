//! Benchmarks for per-term minimization
//!
//! Measures performance of:
//! - Hyperplane projection (breakpoint vs bisection)
//! - Hinge-loss minimization in each branch
//! - Squared hinge minimization

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ridge_core::{
    Consensus, GroundTerm, HyperplaneProjector, PotentialKind, ProjectionMethod, Term, TermState,
};

/// Deterministic pseudo-random inputs in [0, 1).
fn inputs(n: usize, seed: u64) -> Vec<f64> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 11) as f64 / (1u64 << 53) as f64
        })
        .collect()
}

fn state(arity: usize, constant: f64) -> TermState {
    let coefficients = inputs(arity, 7).iter().map(|c| 0.5 + c).collect();
    TermState::new(
        (0..arity).collect(),
        vec![0.0; arity],
        vec![1.0; arity],
        coefficients,
        constant,
    )
    .unwrap()
}

/// Benchmark projection at increasing arity
fn bench_projection(c: &mut Criterion) {
    let mut group = c.benchmark_group("projection");

    for &arity in &[2usize, 8, 32, 128, 512] {
        let coefficients: Vec<f64> = inputs(arity, 1).iter().map(|c| 2.0 * c - 1.0).collect();
        let lower = vec![0.0; arity];
        let upper = vec![1.0; arity];
        let targets = inputs(arity, 2);
        let projector =
            HyperplaneProjector::new(&coefficients, &lower, &upper, 0.1, 1.0).unwrap();

        group.throughput(Throughput::Elements(arity as u64));
        group.bench_with_input(BenchmarkId::new("breakpoint", arity), &targets, |b, t| {
            b.iter(|| projector.project(black_box(t)))
        });

        let bisection = projector.with_method(ProjectionMethod::Bisection {
            max_iterations: 100,
            tolerance: 1e-10,
        });
        group.bench_with_input(BenchmarkId::new("bisection", arity), &targets, |b, t| {
            b.iter(|| bisection.project(black_box(t)))
        });
    }
    group.finish();
}

/// Benchmark hinge minimization in each branch
fn bench_hinge_branches(c: &mut Criterion) {
    let mut group = c.benchmark_group("hinge_branches");
    let arity = 16;
    let consensus_values = vec![0.5; arity];
    let consensus = Consensus::new(&consensus_values, 1.0).unwrap();

    // Constant far above, far below, and between the two candidates.
    for (name, constant, weight) in [
        ("inactive", 100.0, 1.0),
        ("active", -100.0, 0.1),
        ("hyperplane", 4.0, 10.0),
    ] {
        let term = GroundTerm::new(PotentialKind::Hinge, state(arity, constant), weight).unwrap();
        group.bench_function(name, |b| {
            b.iter_batched_ref(
                || term.clone(),
                |t| t.minimize(black_box(&consensus)),
                criterion::BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

/// Benchmark squared hinge at increasing arity
fn bench_squared_hinge(c: &mut Criterion) {
    let mut group = c.benchmark_group("squared_hinge");

    for &arity in &[2usize, 16, 128] {
        let consensus_values = inputs(arity, 3);
        let consensus = Consensus::new(&consensus_values, 1.0).unwrap();
        let mut term =
            GroundTerm::new(PotentialKind::SquaredHinge, state(arity, 0.0), 2.0).unwrap();

        group.throughput(Throughput::Elements(arity as u64));
        group.bench_function(BenchmarkId::from_parameter(arity), |b| {
            b.iter(|| term.minimize(black_box(&consensus)))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_projection,
    bench_hinge_branches,
    bench_squared_hinge,
);

criterion_main!(benches);
