//! Benchmarks for graph construction and centrality computation.
//!
//! Uses deterministic synthetic records (no file I/O) so results are
//! reproducible. Run with: `cargo bench --package tfn-analysis`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tfn_analysis::builder::{build, BuildOptions, TransferGraph};
use tfn_analysis::metrics;
use tfn_data::{Direction, TransferRecord};

/// Generates `count` records over `clubs` synthetic club names.
///
/// Fees cycle between 0.5M and 20M so the default filter drops a share
/// of the rows, as a real dataset would.
fn sample_records(count: usize, clubs: usize) -> Vec<TransferRecord> {
    (0..count)
        .map(|i| TransferRecord {
            team: format!("Club {}", i % clubs),
            counter_team: format!("Club {}", (i * 7 + 1) % clubs),
            dir: if i % 2 == 0 {
                Direction::Out
            } else {
                Direction::In
            },
            fee: ((i % 40) as f64) * 0.5e6,
        })
        .collect()
}

/// Benchmark: filter + aggregate 10k records over 200 clubs.
fn bench_build_10k_records(c: &mut Criterion) {
    let records = sample_records(10_000, 200);
    let opts = BuildOptions::default();

    c.bench_function("build_10k_records", |b| {
        b.iter(|| build(black_box(&records), black_box(&opts)))
    });
}

/// Benchmark: full centrality suite on a 200-club graph.
fn bench_centrality_200_clubs(c: &mut Criterion) {
    let records = sample_records(10_000, 200);
    let graph = TransferGraph::from_records(&records);

    c.bench_function("centrality_200_clubs", |b| {
        b.iter(|| metrics::compute(black_box(&graph)))
    });
}

criterion_group!(benches, bench_build_10k_records, bench_centrality_200_clubs);
criterion_main!(benches);
