/**
 * Vector Index Performance Benchmarks
 *
 * DESIGN DECISION: benchmark `VectorIndex::search` across catalogue sizes
 * and k values
 * WHY: the core's latency target (sub-millisecond per query at up to
 * ~10^4-10^5 patterns) is a testable property of the exhaustive scan, not
 * just an assertion in prose
 */

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use weave_classifier::{Pattern, PatternRow, VectorIndex};

const DIM: usize = 384;

fn unit_vector(seed: usize, dim: usize) -> Vec<f32> {
    let mut v: Vec<f32> = (0..dim)
        .map(|i| (((seed * 31 + i) % 997) as f32 / 997.0) - 0.5)
        .collect();
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
    v
}

fn build_rows(count: usize) -> Vec<PatternRow> {
    (0..count)
        .map(|i| {
            let pattern = Pattern::builder()
                .id(format!("domain/area/topic/{i}"))
                .description(format!("pattern number {i}"))
                .sample_text("sample text")
                .build()
                .unwrap();
            PatternRow {
                pattern,
                vector: unit_vector(i, DIM),
            }
        })
        .collect()
}

fn bench_search_by_catalogue_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_by_catalogue_size");

    for size in [100, 1_000, 10_000].iter() {
        let rows = build_rows(*size);
        let snapshot = VectorIndex::build("bench-model".to_string(), rows).unwrap();
        let query = unit_vector(*size / 2, DIM);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| VectorIndex::search(&snapshot, &query, 4, None).unwrap());
        });
    }

    group.finish();
}

fn bench_search_by_k(c: &mut Criterion) {
    let rows = build_rows(10_000);
    let snapshot = VectorIndex::build("bench-model".to_string(), rows).unwrap();
    let query = unit_vector(42, DIM);

    let mut group = c.benchmark_group("search_by_k");

    for k in [1, 5, 10, 50].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(k), k, |b, &k| {
            b.iter(|| VectorIndex::search(&snapshot, &query, k, None).unwrap());
        });
    }

    group.finish();
}

fn bench_search_with_domain_predicate(c: &mut Criterion) {
    let rows = build_rows(10_000);
    let snapshot = VectorIndex::build("bench-model".to_string(), rows).unwrap();
    let query = unit_vector(7, DIM);
    let predicate: &dyn Fn(&weave_classifier::PatternId) -> bool =
        &|id| id.as_str().ends_with('0');

    c.bench_function("search_10000_with_predicate", |b| {
        b.iter(|| VectorIndex::search(&snapshot, &query, 4, Some(predicate)).unwrap());
    });
}

criterion_group!(
    benches,
    bench_search_by_catalogue_size,
    bench_search_by_k,
    bench_search_with_domain_predicate,
);

criterion_main!(benches);
