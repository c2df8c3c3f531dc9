//! Insert and deduplicated query benchmarks
//!
//! Run with: cargo bench --bench query_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use keyann::{IndexConfig, QueryOptions, VectorIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn generate_vectors(count: usize, dimension: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| (0..dimension).map(|_| rng.gen_range(-1.0..1.0)).collect())
        .collect()
}

/// `copies` consecutive vectors share each key
fn build_index(vectors: &[Vec<f32>], copies: usize) -> VectorIndex<u64> {
    let dimension = vectors[0].len();
    let index = VectorIndex::create(IndexConfig::new(dimension)).unwrap();
    for (i, vector) in vectors.iter().enumerate() {
        index.insert(vector, (i / copies) as u64).unwrap();
    }
    index
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    group.sample_size(10);

    for size in [1_000, 5_000] {
        let vectors = generate_vectors(size, 64, 1);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &vectors, |b, vectors| {
            b.iter(|| black_box(build_index(vectors, 1)));
        });
    }

    group.finish();
}

/// Query cost as the share of duplicate keys grows
fn bench_dedup_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("dedup_query");

    let vectors = generate_vectors(10_000, 64, 2);
    let queries = generate_vectors(100, 64, 3);

    for copies in [1, 5, 25] {
        let index = build_index(&vectors, copies);
        group.throughput(Throughput::Elements(queries.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}copies_k10", copies)),
            &index,
            |b, index| {
                b.iter(|| {
                    for query in &queries {
                        black_box(index.query(query, 10).unwrap());
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_bounded_vs_raw(c: &mut Criterion) {
    let mut group = c.benchmark_group("bounded_vs_raw");

    let vectors = generate_vectors(10_000, 64, 4);
    let index = build_index(&vectors, 10);
    let query = generate_vectors(1, 64, 5).remove(0);

    group.bench_function("knn_search_k10", |b| {
        b.iter(|| black_box(index.knn_search(&query, 10, None).unwrap()));
    });
    group.bench_function("dedup_max_ef_64", |b| {
        let options = QueryOptions::new(10).with_max_ef(64);
        b.iter(|| black_box(index.query_with(&query, &options).unwrap()));
    });
    group.bench_function("dedup_unbounded", |b| {
        let options = QueryOptions::new(10);
        b.iter(|| black_box(index.query_with(&query, &options).unwrap()));
    });

    group.finish();
}

fn bench_query_batch(c: &mut Criterion) {
    let vectors = generate_vectors(10_000, 64, 6);
    let index = build_index(&vectors, 4);
    let queries = generate_vectors(256, 64, 7);

    c.bench_function("query_batch_256", |b| {
        b.iter(|| black_box(index.query_batch(&queries, 10).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_insert,
    bench_dedup_query,
    bench_bounded_vs_raw,
    bench_query_batch
);
criterion_main!(benches);
