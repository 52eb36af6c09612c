//! Extraction and encoding benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use redmodel_bench::utils::{random_user, user_schema};
use redmodel_core::{extract, Format};

/// Benchmark property extraction.
fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract");
    let schema = user_schema();

    for extensions in [0usize, 8, 64].iter() {
        let user = random_user(&schema, *extensions);
        group.bench_with_input(BenchmarkId::from_parameter(extensions), &user, |b, user| {
            b.iter(|| black_box(extract(black_box(user)).unwrap()));
        });
    }
    group.finish();
}

/// Benchmark encoding and decoding attribute maps.
fn bench_formats(c: &mut Criterion) {
    let mut group = c.benchmark_group("format");
    let schema = user_schema();
    let attributes = extract(&random_user(&schema, 16)).unwrap().attributes;

    for format in [Format::Json, Format::Cbor] {
        let encoded = format.encode(&attributes).unwrap();
        group.bench_function(BenchmarkId::new("encode", format!("{format:?}")), |b| {
            b.iter(|| black_box(format.encode(black_box(&attributes)).unwrap()));
        });
        group.bench_function(BenchmarkId::new("decode", format!("{format:?}")), |b| {
            b.iter(|| black_box(format.decode(black_box(&encoded)).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_extract, bench_formats);
criterion_main!(benches);
