//! Repository operation benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use redmodel_bench::utils::{memory_repository, random_token, random_user};
use redmodel_core::{Format, RepositoryConfig};

/// Benchmark inserts of new entities.
fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");

    for extensions in [0usize, 8, 32].iter() {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::from_parameter(extensions),
            extensions,
            |b, &extensions| {
                let repo = memory_repository(RepositoryConfig::default());
                b.iter(|| {
                    let mut user = random_user(repo.schema(), extensions);
                    black_box(repo.put(&mut user).unwrap());
                });
            },
        );
    }
    group.finish();
}

/// Benchmark updates that move a unique value.
fn bench_update(c: &mut Criterion) {
    let repo = memory_repository(RepositoryConfig::default());
    let mut user = random_user(repo.schema(), 4);
    repo.put(&mut user).unwrap();

    c.bench_function("update_moves_unique", |b| {
        b.iter(|| {
            user.set("handle", random_token(12));
            repo.put(black_box(&mut user)).unwrap();
        });
    });
}

/// Benchmark reads by id and by unique value.
fn bench_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("read");

    for format in [Format::Json, Format::Cbor] {
        let repo = memory_repository(RepositoryConfig::new().format(format));
        let mut user = random_user(repo.schema(), 8);
        let id = repo.put(&mut user).unwrap();
        let email = user.get("email").cloned().unwrap();

        group.bench_function(BenchmarkId::new("get", format!("{format:?}")), |b| {
            b.iter(|| black_box(repo.get(black_box(id)).unwrap()));
        });
        group.bench_function(BenchmarkId::new("get_by", format!("{format:?}")), |b| {
            b.iter(|| black_box(repo.get_by("email", email.clone()).unwrap()));
        });
    }
    group.finish();
}

/// Benchmark an insert followed by its delete.
fn bench_insert_delete(c: &mut Criterion) {
    let repo = memory_repository(RepositoryConfig::default());

    c.bench_function("insert_delete", |b| {
        b.iter(|| {
            let mut user = random_user(repo.schema(), 0);
            repo.put(&mut user).unwrap();
            repo.delete(black_box(&mut user)).unwrap();
        });
    });
}

criterion_group!(
    benches,
    bench_insert,
    bench_update,
    bench_reads,
    bench_insert_delete,
);
criterion_main!(benches);
