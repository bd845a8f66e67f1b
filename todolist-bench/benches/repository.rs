//! Criterion benchmarks for the task repository
//!
//! Hot paths:
//! - `TaskRepository::create`: one IMMEDIATE transaction per insert
//! - `TaskRepository::get`: primary-key lookup
//! - `TaskRepository::list`: full ordered scan, swept over store size

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use todolist_bench::ScratchStore;
use todolist_core::{NewTask, SortOrder, TaskFilter};

const SIZES: [usize; 3] = [100, 1_000, 10_000];

fn bench_create(c: &mut Criterion) {
    let mut group = c.benchmark_group("repository/create");

    for size in SIZES {
        let store = ScratchStore::new().unwrap();
        store.seed(size).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), &store, |b, store| {
            b.iter(|| {
                store
                    .repo()
                    .create(black_box(NewTask::new("benchmark task")))
                    .unwrap()
            })
        });
    }

    group.finish();
}

fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("repository/get");

    for size in SIZES {
        let store = ScratchStore::new().unwrap();
        let ids = store.seed(size).unwrap();
        let mut next = 0;

        group.bench_with_input(BenchmarkId::from_parameter(size), &ids, |b, ids| {
            b.iter(|| {
                next = (next + 1) % ids.len();
                store.repo().get(black_box(ids[next])).unwrap()
            })
        });
    }

    group.finish();
}

fn bench_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("repository/list");
    group.sample_size(20);

    for size in SIZES {
        let store = ScratchStore::new().unwrap();
        store.seed(size).unwrap();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &store, |b, store| {
            b.iter(|| {
                store
                    .repo()
                    .list(
                        black_box(&TaskFilter::default()),
                        SortOrder::ByPriorityThenCreated,
                    )
                    .unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_create, bench_get, bench_list);
criterion_main!(benches);
