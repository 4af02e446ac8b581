//! B+tree benchmarks.
//!
//! Measures the copy-on-write insert, point lookup, range scan and delete
//! paths over the in-memory store, plus inserts over the file-backed store.

use std::hint::black_box;
use std::ops::Bound;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use cowbtree::{BTree, DiskStore, MemoryStore};
use tempfile::tempdir;

fn key(i: usize) -> Vec<u8> {
    format!("key{:08}", i).into_bytes()
}

fn scrambled(count: usize) -> Vec<usize> {
    // 2654435761 is coprime with every count used here.
    (0..count).map(|i| (i * 2_654_435_761) % count).collect()
}

fn filled_tree(count: usize) -> BTree<MemoryStore> {
    let mut tree = BTree::create(MemoryStore::new()).unwrap();
    for i in 0..count {
        let value = format!("value{:08}", i);
        tree.insert(&key(i), value.as_bytes()).unwrap();
    }
    tree
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("btree_insert");

    for count in [1_000, 10_000] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("sequential", count), &count, |b, &count| {
            b.iter(|| black_box(filled_tree(count)));
        });

        group.bench_with_input(BenchmarkId::new("random", count), &count, |b, &count| {
            let order = scrambled(count);
            b.iter(|| {
                let mut tree = BTree::create(MemoryStore::new()).unwrap();
                for &i in &order {
                    tree.insert(&key(i), b"value").unwrap();
                }
                black_box(tree)
            });
        });
    }

    group.finish();
}

fn bench_disk_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("btree_disk_insert");
    let count = 1_000;
    group.throughput(Throughput::Elements(count as u64));

    group.bench_function(BenchmarkId::new("sequential", count), |b| {
        b.iter_with_setup(
            || {
                let dir = tempdir().unwrap();
                let store = DiskStore::create(dir.path().join("bench.db")).unwrap();
                (dir, store)
            },
            |(dir, store)| {
                let mut tree = BTree::create(&store).unwrap();
                for i in 0..count {
                    tree.insert(&key(i), b"value").unwrap();
                }
                drop(tree);
                (dir, store)
            },
        );
    });

    group.finish();
}

fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("btree_get");

    for count in [1_000, 100_000] {
        let tree = filled_tree(count);
        let probes = scrambled(count);
        group.bench_with_input(BenchmarkId::new("point", count), &count, |b, _| {
            let mut n = 0;
            b.iter(|| {
                let k = key(probes[n % probes.len()]);
                n += 1;
                black_box(tree.get(&k).unwrap())
            });
        });
    }

    group.finish();
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("btree_scan");
    let count = 100_000;
    let tree = filled_tree(count);

    group.throughput(Throughput::Elements(count as u64));
    group.bench_function("full", |b| {
        b.iter(|| black_box(tree.iter().unwrap().count()));
    });

    let (start, end) = (key(40_000), key(41_000));
    group.throughput(Throughput::Elements(1_000));
    group.bench_function("range_1000", |b| {
        b.iter(|| {
            let iter = tree
                .scan(Bound::Included(start.as_slice()), Bound::Excluded(end.as_slice()))
                .unwrap();
            black_box(iter.count())
        });
    });

    group.finish();
}

fn bench_delete(c: &mut Criterion) {
    let mut group = c.benchmark_group("btree_delete");
    let count = 10_000;
    group.throughput(Throughput::Elements(count as u64));

    group.bench_function(BenchmarkId::new("all_random", count), |b| {
        let order = scrambled(count);
        b.iter_with_setup(
            || filled_tree(count),
            |mut tree| {
                for &i in &order {
                    tree.delete(&key(i)).unwrap();
                }
                tree
            },
        );
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_insert,
    bench_disk_insert,
    bench_get,
    bench_scan,
    bench_delete
);
criterion_main!(benches);
