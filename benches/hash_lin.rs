use core::ptr::NonNull;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use assoc_ds::hash::inthash_u32;
use assoc_ds::{HashLin, Node};

const SIZES: [u32; 3] = [1_000, 10_000, 100_000];

fn node_for(v: &mut u32) -> NonNull<Node<u32>> {
    let n = Box::new(Node::new(NonNull::from(v), 0));
    Box::leak(n).into()
}

// The defining property under test here isn't throughput but that no single
// operation stalls: this group exists to make regressions in the per-step
// work bound of `HashLin::step` visible in `criterion`'s per-iteration
// variance, not just in its mean.
fn insert_incremental(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_lin_insert");
    for &n in &SIZES {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let mut vals: Vec<u32> = (0..n).collect();
                let mut table: HashLin<u32> = HashLin::new();
                let nodes: Vec<_> = vals.iter_mut().map(node_for).collect();
                for (&v, &node) in vals.iter().zip(&nodes) {
                    unsafe { table.insert(node, inthash_u32(v)) };
                }
                black_box(table.count());
                for node in nodes {
                    unsafe {
                        table.remove_existing(node);
                        drop(Box::from_raw(node.as_ptr()));
                    }
                }
            });
        });
    }
    group.finish();
}

fn search_during_transition(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_lin_search_mid_resize");
    for &n in &SIZES {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let mut vals: Vec<u32> = (0..n).collect();
                let mut table: HashLin<u32> = HashLin::new();
                let nodes: Vec<_> = vals.iter_mut().map(node_for).collect();
                // Insert half, forcing a GROW transition to be in flight,
                // then search the already-inserted half while it's live.
                for (&v, &node) in vals.iter().zip(&nodes).take(n as usize / 2) {
                    unsafe { table.insert(node, inthash_u32(v)) };
                }
                for v in 0..n / 2 {
                    let hash = inthash_u32(v);
                    black_box(table.search(&v, hash, |arg, data| unsafe { data.as_ref() == arg }));
                }
                for (i, &node) in nodes.iter().enumerate() {
                    if i < n as usize / 2 {
                        unsafe {
                            table.remove_existing(node);
                        }
                    }
                    unsafe {
                        drop(Box::from_raw(node.as_ptr()));
                    }
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, insert_incremental, search_during_transition);
criterion_main!(benches);
