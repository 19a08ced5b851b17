//! Benchmarks for the layered fold and cached reads
//!
//! Run with: cargo bench -p modval-core

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use modval_core::fold::fold_layers;
use modval_core::modifier::templates;
use modval_core::{ModifiedValue, Modifier};
use std::hint::black_box;

/// `n` modifiers spread over four layers with mixed kinds and priorities.
fn make_stack(n: usize) -> Vec<Modifier<f64>> {
    (0..n)
        .map(|i| {
            let modifier = match i % 4 {
                0 => templates::add(1.5),
                1 => templates::mul(1.01),
                2 => templates::add_fraction(0.1),
                _ => templates::max_cap(1.0e9),
            };
            modifier.with_layer((i % 4) as i32).with_priority((i % 3 == 0) as i32)
        })
        .collect()
}

fn bench_fold(c: &mut Criterion) {
    let mut group = c.benchmark_group("fold/layers");

    for n in [4, 16, 64, 256] {
        let stack = make_stack(n);
        group.bench_with_input(BenchmarkId::new("fold", n), &stack, |b, stack| {
            b.iter(|| black_box(fold_layers(&100.0, stack, None)))
        });
    }

    group.finish();
}

fn bench_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("fold/value");

    for n in [16, 256] {
        let value = ModifiedValue::new(100.0);
        for modifier in make_stack(n) {
            value.attach(&modifier);
        }

        group.bench_with_input(BenchmarkId::new("cached", n), &value, |b, value| {
            b.iter(|| black_box(value.value()))
        });
        group.bench_with_input(BenchmarkId::new("invalidated", n), &value, |b, value| {
            b.iter(|| {
                value.set_dirty();
                black_box(value.value())
            })
        });
    }

    group.finish();
}

fn bench_chain(c: &mut Criterion) {
    let root = ModifiedValue::new(1.0);
    let mut tail = root.clone();
    for _ in 0..32 {
        let next = ModifiedValue::following(&tail);
        next.attach(&templates::add(1.0));
        tail = next;
    }
    // Intermediate values stay alive through the dependency links.

    c.bench_function("fold/chain_32", |b| {
        b.iter(|| {
            root.set_dirty();
            black_box(tail.value())
        })
    });
}

criterion_group!(benches, bench_fold, bench_reads, bench_chain);
criterion_main!(benches);
