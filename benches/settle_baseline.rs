//! Baseline benchmarks for settlement and combinator overhead.
//!
//! Run:
//!   cargo bench --bench settle_baseline

#![allow(missing_docs)]

use criterion::{Criterion, criterion_group, criterion_main};
use promissory::{Promise, combine_all};
use std::hint::black_box;

fn bench_settle(c: &mut Criterion) {
    c.bench_function("fulfill_with_one_subscriber", |b| {
        b.iter(|| {
            let promise = Promise::<u64, &str>::new();
            promise.subscribe(
                |value| {
                    black_box(value);
                },
                |_| {},
            );
            promise.fulfill(black_box(7));
        });
    });

    c.bench_function("late_subscription", |b| {
        b.iter(|| {
            let promise = Promise::<u64, &str>::fulfilled(black_box(7));
            promise.subscribe(
                |value| {
                    black_box(value);
                },
                |_| {},
            );
        });
    });

    c.bench_function("map_chain_8", |b| {
        b.iter(|| {
            let promise = Promise::<u64, &str>::new();
            let mut chained = promise.map(|value| value + 1);
            for _ in 0..7 {
                chained = chained.map(|value| value + 1);
            }
            promise.fulfill(black_box(0));
            black_box(chained.result());
        });
    });

    c.bench_function("combine_all_64", |b| {
        b.iter(|| {
            let promises: Vec<Promise<u64, &str>> = (0..64).map(|_| Promise::new()).collect();
            let aggregate = combine_all(promises.iter().cloned());
            for (index, promise) in promises.iter().enumerate() {
                promise.fulfill(index as u64);
            }
            black_box(aggregate.result());
        });
    });
}

criterion_group!(benches, bench_settle);
criterion_main!(benches);
