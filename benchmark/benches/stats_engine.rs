// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Statistics engine microbenchmarks.
//!
//! Sorting, trimming and the arbitrary-precision standard deviation at
//! several sample counts, plus linker log parsing.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use runstat_benchmark::{synthetic_linker_log, SampleGenerator};
use runstat_core::{RelocationMetrics, Statistics, Timespan};

/// Sample counts to benchmark.
const SAMPLE_COUNTS: &[usize] = &[30, 1_000, 100_000];

fn bench_statistics(c: &mut Criterion) {
    let mut group = c.benchmark_group("statistics");

    for &count in SAMPLE_COUNTS {
        group.throughput(Throughput::Elements(count as u64));
        let samples =
            SampleGenerator::new(42).samples(count, Timespan::from_millis(25), 5_000_000);

        group.bench_with_input(BenchmarkId::from_parameter(count), &samples, |b, samples| {
            b.iter(|| Statistics::from_samples(black_box(samples.clone()), 2));
        });
    }

    group.finish();
}

fn bench_large_values(c: &mut Criterion) {
    // Hour-long samples push the squared deviations far past 64 bits.
    let samples =
        SampleGenerator::new(3).samples(1_000, Timespan::from_secs(3_600), 900_000_000_000);

    c.bench_function("statistics_hour_long_samples", |b| {
        b.iter(|| Statistics::from_samples(black_box(samples.clone()), 10));
    });
}

fn bench_linker_log_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("linker_log_parse");

    for &noise in &[0usize, 100, 10_000] {
        let log = synthetic_linker_log(noise);
        group.throughput(Throughput::Bytes(log.len() as u64));

        group.bench_with_input(BenchmarkId::from_parameter(noise), &log, |b, log| {
            b.iter(|| RelocationMetrics::parse(black_box(log.as_bytes())));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_statistics,
    bench_large_values,
    bench_linker_log_parse
);
criterion_main!(benches);
