// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Performance benchmarks for the SysEx core
//!
//! Run with: cargo bench
//!
//! These benchmarks measure:
//! - Frame encoding and decoding
//! - Value validation across the catalog
//! - Query round trips against the simulated instrument

use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use matriarch_ctl::midi::simulated::PORT_NAME;
use matriarch_ctl::midi::SimulatedDevice;
use matriarch_ctl::{params, sysex, ConnectionManager, Settings};

/// Benchmark building query and set frames
fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    group.bench_function("query", |b| {
        b.iter(|| black_box(sysex::encode_query(black_box(23), black_box(0))))
    });

    for value in [0u16, 127, 8192, 16383].iter() {
        group.bench_with_input(BenchmarkId::new("set", value), value, |b, &value| {
            b.iter(|| black_box(sysex::encode_set(23, black_box(value), 0)))
        });
    }

    group.finish();
}

/// Benchmark the listener's per-frame work
fn bench_decode(c: &mut Criterion) {
    let frame = sysex::encode_response(23, 9000, 0).unwrap_or_default();
    let foreign = vec![0xF0, 0x43, 0x10, 0x4C, 0x00, 0x00, 0x7E, 0x00, 0xF7];

    c.bench_function("decode_response", |b| {
        b.iter(|| black_box(sysex::decode_response(black_box(&frame))))
    });

    c.bench_function("is_recognized_foreign", |b| {
        b.iter(|| black_box(sysex::is_recognized(black_box(&foreign))))
    });

    c.bench_function("format_for_log", |b| {
        b.iter(|| black_box(sysex::format_for_log(black_box(&frame))))
    });
}

/// Benchmark validating out-of-range input against every parameter
fn bench_validate(c: &mut Criterion) {
    c.bench_function("validate_catalog", |b| {
        b.iter(|| {
            let mut sum = 0u32;
            for def in params::PARAMETERS {
                sum += u32::from(def.validate(black_box(20000)));
                sum += u32::from(def.validate(black_box(-5)));
            }
            black_box(sum)
        })
    });

    c.bench_function("lookup", |b| {
        b.iter(|| black_box(params::get(black_box(71))))
    });
}

/// Benchmark a full query round trip through the listener thread
fn bench_round_trip(c: &mut Criterion) {
    let mut settings = Settings::default();
    settings.listener.poll_interval_ms = 1;
    let device = SimulatedDevice::new();
    let manager = ConnectionManager::new(Arc::new(device), settings);
    if !manager.connect(PORT_NAME, PORT_NAME) {
        return;
    }

    c.bench_function("query_round_trip", |b| {
        b.iter(|| black_box(manager.query_one(23, Some(Duration::from_secs(1)))))
    });

    manager.disconnect();
}

criterion_group!(
    benches,
    bench_encode,
    bench_decode,
    bench_validate,
    bench_round_trip,
);

criterion_main!(benches);
