//! Benchmarks for the hot ingress path.
//!
//! Covers frame construction and cloning (the adapter clones frames into
//! its queue), the rate counter feeding the passthrough estimate, and the
//! full ingress-to-sink roundtrip in passthrough mode.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use frame_cadence::rate::{RateCounter, FRAME_RATE_AVERAGING_WINDOW_MS};
use frame_cadence::test_utils::test_frame;
use frame_cadence::{AdapterConfig, CadenceAdapter, ChannelSink, MonotonicClock, VideoFrame};

fn bench_frame_construction(c: &mut Criterion) {
    let payload = vec![0x5a; 640 * 360 * 4];

    let mut group = c.benchmark_group("frame_construction");
    group.throughput(Throughput::Bytes(payload.len() as u64));

    group.bench_function("new_from_payload", |b| {
        b.iter(|| {
            let frame = VideoFrame::new(black_box(payload.clone()), black_box(1_000));
            black_box(frame)
        })
    });

    let frame = test_frame(1_000);
    group.bench_function("clone_shares_payload", |b| {
        b.iter(|| {
            let copy = black_box(&frame).clone();
            black_box(copy)
        })
    });

    group.finish();
}

fn bench_rate_counter(c: &mut Criterion) {
    c.bench_function("rate_counter_update_and_rate", |b| {
        let mut counter = RateCounter::new(FRAME_RATE_AVERAGING_WINDOW_MS, 1000);
        let mut now_ms = 0i64;
        b.iter(|| {
            now_ms += 16;
            counter.update(black_box(now_ms));
            black_box(counter.rate(now_ms))
        })
    });
}

fn bench_passthrough_roundtrip(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("runtime");
    let (sink, mut emitted) = ChannelSink::channel();
    let adapter = runtime.block_on(async {
        CadenceAdapter::spawn(AdapterConfig::default(), Arc::new(MonotonicClock::new()), sink)
    });
    let frame = test_frame(1_000);

    c.bench_function("passthrough_ingress_to_sink", |b| {
        b.iter(|| {
            adapter.on_frame(black_box(frame.clone()));
            runtime.block_on(emitted.recv()).expect("emission")
        })
    });
}

criterion_group!(
    benches,
    bench_frame_construction,
    bench_rate_counter,
    bench_passthrough_roundtrip
);
criterion_main!(benches);
