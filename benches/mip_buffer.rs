//! Benchmarks for the mip buffer and per-frame work
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mipscope::signal::SignalGenerator;
use mipscope::{trace, Channel, ChannelConfig, MipBuffer, ViewportController, ViewportSettings};

fn filled_buffer(size: usize) -> MipBuffer {
    let generator = SignalGenerator::new(1);
    let mut buf = MipBuffer::with_capacity(size);
    for i in 0..size {
        buf.append(generator.sample(i as f64 / 1000.0));
    }
    buf
}

fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("append");

    for size in [1000, 100_000, 1_000_000].iter() {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("append", size), size, |b, &size| {
            let mut buf = filled_buffer(size);
            let mut i = 0u64;
            b.iter(|| {
                buf.append(black_box((i % 256) as f64));
                i = i.wrapping_add(1);
            });
        });
    }

    group.finish();
}

fn bench_query_range(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_range");

    // Cost should stay flat as the buffer grows
    for size in [10_000, 1_000_000, 4_000_000].iter() {
        let buf = filled_buffer(*size);
        let end = *size as f64;

        group.bench_with_input(BenchmarkId::new("full_view", size), &buf, |b, buf| {
            b.iter(|| {
                let slice = buf.query_range(black_box(0.0), black_box(end), 1280.0);
                black_box(slice.map(|s| s.len()))
            });
        });

        group.bench_with_input(BenchmarkId::new("last_second", size), &buf, |b, buf| {
            b.iter(|| {
                let slice = buf.query_range(black_box(end - 1000.0), black_box(end), 1280.0);
                black_box(slice.map(|s| s.len()))
            });
        });
    }

    group.finish();
}

fn bench_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame");

    let generator = SignalGenerator::new(2);
    let mut channel = Channel::new(ChannelConfig::new("bench", 1000.0)).unwrap();
    for i in 0..1_000_000 {
        channel.append(generator.sample(i as f64 / 1000.0), Some(0.0));
    }
    let mut viewport = ViewportController::new(&channel, ViewportSettings::default());
    viewport.set_view_size(1280.0, 720.0);
    viewport.tick(1.0 / 60.0, &channel);

    group.bench_function("tick", |b| {
        b.iter(|| viewport.tick(black_box(1.0 / 60.0), &channel));
    });

    viewport.zoom_out(0.99, 0.0, &channel);
    for _ in 0..600 {
        viewport.tick(1.0 / 60.0, &channel);
    }
    let view = viewport.current();

    group.bench_function("build_trace", |b| {
        b.iter(|| black_box(trace::build(&channel, view.x1, view.x2, 1280.0)));
    });

    group.finish();
}

criterion_group!(benches, bench_append, bench_query_range, bench_frame);
criterion_main!(benches);
