//! Benchmarks for the per-tick ingest path
//!
//! Measures the work done on bytes already read from the socket:
//! - Frame extraction for fixed-width and sentinel framing at various read sizes
//! - Record decoding for every wire layout
//!
//! Platform: Cross-platform (synthetic trajectories, no sockets, CI-safe)

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use flightline::test_utils::{encode_stream, synthetic_ascent};
use flightline::{FrameDecoder, FramingMode, ReceiveBuffer, RecordCodec, RecordLayout};
use std::hint::black_box;

const SAMPLES: usize = 1_000;

/// Feed `stream` through a fresh decoder in `chunk`-sized reads.
fn extract_all(framing: FramingMode, layout: RecordLayout, stream: &[u8], chunk: usize) -> usize {
    let mut decoder = FrameDecoder::new(framing, layout.record_size());
    let mut buffer = ReceiveBuffer::with_capacity(chunk + layout.record_size());
    let mut records = 0;
    for read in stream.chunks(chunk) {
        buffer.extend(read);
        records += decoder.extract_ready(&mut buffer).len();
    }
    records
}

fn bench_frame_extraction(c: &mut Criterion) {
    let samples = synthetic_ascent(SAMPLES);
    let cases = [
        ("extract_packed32_fixed", RecordLayout::Packed32, FramingMode::FixedWidth),
        ("extract_tagged64_fixed", RecordLayout::Tagged64, FramingMode::FixedWidth),
        ("extract_interleaved64_sentinel", RecordLayout::Interleaved64, FramingMode::sentinel()),
    ];

    for (name, layout, framing) in cases {
        let stream = encode_stream(layout, framing, &samples);
        let mut group = c.benchmark_group(name);
        group.throughput(Throughput::Bytes(stream.len() as u64));

        for chunk in [64usize, 1024, 16 * 1024] {
            group.bench_with_input(BenchmarkId::from_parameter(chunk), &chunk, |b, &chunk| {
                b.iter(|| black_box(extract_all(framing, layout, black_box(&stream), chunk)))
            });
        }

        group.finish();
    }
}

fn bench_record_decoding(c: &mut Criterion) {
    let sample = synthetic_ascent(2)[1];
    let mut group = c.benchmark_group("record_decode");

    for layout in [RecordLayout::Packed32, RecordLayout::Tagged64, RecordLayout::Interleaved64] {
        let codec = RecordCodec::new(layout);
        let record = codec.encode(&sample);
        group.throughput(Throughput::Bytes(record.len() as u64));

        group.bench_function(format!("{layout:?}"), |b| {
            b.iter(|| black_box(codec.decode(black_box(&record))))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_frame_extraction, bench_record_decoding);
criterion_main!(benches);
