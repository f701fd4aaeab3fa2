//! Frame constructor benchmarks
//!
//! Zero-copy delivery, split-frame accumulation, start code scanning and
//! header removal on synthetic AVC streams.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use vfc_lib::codec::startcode::iter_nals;
use vfc_lib::codec::CodecKind;
use vfc_lib::constructor::{ConstructorConfig, FrameConstructor, LogContext, StreamInfo};
use vfc_lib::{remove_headers, Bitstream};

/// Baseline SPS, 1280x720
const SPS: [u8; 9] = [0x67, 0x42, 0xC0, 0x1F, 0xED, 0x00, 0xA0, 0x0B, 0x72];
const PPS: [u8; 4] = [0x68, 0xCE, 0x3C, 0x80];

fn annexb(units: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::new();
    for unit in units {
        out.extend_from_slice(&[0, 0, 0, 1]);
        out.extend_from_slice(unit);
    }
    out
}

fn slice(header: &[u8], len: usize) -> Vec<u8> {
    let mut nal = header.to_vec();
    nal.extend((header.len()..len).map(|i| 0xA0 | (i as u8 & 0x0F)));
    nal
}

fn keyframe(len: usize) -> Vec<u8> {
    annexb(&[&SPS, &PPS, &slice(&[0x65, 0x88, 0x84], len)])
}

fn p_frame(len: usize) -> Vec<u8> {
    annexb(&[&slice(&[0x41, 0x9A], len)])
}

/// Constructor that has already delivered a keyframe
fn primed_constructor() -> FrameConstructor {
    let mut fc = FrameConstructor::new(
        CodecKind::Avc,
        ConstructorConfig::default(),
        LogContext::disabled(),
    );
    fc.init(StreamInfo::default())
        .expect("Failed to initialize constructor");
    fc.load(Bytes::from(keyframe(1024)), 0, false, true)
        .expect("Failed to load keyframe");
    drain(&mut fc);
    fc
}

fn drain(fc: &mut FrameConstructor) {
    if let Some(bst) = fc.bitstream() {
        let len = bst.data_length();
        black_box(bst.data());
        bst.consume(len).expect("Failed to consume");
    }
    fc.unload().expect("Failed to unload");
}

/// Whole access units handed out without copying
fn bench_zero_copy_delivery(c: &mut Criterion) {
    let mut group = c.benchmark_group("zero_copy_delivery");

    for &size in &[4 * 1024, 64 * 1024, 512 * 1024] {
        let frame = Bytes::from(p_frame(size));
        group.throughput(Throughput::Bytes(frame.len() as u64));

        group.bench_with_input(BenchmarkId::from_parameter(size), &frame, |b, frame| {
            let mut fc = primed_constructor();
            b.iter(|| {
                fc.load(frame.clone(), 0, false, true)
                    .expect("Failed to load");
                drain(&mut fc);
            });
        });
    }

    group.finish();
}

/// Access units arriving in transport-sized pieces
fn bench_chunked_accumulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunked_accumulation");

    let frame = Bytes::from(p_frame(256 * 1024));
    group.throughput(Throughput::Bytes(frame.len() as u64));

    for &chunk in &[188usize, 1400, 16 * 1024] {
        group.bench_with_input(BenchmarkId::from_parameter(chunk), &chunk, |b, &chunk| {
            let mut fc = primed_constructor();
            b.iter(|| {
                let mut pos = 0;
                while pos < frame.len() {
                    let end = (pos + chunk).min(frame.len());
                    fc.load(frame.slice(pos..end), 0, false, end == frame.len())
                        .expect("Failed to load");
                    drain(&mut fc);
                    pos = end;
                }
            });
        });
    }

    group.finish();
}

/// Start code scanning over a stream of small NAL units
fn bench_start_code_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("start_code_scan");

    let data: Vec<u8> = (0..4096).flat_map(|_| p_frame(250)).collect();
    group.throughput(Throughput::Bytes(data.len() as u64));

    group.bench_function("iter_nals", |b| {
        b.iter(|| iter_nals(black_box(&data)).count());
    });

    group.finish();
}

/// Parameter set removal in front of an IDR slice
fn bench_remove_headers(c: &mut Criterion) {
    let mut group = c.benchmark_group("remove_headers");

    let au = keyframe(64 * 1024);
    group.throughput(Throughput::Bytes(au.len() as u64));

    let borrowed = Bytes::from(au.clone());
    group.bench_function("borrowed", |b| {
        b.iter(|| {
            let mut bst = Bitstream::borrowed(borrowed.clone());
            remove_headers(&mut bst, CodecKind::Avc).expect("Failed to remove headers");
            black_box(bst.data_length())
        });
    });

    group.bench_function("owned", |b| {
        b.iter(|| {
            let mut bst = Bitstream::owned(au.clone());
            remove_headers(&mut bst, CodecKind::Avc).expect("Failed to remove headers");
            black_box(bst.data_length())
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_zero_copy_delivery,
    bench_chunked_accumulation,
    bench_start_code_scan,
    bench_remove_headers,
);

criterion_main!(benches);
