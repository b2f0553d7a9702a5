//! Benchmarks for text splitting
//!
//! This benchmark measures:
//! - Sentence-aware splitting of article-length input
//! - Hard splitting of text without sentence terminators

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use speechgen::text::{segments, split_text};

const PARAGRAPH: &str = "The quick brown fox jumps over the lazy dog. \
Pack my box with five dozen liquor jugs! \
How vexingly quick daft zebras jump? ";

fn bench_sentence_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("split_text");
    for repeats in [10usize, 100, 1000] {
        let text = PARAGRAPH.repeat(repeats);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(repeats), &text, |b, text| {
            b.iter(|| split_text(black_box(text), 2000))
        });
    }
    group.finish();
}

fn bench_hard_split(c: &mut Criterion) {
    let text = "word ".repeat(20_000);
    c.bench_function("split_text/no_terminators", |b| {
        b.iter(|| split_text(black_box(&text), 2000))
    });
}

fn bench_segments(c: &mut Criterion) {
    let text = PARAGRAPH.repeat(500);
    c.bench_function("segments/article", |b| {
        b.iter(|| segments(black_box(&text), 500))
    });
}

criterion_group!(benches, bench_sentence_split, bench_hard_split, bench_segments);
criterion_main!(benches);
