//! Throughput benchmarks for the event emitter
//!
//! Measures per-turn cost for the common shapes of a response: plain text,
//! a code call fragmented into small argument pieces, and a reviewed call.
//!
//! Run with: cargo bench -p execstream-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use futures::stream::{self, StreamExt};
use tokio::runtime::Runtime;

use execstream_core::{parse_partial_json, Delta, EmitterConfig, Event, FunctionCallDelta, StreamEventEmitter};

fn code_turn(lines: usize, fragment_len: usize) -> Vec<Delta> {
    let code: String = (0..lines).map(|i| format!("print({})\\n", i)).collect();
    let arguments = format!(r#"{{"language": "python", "code": "{}"}}"#, code);

    let mut deltas = vec![Delta::tool_call(0, FunctionCallDelta::name("execute"))];
    let bytes = arguments.as_bytes();
    for piece in bytes.chunks(fragment_len) {
        // arguments are ASCII, so byte chunks are valid strings
        let piece = String::from_utf8_lossy(piece).into_owned();
        deltas.push(Delta::tool_call(0, FunctionCallDelta::arguments(piece)));
    }
    deltas
}

fn text_turn(words: usize) -> Vec<Delta> {
    (0..words).map(|i| Delta::content(format!("word{} ", i))).collect()
}

fn run(deltas: Vec<Delta>) -> Vec<Event> {
    let emitter = StreamEventEmitter::new(EmitterConfig::default()).unwrap();
    emitter.into_events(deltas).collect()
}

/// Benchmark text-only and code turns of increasing size
fn benchmark_turns(c: &mut Criterion) {
    let mut group = c.benchmark_group("Emitter_Turns");
    group.sample_size(50);

    for words in [100, 1_000] {
        let deltas = text_turn(words);
        group.throughput(Throughput::Elements(deltas.len() as u64));
        group.bench_with_input(BenchmarkId::new("text", words), &deltas, |b, deltas| {
            b.iter(|| run(black_box(deltas.clone())))
        });
    }

    for lines in [10, 100] {
        let deltas = code_turn(lines, 8);
        group.throughput(Throughput::Elements(deltas.len() as u64));
        group.bench_with_input(BenchmarkId::new("code", lines), &deltas, |b, deltas| {
            b.iter(|| run(black_box(deltas.clone())))
        });
    }

    group.finish();
}

/// Benchmark the review splitter path
fn benchmark_review(c: &mut Criterion) {
    let mut deltas = code_turn(10, 16);
    deltas.push(Delta::content("<war"));
    deltas.push(Delta::content("ning>"));
    deltas.extend((0..200).map(|i| Delta::content(format!("reason {} ", i))));
    deltas.push(Delta::content("</warning>"));

    c.bench_function("review_turn", |b| b.iter(|| run(black_box(deltas.clone()))));
}

/// Benchmark the async stream wrapper against the iterator
fn benchmark_async_stream(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let deltas = code_turn(100, 8);

    c.bench_function("code_turn_stream", |b| {
        b.iter(|| {
            rt.block_on(async {
                let emitter = StreamEventEmitter::new(EmitterConfig::default()).unwrap();
                emitter
                    .into_stream(stream::iter(black_box(deltas.clone())))
                    .collect::<Vec<Event>>()
                    .await
            })
        })
    });
}

/// Benchmark partial JSON parsing on a growing argument prefix
fn benchmark_partial_json(c: &mut Criterion) {
    let code: String = (0..200).map(|i| format!("x = {}\\n", i)).collect();
    let arguments = format!(r#"{{"language": "python", "code": "{}"}}"#, code);

    let mut group = c.benchmark_group("Partial_JSON");
    for cut in [16, arguments.len() / 2, arguments.len() - 2] {
        let prefix = &arguments[..cut];
        group.bench_with_input(BenchmarkId::new("prefix", cut), &prefix, |b, prefix| {
            b.iter(|| parse_partial_json(black_box(prefix)))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_turns,
    benchmark_review,
    benchmark_async_stream,
    benchmark_partial_json
);
criterion_main!(benches);
