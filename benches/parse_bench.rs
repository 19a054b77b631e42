//! Template compile/match throughput.
//!
//! Run with `cargo bench --bench parse_bench`.

use criterion::{criterion_group, criterion_main, Criterion};
use seine_core::{ConverterRegistry, Parser};
use std::hint::black_box;

const GPGGA_TEMPLATE: &str =
    "$GPGGA,{Time:f},{Latitude:nlat},{NorS:w},{Longitude:nlon},{EorW:w},{Quality:d},{Sats:d}";
const GPGGA_SENTENCE: &str = "$GPGGA,123519.00,4807.038,N,01131.000,E,1,08";

fn bench_cached_parse(c: &mut Criterion) {
    let parser = Parser::default();
    // Warm the cache so the loop measures match + cast only.
    parser.compile(GPGGA_TEMPLATE).unwrap();

    c.bench_function("parse_cached_gpgga", |b| {
        b.iter(|| {
            let fields = parser
                .parse(black_box(GPGGA_TEMPLATE), black_box(GPGGA_SENTENCE))
                .unwrap();
            black_box(fields)
        })
    });
}

fn bench_cold_compile(c: &mut Criterion) {
    c.bench_function("compile_cold_gpgga", |b| {
        b.iter(|| {
            // Fresh parser each round: every compile misses the cache.
            let parser = Parser::new(ConverterRegistry::with_builtins());
            black_box(parser.compile(black_box(GPGGA_TEMPLATE)).unwrap())
        })
    });
}

fn bench_diagnose_partial(c: &mut Criterion) {
    let parser = Parser::default();
    let broken = "$GPGGA,123519.00,4807.038,N,01131.000,X,fail";

    c.bench_function("diagnose_partial_gpgga", |b| {
        b.iter(|| {
            black_box(
                parser
                    .diagnose(black_box(GPGGA_TEMPLATE), black_box(broken))
                    .unwrap(),
            )
        })
    });
}

criterion_group!(
    benches,
    bench_cached_parse,
    bench_cold_compile,
    bench_diagnose_partial
);
criterion_main!(benches);
