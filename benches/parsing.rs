//! Benchmarking OEM parsing, in both formats
extern crate criterion;
use criterion::{criterion_group, criterion_main, Criterion};

use oem::prelude::OEM;

fn oem_parsing(path: &str) {
    let _ = OEM::from_file(path).unwrap();
}

fn benchmark(c: &mut Criterion) {
    let mut parsing_grp = c.benchmark_group("parsing");

    // Single segment, with covariances
    parsing_grp.bench_function("KVN/V2", |b| {
        b.iter(|| {
            oem_parsing("test_resources/OEM/valid/v2_example.oem");
        })
    });

    parsing_grp.bench_function("KVN/V2/multi", |b| {
        b.iter(|| {
            oem_parsing("test_resources/OEM/valid/v2_multi.oem");
        })
    });

    parsing_grp.bench_function("XML/V2", |b| {
        b.iter(|| {
            oem_parsing("test_resources/OEM/valid/v2_example.xml");
        })
    });

    parsing_grp.finish();
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
