//! Benchmarking state interpolation and step sampling
extern crate criterion;
use criterion::{criterion_group, criterion_main, Criterion};

use std::str::FromStr;

use oem::prelude::{Duration, EpochTime, OEM};

fn benchmark(c: &mut Criterion) {
    let mut interp_grp = c.benchmark_group("interpolation");

    // Hermite, degree 7
    let hermite = OEM::from_file("test_resources/OEM/valid/v2_example.oem").unwrap();
    // Lagrange, degree 5
    let lagrange = OEM::from_file("test_resources/OEM/valid/v1_iss.oem").unwrap();

    let epoch = EpochTime::from_str("2020-03-01T12:04:30").unwrap();

    interp_grp.bench_function("hermite/7", |b| {
        b.iter(|| {
            let _ = hermite.sample_at(&epoch).unwrap();
        })
    });

    interp_grp.bench_function("lagrange/5", |b| {
        b.iter(|| {
            let _ = lagrange.sample_at(&epoch).unwrap();
        })
    });

    interp_grp.bench_function("steps/10s", |b| {
        b.iter(|| {
            let _ = hermite
                .steps(Duration::from_seconds(10.0))
                .unwrap()
                .collect::<Result<Vec<_>, _>>()
                .unwrap();
        })
    });

    interp_grp.finish();
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
