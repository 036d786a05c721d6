//! Benchmarking OEM formatting, in both formats
extern crate criterion;
use criterion::{criterion_group, criterion_main, Criterion};

use std::io::{BufWriter, Write};

use oem::prelude::{FileFormat, OEM};

#[derive(Debug)]
pub struct Utf8Buffer {
    pub inner: Vec<u8>,
}

impl Write for Utf8Buffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.clear();
        Ok(())
    }
}

impl Utf8Buffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Vec::with_capacity(capacity),
        }
    }
}

fn oem_formatting<W: Write>(oem: &OEM, w: &mut BufWriter<W>, format: FileFormat) {
    oem.to_writer(w, format).unwrap();
    w.flush().unwrap();
}

fn benchmark(c: &mut Criterion) {
    let mut formatting_grp = c.benchmark_group("formatting");

    let mut buffer = BufWriter::new(Utf8Buffer::new(8192));

    let oem = OEM::from_file("test_resources/OEM/valid/v2_example.oem").unwrap();

    for format in [FileFormat::KVN, FileFormat::XML] {
        formatting_grp.bench_function(&format!("{}/V2", format), |b| {
            b.iter(|| {
                oem_formatting(&oem, &mut buffer, format);
            })
        });
    }

    formatting_grp.finish();
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
