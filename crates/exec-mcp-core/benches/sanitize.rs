//! Benchmarks for the output sanitizer hot path.
//!
//! `fix_output` runs on every poll iteration against the full accumulated
//! buffer, so its cost bounds the acquisition loop's overhead.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use exec_mcp_core::sanitize::{clean_final, fix_output};

fn build_buffer(lines: usize) -> String {
    let mut out = String::new();
    for i in 0..lines {
        out.push_str(&format!(
            "  [{i:05}] \x1b[32mok\x1b[0m downloading\rdownloaded chunk {i}  \r\n"
        ));
    }
    out
}

fn bench_fix_output(c: &mut Criterion) {
    let small = build_buffer(50);
    let large = build_buffer(5_000);

    c.bench_function("fix_output_50_lines", |b| {
        b.iter(|| fix_output(black_box(&small)))
    });
    c.bench_function("fix_output_5000_lines", |b| {
        b.iter(|| fix_output(black_box(&large)))
    });
}

fn bench_clean_final(c: &mut Criterion) {
    let buffer = build_buffer(1_000);

    c.bench_function("clean_final_1000_lines", |b| {
        b.iter(|| clean_final(black_box(&buffer)))
    });
}

criterion_group!(benches, bench_fix_output, bench_clean_final);
criterion_main!(benches);
