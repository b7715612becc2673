use std::fmt::Write as _;

use criterion::{criterion_group, criterion_main, Criterion};
use yamlet::{dump, load_all, DumpOptions};

fn large_yaml() -> String {
    let mut text = String::with_capacity(1 << 20);
    for i in 0..2000 {
        let _ = writeln!(text, "record{i}:");
        let _ = writeln!(text, "  id: {i}");
        let _ = writeln!(text, "  ratio: {}.5", i % 100);
        let _ = writeln!(text, "  name: \"item number {i}\"");
        let _ = writeln!(text, "  tags: [a{i}, b{i}, c{i}]");
        let _ = writeln!(text, "  notes: |");
        let _ = writeln!(text, "    line one of record {i}");
        let _ = writeln!(text, "    line two of record {i}");
    }
    text
}

pub fn parser(c: &mut Criterion) {
    let input = large_yaml();

    c.bench_function("yamlet parse large", |b| {
        b.iter(|| {
            let mut bytes = input.as_bytes();
            load_all(&mut bytes).unwrap()
        })
    });

    c.bench_function("yamlet emit large", |b| {
        let documents = {
            let mut bytes = input.as_bytes();
            load_all(&mut bytes).unwrap()
        };
        let options = DumpOptions {
            yaml_version: None,
            ..DumpOptions::default()
        };
        let mut output = Vec::with_capacity(input.len() * 2);

        b.iter_custom(|iters| {
            let mut measurement = std::time::Duration::ZERO;
            for _ in 0..iters {
                let documents = documents.clone();
                output.clear();
                let start_time = std::time::Instant::now();
                dump(&mut output, documents, &options).unwrap();
                measurement += start_time.elapsed();
            }
            measurement
        })
    });
}

criterion_group!(benches, parser);
criterion_main!(benches);
