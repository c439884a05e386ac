//! Performance measurement for complete map assembly

// Criterion macros generate undocumented functions
#![allow(missing_docs)]

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;
use tileweave::assembly::{AssembleOptions, assemble};
use tileweave::catalog::ump;

const BENCH_THEME: &str = r#"
tile +cell
{
3 3

0  0  0
0  +a 0
0  0  0
}

tile +pair
{
4 3

0  0  0  0
0  +a +a 0
0  0  0  0
}

assembly open
{
size "8 8"
+cell "0 64"
+pair "0 16"
}
"#;

/// Measures a full assembly run: required-tile search plus gap coverage
fn bench_assemble_8x8(c: &mut Criterion) {
    let theme = Arc::new(ump::parse_theme("bench", BENCH_THEME).expect("theme parses"));
    let options = AssembleOptions {
        seed: Some(12345),
        ..AssembleOptions::default()
    };

    c.bench_function("assemble_8x8", |b| {
        b.iter(|| {
            let map = assemble(&theme, &options).expect("assembly succeeds");
            black_box(map.placed);
        });
    });
}

criterion_group!(benches, bench_assemble_8x8);
criterion_main!(benches);
