//! Benchmarks for pdfgeom layout and hit-testing performance.
//!
//! Run with: cargo bench
//!
//! These benchmarks use synthetic pages of evenly spaced words.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use pdfgeom::build::{pair_marks, Mark};
use pdfgeom::{
    Element, GeometryDocument, HitTester, Page, PageLayout, PageTokens, Point, Quad, Role, Word,
};

/// A page of `lines` lines, two columns of eight words each.
fn synthetic_page(lines: usize) -> PageTokens {
    let mut tokens = PageTokens::new(1);
    for line in 0..lines {
        let y = 760.0 - line as f64 * 12.0;
        for column in 0..2 {
            let left = 72.0 + column as f64 * 250.0;
            for i in 0..8 {
                let x = left + i as f64 * 26.0;
                tokens
                    .words
                    .push(Word::new(format!("w{}", i), x, y, 22.0, 10.0));
            }
        }
    }
    tokens
}

fn synthetic_marks(floats: usize) -> Vec<Mark> {
    let mut marks = Vec::with_capacity(floats * 2);
    for i in 0..floats {
        let page = (i / 4) as u32 + 1;
        let top = 100.0 + (i % 4) as f64 * 150.0;
        for (role, y) in [("FIG-start", top), ("FIG-end", top + 120.0)] {
            marks.push(Mark {
                id: format!("fig-{}", i),
                role: role.to_string(),
                page,
                x: 72.0,
                y_from_top: y,
                page_width: 612.0,
                page_height: 792.0,
            });
        }
    }
    marks
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("page_layout");

    for lines in [10, 60, 200] {
        let tokens = synthetic_page(lines);
        group.bench_with_input(BenchmarkId::from_parameter(lines), &tokens, |b, tokens| {
            b.iter(|| PageLayout::analyze(black_box(tokens)));
        });
    }

    group.finish();
}

fn bench_hit_testing(c: &mut Criterion) {
    let tokens = synthetic_page(60);
    let elements = (0..50)
        .map(|i| {
            let bottom = 40.0 + i as f64 * 14.0;
            let quad = Quad::from_rect(72.0, bottom, 540.0, bottom + 12.0);
            Element::region(format!("p-{}", i), Role::P, "en", quad)
        })
        .collect();
    let doc = GeometryDocument::new("bench", vec![Page::with_elements(0, elements)])
        .expect("benchmark geometry is valid");
    let tester = HitTester::default();

    c.bench_function("hits_at", |b| {
        b.iter(|| tester.hits_at(black_box(Point::new(300.0, 400.0)), &tokens, doc.page(0)));
    });
}

fn bench_pairing(c: &mut Criterion) {
    let marks = synthetic_marks(400);
    c.bench_function("pair_marks_400", |b| {
        b.iter(|| pair_marks(black_box(&marks)));
    });
}

criterion_group!(benches, bench_layout, bench_hit_testing, bench_pairing);
criterion_main!(benches);
