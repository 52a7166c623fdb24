use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec2;
use motif_core::triangulate::triangulate;

fn circle_outline(n: usize) -> Vec<Vec2> {
    (0..n)
        .map(|i| {
            let angle = std::f32::consts::TAU * i as f32 / n as f32;
            Vec2::new(100.0 * angle.cos(), 100.0 * angle.sin())
        })
        .collect()
}

fn bench_triangulate(c: &mut Criterion) {
    let mut group = c.benchmark_group("triangulate");

    // Vertex counts typical of tessellated curve outlines.
    for &n in &[16usize, 64, 256] {
        let outline = circle_outline(n);
        group.bench_with_input(BenchmarkId::new("circle", n), &outline, |b, points| {
            b.iter(|| triangulate(points))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_triangulate);
criterion_main!(benches);
