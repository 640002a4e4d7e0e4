//! Stamp and export benchmarks

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{Rgba, RgbaImage};
use maskbrush_lib::brush::BrushTip;
use maskbrush_lib::export::{compose, gradient_preset, BackgroundLayer};
use maskbrush_lib::{BrushTool, CanvasPoint, EditSession, EngineConfig};

fn photo(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
    })
}

fn benchmark_tip_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("Tip Generation");

    for size in [5u32, 20, 50, 100].iter() {
        group.bench_with_input(BenchmarkId::new("hard", size), size, |b, &size| {
            b.iter(|| BrushTip::generate(size, 100))
        });
        group.bench_with_input(BenchmarkId::new("soft", size), size, |b, &size| {
            b.iter(|| BrushTip::generate(size, 30))
        });
    }

    group.finish();
}

fn benchmark_strokes(c: &mut Criterion) {
    let mut group = c.benchmark_group("Stroke Stamping");
    let image = photo(1024, 1024);

    for size in [20u32, 100].iter() {
        group.bench_with_input(BenchmarkId::new("erase", size), size, |b, &size| {
            let mut session = EditSession::from_image(image.clone(), EngineConfig::default());
            session.set_brush_size(size);
            b.iter(|| {
                session.begin_stroke(CanvasPoint::new(100.0, 500.0));
                session.extend_stroke(CanvasPoint::new(900.0, 520.0));
                session.end_stroke();
            })
        });
    }

    // Restore without an original exercises the no-op path
    group.bench_function("restore_no_original", |b| {
        let mut session = EditSession::from_image(image.clone(), EngineConfig::default());
        session.set_tool(BrushTool::Restore);
        b.iter(|| {
            session.begin_stroke(CanvasPoint::new(100.0, 500.0));
            session.extend_stroke(CanvasPoint::new(900.0, 520.0));
            session.end_stroke();
        })
    });

    group.finish();
}

fn benchmark_compose(c: &mut Criterion) {
    let mut group = c.benchmark_group("Export Compose");
    let foreground = photo(1024, 768);

    group.bench_function("solid", |b| {
        let layer = BackgroundLayer::Solid(Rgba([255, 255, 255, 255]));
        b.iter(|| compose(&foreground, &layer))
    });
    if let Some(preset) = gradient_preset("#43e97b") {
        let layer = BackgroundLayer::Gradient(preset);
        group.bench_function("gradient", |b| b.iter(|| compose(&foreground, &layer)));
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_tip_generation,
    benchmark_strokes,
    benchmark_compose
);
criterion_main!(benches);
