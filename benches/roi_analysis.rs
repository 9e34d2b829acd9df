use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use image::{Rgb, RgbImage};
use phenocam_roi_rs::image_pipeline::{
    AnalysisOptions, BgrColor, EngineConfig, FillRule, MaskRasterizer, Point, RoiDefinition, RoiImageProcessor,
    RoiRegistry, compute_chromatic,
};
use std::sync::Arc;

fn generate_mock_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    })
}

fn canopy_roi(name: &str, width: i32, height: i32) -> RoiDefinition {
    let points = vec![
        Point::new(width / 10, height / 2),
        Point::new(width / 3, height / 4),
        Point::new(width * 2 / 3, height / 3),
        Point::new(width * 9 / 10, height / 2),
        Point::new(width * 4 / 5, height * 9 / 10),
        Point::new(width / 5, height * 4 / 5),
    ];
    RoiDefinition::new(name, points, BgrColor([0, 255, 255]), 3)
        .expect("valid benchmark ROI")
}

fn benchmark_chromatic_chunk_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("chromatic_by_chunk_rows");
    let image = generate_mock_image(1000, 1000);

    for chunk_rows in [16u32, 64, 256, 1000] {
        group.bench_with_input(
            BenchmarkId::from_parameter(chunk_rows),
            &chunk_rows,
            |b, &rows| {
                b.iter(|| compute_chromatic(black_box(&image), rows).expect("chromatic bands"));
            },
        );
    }

    group.finish();
}

fn benchmark_rasterize(c: &mut Criterion) {
    let mut group = c.benchmark_group("rasterize");

    for (size, rule, label) in [
        (500, FillRule::EvenOdd, "500_even_odd"),
        (2000, FillRule::EvenOdd, "2000_even_odd"),
        (2000, FillRule::NonZero, "2000_non_zero"),
    ] {
        let roi = canopy_roi("ROI_01", size, size);
        let rasterizer = MaskRasterizer::new(rule);
        group.bench_with_input(BenchmarkId::from_parameter(label), &roi, |b, roi| {
            b.iter(|| rasterizer.rasterize(black_box(roi), size as u32, size as u32));
        });
    }

    group.finish();
}

fn benchmark_analyze_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze_all");
    group.sample_size(20);

    let mut registry = RoiRegistry::new();
    for i in 0..4 {
        registry.insert(canopy_roi(&format!("ROI_{i:02}"), 1000 - i * 100, 1000 - i * 100));
    }
    let registry = Arc::new(registry);
    let image = generate_mock_image(1000, 1000);

    for (skip_chromatic, label) in [(true, "rgb_only"), (false, "rgb_and_chromatic")] {
        let options = AnalysisOptions { skip_chromatic, ..AnalysisOptions::default() };
        group.bench_with_input(BenchmarkId::from_parameter(label), &options, |b, options| {
            let mut processor = RoiImageProcessor::new(Arc::clone(&registry), EngineConfig::default());
            processor.set_image(image.clone(), 1.0).expect("image installs");
            b.iter(|| {
                processor.reset().expect("reset");
                processor.analyze_all(&[], black_box(options))
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_chromatic_chunk_sizes,
    benchmark_rasterize,
    benchmark_analyze_all
);
criterion_main!(benches);
