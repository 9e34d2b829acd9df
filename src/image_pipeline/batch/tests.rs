use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{Rgb, RgbImage};
use tempfile::{TempDir, tempdir};

use crate::image_pipeline::bands::{Band, Channel};
use crate::image_pipeline::batch::{BatchOptions, BatchProcessor, ImageStatus};
use crate::image_pipeline::common::config::EngineConfig;
use crate::image_pipeline::common::error::{AnalysisError, Result, Stage};
use crate::image_pipeline::export::{BandExport, YamlReportWriter};
use crate::image_pipeline::raster::RasterReader;
use crate::image_pipeline::roi::{BgrColor, Point, RoiDefinition, RoiRegistry};

struct MockReader {
    image: RgbImage,
}

impl RasterReader for MockReader {
    fn read_raster(&self, data: &[u8]) -> Result<RgbImage> {
        if data.starts_with(b"corrupt") {
            return Err(AnalysisError::Decode("Mock decode error".to_string()));
        }
        Ok(self.image.clone())
    }
}

fn registry() -> Arc<RoiRegistry> {
    let mut registry = RoiRegistry::new();
    for (name, x0, y0, x1, y1) in [("ROI_01", 0, 0, 19, 19), ("ROI_02", 10, 5, 30, 25)] {
        registry.insert(
            RoiDefinition::new(
                name,
                vec![Point::new(x0, y0), Point::new(x1, y0), Point::new(x1, y1), Point::new(x0, y1)],
                BgrColor([0, 0, 255]),
                2,
            )
            .unwrap(),
        );
    }
    Arc::new(registry)
}

fn write_png(dir: &Path, name: &str, color: [u8; 3]) -> PathBuf {
    let path = dir.join(name);
    RgbImage::from_pixel(40, 30, Rgb(color)).save(&path).unwrap();
    path
}

fn three_paths(dir: &TempDir) -> Vec<PathBuf> {
    vec![
        write_png(dir.path(), "first.png", [10, 200, 40]),
        dir.path().join("missing.png"),
        write_png(dir.path(), "third.png", [90, 90, 180]),
    ]
}

#[test]
fn test_batch_with_missing_file() {
    let dir = tempdir().unwrap();
    let paths = three_paths(&dir);
    let options = BatchOptions::builder().output_dir(dir.path().join("out")).build();

    let report = BatchProcessor::new(EngineConfig::default()).process_batch(&paths, &registry(), &options);

    assert_eq!(report.images.len(), 3);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.total_rois_analyzed, 4);

    assert!(report.images[0].is_success());
    assert!(report.images[2].is_success());
    match &report.images[1].status {
        ImageStatus::Error { stage, message } => {
            assert_eq!(*stage, Stage::Load);
            assert!(message.contains("missing.png"));
        }
        other => panic!("expected error, got {other:?}"),
    }
    assert!(report.images[1].outputs.is_empty());

    let first = report.outcome(&paths[0]).unwrap().analysis.as_ref().unwrap();
    let roi = first.get("ROI_01").unwrap();
    assert_eq!(roi.pixel_count, 400);
    assert_eq!(roi.band_stats.rgb.unwrap().g.mean, 200.0);

    let third = report.outcome(&paths[2]).unwrap().analysis.as_ref().unwrap();
    let chroma = third.get("ROI_02").unwrap().band_stats.chromatic.unwrap();
    assert!((chroma.b.mean - 0.5).abs() < 1e-6);

    let stats = dir.path().join("out").join("first_stats.json");
    assert!(stats.exists());
    assert_eq!(report.images[0].outputs, vec![stats]);
}

#[test]
fn test_parallel_matches_sequential() {
    let dir = tempdir().unwrap();
    let paths = three_paths(&dir);
    let sequential = BatchOptions::builder().output_dir(dir.path().join("seq")).build();
    let parallel = BatchOptions::builder()
        .output_dir(dir.path().join("par"))
        .parallel(true)
        .build();
    let config = EngineConfig::builder().threads(Some(2)).build();
    let processor = BatchProcessor::new(config);

    let a = processor.process_batch(&paths, &registry(), &sequential);
    let b = processor.process_batch(&paths, &registry(), &parallel);

    assert_eq!(a.total_rois_analyzed, b.total_rois_analyzed);
    for (x, y) in a.images.iter().zip(&b.images) {
        assert_eq!(x.path, y.path);
        assert_eq!(x.status, y.status);
        assert_eq!(x.analysis, y.analysis);
    }
}

#[test]
fn test_outputs_with_custom_reader_and_writer() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("frame_0001.jpg");
    std::fs::write(&input, b"raw bytes").unwrap();
    let out = dir.path().join("out");

    let options = BatchOptions::builder()
        .output_dir(&out)
        .overlay(true)
        .export_bands(vec![
            BandExport::Channel(Band::Chromatic, Channel::G),
            BandExport::Composite(Band::Rgb),
        ])
        .skip_rois(vec!["ROI_02".to_string()])
        .release_original(true)
        .build();
    let reader = MockReader { image: RgbImage::from_pixel(40, 30, Rgb([20, 120, 60])) };
    let processor = BatchProcessor::with_custom(reader, YamlReportWriter, EngineConfig::default());

    let report = processor.process_batch(&[&input], &registry(), &options);

    let outcome = &report.images[0];
    assert!(outcome.is_success(), "{:?}", outcome.status);
    assert_eq!(outcome.rois_analyzed, 1);
    let expected: Vec<PathBuf> = ["overlay.png", "chromatic_g.png", "rgb_composite.png", "stats.yaml"]
        .iter()
        .map(|suffix| out.join(format!("frame_0001_{suffix}")))
        .collect();
    assert_eq!(outcome.outputs, expected);
    assert!(expected.iter().all(|p| p.exists()));

    let overlay = image::open(&expected[0]).unwrap().to_rgb8();
    assert!(overlay.pixels().any(|p| p.0 == [255, 0, 0]));
    assert_eq!(overlay.get_pixel(39, 29).0, [20, 120, 60]);

    for step in ["load", "overlay", "export_bands", "analyze", "release_original", "export_stats", "release"] {
        assert!(outcome.timings.get_step(step).is_some(), "missing timing {step}");
    }
}

#[test]
fn test_decode_failure_is_isolated() {
    let dir = tempdir().unwrap();
    let good = dir.path().join("good.jpg");
    let bad = dir.path().join("bad.jpg");
    std::fs::write(&good, b"fine").unwrap();
    std::fs::write(&bad, b"corrupt").unwrap();
    let options = BatchOptions::builder().output_dir(dir.path()).build();
    let reader = MockReader { image: RgbImage::from_pixel(40, 30, Rgb([1, 2, 3])) };
    let processor = BatchProcessor::with_custom(reader, YamlReportWriter, EngineConfig::default());

    let report = processor.process_batch(&[&bad, &good], &registry(), &options);

    assert!(matches!(report.images[0].status, ImageStatus::Error { stage: Stage::Load, .. }));
    assert!(report.images[1].is_success());
}

#[test]
fn test_unparsable_roi_source() {
    let dir = tempdir().unwrap();
    let paths = three_paths(&dir);
    let source = dir.path().join("rois.yaml");
    std::fs::write(&source, "ROI_01: [unclosed").unwrap();
    let options = BatchOptions::builder().output_dir(dir.path()).build();
    let processor = BatchProcessor::new(EngineConfig::default());

    let report = processor.process_batch_from_source(&paths, &source, &options);

    assert_eq!(report.images.len(), 3);
    assert_eq!(report.failed(), 3);
    for outcome in &report.images {
        assert!(matches!(outcome.status, ImageStatus::Error { stage: Stage::Config, .. }));
    }

    let missing = processor.process_batch_from_source(&paths, dir.path().join("nope.yaml"), &options);
    assert_eq!(missing.failed(), 3);
}

#[test]
fn test_roi_source_path() {
    let dir = tempdir().unwrap();
    let image = write_png(dir.path(), "a.png", [50, 60, 70]);
    let source = dir.path().join("rois.yaml");
    std::fs::write(
        &source,
        "ROI_01:\n  points: [[0, 0], [9, 0], [9, 9], [0, 9]]\n  color: [0, 0, 255]\n  thickness: 1\n",
    )
    .unwrap();
    let options = BatchOptions::builder().output_dir(dir.path()).build();

    let report = BatchProcessor::new(EngineConfig::default()).process_batch_from_source(&[image], &source, &options);

    assert_eq!(report.succeeded(), 1);
    let analysis = report.images[0].analysis.as_ref().unwrap();
    assert_eq!(analysis.get("ROI_01").unwrap().pixel_count, 100);
}

#[test]
fn test_export_failure_recorded() {
    let dir = tempdir().unwrap();
    let image = write_png(dir.path(), "a.png", [50, 60, 70]);
    let blocker = dir.path().join("not_a_dir");
    std::fs::write(&blocker, b"").unwrap();
    let options = BatchOptions::builder().output_dir(&blocker).overlay(true).build();

    let report = BatchProcessor::new(EngineConfig::default()).process_batch(&[image], &registry(), &options);

    assert!(matches!(report.images[0].status, ImageStatus::Error { stage: Stage::Export, .. }));
    assert!(report.images[0].outputs.is_empty());
    assert_eq!(report.total_rois_analyzed, 0);
}

#[test]
fn test_invalid_config_fails_every_image() {
    let dir = tempdir().unwrap();
    let paths = three_paths(&dir);
    let config = EngineConfig::builder().chunk_rows(0).build();
    let options = BatchOptions::builder().output_dir(dir.path()).build();

    let report = BatchProcessor::new(config).process_batch(&paths, &registry(), &options);

    assert_eq!(report.failed(), 3);
    assert!(matches!(report.images[0].status, ImageStatus::Error { stage: Stage::Config, .. }));
}

#[test]
fn test_batch_report_json() {
    let dir = tempdir().unwrap();
    let paths = three_paths(&dir);
    let options = BatchOptions::builder().output_dir(dir.path()).analyze(false).build();
    let report = BatchProcessor::new(EngineConfig::default()).process_batch(&paths, &registry(), &options);

    let path = dir.path().join("batch_report.json");
    report.write_json(&path).unwrap();

    let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["images"][0]["status"], "success");
    assert_eq!(value["images"][1]["status"], "error");
    assert_eq!(value["images"][1]["stage"], "load");
    assert_eq!(value["total_rois_analyzed"], 0);
    assert!(value["images"][0].get("analysis").is_none());
}

#[test]
fn test_options_from_yaml() {
    let options: BatchOptions = serde_yaml::from_str(
        "output_dir: out\noverlay: true\nexport_bands: [chromatic.g, rgb]\nanalysis:\n  vegetation_index: grvi\n",
    )
    .unwrap();

    assert!(options.overlay);
    assert!(options.analyze);
    assert_eq!(options.downscale_factor, 1.0);
    assert_eq!(
        options.export_bands,
        vec![BandExport::Channel(Band::Chromatic, Channel::G), BandExport::Composite(Band::Rgb)]
    );
    assert!(options.analysis.vegetation_index.is_some());
}

#[test]
fn test_same_file_stem_gets_distinct_outputs() {
    let dir = tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("a")).unwrap();
    std::fs::create_dir_all(dir.path().join("b")).unwrap();
    let paths = vec![
        write_png(&dir.path().join("a"), "img.png", [200, 10, 10]),
        write_png(&dir.path().join("b"), "img.png", [10, 10, 200]),
        write_png(dir.path(), "img_1.png", [10, 200, 10]),
    ];
    let out = dir.path().join("out");

    for parallel in [false, true] {
        let options = BatchOptions::builder()
            .output_dir(&out)
            .overlay(true)
            .parallel(parallel)
            .build();
        let report = BatchProcessor::new(EngineConfig::default()).process_batch(&paths, &registry(), &options);

        assert_eq!(report.succeeded(), 3);
        let outputs: Vec<&PathBuf> = report.images.iter().flat_map(|o| &o.outputs).collect();
        for (i, a) in outputs.iter().enumerate() {
            assert!(outputs[i + 1..].iter().all(|b| a != b), "{a:?} written twice");
        }
        assert_eq!(
            report.images[1].outputs,
            vec![out.join("img_2_overlay.png"), out.join("img_2_stats.json")]
        );

        // each stats file holds its own image's numbers
        for (outcome, red) in report.images.iter().zip([200.0, 10.0, 10.0]) {
            let stats = outcome.outputs.iter().find(|p| p.extension().is_some_and(|e| e == "json")).unwrap();
            let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(stats).unwrap()).unwrap();
            assert_eq!(value["band_stats"]["roi_band_stats.ROI_01.rgb.r"]["mean"], red);
        }
    }
}
