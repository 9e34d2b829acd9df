use image::{Rgb, RgbImage};
use tempfile::tempdir;

use crate::image_pipeline::bands::{Band, Channel, compute_chromatic, compute_rgb};
use crate::image_pipeline::export::{
    BandExport, ImageReport, JsonReportWriter, ReportFormat, ReportWriter, YamlReportWriter, band_to_gray,
    chromatic_composite, draw_roi, flatten_band_stats,
};
use crate::image_pipeline::mask::{MaskRasterizer, RoiMask};
use crate::image_pipeline::roi::{BgrColor, Point, RoiDefinition};
use crate::image_pipeline::stats::{AnalysisOptions, BandArrays, ImageAnalysis, analyze_roi};

fn square(name: &str, x0: i32, y0: i32, x1: i32, y1: i32) -> RoiDefinition {
    RoiDefinition::new(
        name,
        vec![Point::new(x0, y0), Point::new(x1, y0), Point::new(x1, y1), Point::new(x0, y1)],
        BgrColor([255, 0, 0]),
        1,
    )
    .unwrap()
}

fn analysis_for(image: &RgbImage, rois: &[RoiDefinition]) -> ImageAnalysis {
    let chromatic = compute_chromatic(image, 8).unwrap();
    let bands = BandArrays { rgb: Some(compute_rgb(image)), chromatic: Some(&chromatic) };
    let rasterizer = MaskRasterizer::default();
    let rois = rois
        .iter()
        .map(|roi| {
            let mask = rasterizer.rasterize(roi, image.width(), image.height()).unwrap();
            analyze_roi(&roi.name, &mask, &bands, &AnalysisOptions::default()).unwrap()
        })
        .collect();
    ImageAnalysis { rois, skipped: Vec::new() }
}

#[test]
fn test_band_export_parse() {
    assert_eq!("rgb.r".parse::<BandExport>().unwrap(), BandExport::Channel(Band::Rgb, Channel::R));
    assert_eq!(
        "Chromatic.G".parse::<BandExport>().unwrap(),
        BandExport::Channel(Band::Chromatic, Channel::G)
    );
    assert_eq!("chromatic".parse::<BandExport>().unwrap(), BandExport::Composite(Band::Chromatic));
    assert!("hsv.h".parse::<BandExport>().is_err());
    assert!("rgb.x".parse::<BandExport>().is_err());

    assert_eq!(BandExport::Channel(Band::Chromatic, Channel::B).to_string(), "chromatic.b");
    assert_eq!(BandExport::Channel(Band::Rgb, Channel::G).file_suffix(), "rgb_g");
    assert_eq!(BandExport::Composite(Band::Rgb).file_suffix(), "rgb_composite");
}

#[test]
fn test_band_export_deserializes_from_yaml() {
    let exports: Vec<BandExport> = serde_yaml::from_str("[rgb.b, chromatic.g, chromatic]").unwrap();
    assert_eq!(
        exports,
        vec![
            BandExport::Channel(Band::Rgb, Channel::B),
            BandExport::Channel(Band::Chromatic, Channel::G),
            BandExport::Composite(Band::Chromatic),
        ]
    );
}

#[test]
fn test_chromatic_gray_scales_and_blanks_undefined() {
    let mut image = RgbImage::from_pixel(4, 2, Rgb([0, 100, 0]));
    image.put_pixel(3, 1, Rgb([0, 0, 0]));
    let chromatic = compute_chromatic(&image, 1).unwrap();

    let gray = band_to_gray(&chromatic.to_band_image(Channel::G));
    assert_eq!(gray.get_pixel(0, 0).0, [255]);
    assert_eq!(gray.get_pixel(3, 1).0, [0]);

    let composite = chromatic_composite(&chromatic);
    assert_eq!(composite.get_pixel(0, 0).0, [0, 255, 0]);
    assert_eq!(composite.get_pixel(3, 1).0, [0, 0, 0]);
}

#[test]
fn test_rgb_gray_is_raw_value() {
    let image = RgbImage::from_pixel(3, 3, Rgb([10, 20, 30]));
    let gray = band_to_gray(&compute_rgb(&image).to_band_image(Channel::B));
    assert!(gray.pixels().all(|p| p.0 == [30]));
}

#[test]
fn test_draw_roi_outline_and_fill() {
    let mut canvas = RgbImage::from_pixel(20, 20, Rgb([0, 0, 0]));
    let roi = square("ROI_01", 5, 5, 14, 14).with_alpha(0.5).unwrap();
    let mask = MaskRasterizer::default().rasterize(&roi, 20, 20).unwrap();

    draw_roi(&mut canvas, &roi, &mask);

    // BGR [255, 0, 0] is blue
    assert_eq!(canvas.get_pixel(5, 5).0, [0, 0, 255]);
    assert_eq!(canvas.get_pixel(10, 5).0, [0, 0, 255]);
    assert_eq!(canvas.get_pixel(10, 10).0, [0, 0, 128]);
    assert_eq!(canvas.get_pixel(0, 0).0, [0, 0, 0]);
    assert_eq!(canvas.get_pixel(18, 18).0, [0, 0, 0]);
}

#[test]
fn test_draw_roi_without_alpha_leaves_interior() {
    let mut canvas = RgbImage::from_pixel(20, 20, Rgb([50, 50, 50]));
    let roi = square("ROI_01", 2, 2, 17, 17);
    let mask = RoiMask::empty(20, 20);

    draw_roi(&mut canvas, &roi, &mask);

    assert_eq!(canvas.get_pixel(10, 10).0, [50, 50, 50]);
    assert_eq!(canvas.get_pixel(2, 10).0, [0, 0, 255]);
}

#[test]
fn test_flatten_band_stats_keys() {
    let image = RgbImage::from_pixel(10, 10, Rgb([200, 100, 50]));
    let analysis = analysis_for(&image, &[square("ROI_01", 0, 0, 4, 4), square("ROI_02", 5, 5, 9, 9)]);

    let flat = flatten_band_stats(&analysis.rois);

    assert_eq!(flat.len(), 12);
    let key = "roi_band_stats.ROI_02.rgb.g";
    assert_eq!(flat[key].mean, 100.0);
    assert_eq!(flat[key].pixels, 25);
    assert!(flat.contains_key("roi_band_stats.ROI_01.chromatic.b"));
}

#[test]
fn test_json_writer_emits_null_for_empty_stats() {
    let image = RgbImage::from_pixel(10, 10, Rgb([0, 0, 0]));
    let analysis = analysis_for(&image, &[square("ROI_01", 0, 0, 9, 9)]);
    let report = ImageReport::new("black.png".into(), (10, 10), 1.0, &analysis);

    let dir = tempdir().unwrap();
    let path = dir.path().join(format!("black_stats.{}", JsonReportWriter.extension()));
    JsonReportWriter.write_report(&report, &path).unwrap();

    let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let chroma = &value["band_stats"]["roi_band_stats.ROI_01.chromatic.r"];
    assert_eq!(chroma["pixels"], 0);
    assert!(chroma["mean"].is_null());
    assert_eq!(value["band_stats"]["roi_band_stats.ROI_01.rgb.r"]["pixels"], 100);
    assert_eq!(value["rois"][0]["name"], "ROI_01");
}

#[test]
fn test_yaml_writer() {
    let image = RgbImage::from_pixel(8, 8, Rgb([30, 60, 90]));
    let analysis = analysis_for(&image, &[square("ROI_01", 0, 0, 7, 7)]);
    let report = ImageReport::new("a.png".into(), (8, 8), 1.0, &analysis);

    let dir = tempdir().unwrap();
    let path = dir.path().join("a_stats.yaml");
    ReportFormat::Yaml.write_report(&report, &path).unwrap();
    assert_eq!(ReportFormat::Yaml.extension(), YamlReportWriter.extension());

    let value: serde_yaml::Value = serde_yaml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["width"].as_u64(), Some(8));
    assert_eq!(value["band_stats"]["roi_band_stats.ROI_01.rgb.b"]["mean"].as_f64(), Some(90.0));
}

#[test]
fn test_writer_reports_export_error() {
    let report = ImageReport::new("a.png".into(), (1, 1), 1.0, &ImageAnalysis::default());
    let err = JsonReportWriter
        .write_report(&report, std::path::Path::new("/nonexistent/dir/a_stats.json"))
        .unwrap_err();
    assert_eq!(err.stage(), crate::image_pipeline::common::error::Stage::Export);
}

#[test]
fn test_report_format_value_names_match_serde() {
    use clap::ValueEnum;

    for format in ReportFormat::value_variants() {
        let name = format.to_possible_value().unwrap().get_name().to_string();
        assert_eq!(serde_json::to_value(format).unwrap(), serde_json::Value::String(name));
    }
    assert_eq!(ReportFormat::from_str("yml", true), Ok(ReportFormat::Yaml));
    assert!(ReportFormat::from_str("xml", true).is_err());
}
