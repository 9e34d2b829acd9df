use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use phenocam_roi_rs::image_pipeline::{
    AnalysisOptions, BandExport, BatchOptions, BatchProcessor, EngineConfig, ImageCrateReader, ReportFormat,
    RoiRegistry, VegetationIndex,
};
use phenocam_roi_rs::logger;

use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "phenocam-roi")]
#[command(version, about = "Per-ROI color statistics for camera image batches", long_about = None)]
struct Cli {
    /// Images to analyze
    #[arg(value_name = "IMAGE", required = true)]
    images: Vec<PathBuf>,

    /// ROI definitions (YAML mapping of name to polygon); a default
    /// sky-exclusion ROI is used when omitted
    #[arg(short, long, value_name = "FILE")]
    rois: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    out: PathBuf,

    /// Engine configuration (YAML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Downscale factor applied at load (0 < f <= 1)
    #[arg(long, value_name = "FACTOR", default_value = "1.0")]
    downscale: f64,

    /// Save an overlay image per input
    #[arg(long)]
    overlay: bool,

    /// Band images to export, e.g. rgb.r,chromatic.g,chromatic
    #[arg(long, value_name = "BAND[.CHANNEL]", value_delimiter = ',')]
    bands: Vec<BandExport>,

    /// Skip ROI statistics
    #[arg(long)]
    no_analyze: bool,

    /// ROI names to leave out of the analysis
    #[arg(long, value_name = "NAME", value_delimiter = ',')]
    skip: Vec<String>,

    /// Include raw channel histograms
    #[arg(long)]
    histograms: bool,

    /// Vegetation index summarized per ROI
    #[arg(long, value_enum, value_name = "INDEX")]
    vegetation_index: Option<VegetationIndex>,

    /// Per-image statistics format
    #[arg(long, value_enum, value_name = "FORMAT", default_value_t = ReportFormat::Json)]
    format: ReportFormat,

    /// Process images in parallel
    #[arg(long)]
    parallel: bool,

    /// Number of parallel threads
    #[arg(short = 'j', long, value_name = "N")]
    threads: Option<usize>,

    /// Free each image's pristine buffer once its statistics are computed
    #[arg(long)]
    release_original: bool,
}

fn main() -> anyhow::Result<()> {
    logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading engine config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if cli.threads.is_some() {
        config.threads = cli.threads;
    }
    config.validate()?;

    let analysis = AnalysisOptions {
        histograms: cli.histograms,
        vegetation_index: cli.vegetation_index,
        ..AnalysisOptions::default()
    };
    let options = BatchOptions::builder()
        .output_dir(&cli.out)
        .downscale_factor(cli.downscale)
        .overlay(cli.overlay)
        .export_bands(cli.bands)
        .analyze(!cli.no_analyze)
        .skip_rois(cli.skip)
        .analysis(analysis)
        .parallel(cli.parallel)
        .release_original(cli.release_original)
        .build();

    let processor = BatchProcessor::with_custom(ImageCrateReader, cli.format, config);

    info!("Processing {} images into {}", cli.images.len(), cli.out.display());
    let report = match &cli.rois {
        Some(source) => processor.process_batch_from_source(&cli.images, source, &options),
        None => processor.process_batch(&cli.images, &Arc::new(RoiRegistry::new()), &options),
    };

    std::fs::create_dir_all(&cli.out).with_context(|| format!("creating {}", cli.out.display()))?;
    let report_path = cli.out.join("batch_report.json");
    report.write_json(&report_path)?;

    info!(
        "{} succeeded, {} failed, {} ROIs analyzed; report at {}",
        report.succeeded(),
        report.failed(),
        report.total_rois_analyzed,
        report_path.display()
    );
    if report.failed() > 0 {
        warn!("{} images failed, see the batch report for details", report.failed());
    }

    Ok(())
}
