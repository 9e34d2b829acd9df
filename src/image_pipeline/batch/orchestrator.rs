use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{info, info_span, warn};

use crate::image_pipeline::batch::types::{BatchOptions, BatchReport, ImageOutcome, ImageStatus};
use crate::image_pipeline::bands::Band;
use crate::image_pipeline::common::config::EngineConfig;
use crate::image_pipeline::common::error::{AnalysisError, Result};
use crate::image_pipeline::export::{
    BandExport, ImageReport, JsonReportWriter, ReportWriter, band_to_gray, chromatic_composite, save_gray,
    save_rgb,
};
use crate::image_pipeline::processor::RoiImageProcessor;
use crate::image_pipeline::raster::{ImageCrateReader, RasterReader};
use crate::image_pipeline::roi::RoiRegistry;

pub struct BatchProcessor<R: RasterReader, W: ReportWriter> {
    reader: R,
    writer: W,
    config: EngineConfig,
}

impl BatchProcessor<ImageCrateReader, JsonReportWriter> {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            reader: ImageCrateReader,
            writer: JsonReportWriter,
            config,
        }
    }
}

impl<R, W> BatchProcessor<R, W>
where
    R: RasterReader + Sync,
    W: ReportWriter + Sync,
{
    pub fn with_custom(reader: R, writer: W, config: EngineConfig) -> Self {
        Self {
            reader,
            writer,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs every image through load, overlay, band export, analysis and
    /// statistics export. Never fails as a whole: per-image errors end up in
    /// the returned report.
    pub fn process_batch<P: AsRef<Path> + Sync>(
        &self,
        paths: &[P],
        registry: &Arc<RoiRegistry>,
        options: &BatchOptions,
    ) -> BatchReport {
        info!(
            images = paths.len(),
            rois = registry.len(),
            parallel = options.parallel,
            "Starting batch"
        );

        if let Err(e) = self.config.validate() {
            warn!("Invalid engine configuration: {}", e);
            return Self::fail_all(paths, &e);
        }
        if options.writes_outputs() {
            if let Err(e) = std::fs::create_dir_all(&options.output_dir) {
                warn!(
                    "Failed to create output directory {}: {}",
                    options.output_dir.display(),
                    e
                );
            }
        }

        let stems = output_stems(paths);
        let run = |(path, stem): (&P, &String)| self.process_image(path.as_ref(), stem, registry, options);
        let outcomes: Vec<ImageOutcome> = if options.parallel {
            match self.thread_pool() {
                Some(pool) => pool.install(|| paths.par_iter().zip(stems.par_iter()).map(run).collect()),
                None => paths.par_iter().zip(stems.par_iter()).map(run).collect(),
            }
        } else {
            paths.iter().zip(&stems).map(run).collect()
        };

        let report = BatchReport::from_outcomes(outcomes);
        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            rois = report.total_rois_analyzed,
            "Batch complete"
        );
        report
    }

    /// Like [`process_batch`](Self::process_batch), parsing the ROI source
    /// first. An unreadable or unparsable source marks every image failed.
    pub fn process_batch_from_source<P, S>(&self, paths: &[P], roi_source: S, options: &BatchOptions) -> BatchReport
    where
        P: AsRef<Path> + Sync,
        S: AsRef<Path>,
    {
        match RoiRegistry::from_file(roi_source.as_ref()) {
            Ok(registry) => self.process_batch(paths, &Arc::new(registry), options),
            Err(e) => {
                warn!("ROI source rejected: {}", e);
                Self::fail_all(paths, &e)
            }
        }
    }

    fn fail_all<P: AsRef<Path>>(paths: &[P], err: &AnalysisError) -> BatchReport {
        BatchReport::from_outcomes(
            paths
                .iter()
                .map(|p| ImageOutcome::failed(p.as_ref(), err))
                .collect(),
        )
    }

    fn thread_pool(&self) -> Option<rayon::ThreadPool> {
        let threads = self.config.threads?;
        match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => Some(pool),
            Err(e) => {
                warn!("Failed to build {}-thread pool, using the global pool: {}", threads, e);
                None
            }
        }
    }

    fn process_image(
        &self,
        path: &Path,
        stem: &str,
        registry: &Arc<RoiRegistry>,
        options: &BatchOptions,
    ) -> ImageOutcome {
        let _span = info_span!("image", path = %path.display()).entered();
        let mut outcome = ImageOutcome::new(path);
        let mut processor = RoiImageProcessor::new(Arc::clone(registry), self.config.clone());

        if let Err(e) = self.run_stages(&mut processor, path, stem, options, &mut outcome) {
            warn!("{} failed at {} stage: {}", path.display(), e.stage(), e);
            outcome.status = ImageStatus::from_error(&e);
        }

        outcome.timings.time("release", || processor.release());
        outcome.timings.log_summary(&path.display().to_string());
        outcome
    }

    fn run_stages(
        &self,
        processor: &mut RoiImageProcessor,
        path: &Path,
        stem: &str,
        options: &BatchOptions,
        outcome: &mut ImageOutcome,
    ) -> Result<()> {
        let timings = &mut outcome.timings;
        timings.time("load", || {
            processor.load_image_with(&self.reader, path, options.downscale_factor)
        })?;

        let output = |suffix: &str, extension: &str| -> PathBuf {
            options.output_dir.join(format!("{stem}_{suffix}.{extension}"))
        };

        if options.overlay {
            let overlay_path = output("overlay", "png");
            timings.time("overlay", || -> Result<()> {
                processor.draw_overlays()?;
                save_rgb(processor.raster()?.overlay(), &overlay_path)
            })?;
            outcome.outputs.push(overlay_path);
        }

        for export in &options.export_bands {
            let band_path = output(&export.file_suffix(), "png");
            timings.time("export_bands", || write_band(processor, *export, &band_path))?;
            outcome.outputs.push(band_path);
        }

        if !options.analyze {
            return Ok(());
        }

        let analysis = timings.time("analyze", || {
            processor.analyze_all(&options.skip_rois, &options.analysis)
        })?;
        outcome.rois_analyzed = analysis.rois_analyzed();

        if options.release_original {
            timings.time("release_original", || processor.release_original())?;
        }

        let raster = processor.raster()?;
        let report = ImageReport::new(
            path.to_path_buf(),
            (raster.width(), raster.height()),
            raster.scale_factor(),
            &analysis,
        );
        let stats_path = output("stats", self.writer.extension());
        timings.time("export_stats", || self.writer.write_report(&report, &stats_path))?;
        outcome.outputs.push(stats_path);
        outcome.analysis = Some(analysis);
        Ok(())
    }
}

/// Output file stem for every batch entry, unique within the batch.
///
/// Inputs keep their file stem unless another input shares it; repeats get
/// `_1`, `_2`, ... in batch order, skipping names already taken.
fn output_stems<P: AsRef<Path>>(paths: &[P]) -> Vec<String> {
    let stems: Vec<String> = paths
        .iter()
        .map(|p| {
            p.as_ref()
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "image".to_string())
        })
        .collect();

    let mut occurrences: HashMap<&str, usize> = HashMap::new();
    for stem in &stems {
        *occurrences.entry(stem.as_str()).or_default() += 1;
    }
    let mut taken: HashSet<String> = occurrences
        .iter()
        .filter(|(_, count)| **count == 1)
        .map(|(stem, _)| stem.to_string())
        .collect();

    stems
        .iter()
        .map(|stem| {
            if occurrences[stem.as_str()] == 1 {
                return stem.clone();
            }
            let mut n = 1;
            let mut candidate = stem.clone();
            while taken.contains(&candidate) {
                candidate = format!("{stem}_{n}");
                n += 1;
            }
            taken.insert(candidate.clone());
            candidate
        })
        .collect()
}

fn write_band(processor: &mut RoiImageProcessor, export: BandExport, path: &Path) -> Result<()> {
    match export {
        BandExport::Channel(band, channel) => {
            let plane = processor.get_band_image(band, channel, false)?;
            save_gray(&band_to_gray(&plane), path)
        }
        BandExport::Composite(Band::Rgb) => save_rgb(processor.raster()?.original()?, path),
        BandExport::Composite(Band::Chromatic) => {
            let bands = processor.chromatic(false)?;
            save_rgb(&chromatic_composite(&bands), path)
        }
    }
}
