use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::image_pipeline::common::error::{AnalysisError, Result, Stage};
use crate::image_pipeline::common::timing::PipelineTimings;
use crate::image_pipeline::export::BandExport;
use crate::image_pipeline::stats::{AnalysisOptions, ImageAnalysis};

/// Per-batch output directives shared by every image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchOptions {
    pub output_dir: PathBuf,
    pub downscale_factor: f64,
    /// Save `<stem>_overlay.png` with every ROI drawn
    pub overlay: bool,
    /// Band images to save as `<stem>_<band>_<channel>.png`
    pub export_bands: Vec<BandExport>,
    pub analyze: bool,
    /// ROI names excluded from analysis
    pub skip_rois: Vec<String>,
    pub analysis: AnalysisOptions,
    pub parallel: bool,
    /// Free the pristine buffer as soon as analysis is done
    pub release_original: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            downscale_factor: 1.0,
            overlay: false,
            export_bands: Vec::new(),
            analyze: true,
            skip_rois: Vec::new(),
            analysis: AnalysisOptions::default(),
            parallel: false,
            release_original: false,
        }
    }
}

impl BatchOptions {
    pub fn builder() -> BatchOptionsBuilder {
        BatchOptionsBuilder::default()
    }

    /// True when the batch writes anything to `output_dir`.
    pub fn writes_outputs(&self) -> bool {
        self.overlay || self.analyze || !self.export_bands.is_empty()
    }
}

#[derive(Default)]
pub struct BatchOptionsBuilder {
    output_dir: Option<PathBuf>,
    downscale_factor: Option<f64>,
    overlay: Option<bool>,
    export_bands: Option<Vec<BandExport>>,
    analyze: Option<bool>,
    skip_rois: Option<Vec<String>>,
    analysis: Option<AnalysisOptions>,
    parallel: Option<bool>,
    release_original: Option<bool>,
}

impl BatchOptionsBuilder {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn downscale_factor(mut self, factor: f64) -> Self {
        self.downscale_factor = Some(factor);
        self
    }

    pub fn overlay(mut self, enabled: bool) -> Self {
        self.overlay = Some(enabled);
        self
    }

    pub fn export_bands(mut self, bands: Vec<BandExport>) -> Self {
        self.export_bands = Some(bands);
        self
    }

    pub fn analyze(mut self, enabled: bool) -> Self {
        self.analyze = Some(enabled);
        self
    }

    pub fn skip_rois(mut self, names: Vec<String>) -> Self {
        self.skip_rois = Some(names);
        self
    }

    pub fn analysis(mut self, options: AnalysisOptions) -> Self {
        self.analysis = Some(options);
        self
    }

    pub fn parallel(mut self, enabled: bool) -> Self {
        self.parallel = Some(enabled);
        self
    }

    pub fn release_original(mut self, enabled: bool) -> Self {
        self.release_original = Some(enabled);
        self
    }

    pub fn build(self) -> BatchOptions {
        let default = BatchOptions::default();
        BatchOptions {
            output_dir: self.output_dir.unwrap_or(default.output_dir),
            downscale_factor: self.downscale_factor.unwrap_or(default.downscale_factor),
            overlay: self.overlay.unwrap_or(default.overlay),
            export_bands: self.export_bands.unwrap_or(default.export_bands),
            analyze: self.analyze.unwrap_or(default.analyze),
            skip_rois: self.skip_rois.unwrap_or(default.skip_rois),
            analysis: self.analysis.unwrap_or(default.analysis),
            parallel: self.parallel.unwrap_or(default.parallel),
            release_original: self.release_original.unwrap_or(default.release_original),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImageStatus {
    Success,
    Error { stage: Stage, message: String },
}

impl ImageStatus {
    pub fn from_error(err: &AnalysisError) -> Self {
        ImageStatus::Error {
            stage: err.stage(),
            message: err.to_string(),
        }
    }
}

/// What happened to one image of the batch.
#[derive(Debug, Clone, Serialize)]
pub struct ImageOutcome {
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: ImageStatus,
    /// Files written for this image, including those written before a failure
    pub outputs: Vec<PathBuf>,
    pub rois_analyzed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<ImageAnalysis>,
    pub timings: PipelineTimings,
}

impl ImageOutcome {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            status: ImageStatus::Success,
            outputs: Vec::new(),
            rois_analyzed: 0,
            analysis: None,
            timings: PipelineTimings::new(),
        }
    }

    pub fn failed(path: impl Into<PathBuf>, err: &AnalysisError) -> Self {
        Self {
            status: ImageStatus::from_error(err),
            ..Self::new(path)
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ImageStatus::Success
    }
}

/// Per-image outcomes in input order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub images: Vec<ImageOutcome>,
    pub total_rois_analyzed: usize,
}

impl BatchReport {
    pub fn from_outcomes(images: Vec<ImageOutcome>) -> Self {
        let total_rois_analyzed = images.iter().map(|o| o.rois_analyzed).sum();
        Self {
            images,
            total_rois_analyzed,
        }
    }

    pub fn succeeded(&self) -> usize {
        self.images.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.images.len() - self.succeeded()
    }

    pub fn outcome<P: AsRef<Path>>(&self, path: P) -> Option<&ImageOutcome> {
        let path = path.as_ref();
        self.images.iter().find(|o| o.path == path)
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let export_error = |reason: String| AnalysisError::Export {
            path: path.to_path_buf(),
            reason,
        };
        let file = File::create(path).map_err(|e| export_error(e.to_string()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self).map_err(|e| export_error(e.to_string()))
    }
}
