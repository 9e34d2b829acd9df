//! ROI image analysis pipeline
//!
//! Loads raster images, rasterizes named polygon ROIs into masks, derives
//! raw RGB and chromatic-coordinate bands, and aggregates per-ROI statistics.
//! The batch orchestrator applies one ROI registry across many images with
//! per-image failure isolation.

pub mod bands;
pub mod batch;
pub mod common;
pub mod export;
pub mod mask;
pub mod processor;
pub mod raster;
pub mod roi;
pub mod stats;

pub use common::{AnalysisError, EngineConfig, EngineConfigBuilder, PipelineTimings, Result, Stage};

pub use raster::{ImageCrateReader, RasterBuffer, RasterReader};

pub use roi::{BgrColor, DEFAULT_ROI_NAME, Point, RoiDefinition, RoiRegistry, SkyDetection};

pub use mask::{FillRule, MaskRasterizer, RoiMask};

pub use bands::{Band, BandImage, Channel, ChromaticBands, RgbBands, compute_chromatic, compute_rgb};

pub use stats::{AnalysisOptions, ChannelStatistics, ImageAnalysis, RoiAnalysis, VegetationIndex};

pub use processor::RoiImageProcessor;

pub use export::{BandExport, JsonReportWriter, ReportFormat, ReportWriter, YamlReportWriter};

pub use batch::{BatchOptions, BatchOptionsBuilder, BatchProcessor, BatchReport, ImageOutcome, ImageStatus};
