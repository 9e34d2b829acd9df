use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::image_pipeline::bands::Band;

/// Pipeline stage an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Load,
    Config,
    Rasterize,
    Compute,
    Aggregate,
    Export,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Config => "config",
            Stage::Rasterize => "rasterize",
            Stage::Compute => "compute",
            Stage::Aggregate => "aggregate",
            Stage::Export => "export",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Failed to load image {}: {reason}", path.display())]
    ImageLoad { path: PathBuf, reason: String },

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("No image loaded")]
    NoImageLoaded,

    #[error("Original image buffer has been released")]
    OriginalUnavailable,

    #[error("Invalid downscale factor {0}: expected 0 < factor <= 1")]
    InvalidDownscale(f64),

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(u32, u32),

    #[error("Failed to parse ROI source: {0}")]
    RoiSource(String),

    #[error("ROI not found in registry: {0}")]
    UnknownRoi(String),

    #[error("Failed to rasterize ROI {roi}: {reason}")]
    Rasterize { roi: String, reason: String },

    #[error("Failed to compute {band} bands: {reason}")]
    Compute { band: Band, reason: String },

    #[error("Failed to aggregate statistics for ROI {roi}: {reason}")]
    Aggregate { roi: String, reason: String },

    #[error("Failed to write output file {}: {reason}", path.display())]
    Export { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AnalysisError {
    pub fn stage(&self) -> Stage {
        match self {
            AnalysisError::ImageLoad { .. }
            | AnalysisError::Decode(_)
            | AnalysisError::NoImageLoaded
            | AnalysisError::OriginalUnavailable
            | AnalysisError::InvalidDownscale(_)
            | AnalysisError::InvalidDimensions(..) => Stage::Load,
            AnalysisError::RoiSource(_)
            | AnalysisError::UnknownRoi(_)
            | AnalysisError::Config(_) => Stage::Config,
            AnalysisError::Rasterize { .. } => Stage::Rasterize,
            AnalysisError::Compute { .. } => Stage::Compute,
            AnalysisError::Aggregate { .. } => Stage::Aggregate,
            AnalysisError::Export { .. } | AnalysisError::IoError(_) => Stage::Export,
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
