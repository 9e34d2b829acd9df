//! Engine configuration
//!
//! Tunables shared by every image processed with one engine instance. Loaded
//! from YAML with per-field defaults, or assembled with the builder.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::image_pipeline::common::error::{AnalysisError, Result};
use crate::image_pipeline::mask::FillRule;
use crate::image_pipeline::roi::SkyDetection;

/// Rows per strip for chromatic band computation.
pub const DEFAULT_CHUNK_ROWS: u32 = 256;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Rows processed per strip when deriving chromatic bands
    pub chunk_rows: u32,
    /// Polygon fill rule used by the mask rasterizer
    pub fill_rule: FillRule,
    /// Heuristic used to build the default ROI when the registry is empty
    pub sky_detection: SkyDetection,
    /// Images with more pixels than this are downscaled at load
    pub max_pixels: Option<u64>,
    /// Worker threads for parallel batches (rayon default when unset)
    pub threads: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunk_rows: DEFAULT_CHUNK_ROWS,
            fill_rule: FillRule::default(),
            sky_detection: SkyDetection::default(),
            max_pixels: None,
            threads: None,
        }
    }
}

impl EngineConfig {
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: EngineConfig = serde_yaml::from_str(yaml)
            .map_err(|e| AnalysisError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| AnalysisError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_rows == 0 {
            return Err(AnalysisError::Config("chunk_rows must be positive".to_string()));
        }
        if self.max_pixels == Some(0) {
            return Err(AnalysisError::Config("max_pixels must be positive".to_string()));
        }
        if self.threads == Some(0) {
            return Err(AnalysisError::Config("threads must be positive".to_string()));
        }
        self.sky_detection.validate()
    }

    /// Downscale factor to apply to an image of the given size, combining the
    /// caller's request with the `max_pixels` threshold.
    pub fn effective_downscale(&self, requested: f64, width: u32, height: u32) -> f64 {
        let Some(max_pixels) = self.max_pixels else {
            return requested;
        };
        let scaled_pixels = (width as f64 * requested) * (height as f64 * requested);
        if scaled_pixels <= max_pixels as f64 {
            return requested;
        }
        let limit = (max_pixels as f64 / (width as f64 * height as f64)).sqrt();
        requested.min(limit)
    }
}

/// Builder for EngineConfig
#[derive(Default)]
pub struct EngineConfigBuilder {
    chunk_rows: Option<u32>,
    fill_rule: Option<FillRule>,
    sky_detection: Option<SkyDetection>,
    max_pixels: Option<Option<u64>>,
    threads: Option<Option<usize>>,
}

impl EngineConfigBuilder {
    pub fn chunk_rows(mut self, rows: u32) -> Self {
        self.chunk_rows = Some(rows);
        self
    }

    pub fn fill_rule(mut self, rule: FillRule) -> Self {
        self.fill_rule = Some(rule);
        self
    }

    pub fn sky_detection(mut self, policy: SkyDetection) -> Self {
        self.sky_detection = Some(policy);
        self
    }

    pub fn max_pixels(mut self, max: Option<u64>) -> Self {
        self.max_pixels = Some(max);
        self
    }

    pub fn threads(mut self, threads: Option<usize>) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn build(self) -> EngineConfig {
        let default = EngineConfig::default();
        EngineConfig {
            chunk_rows: self.chunk_rows.unwrap_or(default.chunk_rows),
            fill_rule: self.fill_rule.unwrap_or(default.fill_rule),
            sky_detection: self.sky_detection.unwrap_or(default.sky_detection),
            max_pixels: self.max_pixels.unwrap_or(default.max_pixels),
            threads: self.threads.unwrap_or(default.threads),
        }
    }
}
