use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use image::imageops::{self, FilterType};
use image::RgbImage;
use tracing::{debug, info, instrument};

use crate::image_pipeline::common::error::{AnalysisError, Result};
use crate::image_pipeline::raster::reader::RasterReader;
use crate::image_pipeline::raster::ImageCrateReader;

// Identity source for cache keys; every load and reset takes a fresh value.
static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

fn next_version() -> u64 {
    NEXT_VERSION.fetch_add(1, Ordering::Relaxed)
}

/// Working raster for one image.
///
/// Holds the pristine (possibly downscaled) pixels and a separate copy that
/// overlays are drawn on. The pristine copy can be handed back to the caller
/// with [`RasterBuffer::release_original`] once only the overlay is needed.
#[derive(Debug)]
pub struct RasterBuffer {
    original: Option<RgbImage>,
    overlay: RgbImage,
    scale_factor: f64,
    source_dimensions: (u32, u32),
    version: u64,
}

impl RasterBuffer {
    /// Wraps decoded pixels, applying `downscale_factor` (1.0 keeps the size).
    pub fn from_image(image: RgbImage, downscale_factor: f64) -> Result<Self> {
        validate_downscale(downscale_factor)?;

        let source_dimensions = image.dimensions();
        if source_dimensions.0 == 0 || source_dimensions.1 == 0 {
            return Err(AnalysisError::InvalidDimensions(source_dimensions.0, source_dimensions.1));
        }

        let original = if downscale_factor < 1.0 {
            let width = scaled_len(source_dimensions.0, downscale_factor);
            let height = scaled_len(source_dimensions.1, downscale_factor);
            debug!(
                "Downscaling {}x{} -> {}x{} (factor {})",
                source_dimensions.0, source_dimensions.1, width, height, downscale_factor
            );
            imageops::resize(&image, width, height, FilterType::Triangle)
        } else {
            image
        };

        Ok(Self {
            overlay: original.clone(),
            original: Some(original),
            scale_factor: downscale_factor,
            source_dimensions,
            version: next_version(),
        })
    }

    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load<P: AsRef<Path>>(path: P, downscale_factor: f64) -> Result<Self> {
        Self::load_with(&ImageCrateReader, path, downscale_factor)
    }

    pub fn load_with<R: RasterReader + ?Sized, P: AsRef<Path>>(
        reader: &R,
        path: P,
        downscale_factor: f64,
    ) -> Result<Self> {
        let path = path.as_ref();
        validate_downscale(downscale_factor)?;

        let data = std::fs::read(path).map_err(|e| AnalysisError::ImageLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let image = reader.read_raster(&data).map_err(|e| AnalysisError::ImageLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        drop(data);

        let buffer = Self::from_image(image, downscale_factor).map_err(|e| match e {
            AnalysisError::InvalidDimensions(..) => AnalysisError::ImageLoad {
                path: path.to_path_buf(),
                reason: e.to_string(),
            },
            other => other,
        })?;

        info!(
            width = buffer.width(),
            height = buffer.height(),
            scale = buffer.scale_factor,
            "Loaded {}",
            path.display()
        );
        Ok(buffer)
    }

    pub fn original(&self) -> Result<&RgbImage> {
        self.original.as_ref().ok_or(AnalysisError::OriginalUnavailable)
    }

    pub fn overlay(&self) -> &RgbImage {
        &self.overlay
    }

    pub fn overlay_mut(&mut self) -> &mut RgbImage {
        &mut self.overlay
    }

    pub fn is_original_released(&self) -> bool {
        self.original.is_none()
    }

    /// Hands the pristine buffer to the caller. Dropping the returned image
    /// reclaims its memory; later calls that need the original fail with
    /// [`AnalysisError::OriginalUnavailable`].
    pub fn release_original(&mut self) -> Result<RgbImage> {
        let original = self.original.take().ok_or(AnalysisError::OriginalUnavailable)?;
        debug!("Released original {}x{} buffer", original.width(), original.height());
        Ok(original)
    }

    /// Restores the overlay copy to the pristine pixels.
    pub fn reset(&mut self) -> Result<()> {
        let original = self.original.as_ref().ok_or(AnalysisError::OriginalUnavailable)?;
        self.overlay.clone_from(original);
        self.version = next_version();
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.overlay.width()
    }

    pub fn height(&self) -> u32 {
        self.overlay.height()
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    pub fn source_dimensions(&self) -> (u32, u32) {
        self.source_dimensions
    }

    /// Changes on every load and reset; used as the band/mask cache key.
    pub fn version(&self) -> u64 {
        self.version
    }
}

fn validate_downscale(factor: f64) -> Result<()> {
    if !factor.is_finite() || factor <= 0.0 || factor > 1.0 {
        return Err(AnalysisError::InvalidDownscale(factor));
    }
    Ok(())
}

fn scaled_len(len: u32, factor: f64) -> u32 {
    ((len as f64 * factor).round() as u32).max(1)
}
