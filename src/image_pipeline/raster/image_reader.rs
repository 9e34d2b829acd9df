//! Raster reader backed by the `image` crate.
//!
//! Handles every format the crate is built with (PNG, JPEG, TIFF, ...) and
//! normalizes the result to 3-channel 8-bit RGB, dropping alpha and widening
//! grayscale.

use image::RgbImage;
use tracing::debug;

use crate::image_pipeline::common::error::{AnalysisError, Result};
use crate::image_pipeline::raster::reader::RasterReader;

pub struct ImageCrateReader;

impl RasterReader for ImageCrateReader {
    fn read_raster(&self, data: &[u8]) -> Result<RgbImage> {
        debug!("Decoding raster, {} bytes", data.len());

        let decoded = image::load_from_memory(data)
            .map_err(|e| AnalysisError::Decode(e.to_string()))?;

        debug!(
            "Decoded {}x{} {:?}",
            decoded.width(),
            decoded.height(),
            decoded.color()
        );

        Ok(decoded.to_rgb8())
    }
}
