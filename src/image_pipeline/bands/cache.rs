use std::sync::Arc;

use image::RgbImage;
use tracing::debug;

use crate::image_pipeline::bands::compute::compute_chromatic;
use crate::image_pipeline::bands::types::ChromaticBands;
use crate::image_pipeline::common::error::Result;

/// Memo of the chromatic bands for one image version.
///
/// The key is [`RasterBuffer::version`](crate::image_pipeline::raster::RasterBuffer::version),
/// which changes on every load and reset, so stale entries are never served.
#[derive(Debug, Default)]
pub struct BandCache {
    entry: Option<(u64, Arc<ChromaticBands>)>,
}

impl BandCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, version: u64) -> Option<Arc<ChromaticBands>> {
        match &self.entry {
            Some((key, bands)) if *key == version => Some(Arc::clone(bands)),
            _ => None,
        }
    }

    pub fn get_or_compute(
        &mut self,
        version: u64,
        image: &RgbImage,
        chunk_rows: u32,
        force_recompute: bool,
    ) -> Result<Arc<ChromaticBands>> {
        if !force_recompute {
            if let Some(bands) = self.get(version) {
                return Ok(bands);
            }
        }

        debug!(version, force_recompute, "Computing chromatic bands");
        let bands = Arc::new(compute_chromatic(image, chunk_rows)?);
        self.entry = Some((version, Arc::clone(&bands)));
        Ok(bands)
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    pub fn is_cached(&self, version: u64) -> bool {
        self.get(version).is_some()
    }
}
