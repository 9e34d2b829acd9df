use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbImage;
use tracing::{debug, info, info_span, instrument, warn};

use crate::image_pipeline::bands::{Band, BandCache, BandImage, Channel, ChromaticBands, compute_rgb};
use crate::image_pipeline::common::config::EngineConfig;
use crate::image_pipeline::common::error::{AnalysisError, Result};
use crate::image_pipeline::export::draw_roi;
use crate::image_pipeline::mask::{MaskRasterizer, RoiMask};
use crate::image_pipeline::raster::{ImageCrateReader, RasterBuffer, RasterReader};
use crate::image_pipeline::roi::{RoiDefinition, RoiRegistry, synthesize_default_sky_exclusion};
use crate::image_pipeline::stats::{AnalysisOptions, BandArrays, ImageAnalysis, RoiAnalysis, analyze_roi};

/// Runs ROI analysis for one image at a time.
///
/// The registry is shared and never mutated. Masks and chromatic bands are
/// memoized against the raster version, so they are recomputed after every
/// load and reset and never reused across images.
pub struct RoiImageProcessor {
    registry: Arc<RoiRegistry>,
    config: EngineConfig,
    rasterizer: MaskRasterizer,
    raster: Option<RasterBuffer>,
    source: Option<PathBuf>,
    // used only while the registry is empty, in source-resolution coordinates
    fallback_roi: Option<RoiDefinition>,
    bands: BandCache,
    masks: HashMap<String, Arc<RoiMask>>,
    masks_version: Option<u64>,
}

impl RoiImageProcessor {
    pub fn new(registry: Arc<RoiRegistry>, config: EngineConfig) -> Self {
        Self {
            rasterizer: MaskRasterizer::new(config.fill_rule),
            registry,
            config,
            raster: None,
            source: None,
            fallback_roi: None,
            bands: BandCache::new(),
            masks: HashMap::new(),
            masks_version: None,
        }
    }

    pub fn registry(&self) -> &RoiRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Loads `path`, scaled by `downscale_factor` (further reduced if the
    /// image exceeds the configured `max_pixels`).
    pub fn load_image<P: AsRef<Path>>(&mut self, path: P, downscale_factor: f64) -> Result<()> {
        self.load_image_with(&ImageCrateReader, path, downscale_factor)
    }

    #[instrument(skip(self, reader, path), fields(path = %path.as_ref().display()))]
    pub fn load_image_with<R: RasterReader + ?Sized, P: AsRef<Path>>(
        &mut self,
        reader: &R,
        path: P,
        downscale_factor: f64,
    ) -> Result<()> {
        let path = path.as_ref();
        self.release();

        let full = RasterBuffer::load_with(reader, path, 1.0)?;
        let (width, height) = full.source_dimensions();
        let factor = self.config.effective_downscale(downscale_factor, width, height);
        if factor < downscale_factor {
            warn!(
                "{}x{} exceeds max_pixels, downscaling by {:.3} instead of {}",
                width, height, factor, downscale_factor
            );
        }

        let raster = if factor < 1.0 {
            let mut full = full;
            let original = full.release_original()?;
            drop(full);
            RasterBuffer::from_image(original, factor)?
        } else {
            full
        };

        self.source = Some(path.to_path_buf());
        self.install(raster)
    }

    /// Installs already-decoded pixels.
    pub fn set_image(&mut self, image: RgbImage, downscale_factor: f64) -> Result<()> {
        self.release();
        let factor = self
            .config
            .effective_downscale(downscale_factor, image.width(), image.height());
        let raster = RasterBuffer::from_image(image, factor)?;
        self.install(raster)
    }

    fn install(&mut self, raster: RasterBuffer) -> Result<()> {
        self.fallback_roi = if self.registry.is_empty() {
            let roi = synthesize_default_sky_exclusion(raster.original()?, &self.config.sky_detection);
            info!("ROI registry is empty, using default ROI {}", roi.name);
            Some(roi.scaled(1.0 / raster.scale_factor()))
        } else {
            None
        };
        self.raster = Some(raster);
        Ok(())
    }

    pub fn raster(&self) -> Result<&RasterBuffer> {
        self.raster.as_ref().ok_or(AnalysisError::NoImageLoaded)
    }

    fn raster_mut(&mut self) -> Result<&mut RasterBuffer> {
        self.raster.as_mut().ok_or(AnalysisError::NoImageLoaded)
    }

    /// Restores the overlay copy and drops every memoized result.
    pub fn reset(&mut self) -> Result<()> {
        self.raster_mut()?.reset()?;
        self.invalidate_caches();
        Ok(())
    }

    /// Frees the pristine buffer. Memoized chromatic bands and masks survive;
    /// raw band access, analysis and reset fail with
    /// [`AnalysisError::OriginalUnavailable`] afterwards.
    pub fn release_original(&mut self) -> Result<()> {
        let original = self.raster_mut()?.release_original()?;
        drop(original);
        Ok(())
    }

    /// Drops the raster and every derived array.
    pub fn release(&mut self) {
        if let Some(raster) = self.raster.take() {
            debug!("Releasing {}x{} raster", raster.width(), raster.height());
        }
        self.source = None;
        self.fallback_roi = None;
        self.invalidate_caches();
    }

    fn invalidate_caches(&mut self) {
        self.bands.invalidate();
        self.masks.clear();
        self.masks_version = None;
    }

    /// ROIs analyzed for the current image: the registry, or the default ROI
    /// when the registry is empty.
    pub fn rois(&self) -> Vec<&RoiDefinition> {
        match &self.fallback_roi {
            Some(roi) => vec![roi],
            None => self.registry.iter().collect(),
        }
    }

    fn find_roi(&self, name: &str) -> Result<&RoiDefinition> {
        match &self.fallback_roi {
            Some(roi) if roi.name == name => Ok(roi),
            _ => self.registry.require(name),
        }
    }

    /// ROI definition mapped into the working image's coordinates.
    pub fn scaled_roi(&self, name: &str) -> Result<RoiDefinition> {
        let factor = self.raster()?.scale_factor();
        Ok(self.find_roi(name)?.scaled(factor))
    }

    pub fn mask(&mut self, name: &str) -> Result<Arc<RoiMask>> {
        let raster = self.raster.as_ref().ok_or(AnalysisError::NoImageLoaded)?;
        let version = raster.version();
        if self.masks_version != Some(version) {
            self.masks.clear();
            self.masks_version = Some(version);
        }
        if let Some(mask) = self.masks.get(name) {
            return Ok(Arc::clone(mask));
        }

        let roi = self.find_roi(name)?.scaled(raster.scale_factor());
        let mask = Arc::new(self.rasterizer.rasterize(&roi, raster.width(), raster.height())?);
        self.masks.insert(name.to_string(), Arc::clone(&mask));
        Ok(mask)
    }

    pub fn chromatic(&mut self, force_recompute: bool) -> Result<Arc<ChromaticBands>> {
        let raster = self.raster.as_ref().ok_or(AnalysisError::NoImageLoaded)?;
        let version = raster.version();
        if !force_recompute {
            if let Some(bands) = self.bands.get(version) {
                return Ok(bands);
            }
        }
        let original = raster.original()?;
        self.bands
            .get_or_compute(version, original, self.config.chunk_rows, force_recompute)
    }

    /// Full-size plane for one band/channel.
    pub fn get_band_image(&mut self, band: Band, channel: Channel, force_recompute: bool) -> Result<BandImage> {
        match band {
            Band::Rgb => Ok(compute_rgb(self.raster()?.original()?).to_band_image(channel)),
            Band::Chromatic => Ok(self.chromatic(force_recompute)?.to_band_image(channel)),
        }
    }

    pub fn analyze_roi(&mut self, name: &str, options: &AnalysisOptions) -> Result<RoiAnalysis> {
        let mask = self.mask(name)?;
        let chromatic = if options.skip_chromatic {
            None
        } else {
            Some(self.chromatic(false)?)
        };
        let original = self.raster()?.original()?;
        let bands = BandArrays {
            rgb: Some(compute_rgb(original)),
            chromatic: chromatic.as_deref(),
        };
        analyze_roi(name, &mask, &bands, options)
    }

    /// Analyzes every ROI except those named in `skip`.
    #[instrument(skip(self, options))]
    pub fn analyze_all(&mut self, skip: &[String], options: &AnalysisOptions) -> Result<ImageAnalysis> {
        let names: Vec<String> = self.rois().iter().map(|r| r.name.clone()).collect();
        for name in skip {
            if !names.contains(name) {
                warn!("Skip list names unknown ROI {}", name);
            }
        }

        let mut analysis = ImageAnalysis::default();
        for name in names {
            if skip.contains(&name) {
                analysis.skipped.push(name);
                continue;
            }
            let _span = info_span!("analyze_roi", roi = %name).entered();
            analysis.rois.push(self.analyze_roi(&name, options)?);
        }

        info!(
            analyzed = analysis.rois.len(),
            skipped = analysis.skipped.len(),
            "Image analysis complete"
        );
        Ok(analysis)
    }

    /// Draws every ROI outline (and fill, where `alpha > 0`) on the overlay
    /// copy. The original is left untouched.
    pub fn draw_overlays(&mut self) -> Result<()> {
        let names: Vec<String> = self.rois().iter().map(|r| r.name.clone()).collect();
        for name in names {
            let mask = self.mask(&name)?;
            let roi = self.scaled_roi(&name)?;
            draw_roi(self.raster_mut()?.overlay_mut(), &roi, &mask);
        }
        Ok(())
    }
}
