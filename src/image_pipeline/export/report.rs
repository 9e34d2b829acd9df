use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::image_pipeline::stats::{ChannelStatistics, ImageAnalysis, RoiAnalysis};

/// Per-image statistics document.
#[derive(Debug, Clone, Serialize)]
pub struct ImageReport {
    pub image: PathBuf,
    pub width: u32,
    pub height: u32,
    pub scale_factor: f64,
    /// Keyed `roi_band_stats.<roi>.<band>.<channel>`
    pub band_stats: BTreeMap<String, ChannelStatistics>,
    pub rois: Vec<RoiAnalysis>,
    pub skipped_rois: Vec<String>,
}

impl ImageReport {
    pub fn new(image: PathBuf, dimensions: (u32, u32), scale_factor: f64, analysis: &ImageAnalysis) -> Self {
        Self {
            image,
            width: dimensions.0,
            height: dimensions.1,
            scale_factor,
            band_stats: flatten_band_stats(&analysis.rois),
            rois: analysis.rois.clone(),
            skipped_rois: analysis.skipped.clone(),
        }
    }
}

pub fn flatten_band_stats<'a, I>(rois: I) -> BTreeMap<String, ChannelStatistics>
where
    I: IntoIterator<Item = &'a RoiAnalysis>,
{
    rois.into_iter()
        .flat_map(|roi| {
            roi.band_stats.iter().map(move |(band, channel, stats)| {
                (format!("roi_band_stats.{}.{band}.{channel}", roi.name), *stats)
            })
        })
        .collect()
}
