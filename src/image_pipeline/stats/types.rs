//! Statistics records

use serde::{Deserialize, Serialize};

use crate::image_pipeline::bands::{Band, Channel};
use crate::image_pipeline::mask::BoundingRect;
use crate::image_pipeline::stats::general::{ChannelHistograms, IndexSummary, PixelSums, VegetationIndex};

/// Summary of one band/channel over a ROI.
///
/// With no samples, `pixels` and `sum` are zero and the other fields are NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChannelStatistics {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub sum: f64,
    pub pixels: u64,
}

impl ChannelStatistics {
    pub fn empty() -> Self {
        Self {
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
            sum: 0.0,
            pixels: 0,
        }
    }

    /// Two-pass statistics: mean first, then squared deviations from it.
    /// Standard deviation is the population form.
    pub fn from_samples<I>(samples: I) -> Self
    where
        I: Iterator<Item = f64> + Clone,
    {
        let mut pixels = 0u64;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in samples.clone() {
            pixels += 1;
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }
        if pixels == 0 {
            return Self::empty();
        }

        // rounding in `sum` can push the quotient one ulp outside the range
        let mean = (sum / pixels as f64).clamp(min, max);
        let squared: f64 = samples.map(|v| (v - mean) * (v - mean)).sum();
        let std = (squared / pixels as f64).sqrt();

        Self { mean, std, min, max, sum, pixels }
    }

    pub fn is_empty(&self) -> bool {
        self.pixels == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandStatistics {
    pub r: ChannelStatistics,
    pub g: ChannelStatistics,
    pub b: ChannelStatistics,
}

impl BandStatistics {
    pub fn get(&self, channel: Channel) -> &ChannelStatistics {
        match channel {
            Channel::R => &self.r,
            Channel::G => &self.g,
            Channel::B => &self.b,
        }
    }
}

/// Band statistics for one ROI; a band is `None` when it was skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoiBandStatistics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rgb: Option<BandStatistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chromatic: Option<BandStatistics>,
}

impl RoiBandStatistics {
    pub fn get(&self, band: Band) -> Option<&BandStatistics> {
        match band {
            Band::Rgb => self.rgb.as_ref(),
            Band::Chromatic => self.chromatic.as_ref(),
        }
    }

    /// Every computed (band, channel, statistics) triple.
    pub fn iter(&self) -> impl Iterator<Item = (Band, Channel, &ChannelStatistics)> {
        Band::ALL.into_iter().flat_map(move |band| {
            self.get(band)
                .into_iter()
                .flat_map(move |stats| Channel::ALL.into_iter().map(move |c| (band, c, stats.get(c))))
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    pub skip_rgb: bool,
    pub skip_chromatic: bool,
    /// Include 256-bin histograms of the raw channels
    pub histograms: bool,
    pub vegetation_index: Option<VegetationIndex>,
}

/// Everything reported for one ROI on one image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoiAnalysis {
    pub name: String,
    pub pixel_count: u64,
    pub mean_color: [f64; 3],
    pub pixel_sums: PixelSums,
    pub bounding_rect: Option<BoundingRect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub histograms: Option<ChannelHistograms>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vegetation_index: Option<IndexSummary>,
    pub band_stats: RoiBandStatistics,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImageAnalysis {
    pub rois: Vec<RoiAnalysis>,
    /// ROI names excluded by the caller's skip list
    pub skipped: Vec<String>,
}

impl ImageAnalysis {
    pub fn get(&self, name: &str) -> Option<&RoiAnalysis> {
        self.rois.iter().find(|r| r.name == name)
    }

    pub fn rois_analyzed(&self) -> usize {
        self.rois.len()
    }
}
