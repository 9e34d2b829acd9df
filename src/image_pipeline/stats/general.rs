//! General ROI metrics: pixel sums, histograms, vegetation indices.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::image_pipeline::bands::{Channel, RgbBands};
use crate::image_pipeline::stats::types::ChannelStatistics;

const HISTOGRAM_BINS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum VegetationIndex {
    /// Green-red vegetation index, (G - R) / (G + R)
    Grvi,
    /// Excess green, 2G - R - B
    #[value(alias = "excess_green", alias = "exg")]
    ExcessGreen,
}

impl VegetationIndex {
    /// Index value for one pixel, `None` where it is undefined.
    pub fn evaluate(&self, r: u8, g: u8, b: u8) -> Option<f64> {
        let (r, g, b) = (r as f64, g as f64, b as f64);
        match self {
            VegetationIndex::Grvi => {
                let denom = g + r;
                (denom > 0.0).then(|| (g - r) / denom)
            }
            VegetationIndex::ExcessGreen => Some(2.0 * g - r - b),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndexSummary {
    pub index: VegetationIndex,
    #[serde(flatten)]
    pub stats: ChannelStatistics,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PixelSums {
    pub r: u64,
    pub g: u64,
    pub b: u64,
    pub total: u64,
    pub pixels: u64,
}

impl PixelSums {
    /// Per-channel mean, NaN for an empty ROI.
    pub fn mean_color(&self) -> [f64; 3] {
        if self.pixels == 0 {
            return [f64::NAN; 3];
        }
        let n = self.pixels as f64;
        [self.r as f64 / n, self.g as f64 / n, self.b as f64 / n]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelHistograms {
    pub r: Vec<u32>,
    pub g: Vec<u32>,
    pub b: Vec<u32>,
}

pub(crate) fn pixel_sums(indices: &[usize], rgb: &RgbBands<'_>) -> PixelSums {
    let mut sums = PixelSums::default();
    for &idx in indices {
        sums.r += rgb.value(Channel::R, idx) as u64;
        sums.g += rgb.value(Channel::G, idx) as u64;
        sums.b += rgb.value(Channel::B, idx) as u64;
    }
    sums.total = sums.r + sums.g + sums.b;
    sums.pixels = indices.len() as u64;
    sums
}

pub(crate) fn histograms(indices: &[usize], rgb: &RgbBands<'_>) -> ChannelHistograms {
    let mut bins = [vec![0u32; HISTOGRAM_BINS], vec![0u32; HISTOGRAM_BINS], vec![0u32; HISTOGRAM_BINS]];
    for &idx in indices {
        for channel in Channel::ALL {
            bins[channel.index()][rgb.value(channel, idx) as usize] += 1;
        }
    }
    let [r, g, b] = bins;
    ChannelHistograms { r, g, b }
}

pub(crate) fn vegetation_summary(
    indices: &[usize],
    rgb: &RgbBands<'_>,
    index: VegetationIndex,
) -> IndexSummary {
    let samples = indices.iter().filter_map(|&idx| {
        index.evaluate(
            rgb.value(Channel::R, idx),
            rgb.value(Channel::G, idx),
            rgb.value(Channel::B, idx),
        )
    });
    IndexSummary {
        index,
        stats: ChannelStatistics::from_samples(samples),
    }
}
