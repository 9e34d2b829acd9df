//! ROI statistics
//!
//! Per-ROI band statistics (count, mean, std, min, max, sum for every
//! band/channel) and the general ROI metrics reported alongside them.

mod aggregator;
mod general;
pub mod types;


pub use aggregator::{BandArrays, analyze, analyze_roi};
pub use general::{ChannelHistograms, IndexSummary, PixelSums, VegetationIndex};
pub use types::{
    AnalysisOptions, BandStatistics, ChannelStatistics, ImageAnalysis, RoiAnalysis,
    RoiBandStatistics,
};
