use tracing::{debug, instrument};

use crate::image_pipeline::bands::{Channel, ChromaticBands, RgbBands};
use crate::image_pipeline::common::error::{AnalysisError, Result};
use crate::image_pipeline::mask::RoiMask;
use crate::image_pipeline::stats::general::{histograms, pixel_sums, vegetation_summary};
use crate::image_pipeline::stats::types::{
    AnalysisOptions, BandStatistics, ChannelStatistics, RoiAnalysis, RoiBandStatistics,
};

/// Band arrays available for one image.
#[derive(Debug, Clone, Copy, Default)]
pub struct BandArrays<'a> {
    pub rgb: Option<RgbBands<'a>>,
    pub chromatic: Option<&'a ChromaticBands>,
}

/// Band statistics of the pixels selected by `mask`.
///
/// Raw RGB statistics count every masked pixel; chromatic statistics count
/// only masked pixels whose chromatic value is defined.
pub fn analyze(
    roi_name: &str,
    mask: &RoiMask,
    bands: &BandArrays<'_>,
    skip_rgb: bool,
    skip_chromatic: bool,
) -> Result<RoiBandStatistics> {
    let indices = mask.indices();
    analyze_indices(roi_name, mask, &indices, bands, skip_rgb, skip_chromatic)
}

fn analyze_indices(
    roi_name: &str,
    mask: &RoiMask,
    indices: &[usize],
    bands: &BandArrays<'_>,
    skip_rgb: bool,
    skip_chromatic: bool,
) -> Result<RoiBandStatistics> {
    let mut stats = RoiBandStatistics::default();

    if !skip_rgb {
        let rgb = require_rgb(roi_name, mask, bands)?;
        let per_channel = |channel: Channel| {
            ChannelStatistics::from_samples(indices.iter().map(move |&i| rgb.value(channel, i) as f64))
        };
        stats.rgb = Some(BandStatistics {
            r: per_channel(Channel::R),
            g: per_channel(Channel::G),
            b: per_channel(Channel::B),
        });
    }

    if !skip_chromatic {
        let chromatic = bands.chromatic.ok_or_else(|| aggregate_error(roi_name, "chromatic bands not provided"))?;
        if (chromatic.width, chromatic.height) != mask.dimensions() {
            return Err(aggregate_error(
                roi_name,
                &format!(
                    "mask is {}x{} but chromatic bands are {}x{}",
                    mask.width(), mask.height(), chromatic.width, chromatic.height
                ),
            ));
        }
        let per_channel = |channel: Channel| {
            let plane = chromatic.channel(channel);
            ChannelStatistics::from_samples(
                indices
                    .iter()
                    .map(move |&i| plane[i])
                    .filter(|v| !v.is_nan())
                    .map(f64::from),
            )
        };
        stats.chromatic = Some(BandStatistics {
            r: per_channel(Channel::R),
            g: per_channel(Channel::G),
            b: per_channel(Channel::B),
        });
    }

    Ok(stats)
}

/// Band statistics plus the general metrics (pixel sums, bounding rectangle,
/// optional histograms and vegetation index) for one ROI.
#[instrument(skip(mask, bands, options))]
pub fn analyze_roi(
    roi_name: &str,
    mask: &RoiMask,
    bands: &BandArrays<'_>,
    options: &AnalysisOptions,
) -> Result<RoiAnalysis> {
    let rgb = require_rgb(roi_name, mask, bands)?;
    let indices = mask.indices();

    let band_stats = analyze_indices(
        roi_name,
        mask,
        &indices,
        bands,
        options.skip_rgb,
        options.skip_chromatic,
    )?;

    let sums = pixel_sums(&indices, &rgb);
    let analysis = RoiAnalysis {
        name: roi_name.to_string(),
        pixel_count: indices.len() as u64,
        mean_color: sums.mean_color(),
        pixel_sums: sums,
        bounding_rect: mask.bounding_rect(),
        histograms: options.histograms.then(|| histograms(&indices, &rgb)),
        vegetation_index: options
            .vegetation_index
            .map(|index| vegetation_summary(&indices, &rgb, index)),
        band_stats,
    };

    debug!(pixels = analysis.pixel_count, "ROI analyzed");
    Ok(analysis)
}

fn require_rgb<'a>(roi_name: &str, mask: &RoiMask, bands: &BandArrays<'a>) -> Result<RgbBands<'a>> {
    let rgb = bands.rgb.ok_or_else(|| aggregate_error(roi_name, "rgb bands not provided"))?;
    if (rgb.width(), rgb.height()) != mask.dimensions() {
        return Err(aggregate_error(
            roi_name,
            &format!(
                "mask is {}x{} but image is {}x{}",
                mask.width(), mask.height(), rgb.width(), rgb.height()
            ),
        ));
    }
    Ok(rgb)
}

fn aggregate_error(roi_name: &str, reason: &str) -> AnalysisError {
    AnalysisError::Aggregate {
        roi: roi_name.to_string(),
        reason: reason.to_string(),
    }
}
