//! Default sky-exclusion ROI
//!
//! When a registry carries no definitions, the engine analyzes the frame below
//! the horizon. Where the horizon sits is decided by a [`SkyDetection`] policy.

use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::image_pipeline::common::error::{AnalysisError, Result};
use crate::image_pipeline::roi::types::{BgrColor, Point, RoiDefinition};

pub const DEFAULT_ROI_NAME: &str = "ROI_00";

const DEFAULT_ROI_COLOR: BgrColor = BgrColor([0, 255, 0]);
const DEFAULT_ROI_THICKNESS: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum SkyDetection {
    /// The top `fraction` of rows is sky.
    FixedFraction { fraction: f64 },
    /// Rows are sky while at least `sky_row_ratio` of their pixels are bright
    /// (mean channel value ≥ `brightness_threshold`) or blue-dominant and at
    /// least half as bright. Scanning stops at `max_fraction` of the height.
    BrightnessHorizon {
        brightness_threshold: u8,
        sky_row_ratio: f64,
        max_fraction: f64,
    },
}

impl Default for SkyDetection {
    fn default() -> Self {
        SkyDetection::BrightnessHorizon {
            brightness_threshold: 170,
            sky_row_ratio: 0.5,
            max_fraction: 0.6,
        }
    }
}

impl SkyDetection {
    pub fn validate(&self) -> Result<()> {
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        match *self {
            SkyDetection::FixedFraction { fraction } if !in_unit(fraction) => Err(
                AnalysisError::Config(format!("sky fraction {fraction} outside [0, 1]")),
            ),
            SkyDetection::BrightnessHorizon { sky_row_ratio, max_fraction, .. }
                if !in_unit(sky_row_ratio) || !in_unit(max_fraction) =>
            {
                Err(AnalysisError::Config(format!(
                    "sky ratios outside [0, 1]: row ratio {sky_row_ratio}, max fraction {max_fraction}"
                )))
            }
            _ => Ok(()),
        }
    }
}

/// First row below the sky band, always leaving at least two rows of ground.
pub fn detect_horizon_row(image: &RgbImage, policy: &SkyDetection) -> u32 {
    let height = image.height();
    if height < 2 {
        return 0;
    }
    let limit = height - 2;

    let row = match *policy {
        SkyDetection::FixedFraction { fraction } => (height as f64 * fraction).floor() as u32,
        SkyDetection::BrightnessHorizon {
            brightness_threshold,
            sky_row_ratio,
            max_fraction,
        } => {
            let max_row = (height as f64 * max_fraction).floor() as u32;
            let threshold = brightness_threshold as u32;
            let width = image.width() as f64;
            let mut horizon = 0;
            for (y, row) in image.rows().enumerate().take(max_row as usize) {
                let sky_pixels = row
                    .filter(|px| {
                        let [r, g, b] = px.0.map(u32::from);
                        let brightness = (r + g + b) / 3;
                        brightness >= threshold || (b > r && b > g && brightness * 2 >= threshold)
                    })
                    .count();
                if (sky_pixels as f64) < width * sky_row_ratio {
                    break;
                }
                horizon = y as u32 + 1;
            }
            horizon
        }
    };

    row.min(limit)
}

/// Rectangle covering the frame from the detected horizon to the bottom edge,
/// in the image's own pixel coordinates.
pub fn synthesize_default_sky_exclusion(image: &RgbImage, policy: &SkyDetection) -> RoiDefinition {
    let right = image.width().saturating_sub(1) as i32;
    let bottom = image.height().saturating_sub(1) as i32;
    let top = detect_horizon_row(image, policy) as i32;

    debug!("Default ROI horizon at row {} of {}", top, image.height());

    RoiDefinition {
        name: DEFAULT_ROI_NAME.to_string(),
        points: vec![
            Point::new(0, top),
            Point::new(right, top),
            Point::new(right, bottom),
            Point::new(0, bottom),
        ],
        color: DEFAULT_ROI_COLOR,
        thickness: DEFAULT_ROI_THICKNESS,
        alpha: None,
        updated: None,
        comment: Some("default sky exclusion".to_string()),
    }
}
