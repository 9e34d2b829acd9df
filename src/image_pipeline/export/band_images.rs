//! Band image rendering.
//!
//! Raw RGB planes map straight to 8-bit gray. Chromatic planes lie in
//! [0, 1] and are scaled by 255; undefined pixels render black.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use image::{GrayImage, Luma, Rgb, RgbImage};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::image_pipeline::bands::{Band, BandImage, Channel, ChromaticBands};
use crate::image_pipeline::common::error::{AnalysisError, Result};

/// One requested band export: a single channel plane, or a false-color
/// composite of all three channels of a band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BandExport {
    Channel(Band, Channel),
    Composite(Band),
}

impl BandExport {
    /// File name suffix, e.g. `chromatic_g` or `rgb_composite`.
    pub fn file_suffix(&self) -> String {
        match self {
            BandExport::Channel(band, channel) => format!("{band}_{channel}"),
            BandExport::Composite(band) => format!("{band}_composite"),
        }
    }

    pub fn band(&self) -> Band {
        match self {
            BandExport::Channel(band, _) | BandExport::Composite(band) => *band,
        }
    }
}

impl fmt::Display for BandExport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BandExport::Channel(band, channel) => write!(f, "{band}.{channel}"),
            BandExport::Composite(band) => write!(f, "{band}"),
        }
    }
}

impl FromStr for BandExport {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        let (band, channel) = match s.split_once('.') {
            Some((band, channel)) => (band, Some(channel)),
            None => (s, None),
        };
        let band = match band.trim().to_ascii_lowercase().as_str() {
            "rgb" => Band::Rgb,
            "chromatic" => Band::Chromatic,
            other => return Err(AnalysisError::Config(format!("unknown band `{other}`"))),
        };
        let Some(channel) = channel else {
            return Ok(BandExport::Composite(band));
        };
        let channel = match channel.trim().to_ascii_lowercase().as_str() {
            "r" => Channel::R,
            "g" => Channel::G,
            "b" => Channel::B,
            other => return Err(AnalysisError::Config(format!("unknown channel `{other}`"))),
        };
        Ok(BandExport::Channel(band, channel))
    }
}

impl Serialize for BandExport {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BandExport {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

pub fn band_to_gray(plane: &BandImage) -> GrayImage {
    let scale = match plane.band {
        Band::Rgb => 1.0,
        Band::Chromatic => 255.0,
    };
    GrayImage::from_fn(plane.width, plane.height, |x, y| Luma([to_u8(plane.get(x, y), scale)]))
}

pub fn chromatic_composite(bands: &ChromaticBands) -> RgbImage {
    let width = bands.width as usize;
    RgbImage::from_fn(bands.width, bands.height, |x, y| {
        let idx = y as usize * width + x as usize;
        Rgb([
            to_u8(bands.r[idx], 255.0),
            to_u8(bands.g[idx], 255.0),
            to_u8(bands.b[idx], 255.0),
        ])
    })
}

fn to_u8(value: f32, scale: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    (value * scale).round().clamp(0.0, 255.0) as u8
}

pub fn save_gray(image: &GrayImage, path: &Path) -> Result<()> {
    image.save(path).map_err(|e| AnalysisError::Export {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

pub fn save_rgb(image: &RgbImage, path: &Path) -> Result<()> {
    image.save(path).map_err(|e| AnalysisError::Export {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
