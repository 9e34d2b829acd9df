//! Band and channel identifiers and the derived per-pixel arrays.

use std::fmt;

use image::RgbImage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Rgb,
    Chromatic,
}

impl Band {
    pub const ALL: [Band; 2] = [Band::Rgb, Band::Chromatic];

    pub fn as_str(&self) -> &'static str {
        match self {
            Band::Rgb => "rgb",
            Band::Chromatic => "chromatic",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    R,
    G,
    B,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::R, Channel::G, Channel::B];

    /// Offset of the channel within an interleaved RGB pixel.
    pub fn index(&self) -> usize {
        match self {
            Channel::R => 0,
            Channel::G => 1,
            Channel::B => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::R => "r",
            Channel::G => "g",
            Channel::B => "b",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One full-size band/channel plane. Undefined samples are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct BandImage {
    pub band: Band,
    pub channel: Channel,
    pub width: u32,
    pub height: u32,
    pub values: Vec<f32>,
}

impl BandImage {
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.values[y as usize * self.width as usize + x as usize]
    }
}

/// Borrowed view of the three raw channel planes of an RGB image.
#[derive(Debug, Clone, Copy)]
pub struct RgbBands<'a> {
    image: &'a RgbImage,
}

impl<'a> RgbBands<'a> {
    pub(crate) fn new(image: &'a RgbImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Value of `channel` at flat pixel index `idx`.
    pub fn value(&self, channel: Channel, idx: usize) -> u8 {
        self.image.as_raw()[idx * 3 + channel.index()]
    }

    pub fn channel(&self, channel: Channel) -> impl Iterator<Item = u8> + 'a {
        let raw: &'a [u8] = self.image.as_raw();
        raw.iter().skip(channel.index()).step_by(3).copied()
    }

    pub fn image(&self) -> &'a RgbImage {
        self.image
    }

    pub fn to_band_image(&self, channel: Channel) -> BandImage {
        BandImage {
            band: Band::Rgb,
            channel,
            width: self.width(),
            height: self.height(),
            values: self.channel(channel).map(f32::from).collect(),
        }
    }
}

/// Chromatic coordinates (channel / (R+G+B)) as three full-size planes.
///
/// Pixels with R+G+B = 0 are NaN in every plane.
#[derive(Debug, Clone, PartialEq)]
pub struct ChromaticBands {
    pub width: u32,
    pub height: u32,
    pub r: Vec<f32>,
    pub g: Vec<f32>,
    pub b: Vec<f32>,
}

impl ChromaticBands {
    pub fn channel(&self, channel: Channel) -> &[f32] {
        match channel {
            Channel::R => &self.r,
            Channel::G => &self.g,
            Channel::B => &self.b,
        }
    }

    pub fn is_defined(&self, idx: usize) -> bool {
        !self.r[idx].is_nan()
    }

    pub fn defined_count(&self) -> usize {
        self.r.iter().filter(|v| !v.is_nan()).count()
    }

    pub fn to_band_image(&self, channel: Channel) -> BandImage {
        BandImage {
            band: Band::Chromatic,
            channel,
            width: self.width,
            height: self.height,
            values: self.channel(channel).to_vec(),
        }
    }
}
