use std::ops::Range;

use image::RgbImage;
use tracing::{debug, instrument};

use crate::image_pipeline::bands::strips::row_strips;
use crate::image_pipeline::bands::types::{ChromaticBands, RgbBands};
use crate::image_pipeline::common::error::Result;

/// Chromatic coordinates for one horizontal strip of rows.
#[derive(Debug, Clone)]
pub struct ChromaticStrip {
    pub rows: Range<u32>,
    pub r: Vec<f32>,
    pub g: Vec<f32>,
    pub b: Vec<f32>,
}

pub fn compute_rgb(image: &RgbImage) -> RgbBands<'_> {
    RgbBands::new(image)
}

/// Lazily derives chromatic coordinates `chunk_rows` rows at a time.
///
/// Each strip allocates `3 × chunk_rows × width` samples; nothing else is
/// held between strips.
pub fn chromatic_strips(
    image: &RgbImage,
    chunk_rows: u32,
) -> Result<impl Iterator<Item = ChromaticStrip> + '_> {
    let strips = row_strips(image.height(), chunk_rows)?;
    Ok(strips.map(move |rows| chromatic_strip(image, rows)))
}

fn chromatic_strip(image: &RgbImage, rows: Range<u32>) -> ChromaticStrip {
    let row_len = image.width() as usize * 3;
    let start = rows.start as usize * row_len;
    let end = rows.end as usize * row_len;
    let pixels = &image.as_raw()[start..end];

    let len = pixels.len() / 3;
    let mut r = Vec::with_capacity(len);
    let mut g = Vec::with_capacity(len);
    let mut b = Vec::with_capacity(len);

    for px in pixels.chunks_exact(3) {
        let sum = px[0] as u32 + px[1] as u32 + px[2] as u32;
        if sum == 0 {
            r.push(f32::NAN);
            g.push(f32::NAN);
            b.push(f32::NAN);
        } else {
            let sum = sum as f32;
            r.push(px[0] as f32 / sum);
            g.push(px[1] as f32 / sum);
            b.push(px[2] as f32 / sum);
        }
    }

    ChromaticStrip { rows, r, g, b }
}

/// Full-size chromatic planes, assembled strip by strip.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn compute_chromatic(image: &RgbImage, chunk_rows: u32) -> Result<ChromaticBands> {
    let total = image.width() as usize * image.height() as usize;
    let mut bands = ChromaticBands {
        width: image.width(),
        height: image.height(),
        r: Vec::with_capacity(total),
        g: Vec::with_capacity(total),
        b: Vec::with_capacity(total),
    };

    let mut strip_count = 0;
    for strip in chromatic_strips(image, chunk_rows)? {
        bands.r.extend_from_slice(&strip.r);
        bands.g.extend_from_slice(&strip.g);
        bands.b.extend_from_slice(&strip.b);
        strip_count += 1;
    }

    debug!("Chromatic bands computed in {} strips of {} rows", strip_count, chunk_rows);
    Ok(bands)
}
