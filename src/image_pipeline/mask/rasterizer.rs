//! Scanline polygon fill.
//!
//! Each image row is intersected with the polygon edges (half-open in y so
//! shared vertices count once) and spans between crossings are filled
//! according to the [`FillRule`]. A second pass marks every pixel centre
//! lying exactly on an edge so the boundary is always part of the mask.
//! Rows and spans are cut to the image rectangle, which clips the polygon
//! exactly: parts outside the image contribute nothing.

use tracing::{debug, warn};

use crate::image_pipeline::common::error::{AnalysisError, Result};
use crate::image_pipeline::mask::types::{FillRule, RoiMask};
use crate::image_pipeline::roi::{Point, RoiDefinition};

const EPS: f64 = 1e-9;

#[derive(Debug, Clone, Copy, Default)]
pub struct MaskRasterizer {
    fill_rule: FillRule,
}

impl MaskRasterizer {
    pub fn new(fill_rule: FillRule) -> Self {
        Self { fill_rule }
    }

    pub fn fill_rule(&self) -> FillRule {
        self.fill_rule
    }

    /// Mask of the image pixels on or inside `roi`'s polygon.
    ///
    /// Polygons with zero area, or no area inside the image, give an empty
    /// mask.
    pub fn rasterize(&self, roi: &RoiDefinition, width: u32, height: u32) -> Result<RoiMask> {
        if width == 0 || height == 0 {
            return Err(AnalysisError::Rasterize {
                roi: roi.name.clone(),
                reason: format!("image has no pixels ({width}x{height})"),
            });
        }
        if roi.points.len() < 3 {
            return Err(AnalysisError::Rasterize {
                roi: roi.name.clone(),
                reason: format!("polygon has {} points", roi.points.len()),
            });
        }

        let mut mask = RoiMask::empty(width, height);
        if is_collinear(&roi.points) {
            warn!("ROI {} has zero area", roi.name);
            return Ok(mask);
        }

        let vertices: Vec<(f64, f64)> = roi.points.iter().map(|p| (p.x as f64, p.y as f64)).collect();
        self.fill_interior(&vertices, &mut mask);
        mark_boundary(&vertices, &mut mask);

        let count = mask.count();
        if count == 0 {
            warn!("ROI {} has no area inside {}x{} image", roi.name, width, height);
        } else {
            debug!("ROI {} rasterized to {} pixels", roi.name, count);
        }
        Ok(mask)
    }

    fn fill_interior(&self, vertices: &[(f64, f64)], mask: &mut RoiMask) {
        let (min_y, max_y) = vertices
            .iter()
            .fold((f64::MAX, f64::MIN), |(lo, hi), &(_, y)| (lo.min(y), hi.max(y)));
        let Some(rows) = row_range(min_y, max_y, mask.height()) else {
            return;
        };

        let mut crossings: Vec<(f64, i32)> = Vec::with_capacity(vertices.len());
        for y in rows {
            let yf = y as f64;
            crossings.clear();
            for (i, &(x0, y0)) in vertices.iter().enumerate() {
                let (x1, y1) = vertices[(i + 1) % vertices.len()];
                if y0 == y1 {
                    continue;
                }
                let (lo, hi) = if y0 < y1 { (y0, y1) } else { (y1, y0) };
                if yf < lo || yf >= hi {
                    continue;
                }
                let x = x0 + (yf - y0) * (x1 - x0) / (y1 - y0);
                let winding = if y1 > y0 { 1 } else { -1 };
                crossings.push((x, winding));
            }
            crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

            match self.fill_rule {
                FillRule::EvenOdd => {
                    for pair in crossings.chunks_exact(2) {
                        fill_span(mask, y, pair[0].0, pair[1].0);
                    }
                }
                FillRule::NonZero => {
                    let mut winding = 0;
                    let mut span_start = 0.0;
                    for &(x, dir) in &crossings {
                        if winding == 0 {
                            span_start = x;
                        }
                        winding += dir;
                        if winding == 0 {
                            fill_span(mask, y, span_start, x);
                        }
                    }
                }
            }
        }
    }
}

/// Image rows covering `[min_y, max_y]`, or `None` if the range misses the image.
fn row_range(min_y: f64, max_y: f64, height: u32) -> Option<std::ops::RangeInclusive<u32>> {
    let first = (min_y - EPS).ceil().max(0.0);
    let last = (max_y + EPS).floor().min(height as f64 - 1.0);
    (first <= last).then(|| first as u32..=last as u32)
}

/// Fills pixel centres within `[x_left, x_right]`, cut to the image width.
fn fill_span(mask: &mut RoiMask, y: u32, x_left: f64, x_right: f64) {
    let start = (x_left - EPS).ceil().max(0.0);
    let end = (x_right + EPS).floor().min(mask.width() as f64 - 1.0);
    if start <= end {
        mask.fill_row(y, start as u32, end as u32);
    }
}

fn mark_boundary(vertices: &[(f64, f64)], mask: &mut RoiMask) {
    let max_x = mask.width() as f64 - 1.0;
    for (i, &(x0, y0)) in vertices.iter().enumerate() {
        let (x1, y1) = vertices[(i + 1) % vertices.len()];
        if y0 == y1 {
            if y0 >= 0.0 && y0 < mask.height() as f64 {
                fill_span(mask, y0 as u32, x0.min(x1), x0.max(x1));
            }
            continue;
        }
        let Some(rows) = row_range(y0.min(y1), y0.max(y1), mask.height()) else {
            continue;
        };
        for y in rows {
            let x = x0 + (y as f64 - y0) * (x1 - x0) / (y1 - y0);
            let rounded = x.round();
            if (x - rounded).abs() < EPS && (0.0..=max_x).contains(&rounded) {
                mask.set(rounded as u32, y);
            }
        }
    }
}

fn is_collinear(points: &[Point]) -> bool {
    let origin = points[0];
    let Some(other) = points.iter().find(|p| **p != origin) else {
        return true;
    };
    let (dx, dy) = ((other.x - origin.x) as i64, (other.y - origin.y) as i64);
    points
        .iter()
        .all(|p| dx * (p.y - origin.y) as i64 - dy * (p.x - origin.x) as i64 == 0)
}

/// Shoelace area, always non-negative.
pub fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();
    (twice as f64 / 2.0).abs()
}

pub fn polygon_perimeter(points: &[Point]) -> f64 {
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| (((b.x - a.x) as f64).powi(2) + ((b.y - a.y) as f64).powi(2)).sqrt())
        .sum()
}
