use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;

use crate::image_pipeline::mask::RoiMask;
use crate::image_pipeline::roi::RoiDefinition;

/// Draws `roi` onto `canvas`: alpha-blended fill over the mask pixels, then
/// a closed outline `thickness` pixels wide in the stroke color.
///
/// `roi` must already be in the canvas' coordinates and `mask` must match
/// the canvas size.
pub fn draw_roi(canvas: &mut RgbImage, roi: &RoiDefinition, mask: &RoiMask) {
    let color = roi.color.to_rgb();

    let alpha = roi.fill_alpha();
    if alpha > 0.0 && mask.dimensions() == canvas.dimensions() {
        let raw: &mut [u8] = &mut **canvas;
        for (px, _) in raw
            .chunks_exact_mut(3)
            .zip(mask.as_slice())
            .filter(|(_, inside)| **inside)
        {
            for (c, &target) in px.iter_mut().zip(&color) {
                *c = ((1.0 - alpha) * *c as f64 + alpha * target as f64).round() as u8;
            }
        }
    }

    let n = roi.points.len();
    for i in 0..n {
        let a = roi.points[i];
        let b = roi.points[(i + 1) % n];
        draw_thick_segment(
            canvas,
            (a.x as f32, a.y as f32),
            (b.x as f32, b.y as f32),
            roi.thickness,
            Rgb(color),
        );
    }
}

fn draw_thick_segment(canvas: &mut RgbImage, start: (f32, f32), end: (f32, f32), thickness: u32, color: Rgb<u8>) {
    let (dx, dy) = (end.0 - start.0, end.1 - start.1);
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 || thickness <= 1 {
        draw_line_segment_mut(canvas, start, end, color);
        return;
    }

    // parallel strokes offset along the unit normal
    let (nx, ny) = (-dy / len, dx / len);
    let half = (thickness - 1) as f32 / 2.0;
    for step in 0..thickness {
        let offset = step as f32 - half;
        draw_line_segment_mut(
            canvas,
            (start.0 + nx * offset, start.1 + ny * offset),
            (end.0 + nx * offset, end.1 + ny * offset),
            color,
        );
    }
}
