//! Polygon mask rasterization
//!
//! Turns a ROI polygon into a full-resolution membership mask for one image.

mod rasterizer;
mod types;


pub use rasterizer::{MaskRasterizer, polygon_area, polygon_perimeter};
pub use types::{BoundingRect, FillRule, RoiMask};
