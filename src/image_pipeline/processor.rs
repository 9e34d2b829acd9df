//! Per-image ROI processor
//!
//! Owns one image's raster buffer and derived caches, and runs the
//! rasterize → band → statistics pipeline against a shared registry.

mod engine;


pub use engine::RoiImageProcessor;
