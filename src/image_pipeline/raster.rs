//! Raster loading and buffer ownership
//!
//! Decodes image files into 8-bit RGB buffers and keeps the pristine original
//! apart from the copy that receives ROI overlays.

mod buffer;
mod image_reader;
mod reader;


pub use buffer::RasterBuffer;
pub use image_reader::ImageCrateReader;
pub use reader::RasterReader;
