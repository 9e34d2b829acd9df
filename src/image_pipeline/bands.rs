//! Band derivation
//!
//! Raw RGB channel views and normalized chromatic coordinates, the latter
//! computed strip by strip to bound peak memory, with a per-image memo.

mod cache;
mod compute;
mod strips;
pub mod types;


pub use cache::BandCache;
pub use compute::{ChromaticStrip, chromatic_strips, compute_chromatic, compute_rgb};
pub use strips::{RowStrips, row_strips};
pub use types::{Band, BandImage, Channel, ChromaticBands, RgbBands};
