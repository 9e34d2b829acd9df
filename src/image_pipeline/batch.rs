//! Batch orchestration
//!
//! Applies one shared [`RoiRegistry`](crate::image_pipeline::roi::RoiRegistry)
//! to many images. Every image gets its own processor and buffers; a failure
//! is recorded against that image and the batch moves on.

mod orchestrator;
pub mod types;

#[cfg(test)]
mod tests;

pub use orchestrator::BatchProcessor;
pub use types::{BatchOptions, BatchOptionsBuilder, BatchReport, ImageOutcome, ImageStatus};
