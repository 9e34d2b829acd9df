//! Output rendering
//!
//! ROI overlays, band images, and per-image statistics reports.

mod band_images;
mod overlay;
mod report;
mod writer;

#[cfg(test)]
mod tests;

pub use band_images::{BandExport, band_to_gray, chromatic_composite, save_gray, save_rgb};
pub use overlay::draw_roi;
pub use report::{ImageReport, flatten_band_stats};
pub use writer::{JsonReportWriter, ReportFormat, ReportWriter, YamlReportWriter};
