//! ROI definitions and registry
//!
//! Polygonal regions of interest, validated at load time, plus the default
//! sky-exclusion ROI synthesized when no definitions are supplied.

mod registry;
mod sky;
pub mod types;


pub use registry::RoiRegistry;
pub use sky::{DEFAULT_ROI_NAME, SkyDetection, detect_horizon_row, synthesize_default_sky_exclusion};
pub use types::{BgrColor, Point, RoiDefinition, RoiValidationError};
