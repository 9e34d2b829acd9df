//! Common utilities module
//!
//! Error types, stage timings, and engine configuration shared by every
//! component of the ROI analysis pipeline.

pub mod config;
pub mod error;
pub mod timing;

pub use config::{EngineConfig, EngineConfigBuilder};
pub use error::{AnalysisError, Result, Stage};
pub use timing::{PipelineTimings, StepTiming, Timer};
