//! Track-cleaning and temporal-smoothing core for bedload monitoring data.
//!
//! The modules implement the filter pipeline that separates physically
//! plausible sediment tracks from sensor artifacts, plus the gap-aware
//! per-frame and segmented per-track smoothing built on top of it.

pub mod math;
pub mod prelude;
pub mod processing;
pub mod tables;
pub mod telemetry;

pub use prelude::{FilterStage, PipelineConfig, StageOutput};
