use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::tables::{DetectionRow, TrackMovement};

/// Distance used by the jump filter: planar (x/y) or full spatial (x/y/z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMode {
    Planar,
    Spatial,
}

/// How rows with a velocity of exactly zero are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZeroVelocityPolicy {
    /// Remove the rows entirely.
    Drop,
    /// Keep the rows and mark the velocity as missing (NaN), preserving
    /// track continuity for the gap-aware smoothers.
    Nullify,
}

/// Directional requirement for the movement classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Any,
    Positive,
    Negative,
}

/// Position component the movement classifier measures displacement along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Statistic selector used by plotting-facing consumers of the smoothed tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Statistic {
    Mean,
    Median,
}

impl FromStr for Statistic {
    type Err = StageError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "mean" => Ok(Statistic::Mean),
            "median" => Ok(Statistic::Median),
            other => Err(StageError::InvalidConfig(format!(
                "unknown statistic type '{}', expected 'mean' or 'median'",
                other
            ))),
        }
    }
}

/// Shared configuration for the whole processing pipeline.
///
/// Passed by reference into each stage; never a process-wide singleton, so
/// multiple events can be processed with different parameters in one process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub min_track_length: usize,
    pub max_track_length: usize,
    pub max_std_track_vel: f64,
    pub min_median_track_vel: f64,
    pub jump_threshold: f64,
    pub jump_distance: DistanceMode,
    pub movement_axis: Axis,
    pub axis_min_length: f64,
    pub require_direction: Direction,
    pub zero_velocity: ZeroVelocityPolicy,
    pub velocity_upperlimit: f64,
    pub grainsize_upperlimit: f64,
    pub moving_average_window: usize,
    pub gap_threshold: i64,
    pub min_num_detections: usize,
    pub lowess_iterations: usize,
    pub lowess_frame_window: usize,
    pub lowess_gap_threshold: i64,
    pub lowess_segment_length: usize,
    pub statistic: Statistic,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_track_length: 5,
            max_track_length: 300,
            max_std_track_vel: 1.5,
            min_median_track_vel: 0.1,
            jump_threshold: 1.0,
            jump_distance: DistanceMode::Planar,
            movement_axis: Axis::Y,
            axis_min_length: 0.4,
            require_direction: Direction::Any,
            zero_velocity: ZeroVelocityPolicy::Nullify,
            velocity_upperlimit: 10.0,
            grainsize_upperlimit: 2.0,
            moving_average_window: 9,
            gap_threshold: 400,
            min_num_detections: 2,
            lowess_iterations: 1,
            lowess_frame_window: 20,
            lowess_gap_threshold: 150,
            lowess_segment_length: 20,
            statistic: Statistic::Mean,
        }
    }
}

/// Output produced by each filter stage: the surviving rows plus whatever
/// diagnostics the stage collects along the way.
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub rows: Vec<DetectionRow>,
    pub diagnostics: StageDiagnostics,
}

/// Diagnostics used for chaining stages and for the end-of-run summary.
#[derive(Debug, Clone, Default)]
pub struct StageDiagnostics {
    pub tracks_removed: Option<usize>,
    /// Incremental removal counts per rule, in evaluation order.
    pub removed_by_rule: Vec<(&'static str, usize)>,
    /// Rows of tracks rejected by the stage, kept for inspection.
    pub bad_rows: Option<Vec<DetectionRow>>,
    /// Per-track movement magnitudes from the movement classifier.
    pub track_movement: Option<Vec<TrackMovement>>,
    pub notes: Vec<String>,
}

/// Common error type for stage execution.
#[derive(thiserror::Error, Debug)]
pub enum StageError {
    #[error("missing required columns: {0}")]
    Schema(String),
    #[error("no overlapping range: [{left_start}, {left_end}] vs [{right_start}, {right_end}]")]
    NoOverlap {
        left_start: f64,
        left_end: f64,
        right_start: f64,
        right_end: f64,
    },
    #[error("empty input: {0}")]
    EmptyInput(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("internal failure: {0}")]
    Internal(String),
}

pub type StageResult<T> = Result<T, StageError>;

/// Trait shared by the row-filtering stages of the cleaning pipeline.
///
/// Stages never mutate their input; each application produces a new,
/// typically smaller, row table.
pub trait FilterStage {
    fn name(&self) -> &'static str;
    fn apply(&self, rows: &[DetectionRow]) -> StageResult<StageOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statistic_parses_known_selectors() {
        assert_eq!("mean".parse::<Statistic>().unwrap(), Statistic::Mean);
        assert_eq!("Median".parse::<Statistic>().unwrap(), Statistic::Median);
    }

    #[test]
    fn statistic_rejects_unknown_selector() {
        let err = "mode".parse::<Statistic>().unwrap_err();
        assert!(err.to_string().contains("mode"));
    }
}
