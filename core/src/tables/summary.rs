use serde::{Deserialize, Serialize};

/// Per-track scalar summary used as filter input and as LOWESS sample.
///
/// `center_frame` is the frame at the positional midpoint of the track's
/// frame-sorted rows, not the median of frame values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackSummary {
    pub track: i64,
    pub length: usize,
    pub mean_velocity: f64,
    pub median_velocity: f64,
    pub std_velocity: f64,
    pub mean_grainsize: f64,
    pub median_grainsize: f64,
    pub mean_bb_width: f64,
    pub center_frame: i64,
    pub duration: f64,
    pub path_length: f64,
}

/// Movement-classifier diagnostic: displacement along the configured axis
/// between the trimmed endpoints of one track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackMovement {
    pub track: i64,
    pub displacement: f64,
    pub magnitude: f64,
    pub moving: bool,
}

/// One cleaned row annotated with its frame's aggregate statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameStatsRow {
    pub frame: i64,
    pub track: i64,
    pub time: f64,
    pub velocity: f64,
    pub grainsize: f64,
    pub mean_velocity_per_frame: f64,
    pub median_velocity_per_frame: f64,
    pub mean_grainsize_per_frame: f64,
    pub median_grainsize_per_frame: f64,
    pub unique_tracks_per_frame: usize,
}

/// Per-frame statistics with centered moving averages, one row per frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovaRow {
    pub frame: i64,
    pub time: f64,
    pub mean_velocity_per_frame: f64,
    pub median_velocity_per_frame: f64,
    pub mean_grainsize_per_frame: f64,
    pub median_grainsize_per_frame: f64,
    pub unique_tracks_per_frame: f64,
    pub mean_vel_ma: f64,
    pub median_vel_ma: f64,
    pub mean_grain_ma: f64,
    pub median_grain_ma: f64,
    pub tracks_ma: f64,
}

/// One smoothed sample of the segmented LOWESS output.
///
/// The mean and median fits are outer-joined on frame, so either value may
/// be missing (NaN) where the corresponding fit produced no sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LowessRow {
    pub frame: i64,
    pub segment: usize,
    pub smoothed_mean: f64,
    pub smoothed_median: f64,
}

/// Tracking and reference velocities resampled onto a common time grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignedRow {
    pub time_sec: f64,
    pub tracking_velocity: f64,
    pub reference_velocity: f64,
}
