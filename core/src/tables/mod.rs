pub mod row;
pub mod series;
pub mod summary;

pub use row::{extract_frame_time_table, sort_rows, track_slices, DetectionRow, FrameTime};
pub use series::{clock_to_seconds, TimeSeries};
pub use summary::{
    AlignedRow, FrameStatsRow, LowessRow, MovaRow, TrackMovement, TrackSummary,
};
