use serde::{Deserialize, Serialize};

/// One tracked detection: a single object observed in a single frame.
///
/// Positions are LiDAR-referenced bounding-box centers. A velocity or grain
/// size of exactly zero is physically invalid and handled by the sanitizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionRow {
    pub track: i64,
    pub frame: i64,
    #[serde(default = "nan")]
    pub time: f64,
    #[serde(rename = "bb_center_lidar_x")]
    pub x: f64,
    #[serde(rename = "bb_center_lidar_y")]
    pub y: f64,
    #[serde(rename = "bb_center_lidar_z")]
    pub z: f64,
    pub velocity: f64,
    pub grainsize: f64,
    pub bb_width: f64,
}

fn nan() -> f64 {
    f64::NAN
}

impl DetectionRow {
    pub fn axis(&self, axis: crate::prelude::Axis) -> f64 {
        match axis {
            crate::prelude::Axis::X => self.x,
            crate::prelude::Axis::Y => self.y,
            crate::prelude::Axis::Z => self.z,
        }
    }
}

/// Frame-to-time lookup entry, one per distinct frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameTime {
    #[serde(alias = "frame_img")]
    pub frame: i64,
    pub time: f64,
}

/// Sorts rows by (track, frame), the order every per-track stage requires.
pub fn sort_rows(rows: &mut [DetectionRow]) {
    rows.sort_by(|a, b| (a.track, a.frame).cmp(&(b.track, b.frame)));
}

/// Iterates over contiguous per-track slices of a (track, frame)-sorted table.
pub fn track_slices(rows: &[DetectionRow]) -> impl Iterator<Item = &[DetectionRow]> {
    rows.chunk_by(|a, b| a.track == b.track)
}

/// Number of distinct track ids in a row table (any order).
pub fn unique_track_count(rows: &[DetectionRow]) -> usize {
    let mut ids: Vec<i64> = rows.iter().map(|r| r.track).collect();
    ids.sort_unstable();
    ids.dedup();
    ids.len()
}

/// Number of distinct frames in a row table (any order).
pub fn unique_frame_count(rows: &[DetectionRow]) -> usize {
    let mut frames: Vec<i64> = rows.iter().map(|r| r.frame).collect();
    frames.sort_unstable();
    frames.dedup();
    frames.len()
}

/// Builds the frame-to-time lookup: one entry per frame with a valid time,
/// first occurrence kept, sorted by frame.
pub fn extract_frame_time_table(rows: &[DetectionRow]) -> Vec<FrameTime> {
    let mut entries: Vec<FrameTime> = rows
        .iter()
        .filter(|r| r.time.is_finite())
        .map(|r| FrameTime {
            frame: r.frame,
            time: r.time,
        })
        .collect();
    entries.sort_by_key(|e| e.frame);
    entries.dedup_by_key(|e| e.frame);
    entries
}

/// Keeps only rows inside the configured frame range (inclusive).
pub fn restrict_frame_range(rows: &[DetectionRow], start: i64, end: i64) -> Vec<DetectionRow> {
    rows.iter()
        .filter(|r| r.frame >= start && r.frame <= end)
        .cloned()
        .collect()
}
