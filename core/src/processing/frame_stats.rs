use crate::math::stats::StatsHelper;
use crate::prelude::StageResult;
use crate::tables::{DetectionRow, FrameStatsRow};
use crate::telemetry::log::LogManager;

/// Annotates every cleaned row with its frame's aggregate statistics.
///
/// This is a join-back, not a frame-keyed table: downstream smoothing
/// deduplicates per frame itself, while other consumers need the full
/// annotated row set.
pub struct FrameAggregator {
    logger: LogManager,
}

impl FrameAggregator {
    pub fn new() -> Self {
        Self {
            logger: LogManager::new(),
        }
    }

    pub fn aggregate(&self, rows: &[DetectionRow]) -> StageResult<Vec<FrameStatsRow>> {
        let mut sorted = rows.to_vec();
        sorted.sort_by(|a, b| (a.frame, a.track).cmp(&(b.frame, b.track)));

        let mut out = Vec::with_capacity(sorted.len());
        for frame_rows in sorted.chunk_by(|a, b| a.frame == b.frame) {
            let velocities: Vec<f64> = frame_rows.iter().map(|r| r.velocity).collect();
            let grainsizes: Vec<f64> = frame_rows.iter().map(|r| r.grainsize).collect();
            let mut tracks: Vec<i64> = frame_rows.iter().map(|r| r.track).collect();
            tracks.sort_unstable();
            tracks.dedup();

            let mean_velocity = StatsHelper::mean(&velocities);
            let median_velocity = StatsHelper::median(&velocities);
            let mean_grainsize = StatsHelper::mean(&grainsizes);
            let median_grainsize = StatsHelper::median(&grainsizes);

            for row in frame_rows {
                out.push(FrameStatsRow {
                    frame: row.frame,
                    track: row.track,
                    time: row.time,
                    velocity: row.velocity,
                    grainsize: row.grainsize,
                    mean_velocity_per_frame: mean_velocity,
                    median_velocity_per_frame: median_velocity,
                    mean_grainsize_per_frame: mean_grainsize,
                    median_grainsize_per_frame: median_grainsize,
                    unique_tracks_per_frame: tracks.len(),
                });
            }
        }

        self.logger.record(&format!(
            "FrameAggregator annotated {} rows across {} frames",
            out.len(),
            sorted.chunk_by(|a, b| a.frame == b.frame).count()
        ));

        Ok(out)
    }
}

impl Default for FrameAggregator {
    fn default() -> Self {
        Self::new()
    }
}
