use std::collections::HashSet;

use crate::math::stats::StatsHelper;
use crate::prelude::{
    FilterStage, PipelineConfig, StageDiagnostics, StageOutput, StageResult,
};
use crate::tables::{row, DetectionRow, TrackSummary};
use crate::telemetry::log::LogManager;

/// Computes per-track scalar summaries from a row table.
pub struct TrackStatsAggregator;

impl TrackStatsAggregator {
    /// One summary per track id, in ascending track order.
    ///
    /// Velocity and grain-size statistics skip missing values; the sample
    /// std of a single-row track is 0, not NaN.
    pub fn summarize(rows: &[DetectionRow]) -> Vec<TrackSummary> {
        let mut sorted = rows.to_vec();
        row::sort_rows(&mut sorted);

        row::track_slices(&sorted)
            .map(|track| {
                let velocities: Vec<f64> = track.iter().map(|r| r.velocity).collect();
                let grainsizes: Vec<f64> = track.iter().map(|r| r.grainsize).collect();
                let widths: Vec<f64> = track.iter().map(|r| r.bb_width).collect();
                let path_length = track
                    .windows(2)
                    .map(|pair| {
                        let dx = pair[1].x - pair[0].x;
                        let dy = pair[1].y - pair[0].y;
                        let dz = pair[1].z - pair[0].z;
                        (dx * dx + dy * dy + dz * dz).sqrt()
                    })
                    .sum();

                TrackSummary {
                    track: track[0].track,
                    length: track.len(),
                    mean_velocity: StatsHelper::mean(&velocities),
                    median_velocity: StatsHelper::median(&velocities),
                    std_velocity: StatsHelper::sample_std(&velocities),
                    mean_grainsize: StatsHelper::mean(&grainsizes),
                    median_grainsize: StatsHelper::median(&grainsizes),
                    mean_bb_width: StatsHelper::mean(&widths),
                    // positional midpoint, not the median of frame values
                    center_frame: track[track.len() / 2].frame,
                    duration: track[track.len() - 1].time - track[0].time,
                    path_length,
                }
            })
            .collect()
    }
}

/// Length/velocity track filter: bounds on track length, a cap on the
/// per-track velocity std, and a floor on the median velocity.
pub struct TrackFilter {
    min_track_length: usize,
    max_track_length: usize,
    max_std_track_vel: f64,
    min_median_track_vel: f64,
    logger: LogManager,
}

impl TrackFilter {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            min_track_length: config.min_track_length,
            max_track_length: config.max_track_length,
            max_std_track_vel: config.max_std_track_vel,
            min_median_track_vel: config.min_median_track_vel,
            logger: LogManager::new(),
        }
    }
}

impl FilterStage for TrackFilter {
    fn name(&self) -> &'static str {
        "track_filter"
    }

    fn apply(&self, rows: &[DetectionRow]) -> StageResult<StageOutput> {
        let summaries = TrackStatsAggregator::summarize(rows);

        // The three rules are evaluated in order; each removal count is
        // taken against the tracks still passing the earlier rules.
        let (by_length, removed_length): (Vec<&TrackSummary>, usize) = {
            let passing: Vec<&TrackSummary> = summaries
                .iter()
                .filter(|s| s.length >= self.min_track_length && s.length <= self.max_track_length)
                .collect();
            let removed = summaries.len() - passing.len();
            (passing, removed)
        };
        let (by_std, removed_std) = {
            let passing: Vec<&TrackSummary> = by_length
                .iter()
                .copied()
                .filter(|s| s.std_velocity <= self.max_std_track_vel)
                .collect();
            let removed = by_length.len() - passing.len();
            (passing, removed)
        };
        let (passing, removed_median) = {
            let passing: Vec<&TrackSummary> = by_std
                .iter()
                .copied()
                .filter(|s| s.median_velocity >= self.min_median_track_vel)
                .collect();
            let removed = by_std.len() - passing.len();
            (passing, removed)
        };

        let keep: HashSet<i64> = passing.iter().map(|s| s.track).collect();
        let mut kept: Vec<DetectionRow> = rows
            .iter()
            .filter(|r| keep.contains(&r.track))
            .cloned()
            .collect();
        row::sort_rows(&mut kept);

        self.logger.record(&format!(
            "TrackFilter removed {} by length, {} by std, {} by median ({} of {} tracks kept)",
            removed_length,
            removed_std,
            removed_median,
            keep.len(),
            summaries.len()
        ));

        let diagnostics = StageDiagnostics {
            tracks_removed: Some(summaries.len() - keep.len()),
            removed_by_rule: vec![
                ("length", removed_length),
                ("velocity_std", removed_std),
                ("median_velocity", removed_median),
            ],
            ..Default::default()
        };

        Ok(StageOutput {
            rows: kept,
            diagnostics,
        })
    }
}
