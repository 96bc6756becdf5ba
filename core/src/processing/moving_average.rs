use crate::math::rolling::RollingHelper;
use crate::prelude::{PipelineConfig, StageResult};
use crate::tables::{FrameStatsRow, MovaRow};
use crate::telemetry::log::LogManager;

/// Builds the per-frame moving-average table from frame-annotated rows.
///
/// Statistics directly after a frame gap larger than the threshold are set
/// to missing before averaging, so the rolling window never bridges a real
/// temporal discontinuity. Frames with too few detections have their
/// statistics forced to missing rather than left to masquerade as
/// zero-velocity measurements.
pub struct GapAwareSmoother {
    window_size: usize,
    gap_threshold: i64,
    min_num_detections: usize,
    logger: LogManager,
}

impl GapAwareSmoother {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            window_size: config.moving_average_window,
            gap_threshold: config.gap_threshold,
            min_num_detections: config.min_num_detections,
            logger: LogManager::new(),
        }
    }

    pub fn smooth(&self, stats: &[FrameStatsRow]) -> StageResult<Vec<MovaRow>> {
        // one row per frame, first occurrence kept
        let mut frames = stats.to_vec();
        frames.sort_by_key(|s| s.frame);
        frames.dedup_by_key(|s| s.frame);

        let n = frames.len();
        let mut mean_vel: Vec<f64> = frames.iter().map(|s| s.mean_velocity_per_frame).collect();
        let mut median_vel: Vec<f64> =
            frames.iter().map(|s| s.median_velocity_per_frame).collect();
        let mut mean_grain: Vec<f64> =
            frames.iter().map(|s| s.mean_grainsize_per_frame).collect();
        let mut median_grain: Vec<f64> = frames
            .iter()
            .map(|s| s.median_grainsize_per_frame)
            .collect();
        let mut tracks: Vec<f64> = frames
            .iter()
            .map(|s| s.unique_tracks_per_frame as f64)
            .collect();

        let mut gap_breaks = 0usize;
        for i in 1..n {
            if frames[i].frame - frames[i - 1].frame > self.gap_threshold {
                gap_breaks += 1;
                mean_vel[i] = f64::NAN;
                median_vel[i] = f64::NAN;
                mean_grain[i] = f64::NAN;
                median_grain[i] = f64::NAN;
                tracks[i] = f64::NAN;
            }
        }

        let mean_vel_ma = RollingHelper::centered_mean(&mean_vel, self.window_size);
        let median_vel_ma = RollingHelper::centered_mean(&median_vel, self.window_size);
        let mean_grain_ma = RollingHelper::centered_mean(&mean_grain, self.window_size);
        let median_grain_ma = RollingHelper::centered_mean(&median_grain, self.window_size);
        let tracks_ma = RollingHelper::centered_mean(&tracks, self.window_size);

        let mut low_detection = 0usize;
        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            let mut row = MovaRow {
                frame: frames[i].frame,
                time: frames[i].time,
                mean_velocity_per_frame: mean_vel[i],
                median_velocity_per_frame: median_vel[i],
                mean_grainsize_per_frame: mean_grain[i],
                median_grainsize_per_frame: median_grain[i],
                unique_tracks_per_frame: tracks[i],
                mean_vel_ma: mean_vel_ma[i],
                median_vel_ma: median_vel_ma[i],
                mean_grain_ma: mean_grain_ma[i],
                median_grain_ma: median_grain_ma[i],
                tracks_ma: tracks_ma[i],
            };
            if frames[i].unique_tracks_per_frame <= self.min_num_detections {
                low_detection += 1;
                row.mean_velocity_per_frame = f64::NAN;
                row.median_velocity_per_frame = f64::NAN;
                row.mean_grainsize_per_frame = f64::NAN;
                row.median_grainsize_per_frame = f64::NAN;
                row.mean_vel_ma = f64::NAN;
                row.median_vel_ma = f64::NAN;
                row.mean_grain_ma = f64::NAN;
                row.median_grain_ma = f64::NAN;
            }
            out.push(row);
        }

        self.logger.record(&format!(
            "GapAwareSmoother {} frames, {} gap breaks, {} low-detection frames nulled",
            n, gap_breaks, low_detection
        ));

        Ok(out)
    }
}
