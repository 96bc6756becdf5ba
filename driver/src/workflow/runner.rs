use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use trackcore::prelude::FilterStage;
use trackcore::processing::{
    FrameAggregator, GapAwareSmoother, JumpFilter, MovementFilter, PivAligner, RowSanitizer,
    TrackFilter, TrackSmoother, UpperLimitFilter,
};
use trackcore::tables::{
    row, AlignedRow, DetectionRow, FrameTime, LowessRow, MovaRow, TimeSeries, TrackMovement,
    TrackSummary,
};
use trackcore::telemetry::StageTally;

/// Everything one cleaning-and-smoothing run produces.
pub struct WorkflowResult {
    pub clean_rows: Vec<DetectionRow>,
    pub bad_rows: Vec<DetectionRow>,
    pub frame_time: Vec<FrameTime>,
    pub track_movement: Vec<TrackMovement>,
    pub mova: Vec<MovaRow>,
    pub velocity_summaries: Vec<TrackSummary>,
    pub velocity_lowess: Vec<LowessRow>,
    pub aligned: Option<Vec<AlignedRow>>,
    pub summary: String,
}

/// Grain-size outputs, produced by a separate pass over the cleaned rows.
pub struct GrainsizeResult {
    pub summaries: Vec<TrackSummary>,
    pub lowess: Vec<LowessRow>,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    /// Runs the filter pipeline and both per-frame and per-track velocity
    /// views; optionally aligns against an external reference series.
    pub fn execute(
        &self,
        rows: &[DetectionRow],
        reference: Option<&TimeSeries>,
    ) -> anyhow::Result<WorkflowResult> {
        let pipeline = self.config.to_pipeline_config();
        let tally = StageTally::new();

        let raw = match (self.config.start_frame, self.config.end_frame) {
            (Some(start), Some(end)) => row::restrict_frame_range(rows, start, end),
            _ => rows.to_vec(),
        };
        let frame_time = row::extract_frame_time_table(&raw);
        tally.record(
            "raw",
            row::unique_track_count(&raw),
            row::unique_track_count(&raw),
            raw.len(),
            raw.len(),
        );

        let track_filter = TrackFilter::new(&pipeline);
        let filtered = track_filter
            .apply(&raw)
            .context("applying length/velocity track filter")?;
        tally.record(
            track_filter.name(),
            row::unique_track_count(&raw),
            row::unique_track_count(&filtered.rows),
            raw.len(),
            filtered.rows.len(),
        );

        let jump_filter = JumpFilter::new(&pipeline);
        let jumped = jump_filter
            .apply(&filtered.rows)
            .context("applying jump filter")?;
        tally.record(
            jump_filter.name(),
            row::unique_track_count(&filtered.rows),
            row::unique_track_count(&jumped.rows),
            filtered.rows.len(),
            jumped.rows.len(),
        );
        let bad_rows = jumped.diagnostics.bad_rows.clone().unwrap_or_default();

        let movement_filter = MovementFilter::new(&pipeline);
        let moved = movement_filter
            .apply(&jumped.rows)
            .context("applying movement filter")?;
        tally.record(
            movement_filter.name(),
            row::unique_track_count(&jumped.rows),
            row::unique_track_count(&moved.rows),
            jumped.rows.len(),
            moved.rows.len(),
        );
        let track_movement = moved.diagnostics.track_movement.clone().unwrap_or_default();

        let sanitizer = RowSanitizer::new(&pipeline);
        let clean = sanitizer
            .apply(&moved.rows)
            .context("sanitizing zero velocities")?;
        tally.record(
            sanitizer.name(),
            row::unique_track_count(&moved.rows),
            row::unique_track_count(&clean.rows),
            moved.rows.len(),
            clean.rows.len(),
        );

        let stats = FrameAggregator::new()
            .aggregate(&clean.rows)
            .context("computing per-frame statistics")?;
        let mova = GapAwareSmoother::new(&pipeline)
            .smooth(&stats)
            .context("computing gap-aware moving averages")?;

        let (velocity_summaries, velocity_lowess) = TrackSmoother::new(&pipeline)
            .smooth_velocity(&clean.rows)
            .context("smoothing per-track velocities")?;

        let aligned = match reference {
            Some(reference) => {
                let aligner = PivAligner::new(&pipeline);
                let tracking = aligner
                    .tracking_series(&mova)
                    .context("extracting tracking velocity series")?;
                Some(
                    aligner
                        .align(&tracking, reference)
                        .context("aligning tracking and reference velocities")?,
                )
            }
            None => None,
        };

        Ok(WorkflowResult {
            clean_rows: clean.rows,
            bad_rows,
            frame_time,
            track_movement,
            mova,
            velocity_summaries,
            velocity_lowess,
            aligned,
            summary: tally.render(),
        })
    }

    /// Grain-size pass over already-cleaned rows. Fails loudly when the
    /// upper-limit filter leaves nothing to summarize.
    pub fn execute_grainsize(&self, clean_rows: &[DetectionRow]) -> anyhow::Result<GrainsizeResult> {
        let pipeline = self.config.to_pipeline_config();
        let limited = UpperLimitFilter::new(&pipeline)
            .apply(clean_rows)
            .context("applying upper-limit row filter")?;
        let (summaries, lowess) = TrackSmoother::new(&pipeline)
            .smooth_grainsize(&limited.rows)
            .context("smoothing per-track grain sizes")?;
        Ok(GrainsizeResult { summaries, lowess })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(track: i64, frame: i64, y: f64, velocity: f64) -> DetectionRow {
        DetectionRow {
            track,
            frame,
            time: frame as f64 * 0.1,
            x: 0.0,
            y,
            z: 0.0,
            velocity,
            grainsize: 0.2,
            bb_width: 0.3,
        }
    }

    /// Length-n track moving monotonically along y by `total_dy`.
    fn moving_track(id: i64, n: usize, total_dy: f64) -> Vec<DetectionRow> {
        (0..n)
            .map(|i| {
                row(
                    id,
                    i as i64,
                    total_dy * i as f64 / (n - 1) as f64,
                    1.0,
                )
            })
            .collect()
    }

    fn config() -> WorkflowConfig {
        WorkflowConfig {
            min_track_length: 5,
            jump_threshold: 1.0,
            axis_min_length: 0.4,
            ..Default::default()
        }
    }

    #[test]
    fn three_track_example_keeps_only_the_plausible_track() {
        let mut rows = Vec::new();
        // track A: too short, removed by the length filter
        rows.extend(moving_track(1, 3, 1.0));
        // track B: one 2.5 m jump, removed by the jump filter
        let mut track_b = moving_track(2, 10, 1.0);
        for r in track_b.iter_mut().skip(5) {
            r.y += 2.5;
        }
        rows.extend(track_b);
        // track C: monotonic 1.0 m displacement, retained
        rows.extend(moving_track(3, 10, 1.0));

        let result = Runner::new(config()).execute(&rows, None).unwrap();

        assert!(result.clean_rows.iter().all(|r| r.track == 3));
        assert_eq!(result.clean_rows.len(), 10);
        assert!(result.bad_rows.iter().all(|r| r.track == 2));
        assert_eq!(result.bad_rows.len(), 10);
        assert!(result.summary.contains("track_filter"));
    }

    #[test]
    fn clean_input_round_trips_unchanged() {
        let mut rows = Vec::new();
        rows.extend(moving_track(1, 10, 1.0));
        rows.extend(moving_track(2, 12, -1.5));

        let result = Runner::new(config()).execute(&rows, None).unwrap();

        assert_eq!(result.clean_rows.len(), rows.len());
        let mut expected = rows.clone();
        row::sort_rows(&mut expected);
        for (got, want) in result.clean_rows.iter().zip(&expected) {
            assert_eq!(got.track, want.track);
            assert_eq!(got.frame, want.frame);
            assert_eq!(got.velocity, want.velocity);
        }
    }

    #[test]
    fn frame_range_restriction_applies_before_filtering() {
        let rows = moving_track(1, 10, 1.0);
        let runner = Runner::new(WorkflowConfig {
            start_frame: Some(0),
            end_frame: Some(3),
            ..config()
        });
        // only 4 rows survive the range cut, below min_track_length
        let result = runner.execute(&rows, None).unwrap();
        assert!(result.clean_rows.is_empty());
    }

    #[test]
    fn grainsize_pass_fails_on_fully_filtered_input() {
        let mut rows = moving_track(1, 10, 1.0);
        for r in rows.iter_mut() {
            r.grainsize = 0.0;
        }
        let runner = Runner::new(config());
        assert!(runner.execute_grainsize(&rows).is_err());
    }

    #[test]
    fn grainsize_pass_produces_summaries() {
        let mut rows = Vec::new();
        for i in 0..6 {
            let mut track = moving_track(10 + i, 10, 1.0);
            for r in track.iter_mut() {
                r.frame += i * 20;
            }
            rows.extend(track);
        }
        let runner = Runner::new(WorkflowConfig {
            lowess_segment_length: 3,
            ..config()
        });
        let result = runner.execute_grainsize(&rows).unwrap();
        assert_eq!(result.summaries.len(), 6);
        assert!(!result.lowess.is_empty());
    }
}
