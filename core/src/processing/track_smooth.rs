use std::collections::BTreeMap;

use crate::math::lowess::LowessEngine;
use crate::prelude::{PipelineConfig, StageError, StageResult};
use crate::processing::track_filter::TrackStatsAggregator;
use crate::tables::{DetectionRow, LowessRow, TrackSummary};
use crate::telemetry::log::LogManager;

/// Segmented LOWESS over per-track representative values.
///
/// Tracks are reduced to one sample at their center frame, segmented
/// wherever consecutive center frames are further apart than the gap
/// threshold, and smoothed independently per segment so the local
/// regression is never pulled across intervals with no tracks. Segments
/// with fewer tracks than the minimum length are too sparse for a stable
/// fit and emit nothing.
pub struct TrackSmoother {
    frame_window: usize,
    iterations: usize,
    gap_threshold: i64,
    segment_length: usize,
    logger: LogManager,
}

impl TrackSmoother {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            frame_window: config.lowess_frame_window,
            iterations: config.lowess_iterations,
            gap_threshold: config.lowess_gap_threshold,
            segment_length: config.lowess_segment_length,
            logger: LogManager::new(),
        }
    }

    /// Per-track velocity summaries and their segmented LOWESS table.
    /// An empty input legitimately yields empty tables.
    pub fn smooth_velocity(
        &self,
        rows: &[DetectionRow],
    ) -> StageResult<(Vec<TrackSummary>, Vec<LowessRow>)> {
        let summaries = self.ordered_summaries(rows);
        let smoothed = self.smooth_stat(
            &summaries,
            |s| s.mean_velocity,
            |s| s.median_velocity,
            "velocity",
        )?;
        Ok((summaries, smoothed))
    }

    /// Grain-size variant. Zero input rows is an error here: a grain-size
    /// distribution over nothing would silently fabricate results.
    pub fn smooth_grainsize(
        &self,
        rows: &[DetectionRow],
    ) -> StageResult<(Vec<TrackSummary>, Vec<LowessRow>)> {
        if rows.is_empty() {
            return Err(StageError::EmptyInput(
                "grain-size smoothing received no rows".into(),
            ));
        }
        let summaries = self.ordered_summaries(rows);
        let smoothed = self.smooth_stat(
            &summaries,
            |s| s.mean_grainsize,
            |s| s.median_grainsize,
            "grainsize",
        )?;
        Ok((summaries, smoothed))
    }

    fn ordered_summaries(&self, rows: &[DetectionRow]) -> Vec<TrackSummary> {
        let mut summaries = TrackStatsAggregator::summarize(rows);
        summaries.sort_by_key(|s| s.center_frame);
        summaries
    }

    /// Segment ids: cumulative count of center-frame gaps above the threshold.
    fn segment_ids(&self, summaries: &[TrackSummary]) -> Vec<usize> {
        let mut ids = Vec::with_capacity(summaries.len());
        let mut segment = 0usize;
        for i in 0..summaries.len() {
            if i > 0
                && summaries[i].center_frame - summaries[i - 1].center_frame > self.gap_threshold
            {
                segment += 1;
            }
            ids.push(segment);
        }
        ids
    }

    fn smooth_stat(
        &self,
        summaries: &[TrackSummary],
        mean_stat: fn(&TrackSummary) -> f64,
        median_stat: fn(&TrackSummary) -> f64,
        label: &str,
    ) -> StageResult<Vec<LowessRow>> {
        let ids = self.segment_ids(summaries);
        let mut out = Vec::new();
        let mut skipped = 0usize;

        let mut start = 0usize;
        while start < summaries.len() {
            let segment = ids[start];
            let mut end = start;
            while end < summaries.len() && ids[end] == segment {
                end += 1;
            }
            let window = &summaries[start..end];
            start = end;

            if window.len() < self.segment_length {
                skipped += 1;
                continue;
            }

            let mut distinct_frames: Vec<i64> = window.iter().map(|s| s.center_frame).collect();
            distinct_frames.dedup();
            let frac = (self.frame_window as f64 / distinct_frames.len() as f64).min(1.0);

            let mean_fit = self.fit_series(window, mean_stat, frac)?;
            let median_fit = self.fit_series(window, median_stat, frac)?;

            // outer join of the two fits on frame
            let mut joined: BTreeMap<i64, (f64, f64)> = BTreeMap::new();
            for (frame, value) in mean_fit {
                joined.entry(frame).or_insert((f64::NAN, f64::NAN)).0 = value;
            }
            for (frame, value) in median_fit {
                joined.entry(frame).or_insert((f64::NAN, f64::NAN)).1 = value;
            }
            for (frame, (smoothed_mean, smoothed_median)) in joined {
                out.push(LowessRow {
                    frame,
                    segment,
                    smoothed_mean,
                    smoothed_median,
                });
            }
        }

        out.sort_by_key(|r| r.frame);
        self.logger.record(&format!(
            "TrackSmoother {}: {} smoothed samples, {} short segments skipped",
            label,
            out.len(),
            skipped
        ));
        Ok(out)
    }

    /// Fits one statistic over a segment: finite samples only, one sample
    /// per unique center frame (first kept), fixed shared fraction.
    fn fit_series(
        &self,
        window: &[TrackSummary],
        stat: fn(&TrackSummary) -> f64,
        frac: f64,
    ) -> StageResult<Vec<(i64, f64)>> {
        let mut frames: Vec<i64> = Vec::with_capacity(window.len());
        let mut values: Vec<f64> = Vec::with_capacity(window.len());
        for summary in window {
            let value = stat(summary);
            if !value.is_finite() {
                continue;
            }
            if frames.last() == Some(&summary.center_frame) {
                continue;
            }
            frames.push(summary.center_frame);
            values.push(value);
        }
        if frames.is_empty() {
            return Ok(Vec::new());
        }

        let xs: Vec<f64> = frames.iter().map(|&f| f as f64).collect();
        let engine = LowessEngine::new(frac, self.iterations)?;
        let fitted = engine.fit(&xs, &values)?;
        Ok(frames.into_iter().zip(fitted).collect())
    }
}
