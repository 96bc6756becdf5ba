use crate::prelude::{
    Axis, Direction, FilterStage, PipelineConfig, StageDiagnostics, StageOutput, StageResult,
};
use crate::tables::{row, DetectionRow, TrackMovement};
use crate::telemetry::log::LogManager;

/// Classifies tracks as genuinely moving along the configured axis.
///
/// Endpoints are trimmed depending on track length so spurious positions at
/// the trajectory edges cannot fake or mask a displacement.
pub struct MovementFilter {
    axis: Axis,
    min_length: f64,
    direction: Direction,
    logger: LogManager,
}

impl MovementFilter {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            axis: config.movement_axis,
            min_length: config.axis_min_length,
            direction: config.require_direction,
            logger: LogManager::new(),
        }
    }

    /// Trimmed (start, end) indices for a track of `n` rows; None when the
    /// track is too short to trim meaningfully.
    fn trimmed_endpoints(n: usize) -> Option<(usize, usize)> {
        match n {
            0..=4 => None,
            5..=24 => Some((2, n - 2)),
            25..=49 => Some((4, n - 4)),
            50..=149 => Some((6, n - 6)),
            _ => Some((8, n - 10)),
        }
    }

    fn is_moving(&self, displacement: f64) -> bool {
        match self.direction {
            Direction::Any => displacement.abs() > self.min_length,
            Direction::Positive => displacement > self.min_length,
            Direction::Negative => displacement < -self.min_length,
        }
    }
}

impl FilterStage for MovementFilter {
    fn name(&self) -> &'static str {
        "movement_filter"
    }

    fn apply(&self, rows: &[DetectionRow]) -> StageResult<StageOutput> {
        let mut sorted = rows.to_vec();
        row::sort_rows(&mut sorted);

        let mut kept = Vec::with_capacity(sorted.len());
        let mut movement = Vec::new();
        let mut removed = 0usize;

        for track in row::track_slices(&sorted) {
            let record = match Self::trimmed_endpoints(track.len()) {
                Some((start, end)) => {
                    let displacement =
                        track[end].axis(self.axis) - track[start].axis(self.axis);
                    TrackMovement {
                        track: track[0].track,
                        displacement,
                        magnitude: displacement.abs(),
                        moving: self.is_moving(displacement),
                    }
                }
                None => TrackMovement {
                    track: track[0].track,
                    displacement: f64::NAN,
                    magnitude: f64::NAN,
                    moving: false,
                },
            };

            if record.moving {
                kept.extend_from_slice(track);
            } else {
                removed += 1;
            }
            movement.push(record);
        }

        self.logger.record(&format!(
            "MovementFilter axis {:?} threshold {}: removed {} of {} tracks",
            self.axis,
            self.min_length,
            removed,
            movement.len()
        ));

        let diagnostics = StageDiagnostics {
            tracks_removed: Some(removed),
            removed_by_rule: vec![("movement", removed)],
            track_movement: Some(movement),
            ..Default::default()
        };

        Ok(StageOutput {
            rows: kept,
            diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sloped_track(id: i64, n: usize, total_dy: f64) -> Vec<DetectionRow> {
        (0..n)
            .map(|i| DetectionRow {
                track: id,
                frame: i as i64,
                time: i as f64 * 0.1,
                x: 0.0,
                y: total_dy * i as f64 / (n - 1) as f64,
                z: 0.0,
                velocity: 1.0,
                grainsize: 0.1,
                bb_width: 0.2,
            })
            .collect()
    }

    fn filter(min_length: f64, direction: Direction) -> MovementFilter {
        MovementFilter::new(&PipelineConfig {
            axis_min_length: min_length,
            require_direction: direction,
            ..Default::default()
        })
    }

    #[test]
    fn trim_table_matches_length_classes() {
        assert_eq!(MovementFilter::trimmed_endpoints(4), None);
        assert_eq!(MovementFilter::trimmed_endpoints(5), Some((2, 3)));
        assert_eq!(MovementFilter::trimmed_endpoints(24), Some((2, 22)));
        assert_eq!(MovementFilter::trimmed_endpoints(25), Some((4, 21)));
        assert_eq!(MovementFilter::trimmed_endpoints(50), Some((6, 44)));
        assert_eq!(MovementFilter::trimmed_endpoints(150), Some((8, 140)));
    }

    #[test]
    fn boundary_displacement_classifies_either_side() {
        let threshold = 0.4;
        let eps = 1e-3;
        // length 24 trims to indices 2 and 22: 20 of 23 steps remain
        let span = |d: f64| d * 23.0 / 20.0;

        let moving = sloped_track(1, 24, span(threshold + eps));
        let output = filter(threshold, Direction::Any).apply(&moving).unwrap();
        assert_eq!(output.rows.len(), 24);

        let still = sloped_track(1, 24, span(threshold - eps));
        let output = filter(threshold, Direction::Any).apply(&still).unwrap();
        assert!(output.rows.is_empty());
    }

    #[test]
    fn short_tracks_are_skipped_and_flagged() {
        let rows = sloped_track(1, 4, 10.0);
        let output = filter(0.1, Direction::Any).apply(&rows).unwrap();
        assert!(output.rows.is_empty());
        let movement = output.diagnostics.track_movement.unwrap();
        assert!(movement[0].magnitude.is_nan());
        assert!(!movement[0].moving);
    }

    #[test]
    fn negative_direction_rejects_positive_movers() {
        let down = sloped_track(1, 10, -2.0);
        let up = sloped_track(2, 10, 2.0);
        let mut rows = down.clone();
        rows.extend(up);
        let output = filter(0.4, Direction::Negative).apply(&rows).unwrap();
        assert!(output.rows.iter().all(|r| r.track == 1));
    }
}
