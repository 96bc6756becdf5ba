use crate::prelude::{
    DistanceMode, FilterStage, PipelineConfig, StageDiagnostics, StageOutput, StageResult,
};
use crate::tables::{row, DetectionRow};
use crate::telemetry::log::LogManager;

/// Removes tracks whose consecutive-frame displacement ever exceeds the
/// jump threshold, a signature of sensor mis-association.
///
/// The rejected tracks are kept in the stage diagnostics for inspection.
pub struct JumpFilter {
    jump_threshold: f64,
    distance: DistanceMode,
    logger: LogManager,
}

impl JumpFilter {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            jump_threshold: config.jump_threshold,
            distance: config.jump_distance,
            logger: LogManager::new(),
        }
    }

    fn step_distance(&self, a: &DetectionRow, b: &DetectionRow) -> f64 {
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        match self.distance {
            DistanceMode::Planar => (dx * dx + dy * dy).sqrt(),
            DistanceMode::Spatial => {
                let dz = b.z - a.z;
                (dx * dx + dy * dy + dz * dz).sqrt()
            }
        }
    }

    /// Maximum consecutive displacement of one frame-sorted track.
    /// Single-row tracks have no jump and report 0.
    fn max_jump(&self, track: &[DetectionRow]) -> f64 {
        track
            .windows(2)
            .map(|pair| self.step_distance(&pair[0], &pair[1]))
            .fold(0.0, f64::max)
    }
}

impl FilterStage for JumpFilter {
    fn name(&self) -> &'static str {
        "jump_filter"
    }

    fn apply(&self, rows: &[DetectionRow]) -> StageResult<StageOutput> {
        let mut sorted = rows.to_vec();
        row::sort_rows(&mut sorted);

        let mut good = Vec::with_capacity(sorted.len());
        let mut bad = Vec::new();
        let mut good_tracks = 0usize;
        let mut bad_tracks = 0usize;

        for track in row::track_slices(&sorted) {
            if self.max_jump(track) > self.jump_threshold {
                bad_tracks += 1;
                bad.extend_from_slice(track);
            } else {
                good_tracks += 1;
                good.extend_from_slice(track);
            }
        }

        self.logger.record(&format!(
            "JumpFilter threshold {}: {} good tracks, {} bad tracks",
            self.jump_threshold, good_tracks, bad_tracks
        ));

        let diagnostics = StageDiagnostics {
            tracks_removed: Some(bad_tracks),
            removed_by_rule: vec![("jump", bad_tracks)],
            bad_rows: Some(bad),
            ..Default::default()
        };

        Ok(StageOutput {
            rows: good,
            diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk(id: i64, ys: &[f64]) -> Vec<DetectionRow> {
        ys.iter()
            .enumerate()
            .map(|(i, &y)| DetectionRow {
                track: id,
                frame: i as i64,
                time: i as f64 * 0.1,
                x: 0.0,
                y,
                z: 0.0,
                velocity: 1.0,
                grainsize: 0.1,
                bb_width: 0.2,
            })
            .collect()
    }

    fn filter(threshold: f64) -> JumpFilter {
        JumpFilter::new(&PipelineConfig {
            jump_threshold: threshold,
            ..Default::default()
        })
    }

    #[test]
    fn partition_is_exhaustive_and_disjoint() {
        let mut rows = walk(1, &[0.0, 0.1, 0.2]);
        rows.extend(walk(2, &[0.0, 5.0]));
        let output = filter(1.0).apply(&rows).unwrap();
        let bad = output.diagnostics.bad_rows.unwrap();

        assert_eq!(output.rows.len() + bad.len(), rows.len());
        assert!(output.rows.iter().all(|r| r.track == 1));
        assert!(bad.iter().all(|r| r.track == 2));
    }

    #[test]
    fn single_row_tracks_are_always_good() {
        let rows = walk(7, &[3.0]);
        let output = filter(0.0).apply(&rows).unwrap();
        assert_eq!(output.rows.len(), 1);
    }

    #[test]
    fn threshold_is_strict() {
        let rows = walk(1, &[0.0, 1.0]);
        // jump exactly at the threshold stays good
        assert_eq!(filter(1.0).apply(&rows).unwrap().rows.len(), 2);
        assert_eq!(filter(0.99).apply(&rows).unwrap().rows.len(), 0);
    }

    #[test]
    fn raising_threshold_only_recovers_tracks() {
        let mut rows = walk(1, &[0.0, 0.5]);
        rows.extend(walk(2, &[0.0, 1.5]));
        rows.extend(walk(3, &[0.0, 3.0]));
        let loose: Vec<i64> = filter(2.0)
            .apply(&rows)
            .unwrap()
            .rows
            .iter()
            .map(|r| r.track)
            .collect();
        let strict: Vec<i64> = filter(1.0)
            .apply(&rows)
            .unwrap()
            .rows
            .iter()
            .map(|r| r.track)
            .collect();
        assert!(strict.iter().all(|t| loose.contains(t)));
        assert!(loose.len() >= strict.len());
    }

    #[test]
    fn spatial_mode_includes_z_axis() {
        let mut rows = walk(1, &[0.0, 0.0]);
        rows[1].z = 2.0;
        let planar = filter(1.0);
        assert_eq!(planar.apply(&rows).unwrap().rows.len(), 2);

        let spatial = JumpFilter::new(&PipelineConfig {
            jump_threshold: 1.0,
            jump_distance: DistanceMode::Spatial,
            ..Default::default()
        });
        assert_eq!(spatial.apply(&rows).unwrap().rows.len(), 0);
    }
}
