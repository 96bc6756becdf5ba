use crate::prelude::{
    FilterStage, PipelineConfig, StageDiagnostics, StageOutput, StageResult, ZeroVelocityPolicy,
};
use crate::tables::DetectionRow;
use crate::telemetry::log::LogManager;

/// Terminal cleaning step for physically invalid velocity readings.
///
/// Zero velocity either drops the row or nullifies the value; nullifying
/// preserves row and track continuity, which the gap-aware smoothers rely on.
pub struct RowSanitizer {
    policy: ZeroVelocityPolicy,
    logger: LogManager,
}

impl RowSanitizer {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            policy: config.zero_velocity,
            logger: LogManager::new(),
        }
    }
}

impl FilterStage for RowSanitizer {
    fn name(&self) -> &'static str {
        "row_sanitizer"
    }

    fn apply(&self, rows: &[DetectionRow]) -> StageResult<StageOutput> {
        let affected = rows.iter().filter(|r| r.velocity == 0.0).count();

        let rows = match self.policy {
            ZeroVelocityPolicy::Drop => rows
                .iter()
                .filter(|r| r.velocity != 0.0)
                .cloned()
                .collect(),
            ZeroVelocityPolicy::Nullify => rows
                .iter()
                .map(|r| {
                    let mut row = r.clone();
                    if row.velocity == 0.0 {
                        row.velocity = f64::NAN;
                    }
                    row
                })
                .collect(),
        };

        self.logger.record(&format!(
            "RowSanitizer {:?}: {} zero-velocity rows affected",
            self.policy, affected
        ));

        let diagnostics = StageDiagnostics {
            removed_by_rule: vec![("zero_velocity", affected)],
            ..Default::default()
        };

        Ok(StageOutput { rows, diagnostics })
    }
}

/// Drops rows with a zero grain size, a missing velocity or grain size, or
/// values above the configured physical maxima.
pub struct UpperLimitFilter {
    velocity_upperlimit: f64,
    grainsize_upperlimit: f64,
    logger: LogManager,
}

impl UpperLimitFilter {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            velocity_upperlimit: config.velocity_upperlimit,
            grainsize_upperlimit: config.grainsize_upperlimit,
            logger: LogManager::new(),
        }
    }

    fn keeps(&self, row: &DetectionRow) -> bool {
        row.velocity.is_finite()
            && row.grainsize.is_finite()
            && row.grainsize != 0.0
            && row.velocity <= self.velocity_upperlimit
            && row.grainsize <= self.grainsize_upperlimit
    }
}

impl FilterStage for UpperLimitFilter {
    fn name(&self) -> &'static str {
        "upper_limit_filter"
    }

    fn apply(&self, rows: &[DetectionRow]) -> StageResult<StageOutput> {
        let kept: Vec<DetectionRow> = rows.iter().filter(|r| self.keeps(r)).cloned().collect();
        let removed = rows.len() - kept.len();

        self.logger
            .record(&format!("UpperLimitFilter removed {} rows", removed));

        let diagnostics = StageDiagnostics {
            removed_by_rule: vec![("upper_limit", removed)],
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

    fn row(velocity: f64, grainsize: f64) -> DetectionRow {
        DetectionRow {
            track: 1,
            frame: 0,
            time: 0.0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
            velocity,
            grainsize,
            bb_width: 0.2,
        }
    }

    #[test]
    fn drop_policy_removes_zero_velocity_rows() {
        let sanitizer = RowSanitizer::new(&PipelineConfig {
            zero_velocity: ZeroVelocityPolicy::Drop,
            ..Default::default()
        });
        let output = sanitizer.apply(&[row(0.0, 0.1), row(1.0, 0.1)]).unwrap();
        assert_eq!(output.rows.len(), 1);
        assert_eq!(output.rows[0].velocity, 1.0);
    }

    #[test]
    fn nullify_policy_keeps_rows_but_marks_velocity_missing() {
        let sanitizer = RowSanitizer::new(&PipelineConfig {
            zero_velocity: ZeroVelocityPolicy::Nullify,
            ..Default::default()
        });
        let output = sanitizer.apply(&[row(0.0, 0.1), row(1.0, 0.1)]).unwrap();
        assert_eq!(output.rows.len(), 2);
        assert!(output.rows[0].velocity.is_nan());
        assert_eq!(output.rows[1].velocity, 1.0);
    }

    #[test]
    fn upper_limit_filter_enforces_all_rules() {
        let filter = UpperLimitFilter::new(&PipelineConfig {
            velocity_upperlimit: 5.0,
            grainsize_upperlimit: 1.0,
            ..Default::default()
        });
        let rows = vec![
            row(1.0, 0.1),      // kept
            row(1.0, 0.0),      // zero grain size
            row(6.0, 0.1),      // velocity above limit
            row(1.0, 2.0),      // grain size above limit
            row(f64::NAN, 0.1), // missing velocity
        ];
        let output = filter.apply(&rows).unwrap();
        assert_eq!(output.rows.len(), 1);
        assert_eq!(output.diagnostics.removed_by_rule, vec![("upper_limit", 4)]);
    }
}
