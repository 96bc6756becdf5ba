use crate::math::interp::InterpHelper;
use crate::prelude::{PipelineConfig, StageError, StageResult, Statistic};
use crate::tables::{AlignedRow, MovaRow, TimeSeries};
use crate::telemetry::log::LogManager;

const GRID_STEP_SEC: f64 = 0.1;

/// Resamples the tracking velocity and an external reference velocity onto
/// a common uniform time grid for validation against each other.
pub struct PivAligner {
    statistic: Statistic,
    logger: LogManager,
}

impl PivAligner {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            statistic: config.statistic,
            logger: LogManager::new(),
        }
    }

    /// Extracts the smoothed tracking-velocity series from the per-frame
    /// table, using the configured statistic and skipping missing samples.
    pub fn tracking_series(&self, mova: &[MovaRow]) -> StageResult<TimeSeries> {
        let mut time_sec = Vec::new();
        let mut value = Vec::new();
        for row in mova {
            let v = match self.statistic {
                Statistic::Mean => row.mean_vel_ma,
                Statistic::Median => row.median_vel_ma,
            };
            if row.time.is_finite() && v.is_finite() {
                time_sec.push(row.time);
                value.push(v);
            }
        }
        TimeSeries::new(time_sec, value)
    }

    /// Aligns both series over their overlapping time range on a 0.1 s grid.
    pub fn align(
        &self,
        tracking: &TimeSeries,
        reference: &TimeSeries,
    ) -> StageResult<Vec<AlignedRow>> {
        let start = tracking.start().max(reference.start());
        let end = tracking.end().min(reference.end());
        if !(start <= end) {
            return Err(StageError::NoOverlap {
                left_start: tracking.start(),
                left_end: tracking.end(),
                right_start: reference.start(),
                right_end: reference.end(),
            });
        }

        let grid = InterpHelper::uniform_grid(start, end, GRID_STEP_SEC);
        let aligned: Vec<AlignedRow> = grid
            .into_iter()
            .map(|t| AlignedRow {
                time_sec: t,
                tracking_velocity: InterpHelper::linear(&tracking.time_sec, &tracking.value, t),
                reference_velocity: InterpHelper::linear(&reference.time_sec, &reference.value, t),
            })
            .collect();

        self.logger.record(&format!(
            "PivAligner grid [{:.1}, {:.1}] s, {} samples",
            start,
            end,
            aligned.len()
        ));
        Ok(aligned)
    }
}
