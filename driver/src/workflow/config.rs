use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use trackcore::prelude::{
    Axis, Direction, DistanceMode, PipelineConfig, Statistic, ZeroVelocityPolicy,
};

/// Workflow parameters for one event, loadable from YAML.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Event identifier, e.g. "2024_06_14"; used in output file names.
    pub event: String,
    /// Optional inclusive frame range applied before filtering.
    pub start_frame: Option<i64>,
    pub end_frame: Option<i64>,

    pub min_track_length: usize,
    pub max_track_length: usize,
    pub max_std_track_vel: f64,
    pub min_median_track_vel: f64,
    pub jump_threshold: f64,
    pub jump_distance: DistanceMode,
    pub movement_axis: Axis,
    pub axis_min_length: f64,
    pub require_direction: Direction,
    pub zero_velocity: ZeroVelocityPolicy,
    pub velocity_upperlimit: f64,
    pub grainsize_upperlimit: f64,
    pub moving_average_window: usize,
    pub gap_threshold: i64,
    pub min_num_detections: usize,
    pub lowess_iterations: usize,
    pub lowess_frame_window: usize,
    pub lowess_gap_threshold: i64,
    pub lowess_segment_length: usize,
    pub statistic: Statistic,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        let pipeline = PipelineConfig::default();
        Self {
            event: "event".to_string(),
            start_frame: None,
            end_frame: None,
            min_track_length: pipeline.min_track_length,
            max_track_length: pipeline.max_track_length,
            max_std_track_vel: pipeline.max_std_track_vel,
            min_median_track_vel: pipeline.min_median_track_vel,
            jump_threshold: pipeline.jump_threshold,
            jump_distance: pipeline.jump_distance,
            movement_axis: pipeline.movement_axis,
            axis_min_length: pipeline.axis_min_length,
            require_direction: pipeline.require_direction,
            zero_velocity: pipeline.zero_velocity,
            velocity_upperlimit: pipeline.velocity_upperlimit,
            grainsize_upperlimit: pipeline.grainsize_upperlimit,
            moving_average_window: pipeline.moving_average_window,
            gap_threshold: pipeline.gap_threshold,
            min_num_detections: pipeline.min_num_detections,
            lowess_iterations: pipeline.lowess_iterations,
            lowess_frame_window: pipeline.lowess_frame_window,
            lowess_gap_threshold: pipeline.lowess_gap_threshold,
            lowess_segment_length: pipeline.lowess_segment_length,
            statistic: pipeline.statistic,
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn to_pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            min_track_length: self.min_track_length,
            max_track_length: self.max_track_length,
            max_std_track_vel: self.max_std_track_vel,
            min_median_track_vel: self.min_median_track_vel,
            jump_threshold: self.jump_threshold,
            jump_distance: self.jump_distance,
            movement_axis: self.movement_axis,
            axis_min_length: self.axis_min_length,
            require_direction: self.require_direction,
            zero_velocity: self.zero_velocity,
            velocity_upperlimit: self.velocity_upperlimit,
            grainsize_upperlimit: self.grainsize_upperlimit,
            moving_average_window: self.moving_average_window,
            gap_threshold: self.gap_threshold,
            min_num_detections: self.min_num_detections,
            lowess_iterations: self.lowess_iterations,
            lowess_frame_window: self.lowess_frame_window,
            lowess_gap_threshold: self.lowess_gap_threshold,
            lowess_segment_length: self.lowess_segment_length,
            statistic: self.statistic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_produce_pipeline_config() {
        let cfg = WorkflowConfig::default();
        let pipeline = cfg.to_pipeline_config();
        assert_eq!(pipeline.min_track_length, 5);
        assert_eq!(pipeline.gap_threshold, 400);
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"event: 2024_06_14\njump_threshold: 2.5\nzero_velocity: drop\nstatistic: median\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.event, "2024_06_14");
        assert_eq!(cfg.jump_threshold, 2.5);
        assert_eq!(cfg.zero_velocity, ZeroVelocityPolicy::Drop);
        assert_eq!(cfg.statistic, Statistic::Median);
        // untouched fields keep their defaults
        assert_eq!(cfg.min_track_length, 5);
    }
}
