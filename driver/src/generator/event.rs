use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use trackcore::tables::DetectionRow;

/// Configuration for generating a synthetic tracking event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub tracks: usize,
    pub track_length: usize,
    /// Frame offset between consecutive track starts.
    pub track_stride: i64,
    pub frame_rate_hz: f64,
    pub base_velocity: f64,
    pub base_grainsize: f64,
    pub noise: f64,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            tracks: 40,
            track_length: 20,
            track_stride: 10,
            frame_rate_hz: 10.0,
            base_velocity: 1.2,
            base_grainsize: 0.3,
            noise: 0.05,
            seed: 0,
        }
    }
}

/// Builds a plausible event: tracks descending along y at roughly the base
/// velocity, with seeded jitter on position, velocity and grain size.
pub fn build_event_rows(config: &GeneratorConfig) -> Vec<DetectionRow> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let dt = 1.0 / config.frame_rate_hz.max(1e-6);
    let mut rows = Vec::with_capacity(config.tracks * config.track_length);

    for track_index in 0..config.tracks {
        let track = track_index as i64 + 1;
        let first_frame = track_index as i64 * config.track_stride;
        let x0: f64 = rng.gen_range(-5.0..2.0);
        let y0: f64 = rng.gen_range(2.0..4.0);
        let grainsize = (config.base_grainsize + rng.gen_range(-config.noise..config.noise))
            .max(0.01);

        for i in 0..config.track_length {
            let frame = first_frame + i as i64;
            let jitter = rng.gen_range(-config.noise..config.noise);
            rows.push(DetectionRow {
                track,
                frame,
                time: frame as f64 * dt,
                x: x0 + jitter,
                y: y0 - config.base_velocity * dt * i as f64,
                z: 0.5 + jitter,
                velocity: (config.base_velocity + jitter).max(0.01),
                grainsize,
                bb_width: grainsize * 1.5,
            });
        }
    }

    rows
}
