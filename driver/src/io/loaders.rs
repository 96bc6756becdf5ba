use anyhow::Context;
use std::collections::HashMap;
use std::path::Path;
use trackcore::prelude::StageError;
use trackcore::tables::{clock_to_seconds, DetectionRow, FrameTime, TimeSeries};

/// Loads the raw per-detection stats table.
pub fn load_detection_rows(path: &Path) -> anyhow::Result<Vec<DetectionRow>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening stats table {}", path.display()))?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let row: DetectionRow =
            record.with_context(|| format!("parsing stats table {}", path.display()))?;
        rows.push(row);
    }
    Ok(rows)
}

/// Loads the frame-to-time lookup table.
pub fn load_time_table(path: &Path) -> anyhow::Result<Vec<FrameTime>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening time table {}", path.display()))?;
    let mut entries = Vec::new();
    for record in reader.deserialize() {
        let entry: FrameTime =
            record.with_context(|| format!("parsing time table {}", path.display()))?;
        entries.push(entry);
    }
    Ok(entries)
}

/// Fills the row times from the frame-to-time lookup; frames without an
/// entry keep a missing time.
pub fn merge_time(rows: &mut [DetectionRow], table: &[FrameTime]) {
    let lookup: HashMap<i64, f64> = table.iter().map(|e| (e.frame, e.time)).collect();
    for row in rows {
        row.time = lookup.get(&row.frame).copied().unwrap_or(f64::NAN);
    }
}

/// Loads the external reference-velocity series.
///
/// Requires a `Time` column of colon-separated durations and a `velocity`
/// column; missing headers are reported by name.
pub fn load_piv_series(path: &Path) -> anyhow::Result<TimeSeries> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening reference series {}", path.display()))?;
    let headers = reader
        .headers()
        .with_context(|| format!("reading headers of {}", path.display()))?
        .clone();

    let time_idx = headers.iter().position(|h| h == "Time");
    let velocity_idx = headers.iter().position(|h| h == "velocity");
    let (time_idx, velocity_idx) = match (time_idx, velocity_idx) {
        (Some(t), Some(v)) => (t, v),
        _ => {
            let missing: Vec<&str> = [("Time", time_idx), ("velocity", velocity_idx)]
                .iter()
                .filter(|(_, idx)| idx.is_none())
                .map(|(name, _)| *name)
                .collect();
            return Err(StageError::Schema(missing.join(", ")))
                .with_context(|| format!("reference series {}", path.display()));
        }
    };

    let mut samples: Vec<(f64, f64)> = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("reading {}", path.display()))?;
        let time = clock_to_seconds(&record[time_idx])
            .with_context(|| format!("parsing Time column of {}", path.display()))?;
        let velocity: f64 = record[velocity_idx]
            .trim()
            .parse()
            .with_context(|| format!("parsing velocity column of {}", path.display()))?;
        samples.push((time, velocity));
    }
    samples.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let (time_sec, value): (Vec<f64>, Vec<f64>) = samples.into_iter().unzip();
    Ok(TimeSeries::new(time_sec, value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn detection_rows_load_without_time_column() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(
            temp,
            "frame,track,velocity,grainsize,bb_center_lidar_x,bb_center_lidar_y,bb_center_lidar_z,bb_width"
        )
        .unwrap();
        writeln!(temp, "10,1,1.5,0.2,-3.0,1.0,0.5,0.4").unwrap();
        let path = temp.into_temp_path();

        let rows = load_detection_rows(path.as_ref()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].frame, 10);
        assert_eq!(rows[0].y, 1.0);
        assert!(rows[0].time.is_nan());
    }

    #[test]
    fn merge_time_fills_known_frames() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "frame_img,time").unwrap();
        writeln!(temp, "10,1.25").unwrap();
        let path = temp.into_temp_path();
        let table = load_time_table(path.as_ref()).unwrap();

        let mut rows = vec![
            DetectionRow {
                track: 1,
                frame: 10,
                time: f64::NAN,
                x: 0.0,
                y: 0.0,
                z: 0.0,
                velocity: 1.0,
                grainsize: 0.1,
                bb_width: 0.2,
            },
            DetectionRow {
                track: 1,
                frame: 11,
                time: f64::NAN,
                x: 0.0,
                y: 0.0,
                z: 0.0,
                velocity: 1.0,
                grainsize: 0.1,
                bb_width: 0.2,
            },
        ];
        merge_time(&mut rows, &table);
        assert_eq!(rows[0].time, 1.25);
        assert!(rows[1].time.is_nan());
    }

    #[test]
    fn piv_series_parses_clock_times() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "Time,velocity").unwrap();
        writeln!(temp, "00:10,1.5").unwrap();
        writeln!(temp, "00:05,1.0").unwrap();
        let path = temp.into_temp_path();

        let series = load_piv_series(path.as_ref()).unwrap();
        assert_eq!(series.time_sec, vec![5.0, 10.0]);
        assert_eq!(series.value, vec![1.0, 1.5]);
    }

    #[test]
    fn piv_series_names_missing_columns() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "Time,speed").unwrap();
        writeln!(temp, "00:10,1.5").unwrap();
        let path = temp.into_temp_path();

        let err = load_piv_series(path.as_ref()).unwrap_err();
        assert!(format!("{:#}", err).contains("velocity"));
    }
}
