use anyhow::Context;
use serde::Serialize;
use std::fs::{self, File};
use std::path::Path;

/// Writes any serializable row table as CSV with headers.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("flushing {}", path.display()))?;
    Ok(())
}

/// End-of-run summary persisted next to the output tables.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub event: String,
    pub tracks_total: usize,
    pub tracks_remaining: usize,
    pub rows_remaining: usize,
    pub first_frame: Option<i64>,
    pub last_frame: Option<i64>,
    pub unique_frames: usize,
}

pub fn write_run_summary(path: &Path, summary: &RunSummary) -> anyhow::Result<()> {
    write_json(path, summary)
}

/// Writes any serializable value as pretty-printed JSON.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }
    let file =
        File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(file, value)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use trackcore::tables::FrameTime;

    #[test]
    fn csv_round_trips_through_a_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("frame_time.csv");
        let rows = vec![
            FrameTime {
                frame: 1,
                time: 0.1,
            },
            FrameTime {
                frame: 2,
                time: 0.2,
            },
        ];
        write_csv(&path, &rows).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("frame,time"));
        assert!(contents.contains("2,0.2"));
    }

    #[test]
    fn run_summary_is_valid_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("summary.json");
        write_run_summary(
            &path,
            &RunSummary {
                event: "2024_06_14".into(),
                tracks_total: 10,
                tracks_remaining: 7,
                rows_remaining: 350,
                first_frame: Some(100),
                last_frame: Some(900),
                unique_frames: 500,
            },
        )
        .unwrap();
        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["tracks_remaining"], 7);
    }
}
