use anyhow::Context;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use trackcore::math::StatsHelper;

/// Detection count for one frame's label file.
#[derive(Debug, Clone, Serialize)]
pub struct FrameDetections {
    pub frame: i64,
    pub detections: usize,
}

/// Summary statistics over the per-frame detection counts.
#[derive(Debug, Serialize)]
pub struct ScanStats {
    pub total_frames: usize,
    pub total_detections: usize,
    pub mean_detections: f64,
    pub median_detections: f64,
    pub max_detections: usize,
    pub min_detections: usize,
    pub std_detections: f64,
    pub frames_with_detections: usize,
}

fn count_rows(path: &Path) -> anyhow::Result<FrameDetections> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("label file {} has no stem", path.display()))?;
    let frame: i64 = stem
        .parse()
        .with_context(|| format!("label file stem '{}' is not a frame number", stem))?;
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(FrameDetections {
        frame,
        detections: contents.lines().count(),
    })
}

/// Counts detections per frame across a directory of per-frame label files.
///
/// Each file is one independent unit of work; results are merged and sorted
/// by frame number at the end, so no ordering is required between tasks.
pub async fn detection_counts(dir: &Path) -> anyhow::Result<Vec<FrameDetections>> {
    if !dir.exists() {
        anyhow::bail!("label directory does not exist: {}", dir.display());
    }
    let files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("listing {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().map(|e| e == "txt").unwrap_or(false))
        .collect();

    let mut handles = Vec::with_capacity(files.len());
    for file in files {
        handles.push(tokio::task::spawn_blocking(move || count_rows(&file)));
    }

    let mut counts = Vec::with_capacity(handles.len());
    for handle in handles {
        counts.push(handle.await.context("joining scan task")??);
    }
    counts.sort_by_key(|c| c.frame);
    Ok(counts)
}

pub fn scan_stats(counts: &[FrameDetections]) -> ScanStats {
    let values: Vec<f64> = counts.iter().map(|c| c.detections as f64).collect();
    ScanStats {
        total_frames: counts.len(),
        total_detections: counts.iter().map(|c| c.detections).sum(),
        mean_detections: StatsHelper::mean(&values),
        median_detections: StatsHelper::median(&values),
        max_detections: counts.iter().map(|c| c.detections).max().unwrap_or(0),
        min_detections: counts.iter().map(|c| c.detections).min().unwrap_or(0),
        std_detections: StatsHelper::sample_std(&values),
        frames_with_detections: counts.iter().filter(|c| c.detections > 0).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[tokio::test]
    async fn scan_counts_and_sorts_by_frame() {
        let dir = tempdir().unwrap();
        for (name, lines) in [("00010", 3), ("00002", 1), ("00005", 0)] {
            let mut file = fs::File::create(dir.path().join(format!("{}.txt", name))).unwrap();
            for i in 0..lines {
                writeln!(file, "0 0.5 0.5 0.1 0.1 # {}", i).unwrap();
            }
        }

        let counts = detection_counts(dir.path()).await.unwrap();
        assert_eq!(counts.len(), 3);
        assert_eq!(counts[0].frame, 2);
        assert_eq!(counts[2].frame, 10);
        assert_eq!(counts[2].detections, 3);

        let stats = scan_stats(&counts);
        assert_eq!(stats.total_detections, 4);
        assert_eq!(stats.frames_with_detections, 2);
    }

    #[tokio::test]
    async fn scan_rejects_missing_directory() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(detection_counts(&missing).await.is_err());
    }
}
