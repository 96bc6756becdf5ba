use std::sync::Mutex;

/// One line of the end-of-run filtering summary.
#[derive(Debug, Clone)]
pub struct StageCount {
    pub stage: &'static str,
    pub tracks_in: usize,
    pub tracks_out: usize,
    pub rows_in: usize,
    pub rows_out: usize,
}

/// Accumulates per-stage survival counts across a pipeline run.
pub struct StageTally {
    inner: Mutex<Vec<StageCount>>,
}

impl StageTally {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Vec::new()),
        }
    }

    pub fn record(
        &self,
        stage: &'static str,
        tracks_in: usize,
        tracks_out: usize,
        rows_in: usize,
        rows_out: usize,
    ) {
        if let Ok(mut counts) = self.inner.lock() {
            counts.push(StageCount {
                stage,
                tracks_in,
                tracks_out,
                rows_in,
                rows_out,
            });
        }
    }

    pub fn snapshot(&self) -> Vec<StageCount> {
        self.inner.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Human-readable filtering summary, one line per stage.
    pub fn render(&self) -> String {
        let mut lines = vec!["Filtering summary:".to_string()];
        for count in self.snapshot() {
            lines.push(format!(
                "  {:<16} tracks {} -> {}, rows {} -> {}",
                count.stage, count.tracks_in, count.tracks_out, count.rows_in, count.rows_out
            ));
        }
        lines.join("\n")
    }
}

impl Default for StageTally {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_records_in_order() {
        let tally = StageTally::new();
        tally.record("track_filter", 10, 7, 100, 70);
        tally.record("jump_filter", 7, 6, 70, 60);
        let counts = tally.snapshot();
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].stage, "track_filter");
        assert_eq!(counts[1].tracks_out, 6);
        assert!(tally.render().contains("jump_filter"));
    }
}
