use crate::prelude::{StageError, StageResult};

/// An irregularly sampled scalar series indexed by time in seconds.
#[derive(Debug, Clone)]
pub struct TimeSeries {
    pub time_sec: Vec<f64>,
    pub value: Vec<f64>,
}

impl TimeSeries {
    /// Builds a series, requiring equal column lengths and at least one sample.
    pub fn new(time_sec: Vec<f64>, value: Vec<f64>) -> StageResult<Self> {
        if time_sec.is_empty() {
            return Err(StageError::EmptyInput("time series has no samples".into()));
        }
        if time_sec.len() != value.len() {
            return Err(StageError::Schema(format!(
                "time_sec ({}) and value ({}) columns differ in length",
                time_sec.len(),
                value.len()
            )));
        }
        Ok(Self { time_sec, value })
    }

    pub fn start(&self) -> f64 {
        self.time_sec.first().copied().unwrap_or(f64::NAN)
    }

    pub fn end(&self) -> f64 {
        self.time_sec.last().copied().unwrap_or(f64::NAN)
    }
}

/// Converts a colon-separated duration string to seconds.
///
/// Accepts `H:MM:SS` or `MM:SS`, accumulating left to right so each part
/// multiplies the running total by 60 before being added.
pub fn clock_to_seconds(text: &str) -> StageResult<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(StageError::Schema("empty duration string".into()));
    }
    let mut seconds = 0.0_f64;
    for part in trimmed.split(':') {
        let value: f64 = part.trim().parse().map_err(|_| {
            StageError::Schema(format!("unparseable duration string '{}'", text))
        })?;
        seconds = seconds * 60.0 + value;
    }
    Ok(seconds)
}
