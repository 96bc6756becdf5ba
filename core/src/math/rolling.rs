pub struct RollingHelper;

impl RollingHelper {
    /// Centered rolling mean over a fixed window.
    ///
    /// A position yields NaN unless its window lies fully inside the series
    /// and contains only finite values, so missing markers inserted at gaps
    /// are never averaged over. Even windows follow the convention
    /// `[i - (w-1)/2, i + w/2]`.
    pub fn centered_mean(values: &[f64], window: usize) -> Vec<f64> {
        let n = values.len();
        if window == 0 {
            return vec![f64::NAN; n];
        }
        let left = (window - 1) / 2;
        let right = window / 2;
        let mut out = vec![f64::NAN; n];
        for i in 0..n {
            if i < left || i + right >= n {
                continue;
            }
            let slice = &values[i - left..=i + right];
            if slice.iter().all(|v| v.is_finite()) {
                out[i] = slice.iter().sum::<f64>() / window as f64;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_mean_averages_full_windows_only() {
        let out = RollingHelper::centered_mean(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert!(out[0].is_nan());
        assert_eq!(out[1], 2.0);
        assert_eq!(out[2], 3.0);
        assert_eq!(out[3], 4.0);
        assert!(out[4].is_nan());
    }

    #[test]
    fn centered_mean_propagates_missing_values() {
        let out = RollingHelper::centered_mean(&[1.0, f64::NAN, 3.0, 4.0, 5.0], 3);
        assert!(out[1].is_nan());
        assert!(out[2].is_nan());
        assert_eq!(out[3], 4.0);
    }

    #[test]
    fn even_window_leans_right() {
        let out = RollingHelper::centered_mean(&[1.0, 2.0, 3.0, 4.0], 2);
        // window at i covers [i, i + 1]
        assert_eq!(out[0], 1.5);
        assert_eq!(out[1], 2.5);
        assert_eq!(out[2], 3.5);
        assert!(out[3].is_nan());
    }
}
