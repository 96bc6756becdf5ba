pub struct StatsHelper;

impl StatsHelper {
    /// Mean over finite values; NaN when no finite value is present.
    pub fn mean(values: &[f64]) -> f64 {
        let mut sum = 0.0;
        let mut count = 0usize;
        for &v in values {
            if v.is_finite() {
                sum += v;
                count += 1;
            }
        }
        if count == 0 {
            f64::NAN
        } else {
            sum / count as f64
        }
    }

    /// Median over finite values; NaN when no finite value is present.
    /// Even-length inputs yield the average of the two middle values.
    pub fn median(values: &[f64]) -> f64 {
        let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return f64::NAN;
        }
        finite.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let mid = finite.len() / 2;
        if finite.len() % 2 == 1 {
            finite[mid]
        } else {
            (finite[mid - 1] + finite[mid]) / 2.0
        }
    }

    /// Sample standard deviation over finite values.
    ///
    /// Fewer than two samples is not an error: the undefined sample std is
    /// substituted with 0 so single-row tracks do not fail filters on NaN.
    pub fn sample_std(values: &[f64]) -> f64 {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.len() < 2 {
            return 0.0;
        }
        let mean = finite.iter().sum::<f64>() / finite.len() as f64;
        let ssq: f64 = finite.iter().map(|v| (v - mean) * (v - mean)).sum();
        (ssq / (finite.len() - 1) as f64).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_skips_missing_values() {
        assert_eq!(StatsHelper::mean(&[1.0, f64::NAN, 3.0]), 2.0);
        assert!(StatsHelper::mean(&[f64::NAN]).is_nan());
        assert!(StatsHelper::mean(&[]).is_nan());
    }

    #[test]
    fn median_handles_even_and_odd_lengths() {
        assert_eq!(StatsHelper::median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(StatsHelper::median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
        assert!(StatsHelper::median(&[]).is_nan());
    }

    #[test]
    fn std_substitutes_zero_for_degenerate_samples() {
        assert_eq!(StatsHelper::sample_std(&[]), 0.0);
        assert_eq!(StatsHelper::sample_std(&[5.0]), 0.0);
        assert_eq!(StatsHelper::sample_std(&[5.0, f64::NAN]), 0.0);
    }

    #[test]
    fn std_matches_sample_formula() {
        let std = StatsHelper::sample_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((std - 2.138089935299395).abs() < 1e-12);
    }
}
