use ndarray::Array1;

use crate::math::stats::StatsHelper;
use crate::prelude::{StageError, StageResult};

/// Locally-weighted scatterplot smoothing with bisquare robustifying passes.
///
/// The smoothing fraction selects the share of points entering each local
/// fit; `iterations` counts the robustifying passes applied after the first
/// fit. Fitted values are produced at the input points only, so the smoother
/// never extrapolates beyond the data range.
pub struct LowessEngine {
    frac: f64,
    iterations: usize,
}

impl LowessEngine {
    pub fn new(frac: f64, iterations: usize) -> StageResult<Self> {
        if !(frac > 0.0 && frac <= 1.0) {
            return Err(StageError::InvalidConfig(format!(
                "lowess fraction must be in (0, 1], got {}",
                frac
            )));
        }
        Ok(Self { frac, iterations })
    }

    /// Fits the smoother at every input point of an x-sorted sample.
    pub fn fit(&self, x: &[f64], y: &[f64]) -> StageResult<Vec<f64>> {
        if x.is_empty() {
            return Err(StageError::EmptyInput("lowess received no samples".into()));
        }
        if x.len() != y.len() {
            return Err(StageError::Schema(format!(
                "lowess x ({}) and y ({}) columns differ in length",
                x.len(),
                y.len()
            )));
        }
        let n = x.len();
        if n < 3 {
            return Ok(y.to_vec());
        }

        let k = ((self.frac * n as f64).ceil() as usize).clamp(2, n);
        let mut robustness = vec![1.0_f64; n];
        let mut fitted = vec![0.0_f64; n];

        for pass in 0..=self.iterations {
            for i in 0..n {
                let lo = Self::window_start(x, i, k);
                fitted[i] = Self::fit_point(x, y, &robustness, lo, lo + k, i);
            }
            if pass == self.iterations {
                break;
            }
            let residuals: Vec<f64> = y.iter().zip(&fitted).map(|(yi, fi)| yi - fi).collect();
            let abs_res: Vec<f64> = residuals.iter().map(|r| r.abs()).collect();
            let scale = StatsHelper::median(&abs_res);
            if !(scale > 0.0) {
                break;
            }
            for (r, w) in residuals.iter().zip(robustness.iter_mut()) {
                let u = r / (6.0 * scale);
                *w = if u.abs() >= 1.0 {
                    0.0
                } else {
                    let t = 1.0 - u * u;
                    t * t
                };
            }
        }

        Ok(fitted)
    }

    /// Leftmost index of the k-point neighborhood of x[i], found by sliding
    /// right while the next point is closer than the current left edge.
    fn window_start(x: &[f64], i: usize, k: usize) -> usize {
        let n = x.len();
        let mut lo = i.saturating_sub(k - 1);
        while lo + k < n && x[lo + k] - x[i] < x[i] - x[lo] {
            lo += 1;
        }
        lo.min(n - k)
    }

    fn fit_point(x: &[f64], y: &[f64], robustness: &[f64], lo: usize, hi: usize, i: usize) -> f64 {
        let xw = Array1::from_iter(x[lo..hi].iter().copied());
        let yw = Array1::from_iter(y[lo..hi].iter().copied());
        let rw = Array1::from_iter(robustness[lo..hi].iter().copied());

        let h = (x[i] - x[lo]).max(x[hi - 1] - x[i]);
        let weights = if h > 0.0 {
            let tricube = xw.mapv(|xj| {
                let u = ((xj - x[i]) / h).abs();
                if u >= 1.0 {
                    0.0
                } else {
                    let t = 1.0 - u * u * u;
                    t * t * t
                }
            });
            tricube * &rw
        } else {
            rw
        };

        let sw = weights.sum();
        if sw <= 0.0 {
            return y[i];
        }
        let swx = weights.dot(&xw);
        let swy = weights.dot(&yw);
        let swxx = (&weights * &xw).dot(&xw);
        let swxy = (&weights * &xw).dot(&yw);

        let denom = sw * swxx - swx * swx;
        if denom.abs() < 1e-12 * sw * sw {
            return swy / sw;
        }
        let slope = (sw * swxy - swx * swy) / denom;
        let intercept = (swy - slope * swx) / sw;
        intercept + slope * x[i]
    }
}
