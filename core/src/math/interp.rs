pub struct InterpHelper;

impl InterpHelper {
    /// Linear interpolation over an x-ascending sample, clamped to the
    /// endpoint values outside the source range (no extrapolation).
    pub fn linear(xs: &[f64], ys: &[f64], x: f64) -> f64 {
        debug_assert_eq!(xs.len(), ys.len());
        if xs.is_empty() {
            return f64::NAN;
        }
        if x <= xs[0] {
            return ys[0];
        }
        if x >= xs[xs.len() - 1] {
            return ys[ys.len() - 1];
        }
        let idx = match xs.binary_search_by(|v| {
            v.partial_cmp(&x).unwrap_or(std::cmp::Ordering::Less)
        }) {
            Ok(i) => return ys[i],
            Err(i) => i,
        };
        let (x0, x1) = (xs[idx - 1], xs[idx]);
        let (y0, y1) = (ys[idx - 1], ys[idx]);
        if x1 == x0 {
            return y0;
        }
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }

    /// Uniform grid from `start` to `end` inclusive (within float tolerance).
    pub fn uniform_grid(start: f64, end: f64, step: f64) -> Vec<f64> {
        let mut grid = Vec::new();
        if step <= 0.0 || end < start {
            return grid;
        }
        let count = ((end - start) / step + 1e-9).floor() as usize;
        for i in 0..=count {
            grid.push(start + i as f64 * step);
        }
        grid
    }
}
