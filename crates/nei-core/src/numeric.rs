/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tolerances {
    pub abs: f64,
    pub rel: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

impl Tolerances {
    /// Purely absolute comparison, the way ionic fractions are compared.
    pub fn absolute(abs: f64) -> Self {
        Self { abs, rel: 0.0 }
    }
}

pub fn nearly_equal(a: f64, b: f64, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

/// True when every element is strictly greater than its predecessor.
pub fn is_strictly_increasing(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[1] > w[0])
}

/// `n` points evenly spaced in log10 between `10^log_start` and `10^log_end`.
pub fn logspace(log_start: f64, log_end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![10f64.powf(log_start)],
        _ => {
            let step = (log_end - log_start) / (n - 1) as f64;
            (0..n)
                .map(|i| 10f64.powf(log_start + step * i as f64))
                .collect()
        }
    }
}

/// Piecewise-linear interpolation of `(xs, ys)` at `x`.
///
/// `xs` must be strictly increasing. Returns `None` outside `[xs[0], xs[last]]`.
pub fn interp_linear(xs: &[f64], ys: &[f64], x: f64) -> Option<f64> {
    if xs.len() != ys.len() || xs.is_empty() || !x.is_finite() {
        return None;
    }
    let last = xs.len() - 1;
    if x < xs[0] || x > xs[last] {
        return None;
    }
    if xs.len() == 1 {
        return Some(ys[0]);
    }
    // first index with xs[i] >= x
    let hi = xs.partition_point(|&v| v < x).max(1);
    let lo = hi - 1;
    let span = xs[hi] - xs[lo];
    let w = (x - xs[lo]) / span;
    Some(ys[lo] + w * (ys[hi] - ys[lo]))
}

/// Sum of a slice, Kahan-compensated.
pub fn stable_sum(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut c = 0.0;
    for &v in values {
        let y = v - c;
        let t = sum + y;
        c = (t - sum) - y;
        sum = t;
    }
    sum
}
