//! Statistical utility functions shared by labelers, the engine and risk metrics.
//!
//! Missing observations are represented as `NaN`. Every function here skips
//! non-finite values when computing a statistic, and returns `NaN` when the
//! statistic is undefined rather than panicking.

use ndarray::ArrayView1;

/// Minimum threshold for standard deviation to avoid division by zero.
/// Values below this threshold are treated as zero variance.
pub const MIN_STD_THRESHOLD: f64 = 1e-12;

/// The finite values of `values`, in order.
pub fn finite(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|x| x.is_finite()).collect()
}

/// Mean of the finite values; `NaN` when there are none.
pub fn mean(values: &[f64]) -> f64 {
    let xs = finite(values);
    if xs.is_empty() {
        return f64::NAN;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Standard deviation of the finite values with `ddof` delta degrees of freedom.
///
/// `ddof = 0` gives the population estimate, `ddof = 1` the sample estimate.
/// Returns `NaN` when fewer than `ddof + 1` finite values are available.
pub fn std_dev(values: &[f64], ddof: usize) -> f64 {
    let xs = finite(values);
    if xs.len() <= ddof {
        return f64::NAN;
    }
    ArrayView1::from(&xs[..]).std(ddof as f64)
}

/// Sample moments used for non-Gaussian tail adjustments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    /// Arithmetic mean.
    pub mean: f64,
    /// Population standard deviation (ddof = 0).
    pub std: f64,
    /// Population skewness.
    pub skew: f64,
    /// Population excess kurtosis (normal = 0).
    pub excess_kurtosis: f64,
}

/// Population mean, standard deviation, skewness and excess kurtosis.
///
/// Returns `None` for an empty (or all non-finite) sample. When the standard
/// deviation is zero, skew and kurtosis are reported as zero.
pub fn moments(values: &[f64]) -> Option<Moments> {
    let xs = finite(values);
    if xs.is_empty() {
        return None;
    }
    let arr = ArrayView1::from(&xs[..]);
    let mean = arr.mean()?;
    let std = arr.std(0.0);

    if std <= MIN_STD_THRESHOLD {
        return Some(Moments {
            mean,
            std: 0.0,
            skew: 0.0,
            excess_kurtosis: 0.0,
        });
    }

    let z = arr.mapv(|x| (x - mean) / std);
    let skew = z.mapv(|v| v.powi(3)).mean()?;
    let kurt = z.mapv(|v| v.powi(4)).mean()? - 3.0;

    Some(Moments {
        mean,
        std,
        skew,
        excess_kurtosis: kurt,
    })
}

/// Percentile `q` (in `[0, 1]`) of the finite values, using linear interpolation
/// between closest ranks.
///
/// Returns `NaN` for an empty sample.
pub fn percentile(values: &[f64], q: f64) -> f64 {
    let mut xs = finite(values);
    if xs.is_empty() {
        return f64::NAN;
    }
    xs.sort_by(f64::total_cmp);

    let q = q.clamp(0.0, 1.0);
    let pos = q * (xs.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    xs[lo] + (xs[hi] - xs[lo]) * frac
}

/// Trailing rolling standard deviation.
///
/// Position `i` covers `values[i + 1 - window ..= i]` (truncated at the start).
/// The result is `NaN` unless the window holds at least `min_periods` finite
/// values (and more than `ddof` of them).
pub fn rolling_std(values: &[f64], window: usize, min_periods: usize, ddof: usize) -> Vec<f64> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let win = &values[start..=i];
            let count = win.iter().filter(|x| x.is_finite()).count();
            if count < min_periods.max(1) || count <= ddof {
                f64::NAN
            } else {
                std_dev(win, ddof)
            }
        })
        .collect()
}

/// Carry the last finite value forward over gaps, then replace any remaining
/// leading gap with `fill`.
///
/// Values are never filled backwards.
pub fn forward_fill(values: &[f64], fill: f64) -> Vec<f64> {
    let mut last = None;
    values
        .iter()
        .map(|&v| {
            if v.is_finite() {
                last = Some(v);
                v
            } else {
                last.unwrap_or(fill)
            }
        })
        .collect()
}

/// Equity curve `cumprod(1 + r)` starting from 1.0. Non-finite returns count as 0.
pub fn equity_curve(returns: &[f64]) -> Vec<f64> {
    returns
        .iter()
        .scan(1.0_f64, |eq, &r| {
            *eq *= 1.0 + if r.is_finite() { r } else { 0.0 };
            Some(*eq)
        })
        .collect()
}

/// Running maximum of `values`.
pub fn running_max(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .scan(f64::NEG_INFINITY, |peak, &v| {
            *peak = peak.max(v);
            Some(*peak)
        })
        .collect()
}

/// Drawdown `equity / running_max(equity) - 1` (non-positive).
pub fn drawdown(equity: &[f64]) -> Vec<f64> {
    equity
        .iter()
        .zip(running_max(equity))
        .map(|(&eq, peak)| if peak > 0.0 { eq / peak - 1.0 } else { 0.0 })
        .collect()
}
