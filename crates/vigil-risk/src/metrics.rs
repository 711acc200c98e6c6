//! Drawdown, volatility, Value-at-Risk and Expected Shortfall.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use vigil_traits::stats;

/// Equity, running peak and drawdown of a return series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownCurve {
    /// `cumprod(1 + r)` with missing returns counted as 0.
    pub equity: Vec<f64>,
    /// Running maximum of `equity`.
    pub peak: Vec<f64>,
    /// `equity / peak - 1`.
    pub drawdown: Vec<f64>,
}

/// Build the drawdown curve of `returns`.
pub fn drawdown_curve(returns: &[f64]) -> DrawdownCurve {
    let equity = stats::equity_curve(returns);
    let peak = stats::running_max(&equity);
    let drawdown = stats::drawdown(&equity);
    DrawdownCurve {
        equity,
        peak,
        drawdown,
    }
}

/// Most negative drawdown (0 for an empty series).
pub fn max_drawdown(returns: &[f64]) -> f64 {
    drawdown_curve(returns)
        .drawdown
        .into_iter()
        .fold(0.0, f64::min)
}

/// Annualized volatility: population std of returns times `sqrt(ann_fac)`.
pub fn ann_vol(returns: &[f64], ann_fac: f64) -> f64 {
    stats::std_dev(returns, 0) * ann_fac.sqrt()
}

/// One-period historical VaR at confidence `level` (positive = loss).
///
/// The `level` quantile of `-returns`, linearly interpolated. `NaN` for an
/// empty sample.
///
/// # Example
///
/// ```
/// use vigil_risk::var_historic;
///
/// let r: Vec<f64> = (1..=100).map(|i| -(i as f64) / 1000.0).collect();
/// assert!((var_historic(&r, 0.99) - 0.09901).abs() < 1e-9);
/// ```
pub fn var_historic(returns: &[f64], level: f64) -> f64 {
    stats::percentile(&losses(returns), level)
}

/// Historical Expected Shortfall: mean loss at or beyond the VaR threshold.
pub fn es_historic(returns: &[f64], level: f64) -> f64 {
    let losses = losses(returns);
    let threshold = stats::percentile(&losses, level);
    let tail: Vec<f64> = losses.into_iter().filter(|l| *l >= threshold).collect();
    stats::mean(&tail)
}

/// Cornish-Fisher VaR: Gaussian quantile corrected for sample skew and
/// excess kurtosis.
///
/// ```text
/// z_cf = z + (z² - 1)s/6 + (z³ - 3z)k/24 - (2z³ - 5z)s²/36
/// VaR  = -(μ + z_cf·σ)
/// ```
///
/// `z` is the standard normal quantile at `1 - level` (the loss tail).
/// With zero dispersion the result is `-μ`; an empty sample gives `NaN`.
pub fn var_cornish_fisher(returns: &[f64], level: f64) -> f64 {
    let Some(m) = stats::moments(returns) else {
        return f64::NAN;
    };
    if m.std == 0.0 {
        return -m.mean;
    }
    let Ok(normal) = Normal::new(0.0, 1.0) else {
        return f64::NAN;
    };
    let z = normal.inverse_cdf(1.0 - level);
    let (s, k) = (m.skew, m.excess_kurtosis);
    let z_cf = z + (z * z - 1.0) * s / 6.0 + (z.powi(3) - 3.0 * z) * k / 24.0
        - (2.0 * z.powi(3) - 5.0 * z) * s * s / 36.0;
    -(m.mean + z_cf * m.std)
}

/// Historical VaR at `level` and the per-bar breach flags `-r > VaR`.
///
/// Missing returns are dropped before flagging.
pub fn var_breaches(returns: &[f64], level: f64) -> (f64, Vec<bool>) {
    let var = var_historic(returns, level);
    let breaches = returns
        .iter()
        .filter(|r| r.is_finite())
        .map(|r| -r > var)
        .collect();
    (var, breaches)
}

fn losses(returns: &[f64]) -> Vec<f64> {
    returns
        .iter()
        .filter(|r| r.is_finite())
        .map(|r| -r)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> Vec<f64> {
        vec![0.01, -0.02, 0.015, -0.05, 0.0, 0.02, -0.01, 0.03, -0.005, f64::NAN]
    }

    #[test]
    fn test_drawdown_curve() {
        let c = drawdown_curve(&[0.1, -0.5, f64::NAN, 0.2]);
        assert_relative_eq!(c.equity[1], 0.55, epsilon = 1e-12);
        assert_relative_eq!(c.equity[2], 0.55, epsilon = 1e-12);
        assert_relative_eq!(c.peak[3], 1.1, epsilon = 1e-12);
        assert_relative_eq!(c.drawdown[1], -0.5, epsilon = 1e-12);
        assert_relative_eq!(max_drawdown(&[0.1, -0.5, f64::NAN, 0.2]), -0.5, epsilon = 1e-12);
        assert_eq!(max_drawdown(&[]), 0.0);
    }

    #[test]
    fn test_ann_vol() {
        let r = [0.01, -0.01, 0.01, -0.01];
        assert_relative_eq!(ann_vol(&r, 252.0), 0.01 * 252.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_var_es_interpolation() {
        // Losses: -0.03 .. 0.05 over nine finite values.
        let r = sample();
        let var = var_historic(&r, 0.9);
        // Sorted losses [-0.03,-0.02,-0.015,-0.01,0,0.005,0.01,0.02,0.05];
        // position 0.9 * 8 = 7.2 -> 0.02 + 0.2 * 0.03.
        assert_relative_eq!(var, 0.026, epsilon = 1e-12);
        assert_relative_eq!(es_historic(&r, 0.9), 0.05, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_sample_is_nan() {
        assert!(var_historic(&[], 0.99).is_nan());
        assert!(es_historic(&[f64::NAN], 0.99).is_nan());
        assert!(var_cornish_fisher(&[], 0.99).is_nan());
    }

    #[test]
    fn test_cornish_fisher_gaussian_limit() {
        // Symmetric sample: skew vanishes, leaving only the kurtosis term.
        let r = [-0.02, -0.01, 0.0, 0.01, 0.02];
        let m = stats::moments(&r).unwrap();
        let z = Normal::new(0.0, 1.0).unwrap().inverse_cdf(0.01);
        let k = m.excess_kurtosis;
        let expected = -(m.mean + (z + (z.powi(3) - 3.0 * z) * k / 24.0) * m.std);
        assert_relative_eq!(var_cornish_fisher(&r, 0.99), expected, epsilon = 1e-12);
        assert!(var_cornish_fisher(&r, 0.99) > 0.0);
    }

    #[test]
    fn test_cornish_fisher_flat_sample() {
        assert_relative_eq!(var_cornish_fisher(&[0.01; 5], 0.99), -0.01, epsilon = 1e-12);
    }

    #[test]
    fn test_left_skew_raises_cf_var() {
        let mut r = vec![0.01; 95];
        r.extend([-0.08; 5]);
        let m = stats::moments(&r).unwrap();
        let gaussian = -(m.mean + Normal::new(0.0, 1.0).unwrap().inverse_cdf(0.01) * m.std);
        assert!(m.skew < 0.0);
        assert!(var_cornish_fisher(&r, 0.99) > gaussian);
    }

    #[test]
    fn test_breaches() {
        let r = sample();
        let (var, flags) = var_breaches(&r, 0.9);
        assert_relative_eq!(var, 0.026, epsilon = 1e-12);
        assert_eq!(flags.len(), 9);
        assert_eq!(flags.iter().filter(|b| **b).count(), 1);
        assert!(flags[3]);
    }
}
