//! Statistical backtests of VaR breach series.
//!
//! Both tests build a likelihood-ratio statistic in log space, using the
//! convention `0 · ln 0 = 0`, and report its χ²(1) upper-tail probability.

use statrs::distribution::{ChiSquared, ContinuousCDF};
use tracing::debug;

/// Kupiec proportion-of-failures test.
///
/// Compares the observed breach rate `x / n` with the expected
/// `failure_rate` (`1 - alpha` for a VaR at confidence `alpha`).
///
/// Returns the p-value, or `NaN` with fewer than 2 observations.
///
/// # Example
///
/// ```
/// use vigil_risk::kupiec_pof_test;
///
/// let mut breaches = vec![false; 1000];
/// for i in (0..1000).step_by(100) {
///     breaches[i] = true;
/// }
/// assert!(kupiec_pof_test(&breaches, 0.01) > 0.99);
/// ```
pub fn kupiec_pof_test(breaches: &[bool], failure_rate: f64) -> f64 {
    let n = breaches.len();
    if n < 2 || !(0.0..=1.0).contains(&failure_rate) {
        return f64::NAN;
    }
    let x = breaches.iter().filter(|b| **b).count() as f64;
    let n = n as f64;
    let pi_hat = x / n;

    let ll_null = binomial_ll(x, n - x, failure_rate);
    let ll_alt = binomial_ll(x, n - x, pi_hat);
    let lr = -2.0 * (ll_null - ll_alt);
    debug!(n, breaches = x, pi_hat, lr, "kupiec test");
    chi2_pvalue(lr)
}

/// Christoffersen independence test.
///
/// Fits a first-order Markov chain to the breach indicator and compares it
/// against an i.i.d. Bernoulli model; clustered breaches give a small p-value.
///
/// Returns the p-value, or `NaN` with fewer than 2 observations.
pub fn christoffersen_ind_test(breaches: &[bool]) -> f64 {
    if breaches.len() < 2 {
        return f64::NAN;
    }

    // n[i][j]: transitions from state i to state j.
    let mut n = [[0.0_f64; 2]; 2];
    for w in breaches.windows(2) {
        n[usize::from(w[0])][usize::from(w[1])] += 1.0;
    }
    let [[n00, n01], [n10, n11]] = n;

    let pi = (n01 + n11) / (n00 + n01 + n10 + n11);
    let pi0 = ratio(n01, n00 + n01);
    let pi1 = ratio(n11, n10 + n11);

    let ll_iid = binomial_ll(n01 + n11, n00 + n10, pi);
    let ll_markov = binomial_ll(n01, n00, pi0) + binomial_ll(n11, n10, pi1);
    let lr = -2.0 * (ll_iid - ll_markov);
    debug!(n00, n01, n10, n11, lr, "christoffersen test");
    chi2_pvalue(lr)
}

/// `hits · ln p + misses · ln(1 - p)` with `0 · ln 0 = 0`.
fn binomial_ll(hits: f64, misses: f64, p: f64) -> f64 {
    xlny(hits, p) + xlny(misses, 1.0 - p)
}

fn xlny(x: f64, y: f64) -> f64 {
    if x == 0.0 { 0.0 } else { x * y.ln() }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 { num / den } else { 0.0 }
}

/// Upper-tail χ²(1) probability; a diverging statistic gives 0.
fn chi2_pvalue(lr: f64) -> f64 {
    if lr.is_nan() {
        return f64::NAN;
    }
    if lr.is_infinite() {
        return 0.0;
    }
    match ChiSquared::new(1.0) {
        Ok(chi2) => 1.0 - chi2.cdf(lr.max(0.0)),
        Err(_) => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn every(n: usize, k: usize) -> Vec<bool> {
        (0..n).map(|i| i % k == 0).collect()
    }

    #[test]
    fn test_kupiec_calibrated() {
        let b = every(1000, 100);
        assert_eq!(b.iter().filter(|x| **x).count(), 10);
        assert_relative_eq!(kupiec_pof_test(&b, 0.01), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_kupiec_rejects_too_many_breaches() {
        // 5% breaches against a 1% target.
        let p = kupiec_pof_test(&every(1000, 20), 0.01);
        assert!(p < 1e-6, "{p}");
    }

    #[test]
    fn test_kupiec_known_value() {
        // n = 250, x = 5, p = 0.01:
        // LR = -2 [5 ln 0.01 + 245 ln 0.99 - 5 ln 0.02 - 245 ln 0.98]
        let mut b = vec![false; 250];
        b[..5].iter_mut().for_each(|x| *x = true);
        let lr: f64 = -2.0
            * (5.0 * 0.01_f64.ln() + 245.0 * 0.99_f64.ln()
                - 5.0 * 0.02_f64.ln()
                - 245.0 * 0.98_f64.ln());
        let expected = 1.0 - ChiSquared::new(1.0).unwrap().cdf(lr);
        assert_relative_eq!(kupiec_pof_test(&b, 0.01), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_kupiec_no_breaches() {
        let p = kupiec_pof_test(&[false; 100], 0.01);
        assert!(p > 0.1 && p < 1.0);
        // Impossible under a zero failure rate.
        assert_eq!(kupiec_pof_test(&[true, false], 0.0), 0.0);
    }

    #[test]
    fn test_short_series_nan() {
        assert!(kupiec_pof_test(&[], 0.01).is_nan());
        assert!(kupiec_pof_test(&[true], 0.01).is_nan());
        assert!(christoffersen_ind_test(&[true]).is_nan());
    }

    #[test]
    fn test_christoffersen_clustered_vs_spread() {
        let spread = every(500, 25);
        let mut clustered = vec![false; 500];
        clustered[100..120].iter_mut().for_each(|x| *x = true);

        let p_spread = christoffersen_ind_test(&spread);
        let p_clustered = christoffersen_ind_test(&clustered);
        assert!(p_spread > 0.05, "{p_spread}");
        assert!(p_clustered < 1e-6, "{p_clustered}");
    }

    #[test]
    fn test_christoffersen_degenerate_chains() {
        // Never or always breached: both models coincide.
        assert_relative_eq!(christoffersen_ind_test(&[false; 50]), 1.0);
        assert_relative_eq!(christoffersen_ind_test(&[true; 50]), 1.0);
    }
}
