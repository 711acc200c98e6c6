//! Headline performance statistics of a simulation.

use serde::{Deserialize, Serialize};
use vigil_traits::stats;

use crate::{BacktestResult, PortfolioResult};

/// Annualized Sharpe ratio `mean / std * sqrt(ann_fac)` of per-bar returns.
///
/// Uses the population standard deviation. Returns 0 when the deviation is
/// zero or undefined, or when `ann_fac` is unknown or non-positive.
///
/// # Example
///
/// ```
/// use vigil_backtest::sharpe_ratio;
///
/// assert_eq!(sharpe_ratio(&[0.01, 0.01, 0.01], Some(252.0)), 0.0);
/// assert!(sharpe_ratio(&[0.01, 0.02, 0.0], Some(252.0)) > 0.0);
/// assert_eq!(sharpe_ratio(&[0.01, 0.02], None), 0.0);
/// ```
pub fn sharpe_ratio(returns: &[f64], ann_fac: Option<f64>) -> f64 {
    let mu = stats::mean(returns);
    let sd = stats::std_dev(returns, 0);
    match ann_fac {
        Some(ann) if ann > 0.0 && sd.is_finite() && sd > stats::MIN_STD_THRESHOLD => {
            mu / sd * ann.sqrt()
        }
        _ => 0.0,
    }
}

/// Summary of a backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    /// Number of bars.
    pub bars: usize,
    /// Bars per year (0 when unknown).
    pub ann_fac: f64,
    /// Mean net PnL per bar.
    pub mean_ret_bar: f64,
    /// Population std of net PnL per bar.
    pub vol_bar: f64,
    /// Annualized Sharpe ratio.
    pub sharpe: f64,
    /// Final equity.
    pub equity_end: f64,
    /// Most negative drawdown.
    pub max_drawdown: f64,
    /// Mean turnover per bar; absent for aggregated portfolios.
    pub avg_turnover: Option<f64>,
}

impl PerformanceSummary {
    /// Summarize a single-instrument run.
    pub fn from_result(result: &BacktestResult) -> Self {
        Self::build(
            &result.pnl_net,
            &result.equity,
            result.ann_fac,
            Some(&result.turnover),
        )
    }

    /// Summarize an equal-weighted portfolio run.
    pub fn from_portfolio(result: &PortfolioResult) -> Self {
        Self::build(&result.pnl_net, &result.equity, result.ann_fac, None)
    }

    fn build(pnl: &[f64], equity: &[f64], ann_fac: Option<f64>, turnover: Option<&[f64]>) -> Self {
        let pnl: Vec<f64> = pnl
            .iter()
            .map(|p| if p.is_finite() { *p } else { 0.0 })
            .collect();
        let bars = pnl.len();
        let (mean_ret_bar, vol_bar) = if bars == 0 {
            (0.0, 0.0)
        } else {
            (stats::mean(&pnl), stats::std_dev(&pnl, 0))
        };
        let max_drawdown = stats::drawdown(equity)
            .into_iter()
            .fold(0.0_f64, f64::min);

        Self {
            bars,
            ann_fac: ann_fac.unwrap_or(0.0),
            mean_ret_bar,
            vol_bar,
            sharpe: sharpe_ratio(&pnl, ann_fac),
            equity_end: equity.last().copied().unwrap_or(1.0),
            max_drawdown,
            avg_turnover: turnover.map(|t| if t.is_empty() { 0.0 } else { stats::mean(t) }),
        }
    }

    /// Render as a JSON object.
    ///
    /// # Errors
    ///
    /// Propagates serialization errors.
    pub fn to_json(&self) -> vigil_traits::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
