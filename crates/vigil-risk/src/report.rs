//! Risk report assembled from a PnL series.

use std::collections::BTreeMap;
use std::fmt;

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;
use vigil_backtest::{BacktestResult, PortfolioResult, sharpe_ratio};
use vigil_traits::{Result, Timestamp, VigilError, annualization_factor, stats};

use crate::metrics::{
    ann_vol, es_historic, max_drawdown, var_breaches, var_cornish_fisher,
};
use crate::var_backtest::{christoffersen_ind_test, kupiec_pof_test};

/// Risk report parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// VaR / ES confidence level, strictly between 0 and 1.
    pub alpha: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self { alpha: 0.99 }
    }
}

impl RiskConfig {
    /// Parse and validate from JSON, e.g. `{"alpha": 0.95}`.
    ///
    /// # Errors
    ///
    /// Returns a JSON or configuration error.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check that `alpha` lies in `(0, 1)`.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::InvalidConfig`] otherwise.
    pub fn validate(&self) -> Result<()> {
        if self.alpha > 0.0 && self.alpha < 1.0 {
            Ok(())
        } else {
            Err(VigilError::config(format!(
                "alpha must be in (0, 1), got {}",
                self.alpha
            )))
        }
    }
}

/// Scalar risk metrics of one PnL series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    /// Confidence level used for VaR and ES.
    pub alpha: f64,
    /// Finite observations used.
    pub bars: usize,
    /// Bars per year (0 when unknown).
    pub ann_fac: f64,
    /// Annualized Sharpe ratio (0 when undefined).
    pub sharpe: f64,
    /// Most negative drawdown.
    pub max_drawdown: f64,
    /// Population std of per-bar PnL.
    pub vol_bar: f64,
    /// Annualized volatility (`NaN` when the bar frequency is unknown).
    pub ann_vol: f64,
    /// Historical VaR (positive = loss).
    pub var_historic: f64,
    /// Historical Expected Shortfall.
    pub es_historic: f64,
    /// Cornish-Fisher VaR.
    pub var_cornish_fisher: f64,
    /// Bars whose loss exceeded the historical VaR.
    pub n_breaches: usize,
    /// Kupiec proportion-of-failures p-value.
    pub kupiec_pvalue: f64,
    /// Christoffersen independence p-value.
    pub christoffersen_pvalue: f64,
}

/// Compute a [`RiskReport`] from per-bar PnL and its timestamps.
///
/// The bar frequency, and so the annualization, is inferred from
/// `timestamps` exactly as the simulation engine does.
///
/// # Errors
///
/// Returns [`VigilError::InvalidConfig`] for `alpha` outside `(0, 1)` and
/// [`VigilError::InvalidData`] when the lengths differ or the timestamps are
/// not increasing.
///
/// # Example
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use vigil_risk::summarize;
///
/// let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
/// let ts: Vec<_> = (0..4).map(|i| t0 + Duration::days(i)).collect();
/// let report = summarize(&ts, &[0.0, 0.01, -0.02, 0.005], 0.95).unwrap();
///
/// assert_eq!(report.bars, 4);
/// assert!(report.es_historic >= report.var_historic);
/// ```
pub fn summarize(timestamps: &[Timestamp], pnl: &[f64], alpha: f64) -> Result<RiskReport> {
    RiskConfig { alpha }.validate()?;
    if timestamps.len() != pnl.len() {
        return Err(VigilError::data(format!(
            "{} timestamps for {} PnL values",
            timestamps.len(),
            pnl.len()
        )));
    }

    let ann_fac = annualization_factor(timestamps)?;
    let (var_historic, breaches) = var_breaches(pnl, alpha);
    let n_breaches = breaches.iter().filter(|b| **b).count();

    let report = RiskReport {
        alpha,
        bars: stats::finite(pnl).len(),
        ann_fac: ann_fac.unwrap_or(0.0),
        sharpe: sharpe_ratio(pnl, ann_fac),
        max_drawdown: max_drawdown(pnl),
        vol_bar: stats::std_dev(pnl, 0),
        ann_vol: ann_fac.map_or(f64::NAN, |a| ann_vol(pnl, a)),
        var_historic,
        es_historic: es_historic(pnl, alpha),
        var_cornish_fisher: var_cornish_fisher(pnl, alpha),
        n_breaches,
        kupiec_pvalue: kupiec_pof_test(&breaches, 1.0 - alpha),
        christoffersen_pvalue: christoffersen_ind_test(&breaches),
    };
    info!(
        bars = report.bars,
        alpha,
        sharpe = report.sharpe,
        var = report.var_historic,
        breaches = n_breaches,
        "risk summary computed"
    );
    Ok(report)
}

impl RiskReport {
    /// Report on the net PnL of a single-instrument run.
    ///
    /// # Errors
    ///
    /// See [`summarize`].
    pub fn from_backtest(result: &BacktestResult, config: &RiskConfig) -> Result<Self> {
        summarize(&result.timestamps, &result.pnl_net, config.alpha)
    }

    /// Report on the net PnL of an equal-weighted portfolio.
    ///
    /// # Errors
    ///
    /// See [`summarize`].
    pub fn from_portfolio(result: &PortfolioResult, config: &RiskConfig) -> Result<Self> {
        summarize(&result.timestamps, &result.pnl_net, config.alpha)
    }

    /// Metrics as a name → value map.
    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        BTreeMap::from([
            ("alpha", self.alpha),
            ("bars", self.bars as f64),
            ("ann_fac", self.ann_fac),
            ("sharpe", self.sharpe),
            ("max_drawdown", self.max_drawdown),
            ("vol_bar", self.vol_bar),
            ("ann_vol", self.ann_vol),
            ("var_historic", self.var_historic),
            ("es_historic", self.es_historic),
            ("var_cornish_fisher", self.var_cornish_fisher),
            ("n_breaches", self.n_breaches as f64),
            ("kupiec_pvalue", self.kupiec_pvalue),
            ("christoffersen_pvalue", self.christoffersen_pvalue),
        ])
    }

    /// Two-column `metric` / `value` table.
    ///
    /// # Errors
    ///
    /// Propagates polars construction errors.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let (names, values): (Vec<&str>, Vec<f64>) = self.to_map().into_iter().unzip();
        Ok(DataFrame::new(vec![
            Column::new("metric".into(), names),
            Column::new("value".into(), values),
        ])?)
    }

    /// Render a Markdown report with a summary and a VaR-backtest section.
    pub fn to_markdown(&self, title: &str) -> String {
        Markdown {
            report: self,
            title,
        }
        .to_string()
    }
}

struct Markdown<'a> {
    report: &'a RiskReport,
    title: &'a str,
}

impl fmt::Display for Markdown<'_> {
    fn fmt(&self, md: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { report: r, title } = self;
        let pct = r.alpha * 100.0;
        writeln!(md, "# {title}\n")?;
        writeln!(md, "## Summary")?;
        writeln!(md, "- Observations: {}", r.bars)?;
        writeln!(md, "- Sharpe: {:.4}", r.sharpe)?;
        writeln!(md, "- Ann. Vol: {:.4}", r.ann_vol)?;
        writeln!(md, "- Max Drawdown: {:.4}", r.max_drawdown)?;
        writeln!(md, "- VaR (hist, {pct:.2}%): {:.4}", r.var_historic)?;
        writeln!(md, "- ES (hist, {pct:.2}%): {:.4}", r.es_historic)?;
        writeln!(
            md,
            "- VaR (Cornish-Fisher, {pct:.2}%): {:.4}",
            r.var_cornish_fisher
        )?;
        writeln!(md, "\n## VaR Backtests")?;
        writeln!(md, "- Breaches: {}", r.n_breaches)?;
        writeln!(md, "- Kupiec p-value: {}", fmt_pvalue(r.kupiec_pvalue))?;
        writeln!(
            md,
            "- Christoffersen p-value: {}",
            fmt_pvalue(r.christoffersen_pvalue)
        )
    }
}

fn fmt_pvalue(p: f64) -> String {
    if p.is_nan() {
        "NaN".to_string()
    } else {
        format!("{p:.4}")
    }
}
