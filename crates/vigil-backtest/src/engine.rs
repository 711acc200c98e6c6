//! Vol-targeted simulation engine.
//!
//! For each bar `t` of one instrument:
//!
//! ```text
//! signal_exec_t = signal_{t - latency}            (0 before the first executable bar)
//! ret_t         = price_t / price_{t-1} - 1
//! vol_t         = std(ret_{t-lookback..t-1}) * sqrt(ann_fac)
//! position_t    = clip(signal_exec_t * target_vol / vol_t, ±max_leverage)
//! pnl_gross_t   = position_{t-1} * ret_t
//! pnl_net_t     = pnl_gross_t - |position_t - position_{t-1}| * cost_rate
//! ```
//!
//! Undefined or zero volatility yields a flat position.

use std::collections::BTreeMap;

use ndarray::{Array1, ArrayView1, Zip};
use rayon::prelude::*;
use tracing::{debug, info, warn};
use vigil_traits::stats::{self, MIN_STD_THRESHOLD};
use vigil_traits::{PriceSignalFrame, Result, SymbolSeries, Timestamp, annualization_factor};

use crate::{BacktestConfig, BacktestResult, PortfolioResult};

/// Simulation engine bound to a validated configuration.
///
/// # Example
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use vigil_backtest::{Backtest, BacktestConfig};
/// use vigil_traits::SymbolSeries;
///
/// let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
/// let ts: Vec<_> = (0..4).map(|i| t0 + Duration::hours(i)).collect();
/// let series = SymbolSeries::new("BTC", ts, vec![100.0, 101.0, 99.0, 102.0], vec![1.0; 4]).unwrap();
///
/// let bt = Backtest::new(BacktestConfig { vol_lookback: 2, ..Default::default() }).unwrap();
/// let result = bt.run_series(&series).unwrap();
///
/// assert_eq!(result.len(), 4);
/// assert_eq!(result.pnl_gross[0], 0.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Backtest {
    config: BacktestConfig,
}

impl Backtest {
    /// Create an engine after validating `config`.
    ///
    /// # Errors
    ///
    /// See [`BacktestConfig::validate`].
    pub fn new(config: BacktestConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The engine's configuration.
    pub const fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Simulate one instrument.
    ///
    /// An empty series yields an empty result. With fewer than two bars the
    /// annualization factor is unknown and the position stays flat.
    ///
    /// # Errors
    ///
    /// Returns an error only if the bar spacing is not positive, which a
    /// validated [`SymbolSeries`] rules out.
    pub fn run_series(&self, series: &SymbolSeries) -> Result<BacktestResult> {
        let cfg = &self.config;
        let n = series.len();
        if n == 0 {
            return Ok(BacktestResult::empty(series.symbol()));
        }

        let ann_fac = annualization_factor(series.timestamps())?;
        let signal_exec = shift_signal(series.signals(), cfg.latency_bars);
        let ret = simple_returns(series.prices());
        let vol_ann = trailing_vol(&ret, cfg.vol_lookback, ann_fac);

        let position: Array1<f64> = Zip::from(&signal_exec)
            .and(&vol_ann)
            .map_collect(|&s, &v| {
                if v.is_finite() && v > MIN_STD_THRESHOLD {
                    (s * cfg.target_vol_ann / v).clamp(-cfg.max_leverage, cfg.max_leverage)
                } else {
                    0.0
                }
            });

        let prev_position = lag(&position, 0.0);
        let pnl_gross: Array1<f64> = Zip::from(&prev_position)
            .and(ArrayView1::from(&ret))
            .map_collect(|&p, &r| if r.is_finite() { p * r } else { 0.0 });

        let mut turnover = (&position - &prev_position).mapv(f64::abs);
        turnover[0] = 0.0;
        let pnl_net = &pnl_gross - &(&turnover * cfg.cost_rate());

        let pnl_net = pnl_net.to_vec();
        let equity = stats::equity_curve(&pnl_net);
        let drawdown = stats::drawdown(&equity);

        if vol_ann.iter().all(|v| !v.is_finite() || *v <= MIN_STD_THRESHOLD) {
            warn!(
                symbol = series.symbol(),
                bars = n,
                vol_lookback = cfg.vol_lookback,
                "no bar had a usable volatility estimate; position is flat throughout"
            );
        }
        debug!(
            symbol = series.symbol(),
            bars = n,
            ann_fac = ann_fac.unwrap_or(f64::NAN),
            final_equity = equity.last().copied().unwrap_or(1.0),
            "simulated series"
        );

        Ok(BacktestResult {
            symbol: series.symbol().to_string(),
            timestamps: series.timestamps().to_vec(),
            ret,
            signal_exec: signal_exec.to_vec(),
            position: position.to_vec(),
            turnover: turnover.to_vec(),
            pnl_gross: pnl_gross.to_vec(),
            pnl_net,
            equity,
            drawdown,
            ann_fac,
        })
    }

    /// Simulate every symbol of `frame` in parallel and aggregate them with
    /// equal weights.
    ///
    /// # Errors
    ///
    /// Propagates the first per-symbol failure.
    pub fn run(&self, frame: &PriceSignalFrame) -> Result<PortfolioResult> {
        let legs = frame
            .series()
            .par_iter()
            .map(|s| self.run_series(s))
            .collect::<Result<Vec<_>>>()?;

        let portfolio = aggregate_equal_weight(legs)?;
        info!(
            symbols = portfolio.legs.len(),
            bars = portfolio.len(),
            ann_fac = portfolio.ann_fac.unwrap_or(f64::NAN),
            "portfolio simulated"
        );
        Ok(portfolio)
    }
}

/// Simulate a single instrument with `config`.
///
/// # Errors
///
/// Returns [`vigil_traits::VigilError::InvalidConfig`] for an invalid config.
pub fn simulate_series(series: &SymbolSeries, config: &BacktestConfig) -> Result<BacktestResult> {
    Backtest::new(*config)?.run_series(series)
}

/// Simulate a multi-instrument frame with `config`.
///
/// # Errors
///
/// Returns [`vigil_traits::VigilError::InvalidConfig`] for an invalid config.
pub fn simulate(frame: &PriceSignalFrame, config: &BacktestConfig) -> Result<PortfolioResult> {
    Backtest::new(*config)?.run(frame)
}

/// Mean net PnL across all legs on the union time axis.
fn aggregate_equal_weight(legs: Vec<BacktestResult>) -> Result<PortfolioResult> {
    let mut sums: BTreeMap<Timestamp, f64> = BTreeMap::new();
    for leg in &legs {
        for (&ts, &pnl) in leg.timestamps.iter().zip(&leg.pnl_net) {
            *sums.entry(ts).or_insert(0.0) += if pnl.is_finite() { pnl } else { 0.0 };
        }
    }

    let n_symbols = legs.len().max(1) as f64;
    let (timestamps, pnl_net): (Vec<_>, Vec<_>) = sums
        .into_iter()
        .map(|(ts, sum)| (ts, sum / n_symbols))
        .unzip();
    let equity = stats::equity_curve(&pnl_net);
    let drawdown = stats::drawdown(&equity);
    let ann_fac = annualization_factor(&timestamps)?;

    Ok(PortfolioResult {
        timestamps,
        pnl_net,
        equity,
        drawdown,
        ann_fac,
        legs,
    })
}

/// Delay `signal` by `bars`, treating NaN as 0.
fn shift_signal(signal: &[f64], bars: usize) -> Array1<f64> {
    Array1::from_shape_fn(signal.len(), |i| {
        i.checked_sub(bars)
            .map(|j| signal[j])
            .filter(|s| s.is_finite())
            .unwrap_or(0.0)
    })
}

/// Simple returns; the first bar has none.
fn simple_returns(prices: &[f64]) -> Vec<f64> {
    std::iter::once(f64::NAN)
        .chain(prices.windows(2).map(|w| w[1] / w[0] - 1.0))
        .take(prices.len())
        .collect()
}

/// Annualized trailing volatility known at the start of each bar.
///
/// Requires a full window of `lookback` returns (sample std), then lags by one
/// bar so bar `t` never sees its own return.
fn trailing_vol(ret: &[f64], lookback: usize, ann_fac: Option<f64>) -> Array1<f64> {
    let Some(ann_fac) = ann_fac else {
        return Array1::from_elem(ret.len(), f64::NAN);
    };
    let rv = Array1::from(stats::rolling_std(ret, lookback, lookback, 1));
    lag(&rv, f64::NAN) * ann_fac.sqrt()
}

/// Shift `values` one bar later, filling the first slot with `fill`.
fn lag(values: &Array1<f64>, fill: f64) -> Array1<f64> {
    Array1::from_shape_fn(values.len(), |i| if i == 0 { fill } else { values[i - 1] })
}
