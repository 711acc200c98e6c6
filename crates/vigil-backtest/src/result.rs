//! Simulation outputs.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use vigil_traits::types::{columns, timestamp_column};
use vigil_traits::{Result, Symbol, Timestamp};

/// Per-bar output of a single-instrument simulation.
///
/// All vectors have one entry per input bar. `ret[0]` is `NaN` (no previous
/// price); every other series is finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Instrument identifier.
    pub symbol: Symbol,
    /// Bar timestamps.
    pub timestamps: Vec<Timestamp>,
    /// Simple price return over the bar.
    pub ret: Vec<f64>,
    /// Signal after the latency shift (leading gap filled with 0).
    pub signal_exec: Vec<f64>,
    /// Vol-targeted, leverage-clipped position set at the bar's close.
    pub position: Vec<f64>,
    /// Absolute change in position from the previous bar.
    pub turnover: Vec<f64>,
    /// Previous position times this bar's return.
    pub pnl_gross: Vec<f64>,
    /// Gross PnL less turnover costs.
    pub pnl_net: Vec<f64>,
    /// Compounded equity starting from 1.
    pub equity: Vec<f64>,
    /// `equity / running_max(equity) - 1`.
    pub drawdown: Vec<f64>,
    /// Bars per year, when it could be inferred.
    pub ann_fac: Option<f64>,
}

impl BacktestResult {
    /// An empty result for `symbol`.
    pub fn empty(symbol: impl Into<Symbol>) -> Self {
        Self {
            symbol: symbol.into(),
            timestamps: Vec::new(),
            ret: Vec::new(),
            signal_exec: Vec::new(),
            position: Vec::new(),
            turnover: Vec::new(),
            pnl_gross: Vec::new(),
            pnl_net: Vec::new(),
            equity: Vec::new(),
            drawdown: Vec::new(),
            ann_fac: None,
        }
    }

    /// Number of bars.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Whether no bars were simulated.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Final equity (1.0 for an empty run).
    pub fn final_equity(&self) -> f64 {
        self.equity.last().copied().unwrap_or(1.0)
    }

    /// Convert to a `DataFrame` with one row per bar.
    ///
    /// # Errors
    ///
    /// Propagates polars construction errors.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let n = self.len();
        Ok(DataFrame::new(vec![
            timestamp_column(columns::TIMESTAMP, &self.timestamps)?,
            Column::new(
                columns::SYMBOL.into(),
                vec![self.symbol.as_str(); n],
            ),
            Column::new("ret".into(), &self.ret),
            Column::new("signal_exec".into(), &self.signal_exec),
            Column::new("position".into(), &self.position),
            Column::new("turnover".into(), &self.turnover),
            Column::new("pnl_gross".into(), &self.pnl_gross),
            Column::new("pnl_net".into(), &self.pnl_net),
            Column::new("equity".into(), &self.equity),
            Column::new("drawdown".into(), &self.drawdown),
        ])?)
    }
}

/// Equal-weighted aggregate of several single-instrument runs.
///
/// The time axis is the union of all symbols' timestamps. A symbol without a
/// bar at some timestamp contributes 0 to that bar's mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioResult {
    /// Union of all symbols' timestamps, ascending.
    pub timestamps: Vec<Timestamp>,
    /// Mean net PnL across all symbols.
    pub pnl_net: Vec<f64>,
    /// Compounded portfolio equity.
    pub equity: Vec<f64>,
    /// Portfolio drawdown.
    pub drawdown: Vec<f64>,
    /// Bars per year of the union axis, when it could be inferred.
    pub ann_fac: Option<f64>,
    /// Per-symbol runs, in symbol order.
    pub legs: Vec<BacktestResult>,
}

impl PortfolioResult {
    /// Number of bars on the union axis.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Whether the portfolio has no bars.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Run for a single symbol.
    pub fn leg(&self, symbol: &str) -> Option<&BacktestResult> {
        self.legs.iter().find(|l| l.symbol == symbol)
    }

    /// Convert the aggregate series to a `DataFrame`.
    ///
    /// # Errors
    ///
    /// Propagates polars construction errors.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        Ok(DataFrame::new(vec![
            timestamp_column(columns::TIMESTAMP, &self.timestamps)?,
            Column::new("pnl_net".into(), &self.pnl_net),
            Column::new("equity".into(), &self.equity),
            Column::new("drawdown".into(), &self.drawdown),
        ])?)
    }

    /// Stack every leg's per-bar output into one long `DataFrame`.
    ///
    /// # Errors
    ///
    /// Propagates polars construction errors.
    pub fn legs_dataframe(&self) -> Result<DataFrame> {
        let mut frames = self.legs.iter().map(BacktestResult::to_dataframe);
        let Some(first) = frames.next() else {
            return BacktestResult::empty("").to_dataframe();
        };
        let mut out = first?;
        for df in frames {
            out.vstack_mut(&df?)?;
        }
        Ok(out)
    }
}
