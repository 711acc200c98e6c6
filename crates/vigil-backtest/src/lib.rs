//! Signal-to-PnL simulation.
//!
//! A raw signal is delayed by the execution latency, scaled to a target
//! annualized volatility using trailing realized volatility, clipped to a
//! leverage cap, and charged proportional costs on turnover. PnL at bar `t`
//! always uses the position held from `t - 1`.
//!
//! Multi-asset runs simulate each symbol independently and aggregate net PnL
//! as an equal-weighted mean over all symbols.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod config;
pub mod engine;
pub mod result;
pub mod signals;
pub mod summary;

// Re-export main types
pub use config::BacktestConfig;
pub use engine::{Backtest, simulate, simulate_series};
pub use result::{BacktestResult, PortfolioResult};
pub use signals::BaselineSignal;
pub use summary::{PerformanceSummary, sharpe_ratio};
