//! Risk metrics and Value-at-Risk validation.
//!
//! Conventions: inputs are per-bar returns (or net PnL), `NaN` entries are
//! ignored, and VaR/ES are reported as positive numbers for losses.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod metrics;
pub mod report;
pub mod var_backtest;

pub use metrics::{
    DrawdownCurve, ann_vol, drawdown_curve, es_historic, max_drawdown, var_breaches,
    var_cornish_fisher, var_historic,
};
pub use report::{RiskConfig, RiskReport, summarize};
pub use var_backtest::{christoffersen_ind_test, kupiec_pof_test};
