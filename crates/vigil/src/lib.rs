#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/vigil-quant/vigil/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! # vigil
//!
//! vigil is an umbrella crate that re-exports all vigil sub-crates for convenience.
//!
//! ## Quick Start
//!
//! ```ignore
//! use vigil::prelude::*;
//!
//! # fn main() -> vigil::Result<()> {
//! let frame = PriceSignalFrame::from_dataframe(&df)?;
//!
//! // Targets for model training
//! let spec = LabelSpec::TripleBarrier(TripleBarrierConfig::default());
//! let labels = label_frame(&frame, &spec, NanPolicy::DropUnlabeled)?;
//!
//! // Leakage-safe folds over the feature table
//! for fold in PurgedKFold::new(5, 24, 24)?.split(labels.len()) {
//!     // fit on fold.train_idx, score fold.test_idx
//! }
//!
//! // Simulate the model's signal and validate its risk
//! let portfolio = simulate(&frame, &BacktestConfig::default())?;
//! let report = RiskReport::from_portfolio(&portfolio, &RiskConfig::default())?;
//! println!("{}", report.to_markdown("Model A"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Organization
//!
//! - [`traits`] - Shared types, errors and statistics
//! - [`labels`] - Label generators
//! - [`cv`] - Cross-validation splitters
//! - [`backtest`] - Simulation engine
//! - [`risk`] - Risk metrics and VaR backtests

/// Version information for the vigil crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Core Types
// ============================================================================

/// Shared types, errors and statistics.
pub mod traits {
    pub use vigil_traits::*;
}

// Re-export error types
pub use vigil_traits::{Result, VigilError};

// Re-export common types
pub use vigil_traits::{Labeler, PriceSignalFrame, Symbol, SymbolSeries, Timestamp};

// ============================================================================
// Labels
// ============================================================================

/// Label generators.
///
/// - **FixedHorizon**: sign (or value) of the forward log-return
/// - **TripleBarrier**: first of an upper, lower or vertical barrier touched
///
/// Bars too close to the end of a series to be scored are left unlabeled
/// unless a fill value is chosen explicitly.
pub mod labels {
    pub use vigil_labels::*;
}

// ============================================================================
// Cross-Validation
// ============================================================================

/// Cross-validation splitters.
///
/// ```text
/// fold k:   [ train ][purge][  test k  ][embargo][ train ]
/// ```
pub mod cv {
    pub use vigil_cv::*;
}

// ============================================================================
// Backtesting
// ============================================================================

/// Simulation engine.
///
/// ```text
/// position_t  = clip(signal_{t-latency} * target_vol / vol_{t-1}, ±max_leverage)
/// pnl_net_t   = position_{t-1} * ret_t - |Δposition_t| * (fee + slippage)
/// ```
pub mod backtest {
    pub use vigil_backtest::*;
}

// ============================================================================
// Risk
// ============================================================================

/// Risk metrics and VaR backtests.
pub mod risk {
    pub use vigil_risk::*;
}

// ============================================================================
// Prelude
// ============================================================================

/// Prelude module for convenient imports.
///
/// ```ignore
/// use vigil::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{PriceSignalFrame, Result, SymbolSeries, Timestamp, VigilError};
    pub use vigil_backtest::{
        Backtest, BacktestConfig, BacktestResult, BaselineSignal, PerformanceSummary,
        PortfolioResult, simulate, simulate_series,
    };
    pub use vigil_cv::{PurgedKFold, RollingSplitConfig, rolling_splits};
    pub use vigil_labels::{
        FixedHorizonConfig, FixedHorizonMode, LabelSpec, NanPolicy, TripleBarrierConfig,
        label_frame,
    };
    pub use vigil_risk::{RiskConfig, RiskReport, summarize};
    pub use vigil_traits::{Labeler, TailPolicy};
}

// ============================================================================
// Tests
// ============================================================================
