//! Time-series cross-validation without look-ahead leakage.
//!
//! Two splitters are provided:
//! - [`PurgedKFold`]: contiguous index blocks with purge/embargo gaps around
//!   each test block
//! - [`rolling_splits`]: calendar-time walk-forward train → valid windows
//!
//! Both produce plain index arrays so they can drive any training loop.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

mod purged;
mod rolling;

pub use purged::{Fold, PurgedKFold, PurgedKFoldIter, split};
pub use rolling::{
    RollingSplitConfig, SplitFold, TimeWindow, assert_increasing_windows, assert_no_overlap,
    rolling_splits,
};
