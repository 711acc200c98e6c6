//! Label generators for supervised learning on price paths.
//!
//! This crate turns close-price series into targets:
//! - Fixed-horizon: sign (or raw value) of the forward log-return
//! - Triple-barrier: which of an upper, lower or time barrier is hit first
//!
//! Bars within `horizon` of the end of a series cannot be scored; they are
//! marked through an explicit [`TailPolicy`](vigil_traits::TailPolicy) rather
//! than silently assigned a class.
//!
//! # Example
//!
//! ```ignore
//! use vigil_labels::{label_frame, LabelSpec, NanPolicy, TripleBarrierConfig};
//!
//! let spec = LabelSpec::TripleBarrier(TripleBarrierConfig::default());
//! let labels = label_frame(&frame, &spec, NanPolicy::Keep)?;
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

mod fixed_horizon;
mod spec;
mod table;
mod triple_barrier;

// Re-export key types
pub use fixed_horizon::{FixedHorizon, FixedHorizonConfig, FixedHorizonMode};
pub use spec::{LabelSpec, LabelerKind};
pub use table::{LabelTable, NanPolicy, label_frame};
pub use triple_barrier::{BarrierEvent, BarrierTouch, TripleBarrier, TripleBarrierConfig};

use vigil_traits::{Result, VigilError};

/// Prices must be finite and strictly positive to take logarithms.
fn check_prices(prices: &[f64]) -> Result<()> {
    match prices.iter().position(|p| !(p.is_finite() && *p > 0.0)) {
        Some(i) => Err(VigilError::data(format!(
            "price at row {i} must be finite and > 0, got {}",
            prices[i]
        ))),
        None => Ok(()),
    }
}
