#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/vigil-quant/vigil/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core types for the Vigil backtesting and validation framework.
//!
//! This crate provides the foundational abstractions shared by the labelers,
//! the cross-validation splitters, the simulation engine and the risk module.

/// The version of the vigil-traits crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Module declarations
pub mod error;
pub mod label;
pub mod stats;
pub mod time;
pub mod types;

// Re-exports
pub use error::{Result, VigilError};
pub use label::{LabelValues, Labeler, TailPolicy};
pub use time::{SECONDS_PER_YEAR, Timestamp, annualization_factor};
pub use types::{PriceSignalFrame, Symbol, SymbolSeries};
