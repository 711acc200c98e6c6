//! Error types for the Vigil framework.
//!
//! Malformed input *shape* (missing columns, unordered timestamps, invalid
//! configuration) is reported through [`VigilError`]. Degenerate *values* inside
//! well-shaped input (flat prices, zero volatility, too few observations for a
//! test statistic) are not errors: the computations return neutral values instead.

use thiserror::Error;

/// The main error type for Vigil operations.
#[derive(Debug, Error)]
pub enum VigilError {
    /// A configuration value is out of its valid range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error due to invalid or malformed data.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Error when a required column is missing from the data.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Timestamps for a series are not strictly increasing.
    #[error("Non-monotonic timestamps for '{symbol}' at row {row}")]
    NonMonotonicTimestamps {
        /// Instrument whose time axis is broken.
        symbol: String,
        /// Row (within the symbol's series) where the order breaks.
        row: usize,
    },

    /// A timestamp column carries no timezone.
    #[error("Timestamp column '{0}' must be timezone-aware (UTC recommended)")]
    TimezoneNaive(String),

    /// Error from Polars operations.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Error decoding a JSON configuration.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VigilError {
    /// Shorthand for an [`VigilError::InvalidConfig`] error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Shorthand for an [`VigilError::InvalidData`] error.
    pub fn data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }
}

/// A specialized Result type for Vigil operations.
pub type Result<T> = std::result::Result<T, VigilError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VigilError::MissingColumn("price".to_string());
        assert_eq!(err.to_string(), "Missing required column: price");

        let err = VigilError::NonMonotonicTimestamps {
            symbol: "BTC-USD".to_string(),
            row: 3,
        };
        assert_eq!(
            err.to_string(),
            "Non-monotonic timestamps for 'BTC-USD' at row 3"
        );
    }

    #[test]
    fn test_error_shorthands() {
        assert!(matches!(
            VigilError::config("n_splits must be >= 2"),
            VigilError::InvalidConfig(_)
        ));
        assert!(matches!(VigilError::data("bad"), VigilError::InvalidData(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let parsed: std::result::Result<u32, _> = serde_json::from_str("not json");
        let err: VigilError = parsed.unwrap_err().into();
        assert!(matches!(err, VigilError::Json(_)));
    }
}
