//! Engine configuration.

use serde::{Deserialize, Serialize};
use vigil_traits::{Result, VigilError};

/// Execution and sizing parameters for the simulation engine.
///
/// Missing fields fall back to the defaults when deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Exchange fee per unit of turnover, in basis points.
    pub fee_bps: f64,
    /// Slippage per unit of turnover, in basis points.
    pub slippage_bps: f64,
    /// Bars between signal generation and execution.
    pub latency_bars: usize,
    /// Desired annualized volatility of each position.
    pub target_vol_ann: f64,
    /// Symmetric cap on absolute position size.
    pub max_leverage: f64,
    /// Bars in the trailing realized-volatility window (>= 2).
    pub vol_lookback: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            fee_bps: 1.0,
            slippage_bps: 1.0,
            latency_bars: 1,
            target_vol_ann: 0.20,
            max_leverage: 3.0,
            vol_lookback: 60,
        }
    }
}

impl BacktestConfig {
    /// A frictionless configuration: no fees, no slippage.
    pub fn frictionless() -> Self {
        Self {
            fee_bps: 0.0,
            slippage_bps: 0.0,
            ..Self::default()
        }
    }

    /// Parse and validate from JSON such as `{"fee_bps": 2.0, "vol_lookback": 24}`.
    ///
    /// # Errors
    ///
    /// Returns a JSON error for malformed input or
    /// [`VigilError::InvalidConfig`] for out-of-range values.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Combined per-unit-turnover cost as a fraction.
    pub fn cost_rate(&self) -> f64 {
        (self.fee_bps + self.slippage_bps) * 1e-4
    }

    /// Check parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::InvalidConfig`] for negative or non-finite costs,
    /// a non-positive target volatility or leverage cap, or `vol_lookback < 2`.
    pub fn validate(&self) -> Result<()> {
        for (name, v) in [("fee_bps", self.fee_bps), ("slippage_bps", self.slippage_bps)] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(VigilError::config(format!(
                    "{name} must be finite and >= 0, got {v}"
                )));
            }
        }
        if !(self.target_vol_ann.is_finite() && self.target_vol_ann > 0.0) {
            return Err(VigilError::config(format!(
                "target_vol_ann must be finite and > 0, got {}",
                self.target_vol_ann
            )));
        }
        if !(self.max_leverage.is_finite() && self.max_leverage > 0.0) {
            return Err(VigilError::config(format!(
                "max_leverage must be finite and > 0, got {}",
                self.max_leverage
            )));
        }
        if self.vol_lookback < 2 {
            return Err(VigilError::config(format!(
                "vol_lookback must be >= 2, got {}",
                self.vol_lookback
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults() {
        let cfg = BacktestConfig::default();
        assert!(cfg.validate().is_ok());
        assert_relative_eq!(cfg.cost_rate(), 2e-4);
        assert_eq!(cfg.latency_bars, 1);
        assert_eq!(cfg.vol_lookback, 60);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg = BacktestConfig::from_json_str(r#"{"fee_bps": 5.0, "latency_bars": 0}"#).unwrap();
        assert_relative_eq!(cfg.fee_bps, 5.0);
        assert_relative_eq!(cfg.slippage_bps, 1.0);
        assert_eq!(cfg.latency_bars, 0);
    }

    #[test]
    fn test_invalid_values() {
        let bad = [
            BacktestConfig {
                fee_bps: -1.0,
                ..Default::default()
            },
            BacktestConfig {
                target_vol_ann: 0.0,
                ..Default::default()
            },
            BacktestConfig {
                max_leverage: f64::NAN,
                ..Default::default()
            },
            BacktestConfig {
                vol_lookback: 1,
                ..Default::default()
            },
        ];
        for cfg in bad {
            assert!(cfg.validate().is_err(), "{cfg:?}");
        }
        assert!(BacktestConfig::from_json_str(r#"{"vol_lookback": 0}"#).is_err());
    }

    #[test]
    fn test_frictionless() {
        assert_relative_eq!(BacktestConfig::frictionless().cost_rate(), 0.0);
    }
}
