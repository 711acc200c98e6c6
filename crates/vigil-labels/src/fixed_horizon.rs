//! Fixed-horizon forward-return labels.

use serde::{Deserialize, Serialize};
use vigil_traits::{LabelValues, Labeler, Result, TailPolicy, VigilError};

use crate::check_prices;

/// Output mode of the fixed-horizon labeler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FixedHorizonMode {
    /// `1` if the forward log-return exceeds `thr`, `-1` if below `-thr`, else `0`.
    Class {
        /// Symmetric dead-zone half-width (>= 0).
        thr: f64,
    },
    /// The raw forward log-return.
    Return,
}

impl Default for FixedHorizonMode {
    fn default() -> Self {
        Self::Class { thr: 0.0 }
    }
}

/// Configuration for fixed-horizon labeling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedHorizonConfig {
    /// Bars between the labeled bar and the exit bar (> 0).
    pub horizon: usize,
    /// Classification or regression output.
    #[serde(flatten)]
    pub mode: FixedHorizonMode,
    /// Representation of the last `horizon` bars in classification mode.
    /// Regression mode always leaves them `NaN`.
    #[serde(default)]
    pub tail: TailPolicy,
}

impl Default for FixedHorizonConfig {
    fn default() -> Self {
        Self {
            horizon: 24,
            mode: FixedHorizonMode::default(),
            tail: TailPolicy::Unlabeled,
        }
    }
}

impl FixedHorizonConfig {
    /// Check parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::InvalidConfig`] for `horizon == 0` or a negative /
    /// non-finite threshold.
    pub fn validate(&self) -> Result<()> {
        if self.horizon == 0 {
            return Err(VigilError::config("horizon must be > 0"));
        }
        if let FixedHorizonMode::Class { thr } = self.mode
            && !(thr.is_finite() && thr >= 0.0)
        {
            return Err(VigilError::config(format!(
                "thr must be finite and >= 0, got {thr}"
            )));
        }
        Ok(())
    }
}

/// Fixed-horizon labeler.
///
/// `fwd_t = ln(price_{t+horizon}) - ln(price_t)`; bars without a full horizon
/// ahead are unlabeled.
///
/// # Example
///
/// ```
/// use vigil_labels::{FixedHorizon, FixedHorizonConfig, FixedHorizonMode};
/// use vigil_traits::Labeler;
///
/// let labeler = FixedHorizon::new(FixedHorizonConfig {
///     horizon: 1,
///     mode: FixedHorizonMode::Class { thr: 0.0 },
///     ..Default::default()
/// })
/// .unwrap();
///
/// let labels = labeler.label(&[100.0, 105.0, 95.0]).unwrap();
/// assert_eq!(labels.as_class().unwrap(), &[Some(1), Some(-1), None]);
/// ```
#[derive(Debug, Clone)]
pub struct FixedHorizon {
    config: FixedHorizonConfig,
}

impl FixedHorizon {
    /// Create a labeler after validating `config`.
    ///
    /// # Errors
    ///
    /// See [`FixedHorizonConfig::validate`].
    pub fn new(config: FixedHorizonConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The validated configuration.
    pub const fn config(&self) -> &FixedHorizonConfig {
        &self.config
    }

    /// Forward log-returns over `horizon` bars; `NaN` for the tail.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::InvalidData`] for non-positive prices.
    pub fn forward_log_returns(&self, prices: &[f64]) -> Result<Vec<f64>> {
        check_prices(prices)?;
        let h = self.config.horizon;
        Ok((0..prices.len())
            .map(|i| {
                i.checked_add(h)
                    .and_then(|end| prices.get(end))
                    .map_or(f64::NAN, |&exit| exit.ln() - prices[i].ln())
            })
            .collect())
    }
}

impl Labeler for FixedHorizon {
    fn name(&self) -> String {
        let h = self.config.horizon;
        match self.config.mode {
            FixedHorizonMode::Class { .. } => format!("fh_lbl_{h}"),
            FixedHorizonMode::Return => format!("fh_ret_{h}"),
        }
    }

    fn horizon(&self) -> usize {
        self.config.horizon
    }

    fn label(&self, prices: &[f64]) -> Result<LabelValues> {
        let fwd = self.forward_log_returns(prices)?;

        let thr = match self.config.mode {
            FixedHorizonMode::Return => return Ok(LabelValues::Return(fwd)),
            FixedHorizonMode::Class { thr } => thr,
        };

        let tail = self.config.tail.value();
        let labels = fwd
            .into_iter()
            .map(|r| {
                if !r.is_finite() {
                    tail
                } else if r > thr {
                    Some(1)
                } else if r < -thr {
                    Some(-1)
                } else {
                    Some(0)
                }
            })
            .collect();
        Ok(LabelValues::Class(labels))
    }
}
