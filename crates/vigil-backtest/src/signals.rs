//! Reference strategies to benchmark model signals against.

use serde::{Deserialize, Serialize};
use vigil_traits::{PriceSignalFrame, Result, SymbolSeries, VigilError};

/// Baseline signal generators.
///
/// Both are leak-free: the signal at bar `t` only uses closes up to `t - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BaselineSignal {
    /// Constant long signal of 1.0; the engine vol-targets it.
    Hodl,
    /// `+1` when the fast SMA of previous closes is above the slow SMA, `-1`
    /// when below, `0` otherwise or during warm-up.
    SmaCrossover {
        /// Fast moving-average window.
        fast: usize,
        /// Slow moving-average window.
        slow: usize,
    },
}

impl Default for BaselineSignal {
    fn default() -> Self {
        Self::SmaCrossover { fast: 20, slow: 60 }
    }
}

impl BaselineSignal {
    /// Check parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::InvalidConfig`] unless `0 < fast < slow`.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Hodl => Ok(()),
            Self::SmaCrossover { fast, slow } if fast > 0 && fast < slow => Ok(()),
            Self::SmaCrossover { fast, slow } => Err(VigilError::config(format!(
                "sma crossover needs 0 < fast < slow, got fast={fast}, slow={slow}"
            ))),
        }
    }

    /// Compute the signal for a close-price path.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::InvalidConfig`] for invalid windows.
    ///
    /// # Example
    ///
    /// ```
    /// use vigil_backtest::BaselineSignal;
    ///
    /// let sig = BaselineSignal::SmaCrossover { fast: 1, slow: 2 }
    ///     .signal(&[1.0, 2.0, 3.0, 2.0, 1.0])
    ///     .unwrap();
    /// assert_eq!(sig, vec![0.0, 0.0, 1.0, 1.0, -1.0]);
    /// ```
    pub fn signal(&self, prices: &[f64]) -> Result<Vec<f64>> {
        self.validate()?;
        Ok(match *self {
            Self::Hodl => vec![1.0; prices.len()],
            Self::SmaCrossover { fast, slow } => {
                let f = lagged_sma(prices, fast);
                let s = lagged_sma(prices, slow);
                f.iter()
                    .zip(&s)
                    .map(|(f, s)| match f.partial_cmp(s) {
                        Some(std::cmp::Ordering::Greater) => 1.0,
                        Some(std::cmp::Ordering::Less) => -1.0,
                        _ => 0.0,
                    })
                    .collect()
            }
        })
    }

    /// Replace the signal of `series` with this baseline.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::InvalidConfig`] for invalid windows.
    pub fn apply(&self, series: &SymbolSeries) -> Result<SymbolSeries> {
        series.with_signals(self.signal(series.prices())?)
    }

    /// Replace the signal of every symbol in `frame`.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::InvalidConfig`] for invalid windows.
    pub fn apply_frame(&self, frame: &PriceSignalFrame) -> Result<PriceSignalFrame> {
        let series = frame
            .series()
            .iter()
            .map(|s| self.apply(s))
            .collect::<Result<Vec<_>>>()?;
        PriceSignalFrame::from_series(series)
    }
}

/// Mean of the `window` closes strictly before each bar; `NaN` until a full
/// window exists.
fn lagged_sma(prices: &[f64], window: usize) -> Vec<f64> {
    (0..prices.len())
        .map(|t| {
            if t < window {
                f64::NAN
            } else {
                prices[t - window..t].iter().sum::<f64>() / window as f64
            }
        })
        .collect()
}
