//! Triple-barrier labels.
//!
//! For each bar an upper and a lower price barrier are placed at
//! `price * exp(±mult * vol)`, where `vol` is the trailing standard deviation of
//! log-returns known at that bar. The label records which barrier the path
//! touches first within `horizon` bars; when neither is touched, the vertical
//! (time) barrier applies and the label is the sign of the horizon return.

use serde::{Deserialize, Serialize};
use tracing::debug;
use vigil_traits::stats::{forward_fill, rolling_std};
use vigil_traits::{LabelValues, Labeler, Result, TailPolicy, VigilError};

use crate::check_prices;

/// Configuration for triple-barrier labeling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TripleBarrierConfig {
    /// Maximum holding period in bars (> 0).
    pub horizon: usize,
    /// Upper barrier distance in units of trailing volatility.
    pub up_mult: f64,
    /// Lower barrier distance in units of trailing volatility.
    pub dn_mult: f64,
    /// Rolling window for log-return volatility (> 1).
    pub vol_window: usize,
    /// Minimum observations inside the window before volatility is defined.
    /// Defaults to `max(5, vol_window / 5)`, capped at `vol_window`.
    #[serde(default)]
    pub min_periods: Option<usize>,
    /// Representation of the last `horizon` bars.
    #[serde(default)]
    pub tail: TailPolicy,
}

impl Default for TripleBarrierConfig {
    fn default() -> Self {
        Self {
            horizon: 24,
            up_mult: 2.0,
            dn_mult: 2.0,
            vol_window: 50,
            min_periods: None,
            tail: TailPolicy::Unlabeled,
        }
    }
}

impl TripleBarrierConfig {
    /// Symmetric barriers at `±mult` volatilities.
    pub fn symmetric(horizon: usize, mult: f64, vol_window: usize) -> Self {
        Self {
            horizon,
            up_mult: mult,
            dn_mult: mult,
            vol_window,
            ..Default::default()
        }
    }

    /// Check parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::InvalidConfig`] for `horizon == 0`,
    /// `vol_window <= 1`, `min_periods == Some(0)` or negative multipliers.
    pub fn validate(&self) -> Result<()> {
        if self.horizon == 0 {
            return Err(VigilError::config("horizon must be > 0"));
        }
        if self.vol_window <= 1 {
            return Err(VigilError::config("vol_window must be > 1"));
        }
        if self.min_periods == Some(0) {
            return Err(VigilError::config("min_periods must be > 0"));
        }
        for (name, m) in [("up_mult", self.up_mult), ("dn_mult", self.dn_mult)] {
            if !(m.is_finite() && m >= 0.0) {
                return Err(VigilError::config(format!(
                    "{name} must be finite and >= 0, got {m}"
                )));
            }
        }
        Ok(())
    }

    /// Effective minimum observation count for the volatility window.
    pub fn effective_min_periods(&self) -> usize {
        self.min_periods
            .unwrap_or_else(|| (self.vol_window / 5).max(5))
            .min(self.vol_window)
    }
}

/// Which barrier ended the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarrierTouch {
    /// The upper (profit) barrier was touched first.
    Upper,
    /// The lower (stop) barrier was touched first, or both were first touched
    /// at the same step.
    Lower,
    /// Neither barrier was touched before the horizon elapsed.
    Vertical,
}

/// Outcome of scanning one bar's forward path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarrierEvent {
    /// Barrier that ended the scan.
    pub touch: BarrierTouch,
    /// Bars after entry at which the scan ended (`1..=horizon`).
    pub step: usize,
    /// Upper barrier price.
    pub upper: f64,
    /// Lower barrier price.
    pub lower: f64,
    /// Resulting class in `{-1, 0, 1}`.
    pub label: i8,
}

/// Triple-barrier labeler.
///
/// # Example
///
/// ```
/// use vigil_labels::{TripleBarrier, TripleBarrierConfig};
/// use vigil_traits::Labeler;
///
/// let labeler = TripleBarrier::new(TripleBarrierConfig::symmetric(2, 1.0, 3)).unwrap();
/// let labels = labeler.label(&[100.0, 101.0, 102.0, 103.0]).unwrap();
/// assert_eq!(labels.len(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct TripleBarrier {
    config: TripleBarrierConfig,
}

impl TripleBarrier {
    /// Create a labeler after validating `config`.
    ///
    /// # Errors
    ///
    /// See [`TripleBarrierConfig::validate`].
    pub fn new(config: TripleBarrierConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The validated configuration.
    pub const fn config(&self) -> &TripleBarrierConfig {
        &self.config
    }

    /// Trailing log-return volatility known at each bar.
    ///
    /// Population standard deviation over `vol_window` bars, forward-filled and
    /// then zero-filled during warm-up. Never back-filled.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::InvalidData`] for non-positive prices.
    pub fn trailing_volatility(&self, prices: &[f64]) -> Result<Vec<f64>> {
        check_prices(prices)?;
        let log_ret: Vec<f64> = (0..prices.len())
            .map(|i| {
                if i == 0 {
                    f64::NAN
                } else {
                    prices[i].ln() - prices[i - 1].ln()
                }
            })
            .collect();

        let vol = rolling_std(
            &log_ret,
            self.config.vol_window,
            self.config.effective_min_periods(),
            0,
        );
        Ok(forward_fill(&vol, 0.0))
    }

    /// Scan every labelable bar and report which barrier it hit.
    ///
    /// Entries for the last `horizon` bars are `None`.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::InvalidData`] for non-positive prices.
    pub fn events(&self, prices: &[f64]) -> Result<Vec<Option<BarrierEvent>>> {
        let vol = self.trailing_volatility(prices)?;
        let h = self.config.horizon;

        Ok((0..prices.len())
            .map(|i| {
                i.checked_add(h)
                    .is_some_and(|end| end < prices.len())
                    .then(|| self.scan(prices, &vol, i))
            })
            .collect())
    }

    fn scan(&self, prices: &[f64], vol: &[f64], i: usize) -> BarrierEvent {
        let h = self.config.horizon;
        let p0 = prices[i];
        let upper = p0 * (self.config.up_mult * vol[i]).exp();
        let lower = p0 * (-self.config.dn_mult * vol[i]).exp();
        let path = &prices[i + 1..=i + h];

        // Offsets of the first touch; `Some(0)` is a hit on the first step.
        let hit_up = path.iter().position(|&p| p >= upper);
        let hit_dn = path.iter().position(|&p| p <= lower);

        // A same-step touch of both barriers resolves to the stop.
        let (touch, offset) = match (hit_up, hit_dn) {
            (Some(u), Some(d)) if u < d => (BarrierTouch::Upper, u),
            (Some(_), Some(d)) => (BarrierTouch::Lower, d),
            (Some(u), None) => (BarrierTouch::Upper, u),
            (None, Some(d)) => (BarrierTouch::Lower, d),
            (None, None) => (BarrierTouch::Vertical, h - 1),
        };

        let label = match touch {
            BarrierTouch::Upper => 1,
            BarrierTouch::Lower => -1,
            BarrierTouch::Vertical => sign(prices[i + h].ln() - p0.ln()),
        };

        BarrierEvent {
            touch,
            step: offset + 1,
            upper,
            lower,
            label,
        }
    }
}

fn sign(x: f64) -> i8 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

impl Labeler for TripleBarrier {
    fn name(&self) -> String {
        let c = &self.config;
        format!(
            "tb_lbl_h{}_u{}_d{}_w{}",
            c.horizon, c.up_mult, c.dn_mult, c.vol_window
        )
    }

    fn horizon(&self) -> usize {
        self.config.horizon
    }

    fn label(&self, prices: &[f64]) -> Result<LabelValues> {
        let events = self.events(prices)?;
        let tail = self.config.tail.value();
        let labels: Vec<Option<i8>> = events
            .iter()
            .map(|e| e.map_or(tail, |e| Some(e.label)))
            .collect();

        debug!(
            labeler = %self.name(),
            bars = prices.len(),
            labeled = events.iter().filter(|e| e.is_some()).count(),
            "triple-barrier labels computed"
        );
        Ok(LabelValues::Class(labels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn labeler(horizon: usize, mult: f64, vol_window: usize) -> TripleBarrier {
        TripleBarrier::new(TripleBarrierConfig {
            min_periods: Some(2),
            ..TripleBarrierConfig::symmetric(horizon, mult, vol_window)
        })
        .unwrap()
    }

    #[test]
    fn test_hit_on_first_step_counts() {
        // Alternating moves give non-zero vol; a big jump right after entry
        // must register as an upper touch at step 1.
        let prices = [100.0, 101.0, 100.0, 101.0, 100.0, 150.0, 150.0, 150.0];
        let events = labeler(2, 1.0, 3).events(&prices).unwrap();

        let e = events[4].unwrap();
        assert_eq!(e.touch, BarrierTouch::Upper);
        assert_eq!(e.step, 1);
        assert_eq!(e.label, 1);
    }

    #[test]
    fn test_lower_first_wins() {
        let prices = [100.0, 101.0, 100.0, 101.0, 100.0, 50.0, 200.0, 200.0];
        let e = labeler(3, 1.0, 3).events(&prices).unwrap()[4].unwrap();
        assert_eq!(e.touch, BarrierTouch::Lower);
        assert_eq!(e.step, 1);
        assert_eq!(e.label, -1);
    }

    #[test]
    fn test_vertical_barrier_uses_return_sign() {
        // Huge multiplier: barriers never touched.
        let prices = [100.0, 101.0, 100.0, 101.0, 102.0, 103.0];
        let events = labeler(2, 1_000.0, 3).events(&prices).unwrap();
        let e = events[2].unwrap();
        assert_eq!(e.touch, BarrierTouch::Vertical);
        assert_eq!(e.step, 2);
        assert_eq!(e.label, 1);
    }

    #[test]
    fn test_zero_vol_warmup_barriers_collapse() {
        // Before min_periods is reached vol is 0, so both barriers equal p0.
        let prices = [100.0, 100.0, 101.0, 99.0];
        let tb = TripleBarrier::new(TripleBarrierConfig {
            min_periods: Some(10),
            ..TripleBarrierConfig::symmetric(1, 2.0, 10)
        })
        .unwrap();
        let events = tb.events(&prices).unwrap();
        assert_eq!(events[0].unwrap().touch, BarrierTouch::Lower);
        assert_eq!(events[0].unwrap().label, -1);
        assert_eq!(events[1].unwrap().label, 1);
        assert_eq!(events[2].unwrap().label, -1);
        assert!(events[3].is_none());
    }

    #[test]
    fn test_same_step_touch_resolves_to_lower() {
        // Zero multipliers put both barriers on the entry price, so the first
        // move of any size touches both at once.
        let prices = [100.0, 100.0, 120.0, 120.0];
        let events = labeler(2, 0.0, 3).events(&prices).unwrap();
        let e = events[0].unwrap();
        assert_eq!(e.touch, BarrierTouch::Lower);
        assert_eq!(e.step, 1);
        assert_eq!(e.upper, 100.0);
        assert_eq!(e.lower, 100.0);
        assert_eq!(e.label, -1);
    }

    #[test]
    fn test_huge_horizon_leaves_everything_unlabeled() {
        let tb = TripleBarrier::new(TripleBarrierConfig::symmetric(usize::MAX, 1.0, 3)).unwrap();
        let events = tb.events(&[100.0, 101.0, 102.0]).unwrap();
        assert!(events.iter().all(Option::is_none));
        assert_eq!(tb.label(&[100.0, 101.0]).unwrap().labeled_count(), 0);
    }

    #[test]
    fn test_tail_is_unlabeled_by_default() {
        let prices = [100.0, 101.0, 102.0, 103.0, 104.0];
        let labels = labeler(2, 1.0, 3).label(&prices).unwrap();
        let labels = labels.as_class().unwrap();
        assert!(labels[3].is_none() && labels[4].is_none());
        assert!(labels[..3].iter().all(Option::is_some));
    }

    #[test]
    fn test_tail_fill_value() {
        let tb = TripleBarrier::new(TripleBarrierConfig {
            tail: TailPolicy::Fill(0),
            ..TripleBarrierConfig::symmetric(2, 1.0, 3)
        })
        .unwrap();
        let labels = tb.label(&[100.0, 101.0, 102.0]).unwrap();
        assert_eq!(labels.as_class().unwrap()[1..], [Some(0), Some(0)]);
    }

    #[test]
    fn test_short_series_fully_unlabeled() {
        let labels = labeler(5, 1.0, 3).label(&[100.0, 101.0]).unwrap();
        assert_eq!(labels.labeled_count(), 0);
    }

    #[test]
    fn test_volatility_is_not_backfilled() {
        let prices = [100.0, 110.0, 99.0, 120.0, 100.0];
        let vol = labeler(1, 1.0, 3).trailing_volatility(&prices).unwrap();
        assert_eq!(vol[0], 0.0);
        assert_eq!(vol[1], 0.0);
        assert!(vol[2] > 0.0);
        let r1 = (110.0_f64 / 100.0).ln();
        let r2 = (99.0_f64 / 110.0).ln();
        assert_relative_eq!(vol[2], (r1 - r2).abs() / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_validation() {
        assert!(TripleBarrier::new(TripleBarrierConfig::symmetric(0, 1.0, 10)).is_err());
        assert!(TripleBarrier::new(TripleBarrierConfig::symmetric(5, 1.0, 1)).is_err());
        assert!(TripleBarrier::new(TripleBarrierConfig::symmetric(5, -1.0, 10)).is_err());
    }

    #[test]
    fn test_min_periods_default_capped() {
        assert_eq!(TripleBarrierConfig::default().effective_min_periods(), 10);
        assert_eq!(
            TripleBarrierConfig::symmetric(5, 1.0, 3).effective_min_periods(),
            3
        );
    }

    #[test]
    fn test_name_encodes_parameters() {
        let tb = TripleBarrier::new(TripleBarrierConfig::default()).unwrap();
        assert_eq!(tb.name(), "tb_lbl_h24_u2_d2_w50");
    }
}
