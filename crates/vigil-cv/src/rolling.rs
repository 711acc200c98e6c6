//! Walk-forward train → valid splits on calendar time.
//!
//! Windows are half-open. For a validation window `[v, v + valid)` the
//! training window is `[v - embargo - train, v - embargo)`; the next fold
//! starts `step` later. Folds stop once a validation window would end after
//! the last timestamp.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::debug;
use vigil_traits::{Result, Timestamp, VigilError};

/// Rolling split parameters.
///
/// Durations serialize as whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollingSplitConfig {
    /// Training window length.
    #[serde(with = "seconds")]
    pub train: Duration,
    /// Validation window length.
    #[serde(with = "seconds")]
    pub valid: Duration,
    /// Advance between folds; `None` means `valid`.
    #[serde(default, with = "opt_seconds")]
    pub step: Option<Duration>,
    /// Gap between the end of training and the start of validation.
    #[serde(default = "Duration::zero", with = "seconds")]
    pub embargo: Duration,
    /// Minimum rows required in both subsets for a fold to be kept.
    #[serde(default = "default_min_obs")]
    pub min_obs: usize,
}

const fn default_min_obs() -> usize {
    1
}

impl RollingSplitConfig {
    /// Windows of the given lengths, stepping by `valid`, without embargo.
    pub const fn new(train: Duration, valid: Duration) -> Self {
        Self {
            train,
            valid,
            step: None,
            embargo: Duration::zero(),
            min_obs: 1,
        }
    }

    /// Set the advance between folds.
    pub const fn with_step(mut self, step: Duration) -> Self {
        self.step = Some(step);
        self
    }

    /// Set the train/valid gap.
    pub const fn with_embargo(mut self, embargo: Duration) -> Self {
        self.embargo = embargo;
        self
    }

    /// Set the minimum subset size.
    pub const fn with_min_obs(mut self, min_obs: usize) -> Self {
        self.min_obs = min_obs;
        self
    }

    /// Parse and validate from JSON, e.g. `{"train": 86400, "valid": 3600}`.
    ///
    /// # Errors
    ///
    /// Returns a JSON or configuration error.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// The effective step.
    pub fn step(&self) -> Duration {
        self.step.unwrap_or(self.valid)
    }

    /// Check parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::InvalidConfig`] for non-positive window lengths or
    /// step, a negative embargo, or `min_obs == 0`.
    pub fn validate(&self) -> Result<()> {
        let zero = Duration::zero();
        if self.train <= zero || self.valid <= zero {
            return Err(VigilError::config("train and valid windows must be > 0"));
        }
        if self.step() <= zero {
            return Err(VigilError::config("step must be > 0"));
        }
        if self.embargo < zero {
            return Err(VigilError::config("embargo must be >= 0"));
        }
        if self.min_obs == 0 {
            return Err(VigilError::config("min_obs must be >= 1"));
        }
        Ok(())
    }
}

/// A span of time covered by a fold subset, from its first to its last row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// First timestamp in the subset.
    pub start: Timestamp,
    /// Last timestamp in the subset.
    pub end: Timestamp,
}

/// One walk-forward fold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitFold {
    /// Observed span of the training rows.
    pub train: TimeWindow,
    /// Observed span of the validation rows.
    pub valid: TimeWindow,
    /// Training row positions.
    pub train_idx: Vec<usize>,
    /// Validation row positions.
    pub valid_idx: Vec<usize>,
}

/// Build rolling walk-forward folds over sorted `timestamps`.
///
/// `timestamps` may repeat (several symbols sharing a bar) but must be
/// non-decreasing. Folds with fewer than `min_obs` rows in either subset are
/// skipped.
///
/// # Errors
///
/// Returns [`VigilError::InvalidConfig`] for an invalid config and
/// [`VigilError::InvalidData`] for unsorted timestamps.
///
/// # Example
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use vigil_cv::{rolling_splits, RollingSplitConfig};
///
/// let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
/// let ts: Vec<_> = (0..10).map(|i| t0 + Duration::hours(i)).collect();
///
/// let cfg = RollingSplitConfig::new(Duration::hours(4), Duration::hours(2));
/// let folds = rolling_splits(&ts, &cfg).unwrap();
///
/// assert_eq!(folds[0].train_idx, vec![0, 1, 2, 3]);
/// assert_eq!(folds[0].valid_idx, vec![4, 5]);
/// ```
pub fn rolling_splits(timestamps: &[Timestamp], cfg: &RollingSplitConfig) -> Result<Vec<SplitFold>> {
    cfg.validate()?;
    if let Some(i) = timestamps.windows(2).position(|w| w[1] < w[0]) {
        return Err(VigilError::data(format!(
            "timestamps must be sorted; row {} precedes row {}",
            i + 1,
            i
        )));
    }

    let (Some(&first), Some(&last)) = (timestamps.first(), timestamps.last()) else {
        return Ok(Vec::new());
    };

    let mut folds = Vec::new();
    let mut valid_start = first + cfg.train + cfg.embargo;
    loop {
        let valid_end = valid_start + cfg.valid;
        if valid_end > last {
            break;
        }
        let train_end = valid_start - cfg.embargo;
        let train_start = train_end - cfg.train;

        let train_idx = positions(timestamps, train_start, train_end);
        let valid_idx = positions(timestamps, valid_start, valid_end);

        if train_idx.len() >= cfg.min_obs && valid_idx.len() >= cfg.min_obs {
            folds.push(SplitFold {
                train: span(timestamps, &train_idx),
                valid: span(timestamps, &valid_idx),
                train_idx,
                valid_idx,
            });
        } else {
            debug!(%valid_start, train = train_idx.len(), valid = valid_idx.len(), "fold skipped");
        }

        valid_start += cfg.step();
    }

    Ok(folds)
}

/// Row positions with timestamps in `[start, end)`.
fn positions(timestamps: &[Timestamp], start: Timestamp, end: Timestamp) -> Vec<usize> {
    let lo = timestamps.partition_point(|t| *t < start);
    let hi = timestamps.partition_point(|t| *t < end);
    (lo..hi).collect()
}

// Only called with non-empty `idx` (min_obs >= 1).
fn span(timestamps: &[Timestamp], idx: &[usize]) -> TimeWindow {
    TimeWindow {
        start: timestamps[idx[0]],
        end: timestamps[idx[idx.len() - 1]],
    }
}

/// Check that no fold shares rows between training and validation.
///
/// # Errors
///
/// Returns [`VigilError::InvalidData`] naming the first offending fold.
pub fn assert_no_overlap(folds: &[SplitFold]) -> Result<()> {
    for (i, fold) in folds.iter().enumerate() {
        let overlap = fold
            .train_idx
            .iter()
            .any(|t| fold.valid_idx.binary_search(t).is_ok());
        if overlap {
            return Err(VigilError::data(format!(
                "fold {i} has overlap between train and valid indices"
            )));
        }
    }
    Ok(())
}

/// Check that validation windows move forward in time.
///
/// A fold's validation may start exactly where the previous one ended.
///
/// # Errors
///
/// Returns [`VigilError::InvalidData`] naming the first fold that steps back.
pub fn assert_increasing_windows(folds: &[SplitFold]) -> Result<()> {
    for (i, pair) in folds.windows(2).enumerate() {
        if pair[1].valid.start < pair[0].valid.end {
            return Err(VigilError::data(format!(
                "fold {} not increasing: {} < {}",
                i + 1,
                pair[1].valid.start,
                pair[0].valid.end
            )));
        }
    }
    Ok(())
}

mod seconds {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(d.num_seconds())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        i64::deserialize(d).map(Duration::seconds)
    }
}

mod opt_seconds {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_some(&d.num_seconds()),
            None => s.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Option::<i64>::deserialize(d).map(|o| o.map(Duration::seconds))
    }
}
