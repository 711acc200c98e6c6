//! Purged k-fold splitting over a time-ordered index.
//!
//! The index range `[0, n_rows)` is cut into `n_splits` contiguous blocks of
//! near-equal size, the first `n_rows % n_splits` blocks taking one extra row.
//! Each block is the test set of one fold; the training set is everything
//! outside `[start - purge, stop + embargo)`.

use serde::{Deserialize, Serialize};
use tracing::warn;
use vigil_traits::{Result, VigilError};

/// Purged k-fold splitter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgedKFold {
    /// Number of folds (>= 2).
    pub n_splits: usize,
    /// Rows removed from training immediately before each test block.
    #[serde(default)]
    pub purge: usize,
    /// Rows removed from training immediately after each test block.
    #[serde(default)]
    pub embargo: usize,
}

impl Default for PurgedKFold {
    fn default() -> Self {
        Self {
            n_splits: 5,
            purge: 0,
            embargo: 0,
        }
    }
}

impl PurgedKFold {
    /// Create a validated splitter.
    ///
    /// # Arguments
    ///
    /// * `n_splits` - Number of folds, at least 2
    /// * `purge` - Gap before each test block
    /// * `embargo` - Gap after each test block
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::InvalidConfig`] when `n_splits < 2`.
    pub fn new(n_splits: usize, purge: usize, embargo: usize) -> Result<Self> {
        let cv = Self {
            n_splits,
            purge,
            embargo,
        };
        cv.validate()?;
        Ok(cv)
    }

    /// Parse and validate from JSON, e.g. `{"n_splits": 5, "purge": 10}`.
    ///
    /// # Errors
    ///
    /// Returns a JSON or configuration error.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cv: Self = serde_json::from_str(json)?;
        cv.validate()?;
        Ok(cv)
    }

    /// Check parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::InvalidConfig`] when `n_splits < 2`.
    pub fn validate(&self) -> Result<()> {
        if self.n_splits < 2 {
            return Err(VigilError::config(format!(
                "n_splits must be >= 2, got {}",
                self.n_splits
            )));
        }
        Ok(())
    }

    /// Lazily generate the folds over `n_rows` time-ordered rows.
    ///
    /// Calling `split` again restarts the sequence. Every fold is yielded,
    /// including those whose training set ends up empty.
    ///
    /// # Example
    ///
    /// ```
    /// use vigil_cv::PurgedKFold;
    ///
    /// let cv = PurgedKFold::new(3, 1, 1).unwrap();
    /// let folds: Vec<_> = cv.split(9).collect();
    ///
    /// assert_eq!(folds[1].test_idx, vec![3, 4, 5]);
    /// assert_eq!(folds[1].train_idx, vec![0, 1, 7, 8]);
    /// ```
    pub const fn split(&self, n_rows: usize) -> PurgedKFoldIter {
        PurgedKFoldIter {
            cv: *self,
            n_rows,
            next: 0,
        }
    }

    /// Test block `[start, stop)` of fold `k`.
    const fn block(&self, n_rows: usize, k: usize) -> (usize, usize) {
        let base = n_rows / self.n_splits;
        let extra = n_rows % self.n_splits;
        let start = k * base + if k < extra { k } else { extra };
        let size = base + if k < extra { 1 } else { 0 };
        (start, start + size)
    }
}

/// One train/test split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fold {
    /// Position of this fold in the sequence.
    pub index: usize,
    /// Training rows, ascending.
    pub train_idx: Vec<usize>,
    /// Test rows, ascending and contiguous.
    pub test_idx: Vec<usize>,
}

impl Fold {
    /// Whether purge and embargo consumed the entire training complement.
    pub fn is_degenerate(&self) -> bool {
        self.train_idx.is_empty()
    }
}

/// Iterator returned by [`PurgedKFold::split`].
#[derive(Debug, Clone)]
pub struct PurgedKFoldIter {
    cv: PurgedKFold,
    n_rows: usize,
    next: usize,
}

impl Iterator for PurgedKFoldIter {
    type Item = Fold;

    fn next(&mut self) -> Option<Fold> {
        if self.next >= self.cv.n_splits {
            return None;
        }
        let k = self.next;
        self.next += 1;

        let n = self.n_rows;
        let (start, stop) = self.cv.block(n, k);
        let left = start.saturating_sub(self.cv.purge);
        let right = stop.saturating_add(self.cv.embargo).min(n);

        let train_idx: Vec<usize> = (0..left).chain(right..n).collect();
        if train_idx.is_empty() {
            warn!(
                fold = k,
                n_rows = n,
                purge = self.cv.purge,
                embargo = self.cv.embargo,
                "purge and embargo left an empty training set"
            );
        }

        Some(Fold {
            index: k,
            train_idx,
            test_idx: (start..stop).collect(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.cv.n_splits.saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for PurgedKFoldIter {}

/// Convenience wrapper: validate the parameters and collect every fold.
///
/// # Errors
///
/// Returns [`VigilError::InvalidConfig`] when `n_splits < 2`.
pub fn split(n_rows: usize, n_splits: usize, purge: usize, embargo: usize) -> Result<Vec<Fold>> {
    Ok(PurgedKFold::new(n_splits, purge, embargo)?
        .split(n_rows)
        .collect())
}
