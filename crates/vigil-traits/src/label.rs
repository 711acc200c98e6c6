//! Labeler trait for turning price paths into supervised targets.
//!
//! A labeler looks *forward* from each bar, so the last `horizon` bars of any
//! series cannot be labeled. How those bars are represented is part of the
//! label contract, see [`TailPolicy`].

use serde::{Deserialize, Serialize};

use crate::Result;

/// How bars too close to the end of a series to be scored are represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TailPolicy {
    /// Leave the tail unlabeled (`None` / null).
    #[default]
    Unlabeled,
    /// Fill the tail with an explicit class value.
    Fill(i8),
}

impl TailPolicy {
    /// The class value stored for an unlabelable bar.
    pub const fn value(self) -> Option<i8> {
        match self {
            Self::Unlabeled => None,
            Self::Fill(v) => Some(v),
        }
    }
}

/// Label values for one price series, aligned bar-for-bar with the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LabelValues {
    /// Class labels in `{-1, 0, 1}`; `None` marks an unlabeled bar.
    Class(Vec<Option<i8>>),
    /// Forward log-returns; `NaN` marks an unlabeled bar.
    Return(Vec<f64>),
}

impl LabelValues {
    /// Number of bars covered.
    pub fn len(&self) -> usize {
        match self {
            Self::Class(v) => v.len(),
            Self::Return(v) => v.len(),
        }
    }

    /// Whether no bars are covered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether bar `i` carries a label.
    pub fn is_labeled(&self, i: usize) -> bool {
        match self {
            Self::Class(v) => v.get(i).is_some_and(Option::is_some),
            Self::Return(v) => v.get(i).is_some_and(|x| x.is_finite()),
        }
    }

    /// Number of labeled bars.
    pub fn labeled_count(&self) -> usize {
        (0..self.len()).filter(|&i| self.is_labeled(i)).count()
    }

    /// Class labels, if this is a classification series.
    pub fn as_class(&self) -> Option<&[Option<i8>]> {
        match self {
            Self::Class(v) => Some(v),
            Self::Return(_) => None,
        }
    }

    /// Forward returns, if this is a regression series.
    pub fn as_return(&self) -> Option<&[f64]> {
        match self {
            Self::Return(v) => Some(v),
            Self::Class(_) => None,
        }
    }
}

/// A generator of supervised targets from a price path.
///
/// Implementations must be deterministic: labeling the same prices with the
/// same parameters always produces identical output.
pub trait Labeler: Send + Sync {
    /// Canonical name of the label column, encoding the parameters.
    fn name(&self) -> String;

    /// Number of bars looked ahead from each labeled bar.
    fn horizon(&self) -> usize;

    /// Label a single instrument's close prices.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or prices are not
    /// finite and positive.
    fn label(&self, prices: &[f64]) -> Result<LabelValues>;
}
