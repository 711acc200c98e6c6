//! Label kinds known to Vigil.
//!
//! Each kind is a variant carrying its own validated configuration; dispatch
//! is a plain `match`, so adding a kind means adding a variant.

use serde::{Deserialize, Serialize};
use vigil_traits::{LabelValues, Labeler, Result};

use crate::{FixedHorizon, FixedHorizonConfig, TripleBarrier, TripleBarrierConfig};

/// A label kind together with its parameters.
///
/// Deserializes from JSON such as
/// `{"kind": "triple_barrier", "horizon": 24, "up_mult": 2.0, "dn_mult": 2.0, "vol_window": 50}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LabelSpec {
    /// Forward return over a fixed number of bars.
    FixedHorizon(FixedHorizonConfig),
    /// Path-dependent triple-barrier scan.
    TripleBarrier(TripleBarrierConfig),
}

impl LabelSpec {
    /// Parse and validate a spec from JSON.
    ///
    /// # Errors
    ///
    /// Returns a JSON error for malformed input or an
    /// [`vigil_traits::VigilError::InvalidConfig`] for out-of-range parameters.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let spec: Self = serde_json::from_str(json)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Check the variant's parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns [`vigil_traits::VigilError::InvalidConfig`] on failure.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::FixedHorizon(c) => c.validate(),
            Self::TripleBarrier(c) => c.validate(),
        }
    }

    /// Build the concrete labeler for this spec.
    ///
    /// # Errors
    ///
    /// Returns [`vigil_traits::VigilError::InvalidConfig`] for invalid parameters.
    pub fn build(&self) -> Result<LabelerKind> {
        Ok(match self {
            Self::FixedHorizon(c) => LabelerKind::FixedHorizon(FixedHorizon::new(*c)?),
            Self::TripleBarrier(c) => LabelerKind::TripleBarrier(TripleBarrier::new(*c)?),
        })
    }
}

/// A constructed labeler of any supported kind.
#[derive(Debug, Clone)]
pub enum LabelerKind {
    /// Fixed-horizon labeler.
    FixedHorizon(FixedHorizon),
    /// Triple-barrier labeler.
    TripleBarrier(TripleBarrier),
}

impl Labeler for LabelerKind {
    fn name(&self) -> String {
        match self {
            Self::FixedHorizon(l) => l.name(),
            Self::TripleBarrier(l) => l.name(),
        }
    }

    fn horizon(&self) -> usize {
        match self {
            Self::FixedHorizon(l) => l.horizon(),
            Self::TripleBarrier(l) => l.horizon(),
        }
    }

    fn label(&self, prices: &[f64]) -> Result<LabelValues> {
        match self {
            Self::FixedHorizon(l) => l.label(prices),
            Self::TripleBarrier(l) => l.label(prices),
        }
    }
}
