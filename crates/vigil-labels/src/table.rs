//! Labeling a multi-instrument price table.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;
use vigil_traits::types::{columns, timestamp_column};
use vigil_traits::{LabelValues, Labeler, PriceSignalFrame, Result, Symbol, Timestamp};

use crate::LabelSpec;

/// What to do with rows whose label is undefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NanPolicy {
    /// Keep every input row; unlabeled rows carry a null label.
    #[default]
    Keep,
    /// Drop rows without a label.
    DropUnlabeled,
}

/// Labels keyed by `(timestamp, symbol)`.
///
/// Rows are grouped by symbol (in symbol order) and time-ordered within each
/// symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelTable {
    /// Canonical label column name, e.g. `tb_lbl_h24_u2_d2_w50`.
    pub label_col: String,
    /// Row timestamps.
    pub timestamps: Vec<Timestamp>,
    /// Row symbols.
    pub symbols: Vec<Symbol>,
    /// Label values, one per row.
    pub values: LabelValues,
}

impl LabelTable {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Convert into a `DataFrame` with columns `timestamp`, `symbol` and the label column.
    ///
    /// # Errors
    ///
    /// Propagates polars construction errors.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let label = match &self.values {
            LabelValues::Class(v) => Column::new(
                self.label_col.as_str().into(),
                v.iter().map(|x| x.map(i32::from)).collect::<Vec<_>>(),
            ),
            LabelValues::Return(v) => Column::new(
                self.label_col.as_str().into(),
                v.iter()
                    .map(|x| x.is_finite().then_some(*x))
                    .collect::<Vec<_>>(),
            ),
        };

        Ok(DataFrame::new(vec![
            timestamp_column(columns::TIMESTAMP, &self.timestamps)?,
            Column::new(columns::SYMBOL.into(), self.symbols.clone()),
            label,
        ])?)
    }
}

/// Label every symbol of `frame` independently with `spec`.
///
/// Labels never cross symbol boundaries: each instrument's tail is unlabeled
/// on its own.
///
/// # Errors
///
/// Returns [`vigil_traits::VigilError::InvalidConfig`] for an invalid spec.
///
/// # Example
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use vigil_labels::{label_frame, FixedHorizonConfig, LabelSpec, NanPolicy};
/// use vigil_traits::{PriceSignalFrame, SymbolSeries};
///
/// let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
/// let ts: Vec<_> = (0..3).map(|i| t0 + Duration::hours(i)).collect();
/// let frame = PriceSignalFrame::from_series(vec![
///     SymbolSeries::from_prices("BTC", ts, vec![100.0, 105.0, 95.0]).unwrap(),
/// ])
/// .unwrap();
///
/// let spec = LabelSpec::FixedHorizon(FixedHorizonConfig { horizon: 1, ..Default::default() });
/// let table = label_frame(&frame, &spec, NanPolicy::DropUnlabeled).unwrap();
/// assert_eq!(table.len(), 2);
/// ```
pub fn label_frame(
    frame: &PriceSignalFrame,
    spec: &LabelSpec,
    nan_policy: NanPolicy,
) -> Result<LabelTable> {
    let labeler = spec.build()?;

    let regression = matches!(
        spec,
        LabelSpec::FixedHorizon(c) if c.mode == crate::FixedHorizonMode::Return
    );

    let mut timestamps = Vec::with_capacity(frame.len());
    let mut symbols = Vec::with_capacity(frame.len());
    let mut classes = Vec::new();
    let mut returns = Vec::new();

    for series in frame.series() {
        let labels = labeler.label(series.prices())?;
        for (i, &ts) in series.timestamps().iter().enumerate() {
            if nan_policy == NanPolicy::DropUnlabeled && !labels.is_labeled(i) {
                continue;
            }
            timestamps.push(ts);
            symbols.push(series.symbol().to_string());
            match &labels {
                LabelValues::Class(src) => classes.push(src[i]),
                LabelValues::Return(src) => returns.push(src[i]),
            }
        }
    }

    let values = if regression {
        LabelValues::Return(returns)
    } else {
        LabelValues::Class(classes)
    };

    info!(
        label_col = %labeler.name(),
        rows_in = frame.len(),
        rows_out = timestamps.len(),
        "labels built"
    );

    Ok(LabelTable {
        label_col: labeler.name(),
        timestamps,
        symbols,
        values,
    })
}
