//! Common types used throughout the Vigil framework.
//!
//! This module defines the canonical price/signal table consumed by the
//! backtest engine and labelers, together with its conversions from and to
//! polars `DataFrame`s.

use std::collections::BTreeMap;

use chrono::DateTime;
use polars::prelude::*;

use crate::time::{Timestamp, ensure_strictly_increasing};
use crate::{Result, VigilError};

/// An instrument identifier, e.g. `"BTC-USD"`.
pub type Symbol = String;

/// Column names of the canonical price/signal schema.
pub mod columns {
    /// Bar timestamp (timezone-aware datetime).
    pub const TIMESTAMP: &str = "timestamp";
    /// Instrument identifier.
    pub const SYMBOL: &str = "symbol";
    /// Close price (> 0).
    pub const PRICE: &str = "price";
    /// Directional signal; null/NaN is treated as neutral.
    pub const SIGNAL: &str = "signal";
}

/// One instrument's time-ordered bars.
///
/// Invariants (checked by [`SymbolSeries::new`]): the three vectors have equal
/// length, timestamps are strictly increasing, prices are finite and positive.
/// Signals may be `NaN`, which consumers treat as 0.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolSeries {
    symbol: Symbol,
    timestamps: Vec<Timestamp>,
    prices: Vec<f64>,
    signals: Vec<f64>,
}

impl SymbolSeries {
    /// Build a validated series.
    ///
    /// # Errors
    ///
    /// - [`VigilError::InvalidData`] on length mismatch or a non-positive price
    /// - [`VigilError::NonMonotonicTimestamps`] when timestamps are not strictly increasing
    pub fn new(
        symbol: impl Into<Symbol>,
        timestamps: Vec<Timestamp>,
        prices: Vec<f64>,
        signals: Vec<f64>,
    ) -> Result<Self> {
        let symbol = symbol.into();
        if timestamps.len() != prices.len() || prices.len() != signals.len() {
            return Err(VigilError::data(format!(
                "'{symbol}': {} timestamps, {} prices, {} signals",
                timestamps.len(),
                prices.len(),
                signals.len()
            )));
        }
        ensure_strictly_increasing(&symbol, &timestamps)?;
        if let Some(i) = prices.iter().position(|p| !(p.is_finite() && *p > 0.0)) {
            return Err(VigilError::data(format!(
                "'{symbol}': price at row {i} must be finite and > 0, got {}",
                prices[i]
            )));
        }

        Ok(Self {
            symbol,
            timestamps,
            prices,
            signals,
        })
    }

    /// Build a validated series without a signal (all signals neutral).
    ///
    /// # Errors
    ///
    /// Same as [`SymbolSeries::new`].
    pub fn from_prices(
        symbol: impl Into<Symbol>,
        timestamps: Vec<Timestamp>,
        prices: Vec<f64>,
    ) -> Result<Self> {
        let signals = vec![0.0; prices.len()];
        Self::new(symbol, timestamps, prices, signals)
    }

    /// Return a copy with the signal column replaced.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::InvalidData`] when `signals` has the wrong length.
    pub fn with_signals(&self, signals: Vec<f64>) -> Result<Self> {
        if signals.len() != self.len() {
            return Err(VigilError::data(format!(
                "'{}': expected {} signals, got {}",
                self.symbol,
                self.len(),
                signals.len()
            )));
        }
        Ok(Self {
            signals,
            ..self.clone()
        })
    }

    /// The instrument identifier.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Bar timestamps.
    pub fn timestamps(&self) -> &[Timestamp] {
        &self.timestamps
    }

    /// Close prices.
    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    /// Raw signal values (may contain `NaN`).
    pub fn signals(&self) -> &[f64] {
        &self.signals
    }

    /// Number of bars.
    pub const fn len(&self) -> usize {
        self.prices.len()
    }

    /// Whether the series has no bars.
    pub const fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// The canonical `(timestamp, symbol, price, signal)` table.
///
/// Rows are grouped by symbol; symbols are kept in lexicographic order so that
/// every downstream computation is deterministic.
///
/// # Example
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use vigil_traits::{PriceSignalFrame, SymbolSeries};
///
/// let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
/// let ts: Vec<_> = (0..3).map(|i| t0 + Duration::hours(i)).collect();
/// let series = SymbolSeries::new("BTC", ts, vec![100.0, 101.0, 99.0], vec![1.0; 3]).unwrap();
///
/// let frame = PriceSignalFrame::from_series(vec![series]).unwrap();
/// assert_eq!(frame.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSignalFrame {
    series: Vec<SymbolSeries>,
}

impl PriceSignalFrame {
    /// Build a frame from per-symbol series.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::InvalidData`] if the same symbol appears twice.
    pub fn from_series(series: Vec<SymbolSeries>) -> Result<Self> {
        let mut by_symbol: BTreeMap<Symbol, SymbolSeries> = BTreeMap::new();
        for s in series {
            if by_symbol.contains_key(s.symbol()) {
                return Err(VigilError::data(format!(
                    "duplicate series for symbol '{}'",
                    s.symbol()
                )));
            }
            by_symbol.insert(s.symbol.clone(), s);
        }
        Ok(Self {
            series: by_symbol.into_values().collect(),
        })
    }

    /// Build a frame from long-format rows `(timestamp, symbol, price, signal)`.
    ///
    /// Rows of each symbol must already be in strictly increasing time order;
    /// they are not sorted.
    ///
    /// # Errors
    ///
    /// Same as [`SymbolSeries::new`] for each symbol.
    pub fn from_rows<I>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Timestamp, Symbol, f64, f64)>,
    {
        let mut grouped: BTreeMap<Symbol, (Vec<Timestamp>, Vec<f64>, Vec<f64>)> = BTreeMap::new();
        for (ts, symbol, price, signal) in rows {
            let entry = grouped.entry(symbol).or_default();
            entry.0.push(ts);
            entry.1.push(price);
            entry.2.push(signal);
        }

        let series = grouped
            .into_iter()
            .map(|(symbol, (ts, px, sig))| SymbolSeries::new(symbol, ts, px, sig))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { series })
    }

    /// Build a frame from a polars `DataFrame` with the canonical columns.
    ///
    /// The `timestamp` column must be a timezone-aware `Datetime`; nulls in
    /// `signal` become `NaN` (neutral).
    ///
    /// # Errors
    ///
    /// - [`VigilError::MissingColumn`] for an absent column
    /// - [`VigilError::TimezoneNaive`] for a `Datetime` column without timezone
    /// - [`VigilError::InvalidData`] for nulls in `timestamp`/`symbol`/`price`
    /// - [`VigilError::NonMonotonicTimestamps`] for unordered rows within a symbol
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        Self::from_dataframe_inner(df, true)
    }

    /// Like [`PriceSignalFrame::from_dataframe`] but the `signal` column is
    /// optional (absent means neutral). Used for labeling, where no signal exists yet.
    ///
    /// # Errors
    ///
    /// Same as [`PriceSignalFrame::from_dataframe`].
    pub fn from_price_dataframe(df: &DataFrame) -> Result<Self> {
        Self::from_dataframe_inner(df, false)
    }

    fn from_dataframe_inner(df: &DataFrame, require_signal: bool) -> Result<Self> {
        let timestamps = timestamps_from_column(required_column(df, columns::TIMESTAMP)?)?;

        let symbols = required_column(df, columns::SYMBOL)?
            .as_materialized_series()
            .str()?
            .into_iter()
            .enumerate()
            .map(|(i, s)| {
                s.map(str::to_string)
                    .ok_or_else(|| VigilError::data(format!("null symbol at row {i}")))
            })
            .collect::<Result<Vec<_>>>()?;

        let prices = required_column(df, columns::PRICE)?
            .as_materialized_series()
            .cast(&DataType::Float64)?;
        let prices = prices
            .f64()?
            .into_iter()
            .enumerate()
            .map(|(i, p)| p.ok_or_else(|| VigilError::data(format!("null price at row {i}"))))
            .collect::<Result<Vec<_>>>()?;

        let signals: Vec<f64> = match df.column(columns::SIGNAL) {
            Ok(col) => col
                .as_materialized_series()
                .cast(&DataType::Float64)?
                .f64()?
                .into_iter()
                .map(|s| s.unwrap_or(f64::NAN))
                .collect(),
            Err(_) if !require_signal => vec![0.0; df.height()],
            Err(_) => return Err(VigilError::MissingColumn(columns::SIGNAL.to_string())),
        };

        Self::from_rows(
            timestamps
                .into_iter()
                .zip(symbols)
                .zip(prices)
                .zip(signals)
                .map(|(((ts, sym), px), sig)| (ts, sym, px, sig)),
        )
    }

    /// Per-symbol series in symbol order.
    pub fn series(&self) -> &[SymbolSeries] {
        &self.series
    }

    /// Look up one symbol's series.
    pub fn get(&self, symbol: &str) -> Option<&SymbolSeries> {
        self.series.iter().find(|s| s.symbol() == symbol)
    }

    /// Symbols in the frame, in order.
    pub fn symbols(&self) -> Vec<&str> {
        self.series.iter().map(SymbolSeries::symbol).collect()
    }

    /// Total number of rows across all symbols.
    pub fn len(&self) -> usize {
        self.series.iter().map(SymbolSeries::len).sum()
    }

    /// Whether the frame holds no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert back into a long-format polars `DataFrame`.
    ///
    /// # Errors
    ///
    /// Propagates polars construction errors.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut ts = Vec::with_capacity(self.len());
        let mut sym = Vec::with_capacity(self.len());
        let mut px = Vec::with_capacity(self.len());
        let mut sig = Vec::with_capacity(self.len());
        for s in &self.series {
            ts.extend_from_slice(s.timestamps());
            sym.extend(std::iter::repeat_n(s.symbol().to_string(), s.len()));
            px.extend_from_slice(s.prices());
            sig.extend_from_slice(s.signals());
        }

        let df = DataFrame::new(vec![
            timestamp_column(columns::TIMESTAMP, &ts)?,
            Column::new(columns::SYMBOL.into(), sym),
            Column::new(columns::PRICE.into(), px),
            Column::new(columns::SIGNAL.into(), sig),
        ])?;
        Ok(df)
    }
}

fn required_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name)
        .map_err(|_| VigilError::MissingColumn(name.to_string()))
}

/// Decode a timezone-aware polars `Datetime` column into UTC timestamps.
///
/// # Errors
///
/// - [`VigilError::TimezoneNaive`] when the column has no timezone
/// - [`VigilError::InvalidData`] for non-datetime columns, nulls or out-of-range values
pub fn timestamps_from_column(col: &Column) -> Result<Vec<Timestamp>> {
    let unit = match col.dtype() {
        DataType::Datetime(unit, Some(_)) => *unit,
        DataType::Datetime(_, None) => {
            return Err(VigilError::TimezoneNaive(col.name().to_string()));
        }
        other => {
            return Err(VigilError::data(format!(
                "column '{}' must be a timezone-aware datetime, got {other}",
                col.name()
            )));
        }
    };

    let raw = col.as_materialized_series().cast(&DataType::Int64)?;
    raw.i64()?
        .into_iter()
        .enumerate()
        .map(|(i, v)| {
            let v = v.ok_or_else(|| VigilError::data(format!("null timestamp at row {i}")))?;
            let ts = match unit {
                TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(v)),
                TimeUnit::Microseconds => DateTime::from_timestamp_micros(v),
                TimeUnit::Milliseconds => DateTime::from_timestamp_millis(v),
            };
            ts.ok_or_else(|| VigilError::data(format!("timestamp out of range at row {i}")))
        })
        .collect()
}

/// Encode UTC timestamps as a polars `Datetime[μs, UTC]` column.
///
/// # Errors
///
/// Propagates polars cast errors.
pub fn timestamp_column(name: &str, timestamps: &[Timestamp]) -> Result<Column> {
    let micros: Vec<i64> = timestamps.iter().map(|t| t.timestamp_micros()).collect();
    let series = Series::new(name.into(), micros).cast(&DataType::Datetime(
        TimeUnit::Microseconds,
        Some("UTC".into()),
    ))?;
    Ok(Column::from(series))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn hours(n: usize) -> Vec<Timestamp> {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| t0 + Duration::hours(i as i64)).collect()
    }

    fn sample_df() -> DataFrame {
        let ts = hours(3);
        let mut ts2 = ts.clone();
        ts2.extend(ts);
        DataFrame::new(vec![
            timestamp_column("timestamp", &ts2).unwrap(),
            Column::new("symbol".into(), ["ETH", "ETH", "ETH", "BTC", "BTC", "BTC"]),
            Column::new("price".into(), [10.0, 11.0, 12.0, 100.0, 101.0, 102.0]),
            Column::new(
                "signal".into(),
                [Some(1.0), None, Some(-1.0), Some(0.5), Some(0.5), Some(0.5)],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_series_validation() {
        assert!(SymbolSeries::new("X", hours(2), vec![1.0], vec![0.0]).is_err());
        assert!(SymbolSeries::new("X", hours(2), vec![1.0, 0.0], vec![0.0; 2]).is_err());
        assert!(SymbolSeries::new("X", hours(2), vec![1.0, f64::NAN], vec![0.0; 2]).is_err());

        let mut ts = hours(3);
        ts.swap(1, 2);
        let err = SymbolSeries::from_prices("X", ts, vec![1.0; 3]).unwrap_err();
        assert!(matches!(err, VigilError::NonMonotonicTimestamps { row: 2, .. }));
    }

    #[test]
    fn test_with_signals() {
        let s = SymbolSeries::from_prices("X", hours(2), vec![1.0, 2.0]).unwrap();
        assert_eq!(s.signals(), &[0.0, 0.0]);
        let s = s.with_signals(vec![1.0, -1.0]).unwrap();
        assert_eq!(s.signals(), &[1.0, -1.0]);
        assert!(s.with_signals(vec![1.0]).is_err());
    }

    #[test]
    fn test_from_rows_groups_and_orders_symbols() {
        let ts = hours(2);
        let frame = PriceSignalFrame::from_rows(vec![
            (ts[0], "ETH".to_string(), 10.0, 1.0),
            (ts[0], "BTC".to_string(), 100.0, 1.0),
            (ts[1], "ETH".to_string(), 11.0, 1.0),
            (ts[1], "BTC".to_string(), 101.0, 1.0),
        ])
        .unwrap();

        assert_eq!(frame.symbols(), vec!["BTC", "ETH"]);
        assert_eq!(frame.get("ETH").unwrap().prices(), &[10.0, 11.0]);
        assert_eq!(frame.len(), 4);
    }

    #[test]
    fn test_duplicate_series_rejected() {
        let a = SymbolSeries::from_prices("X", hours(1), vec![1.0]).unwrap();
        assert!(PriceSignalFrame::from_series(vec![a.clone(), a]).is_err());
    }

    #[test]
    fn test_from_dataframe() {
        let frame = PriceSignalFrame::from_dataframe(&sample_df()).unwrap();
        assert_eq!(frame.symbols(), vec!["BTC", "ETH"]);

        let eth = frame.get("ETH").unwrap();
        assert_eq!(eth.prices(), &[10.0, 11.0, 12.0]);
        assert!(eth.signals()[1].is_nan());
        assert_eq!(eth.timestamps(), hours(3).as_slice());
    }

    #[test]
    fn test_from_dataframe_missing_signal() {
        let df = sample_df().drop("signal").unwrap();
        let err = PriceSignalFrame::from_dataframe(&df).unwrap_err();
        assert!(matches!(err, VigilError::MissingColumn(c) if c == "signal"));

        let frame = PriceSignalFrame::from_price_dataframe(&df).unwrap();
        assert_eq!(frame.get("BTC").unwrap().signals(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_from_dataframe_rejects_naive_timestamps() {
        let ts = Series::new("timestamp".into(), [0_i64, 1_000, 2_000])
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
            .unwrap();
        let df = DataFrame::new(vec![
            Column::from(ts),
            Column::new("symbol".into(), ["A", "A", "A"]),
            Column::new("price".into(), [1.0, 2.0, 3.0]),
            Column::new("signal".into(), [0.0, 0.0, 0.0]),
        ])
        .unwrap();

        let err = PriceSignalFrame::from_dataframe(&df).unwrap_err();
        assert!(matches!(err, VigilError::TimezoneNaive(_)));
    }

    #[test]
    fn test_roundtrip_dataframe() {
        let frame = PriceSignalFrame::from_dataframe(&sample_df()).unwrap();
        let df = frame.to_dataframe().unwrap();
        assert_eq!(df.height(), 6);
        let back = PriceSignalFrame::from_dataframe(&df).unwrap();
        assert_eq!(back.get("BTC"), frame.get("BTC"));
    }
}
