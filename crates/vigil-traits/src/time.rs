//! Bar spacing and annualization.
//!
//! Sampling may be irregular (exchange outages, weekend gaps), so the bar length
//! is taken as the *median* spacing between consecutive timestamps rather than
//! the first or mean delta.

use crate::{Result, VigilError};
use chrono::{DateTime, Utc};

/// A UTC timestamp. Timezone awareness is carried by the type.
pub type Timestamp = DateTime<Utc>;

/// Seconds in a Julian year (365.25 days).
pub const SECONDS_PER_YEAR: f64 = 365.25 * 24.0 * 3600.0;

/// Check that `timestamps` is strictly increasing.
///
/// # Errors
///
/// Returns [`VigilError::NonMonotonicTimestamps`] naming `symbol` and the first
/// offending row.
pub fn ensure_strictly_increasing(symbol: &str, timestamps: &[Timestamp]) -> Result<()> {
    match timestamps.windows(2).position(|w| w[1] <= w[0]) {
        Some(i) => Err(VigilError::NonMonotonicTimestamps {
            symbol: symbol.to_string(),
            row: i + 1,
        }),
        None => Ok(()),
    }
}

/// Median spacing between consecutive timestamps, in seconds.
///
/// Returns `None` when fewer than two timestamps are given. For an even number
/// of deltas the two middle values are averaged.
pub fn median_bar_seconds(timestamps: &[Timestamp]) -> Option<f64> {
    if timestamps.len() < 2 {
        return None;
    }

    let mut deltas: Vec<f64> = timestamps
        .windows(2)
        .map(|w| (w[1] - w[0]).num_milliseconds() as f64 / 1000.0)
        .collect();
    deltas.sort_by(f64::total_cmp);

    let mid = deltas.len() / 2;
    let median = if deltas.len() % 2 == 0 {
        0.5 * (deltas[mid - 1] + deltas[mid])
    } else {
        deltas[mid]
    };
    Some(median)
}

/// Number of bars per year implied by the median bar spacing.
///
/// Returns `Ok(None)` when there are fewer than two timestamps (nothing to infer).
///
/// # Errors
///
/// Returns [`VigilError::InvalidData`] when the median spacing is not positive,
/// which only happens for non-increasing timestamps.
pub fn annualization_factor(timestamps: &[Timestamp]) -> Result<Option<f64>> {
    match median_bar_seconds(timestamps) {
        None => Ok(None),
        Some(dt) if dt > 0.0 => Ok(Some(SECONDS_PER_YEAR / dt)),
        Some(dt) => Err(VigilError::data(format!(
            "non-increasing timestamps: median bar spacing is {dt}s"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone};

    fn hourly(n: usize) -> Vec<Timestamp> {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| t0 + Duration::hours(i as i64)).collect()
    }

    #[test]
    fn test_hourly_annualization() {
        let ann = annualization_factor(&hourly(48)).unwrap().unwrap();
        assert_relative_eq!(ann, 8766.0, epsilon = 1e-9);
    }

    #[test]
    fn test_median_tolerates_gaps() {
        let mut ts = hourly(10);
        // A weekend-sized hole in the middle does not move the median.
        for t in ts.iter_mut().skip(5) {
            *t += Duration::hours(48);
        }
        assert_relative_eq!(median_bar_seconds(&ts).unwrap(), 3600.0);
    }

    #[test]
    fn test_even_number_of_deltas_averages() {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let ts = vec![
            t0,
            t0 + Duration::seconds(10),
            t0 + Duration::seconds(40),
        ];
        assert_relative_eq!(median_bar_seconds(&ts).unwrap(), 20.0);
    }

    #[test]
    fn test_single_timestamp_has_no_factor() {
        assert!(annualization_factor(&hourly(1)).unwrap().is_none());
        assert!(annualization_factor(&[]).unwrap().is_none());
    }

    #[test]
    fn test_non_increasing_rejected() {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let ts = vec![t0, t0, t0];
        assert!(annualization_factor(&ts).is_err());

        let err = ensure_strictly_increasing("ETH", &ts).unwrap_err();
        assert!(matches!(
            err,
            VigilError::NonMonotonicTimestamps { row: 1, .. }
        ));
    }

    #[test]
    fn test_strictly_increasing_ok() {
        assert!(ensure_strictly_increasing("ETH", &hourly(5)).is_ok());
    }
}
