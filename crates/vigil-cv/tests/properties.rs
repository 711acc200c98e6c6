//! Property tests for the splitters.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use vigil_cv::{
    PurgedKFold, RollingSplitConfig, assert_increasing_windows, assert_no_overlap, rolling_splits,
};

proptest! {
    #[test]
    fn folds_partition_rows_without_gaps(n_rows in 0usize..300, n_splits in 2usize..12) {
        let cv = PurgedKFold::new(n_splits, 0, 0).unwrap();
        let mut tested = Vec::new();

        for fold in cv.split(n_rows) {
            let mut all: Vec<usize> = fold.train_idx.iter().chain(&fold.test_idx).copied().collect();
            all.sort_unstable();
            prop_assert_eq!(all, (0..n_rows).collect::<Vec<_>>());
            tested.extend(fold.test_idx);
        }

        // Test blocks tile the index exactly once.
        prop_assert_eq!(tested, (0..n_rows).collect::<Vec<_>>());
    }

    #[test]
    fn purge_and_embargo_respected(
        n_rows in 1usize..300,
        n_splits in 2usize..12,
        purge in 0usize..20,
        embargo in 0usize..20,
    ) {
        let cv = PurgedKFold::new(n_splits, purge, embargo).unwrap();
        prop_assert_eq!(cv.split(n_rows).len(), n_splits);

        for fold in cv.split(n_rows) {
            let (Some(&start), Some(&last)) = (fold.test_idx.first(), fold.test_idx.last()) else {
                continue;
            };
            let lo = start.saturating_sub(purge);
            let hi = last + 1 + embargo;
            for &t in &fold.train_idx {
                prop_assert!(t < lo || t >= hi, "train row {} inside [{}, {})", t, lo, hi);
            }
            // Nothing outside the gap is lost.
            let kept = (0..n_rows).filter(|&i| i < lo || i >= hi).count();
            prop_assert_eq!(fold.train_idx.len(), kept);
        }
    }

    #[test]
    fn rolling_folds_are_disjoint_and_ordered(
        n_bars in 0i64..200,
        train_h in 1i64..24,
        valid_h in 1i64..12,
        step_h in 1i64..12,
        embargo_h in 0i64..6,
    ) {
        let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let ts: Vec<_> = (0..n_bars).map(|i| t0 + Duration::hours(i)).collect();
        let cfg = RollingSplitConfig::new(Duration::hours(train_h), Duration::hours(valid_h))
            .with_step(Duration::hours(step_h))
            .with_embargo(Duration::hours(embargo_h));

        let folds = rolling_splits(&ts, &cfg).unwrap();
        prop_assert!(assert_no_overlap(&folds).is_ok());
        if step_h >= valid_h {
            prop_assert!(assert_increasing_windows(&folds).is_ok());
        }
        for fold in &folds {
            let train_last = *fold.train_idx.last().unwrap();
            let valid_first = fold.valid_idx[0];
            prop_assert!(ts[valid_first] - ts[train_last] > Duration::hours(embargo_h));
        }
    }
}
