//! End-to-end: labels → folds → backtest → risk report.

use approx::assert_relative_eq;
use chrono::{Duration, TimeZone, Utc};
use vigil::prelude::*;

/// Deterministic zig-zag with drift, so barriers and VaR breaches occur.
fn prices(n: usize, drift: f64, phase: usize) -> Vec<f64> {
    let mut p = 100.0;
    (0..n)
        .map(|i| {
            let wave = [0.012, -0.008, 0.015, -0.02, 0.005, -0.011, 0.009][(i + phase) % 7];
            p *= 1.0 + drift + wave;
            p
        })
        .collect()
}

fn frame(n: usize) -> PriceSignalFrame {
    let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let ts: Vec<_> = (0..n).map(|i| t0 + Duration::hours(i as i64)).collect();
    PriceSignalFrame::from_series(vec![
        SymbolSeries::from_prices("BTC-USDT", ts.clone(), prices(n, 0.001, 0)).unwrap(),
        SymbolSeries::from_prices("ETH-USDT", ts[24..].to_vec(), prices(n - 24, -0.0005, 3))
            .unwrap(),
    ])
    .unwrap()
}

#[test]
fn full_pipeline() {
    let frame = frame(400);

    // Labels
    let spec = LabelSpec::TripleBarrier(TripleBarrierConfig {
        horizon: 12,
        vol_window: 20,
        ..Default::default()
    });
    let labels = label_frame(&frame, &spec, NanPolicy::DropUnlabeled).unwrap();
    assert_eq!(labels.len(), frame.len() - 2 * 12);
    assert!(labels.label_col.starts_with("tb_lbl_h12"));

    // Folds over the labeled rows
    let cv = PurgedKFold::new(5, 12, 12).unwrap();
    let folds: Vec<_> = cv.split(labels.len()).collect();
    assert_eq!(folds.len(), 5);
    for fold in &folds {
        assert!(!fold.train_idx.is_empty());
        assert!(fold.train_idx.iter().all(|i| !fold.test_idx.contains(i)));
    }

    // Baseline signal, simulation and summary
    let signals = BaselineSignal::SmaCrossover { fast: 5, slow: 20 }
        .apply_frame(&frame)
        .unwrap();
    let cfg = BacktestConfig {
        vol_lookback: 24,
        ..Default::default()
    };
    let portfolio = simulate(&signals, &cfg).unwrap();
    assert_eq!(portfolio.len(), 400);
    assert_eq!(portfolio.legs.len(), 2);
    assert_relative_eq!(portfolio.ann_fac.unwrap(), 365.25 * 24.0, epsilon = 1e-9);

    let summary = PerformanceSummary::from_portfolio(&portfolio);
    assert_eq!(summary.bars, 400);
    assert!(summary.max_drawdown <= 0.0);

    // Risk
    let report = RiskReport::from_portfolio(&portfolio, &RiskConfig { alpha: 0.95 }).unwrap();
    assert_eq!(report.bars, 400);
    assert_relative_eq!(report.sharpe, summary.sharpe, epsilon = 1e-12);
    assert_relative_eq!(report.max_drawdown, summary.max_drawdown, epsilon = 1e-12);
    assert!(report.es_historic >= report.var_historic);
    assert!(report.kupiec_pvalue.is_finite());
    assert!(report.to_markdown("SMA 5/20").contains("Kupiec p-value"));
}

#[test]
fn dataframe_boundary_roundtrip() {
    let frame = BaselineSignal::Hodl.apply_frame(&frame(60)).unwrap();
    let df = frame.to_dataframe().unwrap();
    let back = PriceSignalFrame::from_dataframe(&df).unwrap();
    assert_eq!(back, frame);

    let result = simulate(&back, &BacktestConfig::default()).unwrap();
    let legs = result.legs_dataframe().unwrap();
    assert_eq!(legs.height(), frame.len());
    assert_eq!(result.to_dataframe().unwrap().height(), 60);
}

#[test]
fn rolling_splits_over_portfolio_axis() {
    let frame = frame(200);
    let portfolio = simulate(&frame, &BacktestConfig::default()).unwrap();
    let cfg = RollingSplitConfig::new(Duration::hours(48), Duration::hours(24))
        .with_embargo(Duration::hours(6));
    let folds = rolling_splits(&portfolio.timestamps, &cfg).unwrap();

    assert!(!folds.is_empty());
    vigil::cv::assert_no_overlap(&folds).unwrap();
    vigil::cv::assert_increasing_windows(&folds).unwrap();
}
