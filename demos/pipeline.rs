//! End-to-end walkthrough on a synthetic hourly panel.
//!
//! This example demonstrates:
//! - Building triple-barrier labels for every symbol
//! - Splitting the labeled rows into purged k-fold and walk-forward folds
//! - Simulating an SMA crossover baseline with vol targeting and costs
//! - Rendering the portfolio risk report
//!
//! ```text
//! RUST_LOG=vigil_backtest=debug cargo run -p vigil-demos --example pipeline
//! ```

use chrono::{Duration, TimeZone, Utc};
use tracing::info;
use tracing_subscriber::EnvFilter;
use vigil::prelude::*;

/// Ninety days of hourly bars.
const BARS: usize = 24 * 90;

/// Deterministic log-price path: a slow cycle plus a pseudo-random walk.
fn synthetic_prices(n: usize, seed: u64, drift: f64) -> Vec<f64> {
    let mut state = seed;
    let mut log_p = 100.0_f64.ln();
    (0..n)
        .map(|i| {
            // xorshift64
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let noise = (state % 2001) as f64 / 1000.0 - 1.0;
            let cycle = (i as f64 / 96.0).sin() * 0.002;
            log_p += drift + cycle + noise * 0.008;
            log_p.exp()
        })
        .collect()
}

fn build_frame() -> Result<PriceSignalFrame> {
    let t0 = Utc
        .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| VigilError::data("invalid start timestamp"))?;
    let ts: Vec<Timestamp> = (0..BARS).map(|i| t0 + Duration::hours(i as i64)).collect();

    PriceSignalFrame::from_series(vec![
        SymbolSeries::from_prices("BTC-USDT", ts.clone(), synthetic_prices(BARS, 7, 0.0001))?,
        SymbolSeries::from_prices("ETH-USDT", ts.clone(), synthetic_prices(BARS, 11, 0.0))?,
        SymbolSeries::from_prices("SOL-USDT", ts, synthetic_prices(BARS, 23, -0.00005))?,
    ])
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let frame = build_frame()?;
    info!(rows = frame.len(), symbols = ?frame.symbols(), "synthetic panel built");

    // Targets
    let spec = LabelSpec::from_json_str(
        r#"{"kind": "triple_barrier", "horizon": 24, "up_mult": 2.0, "dn_mult": 2.0, "vol_window": 50}"#,
    )?;
    let labels = label_frame(&frame, &spec, NanPolicy::DropUnlabeled)?;
    info!(column = %labels.label_col, rows = labels.len(), "labels computed");

    // Folds
    let cv = PurgedKFold::new(5, 24, 24)?;
    for fold in cv.split(labels.len()) {
        info!(
            fold = fold.index,
            train = fold.train_idx.len(),
            test = fold.test_idx.len(),
            "purged fold"
        );
    }

    let walk_forward = RollingSplitConfig::new(Duration::days(30), Duration::days(7))
        .with_embargo(Duration::days(1));
    let windows = rolling_splits(frame.series()[0].timestamps(), &walk_forward)?;
    info!(folds = windows.len(), "walk-forward windows");

    // Simulation
    let signals = BaselineSignal::SmaCrossover { fast: 24, slow: 96 }.apply_frame(&frame)?;
    let config = BacktestConfig::from_json_str(r#"{"vol_lookback": 72}"#)?;
    let portfolio = simulate(&signals, &config)?;

    let summary = PerformanceSummary::from_portfolio(&portfolio);
    println!("{}\n", serde_json::to_string_pretty(&summary)?);

    for leg in &portfolio.legs {
        let leg_report = RiskReport::from_backtest(leg, &RiskConfig::default())?;
        info!(
            symbol = %leg.symbol,
            sharpe = leg_report.sharpe,
            max_drawdown = leg_report.max_drawdown,
            "leg risk"
        );
    }

    // Risk
    let report = RiskReport::from_portfolio(&portfolio, &RiskConfig { alpha: 0.99 })?;
    println!("{}", report.to_markdown("SMA 24/96, equal weight"));
    Ok(())
}
