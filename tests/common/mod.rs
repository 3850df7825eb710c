#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use std::io::Write;
use std::path::{Path, PathBuf};
pub use tradesim::domain::bar::{Bar, Enrichment, PriceRow, SignalRow};
use tradesim::domain::backtest::BacktestConfig;
use tradesim::domain::execution::ExecutionConfig;

/// Hourly timestamps starting 2024-01-15 00:00.
pub fn ts(i: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 15)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + TimeDelta::hours(i as i64)
}

pub fn make_bar(i: usize, high: f64, low: f64, close: f64, signal: i64) -> Bar {
    Bar {
        timestamp: ts(i),
        open: close,
        high,
        low,
        close,
        volume: Some(1000.0),
        signal,
        enrichment: Enrichment::default(),
    }
}

/// A bar that never reaches anything: high = low = close.
pub fn flat(i: usize, close: f64) -> Bar {
    make_bar(i, close, close, close, 0)
}

pub fn with_enrichment(mut bar: Bar, enrichment: Enrichment) -> Bar {
    bar.enrichment = enrichment;
    bar
}

pub fn price(i: usize, open: f64, high: f64, low: f64, close: f64) -> PriceRow {
    PriceRow {
        timestamp: ts(i),
        open,
        high,
        low,
        close,
        volume: None,
    }
}

pub fn signal(i: usize, value: i64) -> SignalRow {
    SignalRow {
        timestamp: ts(i),
        signal: value,
        enrichment: Enrichment::default(),
    }
}

pub fn frictionless() -> BacktestConfig {
    BacktestConfig::default()
}

pub fn hedge() -> BacktestConfig {
    BacktestConfig {
        single_position_mode: false,
        ..BacktestConfig::default()
    }
}

pub fn with_costs(commission_perc: f64, slippage: f64) -> BacktestConfig {
    BacktestConfig {
        execution: ExecutionConfig {
            commission_perc,
            slippage,
        },
        ..BacktestConfig::default()
    }
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}
