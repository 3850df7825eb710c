//! CSV file data adapter.
//!
//! Columns are located by header name (case-insensitive), so column order
//! is free and extra columns are ignored. The timestamp column may be
//! called `timestamp` or `datetime`.

use crate::domain::bar::{Enrichment, PriceRow, SignalRow, parse_timestamp};
use crate::domain::error::{InputError, TradesimError};
use crate::ports::data_port::DataPort;
use csv::StringRecord;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

const PRICE: &str = "price";
const SIGNAL: &str = "signal";
const TIMESTAMP_ALIASES: [&str; 2] = ["timestamp", "datetime"];

pub struct CsvAdapter {
    prices_path: PathBuf,
    signals_path: Option<PathBuf>,
}

impl CsvAdapter {
    pub fn new(prices_path: PathBuf, signals_path: Option<PathBuf>) -> Self {
        Self {
            prices_path,
            signals_path,
        }
    }
}

impl DataPort for CsvAdapter {
    fn load_prices(&self) -> Result<Vec<PriceRow>, TradesimError> {
        let content = read_file(&self.prices_path)?;
        read_prices(content.as_bytes())
    }

    fn load_signals(&self) -> Result<Vec<SignalRow>, TradesimError> {
        match &self.signals_path {
            Some(path) => {
                let content = read_file(path)?;
                read_signals(content.as_bytes())
            }
            None => Ok(Vec::new()),
        }
    }
}

fn read_file(path: &Path) -> Result<String, TradesimError> {
    fs::read_to_string(path).map_err(|e| {
        TradesimError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read {}: {}", path.display(), e),
        ))
    })
}

/// Header name -> column index lookup for one series.
struct Columns {
    series: &'static str,
    headers: Vec<String>,
}

impl Columns {
    fn new(series: &'static str, headers: &StringRecord) -> Self {
        Self {
            series,
            headers: headers.iter().map(|h| h.trim().to_lowercase()).collect(),
        }
    }

    fn find(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    fn require(&self, name: &str) -> Result<usize, InputError> {
        self.find(name).ok_or_else(|| InputError::MissingColumn {
            series: self.series.to_string(),
            column: name.to_string(),
        })
    }

    fn timestamp(&self) -> Result<usize, InputError> {
        TIMESTAMP_ALIASES
            .iter()
            .find_map(|name| self.find(name))
            .ok_or_else(|| InputError::MissingColumn {
                series: self.series.to_string(),
                column: "timestamp".to_string(),
            })
    }
}

/// Row-level cell parsing with error context.
struct Row<'a> {
    series: &'static str,
    index: usize,
    record: &'a StringRecord,
}

impl Row<'_> {
    fn cell(&self, col: usize) -> &str {
        self.record.get(col).unwrap_or("").trim()
    }

    fn invalid(&self, column: &str, value: &str) -> InputError {
        InputError::InvalidNumber {
            series: self.series.to_string(),
            row: self.index,
            column: column.to_string(),
            value: value.to_string(),
        }
    }

    fn timestamp(&self, col: usize) -> Result<chrono::NaiveDateTime, InputError> {
        let raw = self.cell(col);
        parse_timestamp(raw).ok_or_else(|| InputError::InvalidTimestamp {
            series: self.series.to_string(),
            row: self.index,
            value: raw.to_string(),
        })
    }

    fn price(&self, col: usize, column: &str) -> Result<f64, InputError> {
        let raw = self.cell(col);
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| self.invalid(column, raw))
    }

    /// Empty, null-like and non-finite cells are absent.
    fn optional(&self, col: Option<usize>, column: &str) -> Result<Option<f64>, InputError> {
        let Some(col) = col else {
            return Ok(None);
        };
        let raw = self.cell(col);
        if is_null(raw) {
            return Ok(None);
        }
        raw.parse::<f64>()
            .map(|v| Some(v).filter(|v| v.is_finite()))
            .map_err(|_| self.invalid(column, raw))
    }

    fn signal(&self, col: Option<usize>) -> Result<i64, InputError> {
        let Some(col) = col else {
            return Ok(0);
        };
        let raw = self.cell(col);
        if is_null(raw) {
            return Ok(0);
        }
        if let Ok(v) = raw.parse::<i64>() {
            return Ok(v);
        }
        match raw.parse::<f64>() {
            Ok(v) if v.is_nan() => Ok(0),
            Ok(v) if v.is_finite() => Ok(v.trunc() as i64),
            _ => Err(self.invalid("signal", raw)),
        }
    }
}

fn is_null(raw: &str) -> bool {
    raw.is_empty() || matches!(raw.to_lowercase().as_str(), "nan" | "null" | "none" | "na")
}

/// Parse a price series. Requires timestamp and OHLC columns; volume is optional.
pub fn read_prices<R: Read>(reader: R) -> Result<Vec<PriceRow>, TradesimError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let columns = Columns::new(PRICE, rdr.headers()?);

    let ts_col = columns.timestamp()?;
    let open_col = columns.require("open")?;
    let high_col = columns.require("high")?;
    let low_col = columns.require("low")?;
    let close_col = columns.require("close")?;
    let volume_col = columns.find("volume");

    let mut rows = Vec::new();
    for (index, result) in rdr.records().enumerate() {
        let record = result?;
        let row = Row {
            series: PRICE,
            index,
            record: &record,
        };
        rows.push(PriceRow {
            timestamp: row.timestamp(ts_col)?,
            open: row.price(open_col, "open")?,
            high: row.price(high_col, "high")?,
            low: row.price(low_col, "low")?,
            close: row.price(close_col, "close")?,
            volume: row.optional(volume_col, "volume")?,
        });
    }

    Ok(rows)
}

/// Parse a signal series. A missing `signal` column means no signals;
/// missing enrichment columns switch that feature off for every row.
pub fn read_signals<R: Read>(reader: R) -> Result<Vec<SignalRow>, TradesimError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let columns = Columns::new(SIGNAL, rdr.headers()?);

    let ts_col = columns.timestamp()?;
    let signal_col = columns.find("signal");
    let stop_col = columns.find("stop_price");
    let take_col = columns.find("take_price");
    let size_col = columns.find("size");
    let risk_col = columns.find("risk");
    let trail_col = columns.find("trailing_distance");

    let mut rows = Vec::new();
    for (index, result) in rdr.records().enumerate() {
        let record = result?;
        let row = Row {
            series: SIGNAL,
            index,
            record: &record,
        };
        rows.push(SignalRow {
            timestamp: row.timestamp(ts_col)?,
            signal: row.signal(signal_col)?,
            enrichment: Enrichment {
                stop_price: row.optional(stop_col, "stop_price")?,
                take_price: row.optional(take_col, "take_price")?,
                size: row.optional(size_col, "size")?,
                risk: row.optional(risk_col, "risk")?,
                trailing_distance: row.optional(trail_col, "trailing_distance")?,
            },
        });
    }

    Ok(rows)
}
