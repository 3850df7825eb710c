//! Price rows, signal rows and the merged bar they produce.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::trade::Direction;

/// One row of the authoritative price series.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRow {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
}

/// Optional per-signal trade parameters. `None` means the feature is off for that row.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Enrichment {
    pub stop_price: Option<f64>,
    pub take_price: Option<f64>,
    pub size: Option<f64>,
    pub risk: Option<f64>,
    pub trailing_distance: Option<f64>,
}

/// One row of the signal series. Positive signal requests a long entry,
/// negative a short entry, zero does nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRow {
    pub timestamp: NaiveDateTime,
    pub signal: i64,
    pub enrichment: Enrichment,
}

/// A price row joined with whatever signal shares its timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
    pub signal: i64,
    pub enrichment: Enrichment,
}

impl Bar {
    pub fn from_price(row: &PriceRow) -> Self {
        Bar {
            timestamp: row.timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
            signal: 0,
            enrichment: Enrichment::default(),
        }
    }

    /// Direction requested by this bar's signal, if any.
    pub fn signal_direction(&self) -> Option<Direction> {
        match self.signal {
            s if s > 0 => Some(Direction::Long),
            s if s < 0 => Some(Direction::Short),
            _ => None,
        }
    }
}

const TIMESTAMP_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a timestamp cell. Accepts ISO-like date-times, bare dates and
/// integer epoch milliseconds.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(ts);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    value
        .parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .map(|dt| dt.naive_utc())
}

/// Inverse of [`parse_timestamp`] for date-times. Sub-second digits are
/// written only when present.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()
}
