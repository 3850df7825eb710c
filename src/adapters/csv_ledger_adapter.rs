//! CSV ledger writer.

use crate::domain::bar::format_timestamp;
use crate::domain::error::TradesimError;
use crate::domain::ledger::TradeRecord;
use crate::ports::ledger_port::LedgerPort;
use chrono::TimeDelta;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

/// Flat CSV row. Field order is the column order.
#[derive(Debug, Serialize)]
struct LedgerRow {
    id: u64,
    direction: &'static str,
    entry_time: String,
    entry_bar_index: usize,
    entry_price: f64,
    size: f64,
    stop_price: Option<f64>,
    take_price: Option<f64>,
    trailing_distance: Option<f64>,
    risk: Option<f64>,
    max_favor: f64,
    max_adverse: f64,
    exit_time: String,
    exit_bar_index: usize,
    exit_price: f64,
    pnl: f64,
    commission_open: f64,
    commission_close: f64,
    exit_reason: &'static str,
    /// Seconds, fractional when the trade lasted a non-whole number of seconds.
    duration: f64,
    bars_in_trade: usize,
    result: &'static str,
    risk_reward: Option<f64>,
    volume_at_entry: Option<f64>,
}

impl From<&TradeRecord> for LedgerRow {
    fn from(rec: &TradeRecord) -> Self {
        let t = &rec.trade;
        LedgerRow {
            id: t.id,
            direction: t.direction.as_str(),
            entry_time: format_timestamp(&t.entry_time),
            entry_bar_index: t.entry_bar_index,
            entry_price: t.entry_price,
            size: t.size,
            stop_price: t.stop_price,
            take_price: t.take_price,
            trailing_distance: t.trailing_distance,
            risk: t.risk,
            max_favor: t.max_favor,
            max_adverse: t.max_adverse,
            exit_time: format_timestamp(&t.exit_time),
            exit_bar_index: t.exit_bar_index,
            exit_price: t.exit_price,
            pnl: t.pnl,
            commission_open: t.commission_open,
            commission_close: t.commission_close,
            exit_reason: t.exit_reason.as_str(),
            duration: seconds(rec.duration),
            bars_in_trade: rec.bars_in_trade,
            result: rec.result.as_str(),
            risk_reward: rec.risk_reward,
            volume_at_entry: t.volume_at_entry,
        }
    }
}

fn seconds(delta: TimeDelta) -> f64 {
    delta.num_seconds() as f64 + f64::from(delta.subsec_nanos()) / 1e9
}

/// Serialize the ledger as CSV into any writer. Writes nothing for an
/// empty ledger.
pub fn write_ledger<W: Write>(writer: W, ledger: &[TradeRecord]) -> Result<bool, TradesimError> {
    if ledger.is_empty() {
        return Ok(false);
    }
    let mut wtr = csv::Writer::from_writer(writer);
    for rec in ledger {
        wtr.serialize(LedgerRow::from(rec))?;
    }
    wtr.flush()?;
    Ok(true)
}

pub struct CsvLedgerAdapter {
    path: PathBuf,
}

impl CsvLedgerAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl LedgerPort for CsvLedgerAdapter {
    fn write(&self, ledger: &[TradeRecord]) -> Result<bool, TradesimError> {
        if ledger.is_empty() {
            return Ok(false);
        }
        let file = std::fs::File::create(&self.path)?;
        write_ledger(file, ledger)
    }
}
