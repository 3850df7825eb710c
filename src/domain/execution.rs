//! Trade execution: opening trades from signals and closing them out.
//!
//! Slippage always works against the trader, on entry and on exit alike.
//! Commission is a fraction of notional at the realized price.

use chrono::NaiveDateTime;

use super::bar::Bar;
use super::trade::{ClosedTrade, Direction, ExitReason, OpenTrade, gross_pnl};

/// Friction parameters applied to every fill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionConfig {
    pub commission_perc: f64,
    pub slippage: f64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            commission_perc: 0.0,
            slippage: 0.0,
        }
    }
}

/// commission_perc * price * size
pub fn calculate_commission(price: f64, size: f64, config: &ExecutionConfig) -> f64 {
    config.commission_perc * price * size
}

/// Long pays up: price * (1 + slippage). Short receives less: price * (1 - slippage).
pub fn apply_entry_slippage(price: f64, direction: Direction, slippage: f64) -> f64 {
    match direction {
        Direction::Long => price * (1.0 + slippage),
        Direction::Short => price * (1.0 - slippage),
    }
}

/// Long sells lower: price * (1 - slippage). Short covers higher: price * (1 + slippage).
pub fn apply_exit_slippage(price: f64, direction: Direction, slippage: f64) -> f64 {
    match direction {
        Direction::Long => price * (1.0 - slippage),
        Direction::Short => price * (1.0 + slippage),
    }
}

/// Open a trade at the bar's close in the given direction.
///
/// Size defaults to 1. When the signal carries no risk but does carry a
/// stop, risk is inferred as `|entry_price - stop_price| * size`.
pub fn open_trade(
    id: u64,
    direction: Direction,
    bar: &Bar,
    bar_index: usize,
    config: &ExecutionConfig,
) -> OpenTrade {
    let enrichment = &bar.enrichment;
    let size = enrichment.size.unwrap_or(1.0);
    let entry_price = apply_entry_slippage(bar.close, direction, config.slippage);
    let commission_open = calculate_commission(entry_price, size, config);

    let risk = enrichment.risk.or_else(|| {
        enrichment
            .stop_price
            .map(|stop| (entry_price - stop).abs() * size)
    });

    OpenTrade {
        id,
        direction,
        size,
        entry_price,
        entry_time: bar.timestamp,
        entry_bar_index: bar_index,
        stop_price: enrichment.stop_price,
        take_price: enrichment.take_price,
        trailing_distance: enrichment.trailing_distance,
        risk,
        max_favor: 0.0,
        max_adverse: 0.0,
        commission_open,
        volume_at_entry: bar.volume,
    }
}

/// Close a trade at `market_price` (before slippage).
///
/// Pure: the same inputs always produce the same record.
pub fn close_trade(
    trade: OpenTrade,
    market_price: f64,
    exit_time: NaiveDateTime,
    exit_bar_index: usize,
    exit_reason: ExitReason,
    config: &ExecutionConfig,
) -> ClosedTrade {
    let exit_price = apply_exit_slippage(market_price, trade.direction, config.slippage);
    let commission_close = calculate_commission(exit_price, trade.size, config);
    let pnl = gross_pnl(trade.direction, trade.entry_price, exit_price, trade.size)
        - trade.commission_open
        - commission_close;

    ClosedTrade {
        id: trade.id,
        direction: trade.direction,
        size: trade.size,
        entry_price: trade.entry_price,
        entry_time: trade.entry_time,
        entry_bar_index: trade.entry_bar_index,
        stop_price: trade.stop_price,
        take_price: trade.take_price,
        trailing_distance: trade.trailing_distance,
        risk: trade.risk,
        max_favor: trade.max_favor,
        max_adverse: trade.max_adverse,
        commission_open: trade.commission_open,
        volume_at_entry: trade.volume_at_entry,
        exit_price,
        exit_time,
        exit_bar_index,
        exit_reason,
        commission_close,
        pnl,
    }
}
