//! Bar-by-bar trade simulation.
//!
//! Each bar is processed in a fixed order: every open trade first has its
//! excursion widened, its trailing stop ratcheted and its stop/target
//! tested; only then is the bar's signal acted on.

use chrono::NaiveDateTime;
use tracing::{debug, info};

use super::bar::Bar;
use super::execution::{ExecutionConfig, close_trade, open_trade};
use super::ledger::{TradeRecord, aggregate};
use super::trade::{ClosedTrade, ExitPriority, ExitReason, OpenTrade};

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    /// Starting balance for equity derivation; P&L does not depend on it.
    pub initial_capital: f64,
    /// At most one open trade; a new signal closes whatever is open first.
    /// When false (hedge mode) signals open trades additively.
    pub single_position_mode: bool,
    pub execution: ExecutionConfig,
    pub exit_priority: ExitPriority,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 1000.0,
            single_position_mode: true,
            execution: ExecutionConfig::default(),
            exit_priority: ExitPriority::StopFirst,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub trades: Vec<TradeRecord>,
    pub bar_count: usize,
    pub initial_capital: f64,
}

/// Streaming simulator. Feed bars in ascending timestamp order with
/// [`Simulator::on_bar`], then call [`Simulator::finish`] to force-close
/// anything still open at the last bar.
#[derive(Debug)]
pub struct Simulator<'a> {
    config: &'a BacktestConfig,
    open: Vec<OpenTrade>,
    closed: Vec<ClosedTrade>,
    next_id: u64,
    bar_count: usize,
    last_bar: Option<(NaiveDateTime, f64)>,
}

impl<'a> Simulator<'a> {
    pub fn new(config: &'a BacktestConfig) -> Self {
        Simulator {
            config,
            open: Vec::new(),
            closed: Vec::new(),
            next_id: 0,
            bar_count: 0,
            last_bar: None,
        }
    }

    pub fn open_trades(&self) -> &[OpenTrade] {
        &self.open
    }

    pub fn closed_trades(&self) -> &[ClosedTrade] {
        &self.closed
    }

    pub fn bar_count(&self) -> usize {
        self.bar_count
    }

    pub fn on_bar(&mut self, bar: &Bar) {
        debug_assert!(
            self.last_bar.is_none_or(|(ts, _)| ts < bar.timestamp),
            "bars must be strictly ascending"
        );
        let index = self.bar_count;
        let exec = self.config.execution;

        let mut still_open = Vec::with_capacity(self.open.len() + 1);
        for mut trade in self.open.drain(..) {
            trade.update_excursion(bar.high, bar.low);
            trade.ratchet_trailing_stop(bar.close);
            match trade.check_exit(bar.high, bar.low, self.config.exit_priority) {
                Some((reason, price)) => {
                    let closed = close_trade(trade, price, bar.timestamp, index, reason, &exec);
                    log_close(&closed);
                    self.closed.push(closed);
                }
                None => still_open.push(trade),
            }
        }
        self.open = still_open;

        if let Some(direction) = bar.signal_direction() {
            if self.config.single_position_mode {
                for trade in self.open.drain(..) {
                    let closed =
                        close_trade(trade, bar.close, bar.timestamp, index, ExitReason::Signal, &exec);
                    log_close(&closed);
                    self.closed.push(closed);
                }
            }

            let trade = open_trade(self.next_id, direction, bar, index, &exec);
            self.next_id += 1;
            debug!(
                id = trade.id,
                direction = %trade.direction,
                bar = index,
                entry_price = trade.entry_price,
                size = trade.size,
                "trade opened"
            );
            self.open.push(trade);
        }

        self.bar_count += 1;
        self.last_bar = Some((bar.timestamp, bar.close));
    }

    /// Close every remaining trade at the last bar's close and return the
    /// closed trades in the order they were closed.
    pub fn finish(mut self) -> Vec<ClosedTrade> {
        if let Some((timestamp, close)) = self.last_bar {
            let index = self.bar_count - 1;
            let exec = self.config.execution;
            for trade in self.open.drain(..) {
                let closed =
                    close_trade(trade, close, timestamp, index, ExitReason::EndOfData, &exec);
                log_close(&closed);
                self.closed.push(closed);
            }
        }
        self.closed
    }
}

fn log_close(trade: &ClosedTrade) {
    debug!(
        id = trade.id,
        direction = %trade.direction,
        bar = trade.exit_bar_index,
        exit_price = trade.exit_price,
        reason = %trade.exit_reason,
        pnl = trade.pnl,
        "trade closed"
    );
}

/// Run a full simulation over merged bars and aggregate the ledger.
pub fn run_backtest(bars: &[Bar], config: &BacktestConfig) -> BacktestResult {
    let mut sim = Simulator::new(config);
    for bar in bars {
        sim.on_bar(bar);
    }
    let bar_count = sim.bar_count();
    let trades = aggregate(sim.finish());

    info!(bars = bar_count, trades = trades.len(), "backtest complete");

    BacktestResult {
        trades,
        bar_count,
        initial_capital: config.initial_capital,
    }
}
