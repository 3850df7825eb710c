//! Closed-trade ledger with derived per-trade fields.

use chrono::TimeDelta;
use std::fmt;

use super::trade::ClosedTrade;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeOutcome {
    Win,
    Loss,
    Breakeven,
}

impl TradeOutcome {
    pub fn classify(pnl: f64) -> Self {
        if pnl > 0.0 {
            TradeOutcome::Win
        } else if pnl < 0.0 {
            TradeOutcome::Loss
        } else {
            TradeOutcome::Breakeven
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TradeOutcome::Win => "win",
            TradeOutcome::Loss => "loss",
            TradeOutcome::Breakeven => "be",
        }
    }
}

impl fmt::Display for TradeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One ledger row: the closed trade plus fields derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub trade: ClosedTrade,
    pub duration: TimeDelta,
    pub bars_in_trade: usize,
    pub result: TradeOutcome,
    /// pnl / risk; `None` when risk is absent or zero.
    pub risk_reward: Option<f64>,
}

impl TradeRecord {
    pub fn from_closed(trade: ClosedTrade) -> Self {
        let duration = trade.exit_time - trade.entry_time;
        let bars_in_trade = trade.exit_bar_index - trade.entry_bar_index;
        let result = TradeOutcome::classify(trade.pnl);
        let risk_reward = trade
            .risk
            .filter(|r| *r != 0.0)
            .map(|r| trade.pnl / r);
        TradeRecord {
            trade,
            duration,
            bars_in_trade,
            result,
            risk_reward,
        }
    }
}

/// Derive ledger fields for every closed trade, preserving order.
pub fn aggregate(closed: Vec<ClosedTrade>) -> Vec<TradeRecord> {
    closed.into_iter().map(TradeRecord::from_closed).collect()
}

/// The last `n` rows of the ledger.
pub fn tail(ledger: &[TradeRecord], n: usize) -> &[TradeRecord] {
    &ledger[ledger.len().saturating_sub(n)..]
}
