//! Open and closed trade records and the per-bar lifecycle steps.

use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Long => "long",
            Direction::Short => "short",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    Signal,
    EndOfData,
}

impl ExitReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ExitReason::StopLoss => "sl",
            ExitReason::TakeProfit => "tp",
            ExitReason::Signal => "signal",
            ExitReason::EndOfData => "eod",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Which level wins when a single bar touches both stop and target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExitPriority {
    /// Assume the adverse move happened first within the bar.
    #[default]
    StopFirst,
    TargetFirst,
}

/// A trade that is still live. Owned by the simulator until it is closed.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenTrade {
    pub id: u64,
    pub direction: Direction,
    pub size: f64,
    pub entry_price: f64,
    pub entry_time: NaiveDateTime,
    pub entry_bar_index: usize,
    pub stop_price: Option<f64>,
    pub take_price: Option<f64>,
    pub trailing_distance: Option<f64>,
    pub risk: Option<f64>,
    pub max_favor: f64,
    pub max_adverse: f64,
    pub commission_open: f64,
    pub volume_at_entry: Option<f64>,
}

impl OpenTrade {
    /// Widen MFE/MAE using the bar's extremes against the entry price.
    pub fn update_excursion(&mut self, high: f64, low: f64) {
        let (best, worst) = match self.direction {
            Direction::Long => (
                (high - self.entry_price) * self.size,
                (low - self.entry_price) * self.size,
            ),
            Direction::Short => (
                (self.entry_price - low) * self.size,
                (self.entry_price - high) * self.size,
            ),
        };
        self.max_favor = self.max_favor.max(best);
        self.max_adverse = self.max_adverse.min(worst);
    }

    /// Move the stop toward `close` by the trailing distance. The stop only
    /// ever tightens; with no stop yet the candidate becomes the initial stop.
    pub fn ratchet_trailing_stop(&mut self, close: f64) {
        let Some(distance) = self.trailing_distance else {
            return;
        };
        let candidate = match self.direction {
            Direction::Long => close - distance,
            Direction::Short => close + distance,
        };
        self.stop_price = Some(match (self.stop_price, self.direction) {
            (None, _) => candidate,
            (Some(stop), Direction::Long) => stop.max(candidate),
            (Some(stop), Direction::Short) => stop.min(candidate),
        });
    }

    pub fn stop_hit(&self, high: f64, low: f64) -> bool {
        match (self.stop_price, self.direction) {
            (Some(stop), Direction::Long) => low <= stop,
            (Some(stop), Direction::Short) => high >= stop,
            (None, _) => false,
        }
    }

    pub fn target_hit(&self, high: f64, low: f64) -> bool {
        match (self.take_price, self.direction) {
            (Some(take), Direction::Long) => high >= take,
            (Some(take), Direction::Short) => low <= take,
            (None, _) => false,
        }
    }

    /// Intrabar stop/target test. Returns the reason and the pre-slippage
    /// level the trade exits at.
    pub fn check_exit(&self, high: f64, low: f64, priority: ExitPriority) -> Option<(ExitReason, f64)> {
        let stop = self
            .stop_price
            .filter(|_| self.stop_hit(high, low))
            .map(|p| (ExitReason::StopLoss, p));
        let target = self
            .take_price
            .filter(|_| self.target_hit(high, low))
            .map(|p| (ExitReason::TakeProfit, p));
        match priority {
            ExitPriority::StopFirst => stop.or(target),
            ExitPriority::TargetFirst => target.or(stop),
        }
    }
}

/// Frozen record of a finished trade.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub id: u64,
    pub direction: Direction,
    pub size: f64,
    pub entry_price: f64,
    pub entry_time: NaiveDateTime,
    pub entry_bar_index: usize,
    pub stop_price: Option<f64>,
    pub take_price: Option<f64>,
    pub trailing_distance: Option<f64>,
    pub risk: Option<f64>,
    pub max_favor: f64,
    pub max_adverse: f64,
    pub commission_open: f64,
    pub volume_at_entry: Option<f64>,
    pub exit_price: f64,
    pub exit_time: NaiveDateTime,
    pub exit_bar_index: usize,
    pub exit_reason: ExitReason,
    pub commission_close: f64,
    pub pnl: f64,
}

/// Price P&L before commissions.
pub fn gross_pnl(direction: Direction, entry_price: f64, exit_price: f64, size: f64) -> f64 {
    match direction {
        Direction::Long => (exit_price - entry_price) * size,
        Direction::Short => (entry_price - exit_price) * size,
    }
}
