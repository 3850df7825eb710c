//! Performance summary derived from the closed-trade ledger.
//!
//! Equity moves only when a trade closes: the curve has one point per
//! ledger row, starting from `initial_capital`.

use chrono::{NaiveDateTime, TimeDelta};

use super::ledger::{TradeOutcome, TradeRecord};

const DAYS_PER_YEAR: f64 = 365.0;

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub time: NaiveDateTime,
    pub equity: f64,
    /// equity - running peak (zero or negative)
    pub drawdown: f64,
    /// equity / running peak - 1 (zero or negative)
    pub drawdown_pct: f64,
}

/// Cumulative equity after each closed trade, in ledger order.
pub fn equity_curve(ledger: &[TradeRecord], initial_capital: f64) -> Vec<EquityPoint> {
    let mut equity = initial_capital;
    let mut peak = initial_capital;
    ledger
        .iter()
        .map(|rec| {
            equity += rec.trade.pnl;
            peak = peak.max(equity);
            let drawdown_pct = if peak > 0.0 { equity / peak - 1.0 } else { 0.0 };
            EquityPoint {
                time: rec.trade.exit_time,
                equity,
                drawdown: equity - peak,
                drawdown_pct,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub initial_capital: f64,
    pub final_balance: f64,
    pub net_profit: f64,
    pub total_trades: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub trades_breakeven: usize,
    pub win_rate: f64,
    pub gross_profit: f64,
    /// Sum of losing P&L, zero or negative.
    pub gross_loss: f64,
    pub profit_factor: f64,
    pub avg_win: f64,
    /// Magnitude of the average losing trade.
    pub avg_loss: f64,
    pub expectancy: f64,
    pub largest_win: f64,
    /// Magnitude of the worst losing trade.
    pub largest_loss: f64,
    /// Deepest peak-to-trough fall in currency units, as a positive number.
    pub max_drawdown: f64,
    /// Deepest peak-to-trough fall as a fraction of the peak, positive.
    pub max_drawdown_pct: f64,
    /// Trades from the deepest drawdown point until equity regains the prior peak.
    pub recovery_trades: Option<usize>,
    pub avg_duration: TimeDelta,
    pub avg_bars_in_trade: f64,
    pub annualized_return: Option<f64>,
    pub sharpe_per_trade: Option<f64>,
    pub avg_r_multiple: Option<f64>,
}

impl Metrics {
    pub fn compute(ledger: &[TradeRecord], initial_capital: f64) -> Self {
        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut trades_breakeven = 0usize;
        let mut gross_profit = 0.0_f64;
        let mut gross_loss = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;
        let mut total_seconds = 0i64;
        let mut total_bars = 0usize;

        for rec in ledger {
            let pnl = rec.trade.pnl;
            match rec.result {
                TradeOutcome::Win => {
                    trades_won += 1;
                    gross_profit += pnl;
                    largest_win = largest_win.max(pnl);
                }
                TradeOutcome::Loss => {
                    trades_lost += 1;
                    gross_loss += pnl;
                    largest_loss = largest_loss.max(pnl.abs());
                }
                TradeOutcome::Breakeven => trades_breakeven += 1,
            }
            total_seconds += rec.duration.num_seconds();
            total_bars += rec.bars_in_trade;
        }

        let total_trades = ledger.len();
        let net_profit: f64 = ledger.iter().map(|r| r.trade.pnl).sum();
        let final_balance = initial_capital + net_profit;

        let per_trade = |value: f64, count: usize| {
            if count > 0 { value / count as f64 } else { 0.0 }
        };

        let profit_factor = if gross_loss < 0.0 {
            gross_profit / gross_loss.abs()
        } else if gross_profit > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let curve = equity_curve(ledger, initial_capital);
        let (max_drawdown, max_drawdown_pct, recovery_trades) = compute_drawdown(&curve);

        let avg_duration = if total_trades > 0 {
            TimeDelta::seconds(total_seconds / total_trades as i64)
        } else {
            TimeDelta::zero()
        };

        let r_multiples: Vec<f64> = ledger.iter().filter_map(|r| r.risk_reward).collect();
        let avg_r_multiple = if r_multiples.is_empty() {
            None
        } else {
            Some(r_multiples.iter().sum::<f64>() / r_multiples.len() as f64)
        };

        Metrics {
            initial_capital,
            final_balance,
            net_profit,
            total_trades,
            trades_won,
            trades_lost,
            trades_breakeven,
            win_rate: per_trade(trades_won as f64, total_trades),
            gross_profit,
            gross_loss,
            profit_factor,
            avg_win: per_trade(gross_profit, trades_won),
            avg_loss: per_trade(gross_loss.abs(), trades_lost),
            expectancy: per_trade(net_profit, total_trades),
            largest_win,
            largest_loss,
            max_drawdown,
            max_drawdown_pct,
            recovery_trades,
            avg_duration,
            avg_bars_in_trade: per_trade(total_bars as f64, total_trades),
            annualized_return: compute_annualized_return(ledger, initial_capital, final_balance),
            sharpe_per_trade: compute_sharpe(ledger, initial_capital),
            avg_r_multiple,
        }
    }
}

/// (max drawdown value, max drawdown fraction, trades to recover)
fn compute_drawdown(curve: &[EquityPoint]) -> (f64, f64, Option<usize>) {
    let Some((deepest, point)) = curve
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.drawdown_pct.total_cmp(&b.1.drawdown_pct))
    else {
        return (0.0, 0.0, Some(0));
    };

    let max_drawdown = curve.iter().map(|p| -p.drawdown).fold(0.0_f64, f64::max);
    if point.drawdown_pct >= 0.0 {
        return (max_drawdown, 0.0, Some(0));
    }

    let peak = point.equity - point.drawdown;
    let recovery = curve[deepest..]
        .iter()
        .position(|p| p.equity >= peak);

    (max_drawdown, -point.drawdown_pct, recovery)
}

fn compute_annualized_return(
    ledger: &[TradeRecord],
    initial_capital: f64,
    final_balance: f64,
) -> Option<f64> {
    let start = ledger.iter().map(|r| r.trade.entry_time).min()?;
    let end = ledger.iter().map(|r| r.trade.exit_time).max()?;
    let days = (end - start).num_days();
    if days <= 0 || initial_capital <= 0.0 || final_balance <= 0.0 {
        return None;
    }
    Some((final_balance / initial_capital).powf(DAYS_PER_YEAR / days as f64) - 1.0)
}

fn compute_sharpe(ledger: &[TradeRecord], initial_capital: f64) -> Option<f64> {
    if ledger.len() < 2 || initial_capital <= 0.0 {
        return None;
    }
    let returns: Vec<f64> = ledger
        .iter()
        .map(|r| r.trade.pnl / initial_capital)
        .collect();
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();
    if stddev > 0.0 {
        Some(mean / stddev * n.sqrt())
    } else {
        None
    }
}
