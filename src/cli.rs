//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_ledger_adapter::CsvLedgerAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{SECTION, validate_backtest_config};
use crate::domain::error::TradesimError;
use crate::domain::execution::ExecutionConfig;
use crate::domain::ledger::{self, TradeRecord};
use crate::domain::merge::merge_series;
use crate::domain::metrics::Metrics;
use crate::domain::trade::ExitPriority;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::ledger_port::LedgerPort;

#[derive(Parser, Debug)]
#[command(name = "tradesim", about = "Signal-driven trade simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Simulate trades from a price series and a signal series
    Run {
        #[arg(short, long)]
        prices: Option<PathBuf>,
        #[arg(short, long)]
        signals: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write the closed-trade ledger to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Allow multiple concurrent trades (overrides single_position_mode)
        #[arg(long)]
        hedge: bool,
        /// Number of most recent trades to print
        #[arg(long, default_value_t = 10)]
        tail: usize,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run {
            prices,
            signals,
            config,
            output,
            hedge,
            tail,
        } => run_simulation(
            prices.as_deref(),
            signals.as_deref(),
            config.as_deref(),
            output.as_deref(),
            hedge,
            tail,
        ),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = TradesimError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Validate the `[backtest]` section and build the run configuration.
pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, TradesimError> {
    validate_backtest_config(adapter)?;

    let exit_priority = match adapter.get_string(SECTION, "tie_break") {
        Some(s) if s.trim().eq_ignore_ascii_case("target") => ExitPriority::TargetFirst,
        _ => ExitPriority::StopFirst,
    };

    Ok(BacktestConfig {
        initial_capital: adapter.get_double(SECTION, "initial_capital", 1000.0),
        single_position_mode: adapter.get_bool(SECTION, "single_position_mode", true),
        execution: ExecutionConfig {
            commission_perc: adapter.get_double(SECTION, "commission_perc", 0.0),
            slippage: adapter.get_double(SECTION, "slippage", 0.0),
        },
        exit_priority,
    })
}

/// Resolve a data path: the CLI flag wins over the `[data]` section.
pub fn resolve_path(flag: Option<&Path>, config: &dyn ConfigPort, key: &str) -> Option<PathBuf> {
    flag.map(Path::to_path_buf).or_else(|| {
        config
            .get_string("data", key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
    })
}

/// Load, merge, simulate and aggregate.
pub fn run_pipeline(
    data_port: &dyn DataPort,
    config: &BacktestConfig,
) -> Result<BacktestResult, TradesimError> {
    let prices = data_port.load_prices()?;
    let signals = data_port.load_signals()?;
    eprintln!(
        "Loaded {} price rows and {} signal rows",
        prices.len(),
        signals.len()
    );

    let bars = merge_series(&prices, &signals)?;
    Ok(backtest_engine::run_backtest(&bars, config))
}

fn run_simulation(
    prices_flag: Option<&Path>,
    signals_flag: Option<&Path>,
    config_path: Option<&Path>,
    output_path: Option<&Path>,
    hedge: bool,
    tail: usize,
) -> ExitCode {
    // Stage 1: Load config
    let adapter = match config_path {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            match load_config(path) {
                Ok(a) => a,
                Err(code) => return code,
            }
        }
        None => FileConfigAdapter::empty(),
    };

    // Stage 2: Validate and build run config
    let mut bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    if hedge {
        bt_config.single_position_mode = false;
    }

    // Stage 3: Resolve inputs
    let Some(prices) = resolve_path(prices_flag, &adapter, "prices") else {
        let err = TradesimError::ConfigMissing {
            section: "data".into(),
            key: "prices".into(),
        };
        eprintln!("error: {err} (or pass --prices)");
        return (&err).into();
    };
    let signals = resolve_path(signals_flag, &adapter, "signals");
    if signals.is_none() {
        eprintln!("warning: no signal series given; no trades will open");
    }

    // Stage 4: Simulate
    eprintln!(
        "Running simulation ({} mode, commission {}, slippage {})",
        if bt_config.single_position_mode { "single-position" } else { "hedge" },
        bt_config.execution.commission_perc,
        bt_config.execution.slippage,
    );
    let data_port = CsvAdapter::new(prices, signals);
    let result = match run_pipeline(&data_port, &bt_config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!("  Processed: {} bars", result.bar_count);

    // Stage 5: Summarize
    let metrics = Metrics::compute(&result.trades, result.initial_capital);
    print_summary(&metrics);
    print_trades(ledger::tail(&result.trades, tail));

    // Stage 6: Export ledger
    if let Some(path) = output_path {
        let writer = CsvLedgerAdapter::new(path.to_path_buf());
        match writer.write(&result.trades) {
            Ok(true) => eprintln!("\nLedger written to: {}", path.display()),
            Ok(false) => eprintln!("\nNo trades closed; ledger not written"),
            Err(e) => {
                eprintln!("error: failed to write ledger: {e}");
                return (&e).into();
            }
        }
    }

    ExitCode::SUCCESS
}

fn print_summary(m: &Metrics) {
    let fmt_opt = |v: Option<f64>, scale: f64, suffix: &str| match v {
        Some(v) => format!("{:.2}{}", v * scale, suffix),
        None => "n/a".to_string(),
    };

    eprintln!("\n=== Results ===");
    eprintln!("Initial Capital:  {:.2}", m.initial_capital);
    eprintln!("Final Balance:    {:.2}", m.final_balance);
    eprintln!("Net Profit:       {:.2}", m.net_profit);
    eprintln!(
        "Total Trades:     {} ({} won, {} lost, {} breakeven)",
        m.total_trades, m.trades_won, m.trades_lost, m.trades_breakeven
    );
    eprintln!("Win Rate:         {:.1}%", m.win_rate * 100.0);
    eprintln!("Profit Factor:    {:.2}", m.profit_factor);
    eprintln!("Expectancy:       {:.2}", m.expectancy);
    eprintln!(
        "Max Drawdown:     -{:.2} (-{:.1}%)",
        m.max_drawdown,
        m.max_drawdown_pct * 100.0
    );
    eprintln!(
        "Recovery:         {}",
        m.recovery_trades
            .map(|n| format!("{n} trades"))
            .unwrap_or_else(|| "not recovered".to_string())
    );
    eprintln!("Avg Duration:     {}", m.avg_duration);
    eprintln!("Avg Bars:         {:.1}", m.avg_bars_in_trade);
    eprintln!("Annualized:       {}", fmt_opt(m.annualized_return, 100.0, "%"));
    eprintln!("Sharpe (trade):   {}", fmt_opt(m.sharpe_per_trade, 1.0, ""));
    eprintln!("Avg R-multiple:   {}", fmt_opt(m.avg_r_multiple, 1.0, ""));
}

fn print_trades(trades: &[TradeRecord]) {
    if trades.is_empty() {
        return;
    }
    eprintln!("\n=== Last {} Trades ===", trades.len());
    for rec in trades {
        let t = &rec.trade;
        eprintln!(
            "  #{:<4} {:<5} {} -> {}  {:.4} -> {:.4}  {:<6} {:>+.2} ({})",
            t.id,
            t.direction,
            t.entry_time,
            t.exit_time,
            t.entry_price,
            t.exit_price,
            t.exit_reason,
            t.pnl,
            rec.result,
        );
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("\nBacktest settings:");
    eprintln!("  initial_capital:      {}", config.initial_capital);
    eprintln!("  single_position_mode: {}", config.single_position_mode);
    eprintln!("  commission_perc:      {}", config.execution.commission_perc);
    eprintln!("  slippage:             {}", config.execution.slippage);
    eprintln!("  tie_break:            {:?}", config.exit_priority);

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}
