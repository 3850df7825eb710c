//! CLI-level tests: config loading, validation and the `run`/`validate`
//! subcommands against real files.

mod common;

use clap::Parser;
use common::*;
use std::process::ExitCode;
use tempfile::TempDir;
use tradesim::adapters::file_config_adapter::FileConfigAdapter;
use tradesim::cli::{Cli, build_backtest_config, load_config, resolve_path, run};
use tradesim::domain::backtest::BacktestConfig;
use tradesim::domain::error::TradesimError;
use tradesim::domain::trade::ExitPriority;

const PRICES: &str = "datetime,open,high,low,close\n\
    2024-01-15 00:00:00,100,100,100,100\n\
    2024-01-15 01:00:00,100,106,99,105\n\
    2024-01-15 02:00:00,105,112,104,111\n";

const SIGNALS: &str = "datetime,signal,take_price\n\
    2024-01-15 00:00:00,1,110\n";

// ExitCode has no PartialEq; compare the Debug form.
fn assert_exit(actual: ExitCode, expected: ExitCode) {
    assert_eq!(format!("{actual:?}"), format!("{expected:?}"));
}

mod config_building {
    use super::*;

    #[test]
    fn empty_config_gives_defaults() {
        let config = build_backtest_config(&FileConfigAdapter::empty()).unwrap();
        assert_eq!(config, BacktestConfig::default());
    }

    #[test]
    fn reads_every_backtest_key() {
        let adapter = FileConfigAdapter::from_string(
            "[backtest]\n\
             initial_capital = 5000\n\
             single_position_mode = false\n\
             commission_perc = 0.001\n\
             slippage = 0.0005\n\
             tie_break = Target\n",
        )
        .unwrap();

        let config = build_backtest_config(&adapter).unwrap();

        assert_eq!(config.initial_capital, 5000.0);
        assert!(!config.single_position_mode);
        assert_eq!(config.execution.commission_perc, 0.001);
        assert_eq!(config.execution.slippage, 0.0005);
        assert_eq!(config.exit_priority, ExitPriority::TargetFirst);
    }

    #[test]
    fn rejects_negative_commission() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\ncommission_perc = -0.1\n").unwrap();
        let err = build_backtest_config(&adapter).unwrap_err();
        match err {
            TradesimError::ConfigInvalid { key, .. } => assert_eq!(key, "commission_perc"),
            other => panic!("expected ConfigInvalid, got {other}"),
        }
    }

    #[test]
    fn rejects_unknown_tie_break() {
        let adapter = FileConfigAdapter::from_string("[backtest]\ntie_break = coin\n").unwrap();
        let err = build_backtest_config(&adapter).unwrap_err();
        assert!(matches!(err, TradesimError::ConfigInvalid { .. }));
        assert_exit(ExitCode::from(&err), ExitCode::from(2));
    }

    #[test]
    fn rejects_unparseable_capital() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\ninitial_capital = lots\n").unwrap();
        assert!(matches!(
            build_backtest_config(&adapter),
            Err(TradesimError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn load_config_missing_file_fails() {
        assert!(load_config(std::path::Path::new("/nonexistent/tradesim.ini")).is_err());
    }
}

mod path_resolution {
    use super::*;
    use std::path::{Path, PathBuf};

    #[test]
    fn flag_overrides_config() {
        let adapter = FileConfigAdapter::from_string("[data]\nprices = from_config.csv\n").unwrap();
        assert_eq!(
            resolve_path(Some(Path::new("from_flag.csv")), &adapter, "prices"),
            Some(PathBuf::from("from_flag.csv"))
        );
        assert_eq!(
            resolve_path(None, &adapter, "prices"),
            Some(PathBuf::from("from_config.csv"))
        );
    }

    #[test]
    fn blank_config_value_is_absent() {
        let adapter = FileConfigAdapter::from_string("[data]\nsignals =\n").unwrap();
        assert_eq!(resolve_path(None, &adapter, "signals"), None);
        assert_eq!(resolve_path(None, &adapter, "prices"), None);
    }
}

mod subcommands {
    use super::*;

    #[test]
    fn run_writes_ledger() {
        let dir = TempDir::new().unwrap();
        let prices = write_file(dir.path(), "prices.csv", PRICES);
        let signals = write_file(dir.path(), "signals.csv", SIGNALS);
        let output = dir.path().join("ledger.csv");

        let cli = Cli::try_parse_from([
            "tradesim",
            "run",
            "--prices",
            prices.to_str().unwrap(),
            "--signals",
            signals.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
        ])
        .unwrap();

        assert_exit(run(cli), ExitCode::SUCCESS);
        let content = std::fs::read_to_string(&output).unwrap();
        let row = content.lines().nth(1).unwrap();
        assert!(row.contains(",tp,"));
        assert!(row.contains(",110.0,"));
    }

    #[test]
    fn run_uses_data_section_from_config() {
        let dir = TempDir::new().unwrap();
        let prices = write_file(dir.path(), "prices.csv", PRICES);
        let signals = write_file(dir.path(), "signals.csv", SIGNALS);
        let config = write_file(
            dir.path(),
            "tradesim.ini",
            &format!(
                "[backtest]\ninitial_capital = 2000\n\n[data]\nprices = {}\nsignals = {}\n",
                prices.display(),
                signals.display()
            ),
        );
        let output = dir.path().join("ledger.csv");

        let cli = Cli::try_parse_from([
            "tradesim",
            "run",
            "-c",
            config.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .unwrap();

        assert_exit(run(cli), ExitCode::SUCCESS);
        assert!(output.exists());
    }

    #[test]
    fn run_without_prices_is_config_error() {
        let cli = Cli::try_parse_from(["tradesim", "run"]).unwrap();
        assert_exit(run(cli), ExitCode::from(2));
    }

    #[test]
    fn run_with_bad_prices_is_input_error() {
        let dir = TempDir::new().unwrap();
        let prices = write_file(
            dir.path(),
            "prices.csv",
            "timestamp,open,high,low,close\nnot-a-date,1,1,1,1\n",
        );
        let cli = Cli::try_parse_from(["tradesim", "run", "-p", prices.to_str().unwrap()]).unwrap();
        assert_exit(run(cli), ExitCode::from(3));
    }

    #[test]
    fn run_with_no_trades_skips_ledger() {
        let dir = TempDir::new().unwrap();
        let prices = write_file(dir.path(), "prices.csv", PRICES);
        let output = dir.path().join("ledger.csv");
        let cli = Cli::try_parse_from([
            "tradesim",
            "run",
            "-p",
            prices.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .unwrap();

        assert_exit(run(cli), ExitCode::SUCCESS);
        assert!(!output.exists());
    }

    #[test]
    fn hedge_flag_parses() {
        let cli = Cli::try_parse_from(["tradesim", "run", "-p", "x.csv", "--hedge", "--tail", "3"])
            .unwrap();
        match cli.command {
            tradesim::cli::Command::Run { hedge, tail, .. } => {
                assert!(hedge);
                assert_eq!(tail, 3);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn validate_accepts_good_config() {
        let dir = TempDir::new().unwrap();
        let config = write_file(dir.path(), "ok.ini", "[backtest]\nslippage = 0.001\n");
        let cli =
            Cli::try_parse_from(["tradesim", "validate", "-c", config.to_str().unwrap()]).unwrap();
        assert_exit(run(cli), ExitCode::SUCCESS);
    }

    #[test]
    fn validate_rejects_bad_config() {
        let dir = TempDir::new().unwrap();
        let config = write_file(dir.path(), "bad.ini", "[backtest]\nslippage = 1.5\n");
        let cli =
            Cli::try_parse_from(["tradesim", "validate", "-c", config.to_str().unwrap()]).unwrap();
        assert_exit(run(cli), ExitCode::from(2));
    }
}
