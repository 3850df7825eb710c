//! Configuration validation.
//!
//! Validates the `[backtest]` section before a run starts. Absent keys are
//! fine (they take their defaults); present keys must parse and be in range.

use crate::domain::error::TradesimError;
use crate::ports::config_port::ConfigPort;

pub const SECTION: &str = "backtest";

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    validate_initial_capital(config)?;
    validate_fraction(config, "commission_perc")?;
    validate_fraction(config, "slippage")?;
    validate_position_mode(config)?;
    validate_tie_break(config)?;
    Ok(())
}

fn invalid(key: &str, reason: impl Into<String>) -> TradesimError {
    TradesimError::ConfigInvalid {
        section: SECTION.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn parse_number(config: &dyn ConfigPort, key: &str) -> Result<Option<f64>, TradesimError> {
    match config.get_string(SECTION, key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| invalid(key, format!("'{}' is not a number", raw.trim()))),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    if let Some(value) = parse_number(config, "initial_capital")? {
        if !value.is_finite() || value <= 0.0 {
            return Err(invalid("initial_capital", "initial_capital must be positive"));
        }
    }
    Ok(())
}

fn validate_fraction(config: &dyn ConfigPort, key: &str) -> Result<(), TradesimError> {
    if let Some(value) = parse_number(config, key)? {
        if !(0.0..1.0).contains(&value) {
            return Err(invalid(key, format!("{key} must be in [0, 1)")));
        }
    }
    Ok(())
}

fn validate_position_mode(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    match config.get_string(SECTION, "single_position_mode") {
        Some(raw) if parse_bool(&raw).is_none() => Err(invalid(
            "single_position_mode",
            format!("'{}' is not a boolean", raw.trim()),
        )),
        _ => Ok(()),
    }
}

fn validate_tie_break(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    match config.get_string(SECTION, "tie_break") {
        Some(raw) if !matches!(raw.trim().to_lowercase().as_str(), "stop" | "target") => Err(
            invalid("tie_break", "tie_break must be 'stop' or 'target'"),
        ),
        _ => Ok(()),
    }
}

pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn invalid_key(content: &str) -> String {
        match validate_backtest_config(&make_config(content)).unwrap_err() {
            TradesimError::ConfigInvalid { key, .. } => key,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn valid_backtest_config_passes() {
        let config = make_config(
            r#"
[backtest]
initial_capital = 1000.0
single_position_mode = true
commission_perc = 0.001
slippage = 0.0005
tie_break = stop
"#,
        );
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn empty_config_passes() {
        assert!(validate_backtest_config(&make_config("[backtest]\n")).is_ok());
        assert!(validate_backtest_config(&make_config("")).is_ok());
    }

    #[test]
    fn initial_capital_must_be_positive() {
        assert_eq!(invalid_key("[backtest]\ninitial_capital = -100\n"), "initial_capital");
        assert_eq!(invalid_key("[backtest]\ninitial_capital = 0\n"), "initial_capital");
    }

    #[test]
    fn initial_capital_must_parse() {
        assert_eq!(invalid_key("[backtest]\ninitial_capital = lots\n"), "initial_capital");
    }

    #[test]
    fn commission_negative_fails() {
        assert_eq!(invalid_key("[backtest]\ncommission_perc = -0.1\n"), "commission_perc");
    }

    #[test]
    fn commission_of_one_or_more_fails() {
        assert_eq!(invalid_key("[backtest]\ncommission_perc = 1.0\n"), "commission_perc");
    }

    #[test]
    fn slippage_negative_fails() {
        assert_eq!(invalid_key("[backtest]\nslippage = -0.01\n"), "slippage");
    }

    #[test]
    fn slippage_must_parse() {
        assert_eq!(invalid_key("[backtest]\nslippage = abc\n"), "slippage");
    }

    #[test]
    fn position_mode_must_be_boolean() {
        assert_eq!(
            invalid_key("[backtest]\nsingle_position_mode = maybe\n"),
            "single_position_mode"
        );
        assert!(validate_backtest_config(&make_config("[backtest]\nsingle_position_mode = no\n")).is_ok());
    }

    #[test]
    fn tie_break_values() {
        assert_eq!(invalid_key("[backtest]\ntie_break = coin\n"), "tie_break");
        assert!(validate_backtest_config(&make_config("[backtest]\ntie_break = Target\n")).is_ok());
    }

    #[test]
    fn parse_bool_variants() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" yes "), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("false"), Some(false));
        assert_eq!(parse_bool("No"), Some(false));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("y"), None);
    }
}
