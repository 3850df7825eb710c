//! Ledger output port trait.

use crate::domain::error::TradesimError;
use crate::domain::ledger::TradeRecord;

/// Port for persisting the closed-trade ledger.
pub trait LedgerPort {
    /// Returns `Ok(false)` when there was nothing to write.
    fn write(&self, ledger: &[TradeRecord]) -> Result<bool, TradesimError>;
}
