//! Market data access port trait.

use crate::domain::bar::{PriceRow, SignalRow};
use crate::domain::error::TradesimError;

pub trait DataPort {
    /// The authoritative price series. Row order is not significant.
    fn load_prices(&self) -> Result<Vec<PriceRow>, TradesimError>;

    /// The signal series. A source with no signals yields an empty vector.
    fn load_signals(&self) -> Result<Vec<SignalRow>, TradesimError>;
}
