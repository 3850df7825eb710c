//! tradesim: signal-driven trade simulation engine.
//!
//! Turns a price series plus a parallel signal series into a ledger of
//! closed trades with realized P&L.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
