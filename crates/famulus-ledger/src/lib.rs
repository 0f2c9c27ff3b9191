//! Shared resource ledger for the famulus automation core.
//!
//! One ledger instance is shared by the encounter controller and the
//! production resolver: both read it before deciding whether a
//! shortfall exists, and both mutate it only after a successful
//! external call. See [`ledger::Ledger`].

pub mod ledger;

pub use ledger::{Ledger, LedgerDelta, LedgerEntry, LedgerError};
