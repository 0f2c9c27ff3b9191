//! Error types for the production layer.
//!
//! A production request either succeeds whole or aborts: there are no
//! retries. Recursion bottoming out on an item with no recipe and a
//! real shortfall is the fatal case; continuation denial is a clean
//! unwind and not represented here.

use famulus_ledger::LedgerError;
use famulus_types::{ItemId, ServiceError};

/// Errors that can occur while resolving a production request.
#[derive(Debug, thiserror::Error)]
pub enum CraftError {
    /// Recursion reached an item that cannot be produced while a real
    /// shortfall remains.
    #[error("cannot produce item {item}: need {needed}, hold {held}, and no recipe applies")]
    InsufficientResource {
        /// The item that cannot be produced.
        item: ItemId,
        /// Units required.
        needed: i64,
        /// Units currently held.
        held: i64,
    },

    /// The external service call failed.
    #[error("service error: {0}")]
    Service(#[from] ServiceError),

    /// A ledger mutation failed.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}
