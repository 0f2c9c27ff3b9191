//! Error types for the encounter layer.
//!
//! Policy mistakes (unaffordable or unknown actions) are recovered
//! locally by falling back to the safe default and never surface as
//! errors; only service and ledger failures cross the component
//! boundary.

use famulus_ledger::LedgerError;
use famulus_types::ServiceError;

/// Errors that can occur while running an encounter.
#[derive(Debug, thiserror::Error)]
pub enum CombatError {
    /// The external service call failed.
    #[error("service error: {0}")]
    Service(#[from] ServiceError),

    /// A ledger mutation failed.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}
