//! The shared resource ledger: held quantities plus a mutation log.
//!
//! The [`Ledger`] is the single source of truth both automation layers
//! read before deciding whether a shortfall exists. It is mutated only
//! after an external call returns, through [`Ledger::credit`],
//! [`Ledger::debit`], or a batch [`Ledger::apply`].
//!
//! # Design
//!
//! - **Balances never go negative**: a debit that would undershoot
//!   zero is rejected whole; the caller must produce the shortfall
//!   first.
//! - **Append-only log**: every mutation is recorded as a
//!   [`LedgerEntry`] for the collaborator's tally display.
//! - **Single writer**: one run mutates the ledger at a time; the
//!   pipeline is single-threaded per run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use famulus_types::ItemId;

/// Errors that can occur when mutating the ledger.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LedgerError {
    /// A credit or debit was requested with a non-positive quantity.
    #[error("quantity must be positive, got {quantity} for item {item}")]
    InvalidQuantity {
        /// The item being mutated.
        item: ItemId,
        /// The offending quantity.
        quantity: i64,
    },

    /// A debit would drive a balance below zero.
    #[error("item {item} holds {held}, cannot debit {debit}")]
    WouldGoNegative {
        /// The item being debited.
        item: ItemId,
        /// The quantity currently held.
        held: i64,
        /// The debit that was requested.
        debit: i64,
    },
}

/// One signed mutation to apply as part of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerDelta {
    /// The item to mutate.
    pub item: ItemId,
    /// Signed quantity change.
    pub delta: i64,
}

/// One recorded ledger mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// The item that was mutated.
    pub item: ItemId,
    /// Signed quantity change.
    pub delta: i64,
    /// Why the mutation happened (e.g. `"combat item"`, `"produce"`).
    pub reason: String,
}

/// The shared mapping of item id to currently held quantity.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Ledger {
    balances: BTreeMap<ItemId, i64>,
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    /// Create an empty ledger.
    pub const fn new() -> Self {
        Self {
            balances: BTreeMap::new(),
            entries: Vec::new(),
        }
    }

    /// Create a ledger seeded with starting balances.
    pub fn with_balances(balances: impl IntoIterator<Item = (ItemId, i64)>) -> Self {
        Self {
            balances: balances.into_iter().collect(),
            entries: Vec::new(),
        }
    }

    /// Quantity currently held of an item. Absent items hold zero.
    pub fn quantity(&self, item: ItemId) -> i64 {
        self.balances.get(&item).copied().unwrap_or(0)
    }

    /// Add `quantity` units of an item.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidQuantity`] if `quantity` is not
    /// positive.
    pub fn credit(
        &mut self,
        item: ItemId,
        quantity: i64,
        reason: impl Into<String>,
    ) -> Result<(), LedgerError> {
        if quantity <= 0 {
            return Err(LedgerError::InvalidQuantity { item, quantity });
        }
        self.record(item, quantity, reason.into());
        Ok(())
    }

    /// Remove `quantity` units of an item.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidQuantity`] if `quantity` is not
    /// positive, or [`LedgerError::WouldGoNegative`] if the balance
    /// cannot cover the debit.
    pub fn debit(
        &mut self,
        item: ItemId,
        quantity: i64,
        reason: impl Into<String>,
    ) -> Result<(), LedgerError> {
        if quantity <= 0 {
            return Err(LedgerError::InvalidQuantity { item, quantity });
        }
        let held = self.quantity(item);
        if held < quantity {
            return Err(LedgerError::WouldGoNegative {
                item,
                held,
                debit: quantity,
            });
        }
        self.record(item, quantity.saturating_neg(), reason.into());
        Ok(())
    }

    /// Apply a batch of deltas atomically.
    ///
    /// Every delta is validated against the projected balances before
    /// any is committed: either the whole batch lands or none of it
    /// does.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::WouldGoNegative`] if any projected
    /// balance would undershoot zero; the ledger is left untouched.
    pub fn apply(
        &mut self,
        deltas: &[LedgerDelta],
        reason: impl Into<String>,
    ) -> Result<(), LedgerError> {
        let mut projected: BTreeMap<ItemId, i64> = BTreeMap::new();
        for delta in deltas {
            let balance = projected
                .entry(delta.item)
                .or_insert_with(|| self.quantity(delta.item));
            *balance = balance.saturating_add(delta.delta);
            if *balance < 0 {
                return Err(LedgerError::WouldGoNegative {
                    item: delta.item,
                    held: self.quantity(delta.item),
                    debit: delta.delta.saturating_neg(),
                });
            }
        }

        let reason = reason.into();
        for delta in deltas {
            self.record(delta.item, delta.delta, reason.clone());
        }
        Ok(())
    }

    /// All recorded mutations, in insertion order.
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    fn record(&mut self, item: ItemId, delta: i64, reason: String) {
        let balance = self.balances.entry(item).or_insert(0);
        *balance = balance.saturating_add(delta);
        debug!(%item, delta, balance = *balance, reason, "ledger mutation");
        self.entries.push(LedgerEntry {
            item,
            delta,
            reason,
        });
    }
}
