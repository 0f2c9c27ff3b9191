//! Batch planning for the bulk intermediate's fixed denominations.
//!
//! The service produces the bulk intermediate only in denominations of
//! 1000, 100, 10, or 1 units per call. The planner decomposes a
//! requested quantity greedily over descending denominations, which
//! minimizes the call count for any quantity; the executor issues one
//! call per planned denomination, debiting the base currency and
//! crediting the intermediate as each call returns.

use tracing::debug;

use famulus_ledger::{Ledger, LedgerDelta};
use famulus_types::{GameService, RecipeBook, Session};

use crate::error::CraftError;
use crate::resolver::CraftOutcome;

/// The fixed production denominations, largest first.
pub const DENOMINATIONS: [i64; 4] = [1000, 100, 10, 1];

/// The stockpile endpoint handling currency conversions.
pub const STOCKPILE_ENDPOINT: &str = "inventory.php";

/// Decompose a quantity into a minimal greedy call sequence.
///
/// Repeatedly subtracts the largest denomination no greater than the
/// remainder; the emitted sequence always sums to `quantity` (clamped
/// non-negative).
pub fn plan(quantity: i64) -> Vec<i64> {
    let mut remaining = quantity.max(0);
    let mut calls = Vec::new();
    while remaining > 0 {
        let Some(denomination) = DENOMINATIONS.iter().copied().find(|&d| d <= remaining) else {
            break;
        };
        calls.push(denomination);
        remaining = remaining.saturating_sub(denomination);
    }
    calls
}

/// Execute a planned batch against the service and the ledger.
///
/// Continuation is polled before every call; a denial stops cleanly
/// with the units produced so far. The currency balance is checked
/// before each call so no doomed conversion is ever submitted.
///
/// # Errors
///
/// Returns [`CraftError::InsufficientResource`] when the base currency
/// cannot cover the next denomination, or propagates service and
/// ledger failures.
pub fn execute(
    session: &mut Session,
    service: &mut dyn GameService,
    ledger: &mut Ledger,
    recipes: &RecipeBook,
    quantity: i64,
) -> Result<CraftOutcome, CraftError> {
    let mut produced: i64 = 0;

    for denomination in plan(quantity) {
        if !session.permits_continue() {
            return Ok(CraftOutcome::Unwound { produced });
        }

        let cost = recipes.bulk_unit_cost.saturating_mul(denomination);
        let held = ledger.quantity(recipes.base_currency);
        if held < cost {
            return Err(CraftError::InsufficientResource {
                item: recipes.base_currency,
                needed: cost,
                held,
            });
        }

        let mut fields: Vec<(String, String)> = Vec::new();
        if let Some(credential) = session.credential() {
            fields.push((String::from("pwd"), String::from(credential)));
        }
        fields.push((String::from("which"), String::from("3")));
        fields.push((String::from("action"), String::from("condense")));
        fields.push((String::from("quantity"), denomination.to_string()));

        service.submit(STOCKPILE_ENDPOINT, &fields)?;

        ledger.apply(
            &[
                LedgerDelta {
                    item: recipes.base_currency,
                    delta: cost.saturating_neg(),
                },
                LedgerDelta {
                    item: recipes.bulk_intermediate,
                    delta: denomination,
                },
            ],
            "bulk conversion",
        )?;

        produced = produced.saturating_add(denomination);
        debug!(denomination, produced, "bulk conversion call complete");
    }

    Ok(CraftOutcome::Produced(produced))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use famulus_types::{ItemId, ScriptedService, Severity};

    use super::*;

    fn recipes() -> RecipeBook {
        RecipeBook {
            bulk_intermediate: ItemId::new(25),
            base_currency: ItemId::new(1),
            bulk_unit_cost: 10,
            ..RecipeBook::default()
        }
    }

    #[test]
    fn plan_is_greedy_minimal() {
        assert_eq!(
            plan(2345),
            vec![1000, 1000, 100, 100, 100, 10, 10, 10, 10, 10, 1, 1, 1, 1, 1],
        );
    }

    #[test]
    fn exact_denominations_take_one_call() {
        assert_eq!(plan(1000), vec![1000]);
        assert_eq!(plan(100), vec![100]);
        assert_eq!(plan(10), vec![10]);
        assert_eq!(plan(1), vec![1]);
    }

    #[test]
    fn zero_and_negative_plan_nothing() {
        assert!(plan(0).is_empty());
        assert!(plan(-5).is_empty());
    }

    #[test]
    fn plans_sum_exactly_and_are_minimal() {
        for quantity in 0..=1500 {
            let calls = plan(quantity);
            assert_eq!(calls.iter().sum::<i64>(), quantity, "sum for {quantity}");

            let expected_len = usize::try_from(
                quantity / 1000 + quantity % 1000 / 100 + quantity % 100 / 10 + quantity % 10,
            )
            .unwrap();
            assert_eq!(calls.len(), expected_len, "count for {quantity}");
        }
    }

    #[test]
    fn execute_converts_currency_per_denomination() {
        let mut session = Session::new(Some(String::from("hash")));
        let mut service = ScriptedService::default();
        let mut ledger = Ledger::with_balances([(ItemId::new(1), 20_000)]);
        let recipes = recipes();

        let outcome = execute(&mut session, &mut service, &mut ledger, &recipes, 1110).unwrap();

        assert_eq!(outcome, CraftOutcome::Produced(1110));
        assert_eq!(service.call_count(), 3);
        assert_eq!(service.calls[0].endpoint, STOCKPILE_ENDPOINT);
        assert_eq!(service.calls[0].field("quantity"), Some("1000"));
        assert_eq!(service.calls[2].field("quantity"), Some("10"));
        // 1110 units at 10 currency each.
        assert_eq!(ledger.quantity(ItemId::new(1)), 20_000 - 11_100);
        assert_eq!(ledger.quantity(ItemId::new(25)), 1110);
    }

    #[test]
    fn execute_refuses_unaffordable_conversions() {
        let mut session = Session::new(None);
        let mut service = ScriptedService::default();
        let mut ledger = Ledger::with_balances([(ItemId::new(1), 5000)]);
        let recipes = recipes();

        let result = execute(&mut session, &mut service, &mut ledger, &recipes, 1000);

        assert!(matches!(
            result,
            Err(CraftError::InsufficientResource { needed: 10_000, held: 5000, .. }),
        ));
        // The doomed call was never submitted.
        assert_eq!(service.call_count(), 0);
        assert_eq!(ledger.quantity(ItemId::new(1)), 5000);
    }

    #[test]
    fn denied_continuation_unwinds_cleanly() {
        let mut session = Session::new(None);
        session.notify(Severity::Abort, "stopped");
        let mut service = ScriptedService::default();
        let mut ledger = Ledger::with_balances([(ItemId::new(1), 20_000)]);
        let recipes = recipes();

        let outcome = execute(&mut session, &mut service, &mut ledger, &recipes, 50).unwrap();

        assert_eq!(outcome, CraftOutcome::Unwound { produced: 0 });
        assert_eq!(service.call_count(), 0);
    }
}
