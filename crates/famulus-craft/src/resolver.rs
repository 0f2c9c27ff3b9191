//! The recursive production resolver.
//!
//! `resolve` manufactures a requested quantity of a derived item from
//! its two-slot recipe, recursing into any component the ledger cannot
//! cover. Three production families exist:
//!
//! 1. The **bulk intermediate** delegates entirely to the batch
//!    planner (fixed denominations).
//! 2. The **single-batch family** is produced one unit per service
//!    call, straight from the base currency.
//! 3. Everything else follows its recipe: per-slot shortfalls recurse
//!    with the component's own method, combine-method productions
//!    additionally require the bulk intermediate, then one production
//!    call covers the full quantity.
//!
//! Control flow stays pure: `resolve` returns the quantity actually
//! produced, and every ledger mutation happens in a single apply-delta
//! step after the corresponding service call returns. Recursion bottoms
//! out at items with no recipe; a real shortfall there fails fast
//! instead of looping.

use tracing::{debug, info};

use famulus_ledger::{Ledger, LedgerDelta};
use famulus_types::{CraftMethod, GameData, GameService, ItemCatalog, ItemId, Session};

use crate::batch::{self, STOCKPILE_ENDPOINT};
use crate::error::CraftError;

/// How a production request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CraftOutcome {
    /// The request completed; this many units of the target were made.
    Produced(i64),
    /// Continuation was denied mid-request; the request stopped before
    /// its next service call. Not an error.
    Unwound {
        /// Units of the target produced before stopping.
        produced: i64,
    },
}

/// A pending request to manufacture `quantity` units of `item`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductionRequest {
    /// The item to produce.
    pub item: ItemId,
    /// The preparation method.
    pub method: CraftMethod,
    /// Units needed. Always positive.
    pub quantity: i64,
}

impl ProductionRequest {
    /// Render the request for the collaborator's queue display,
    /// e.g. `"wooden figurine (10)"`.
    pub fn describe(&self, catalog: &ItemCatalog) -> String {
        let name = catalog.name(self.item).unwrap_or("unknown item");
        format!("{name} ({})", self.quantity)
    }
}

/// Sort pending requests by item display name, the order the queue
/// display presents them in.
pub fn sort_by_name(requests: &mut [ProductionRequest], catalog: &ItemCatalog) {
    requests.sort_by(|a, b| {
        let a_name = catalog.name(a.item).unwrap_or("");
        let b_name = catalog.name(b.item).unwrap_or("");
        a_name.cmp(b_name)
    });
}

/// Resolve and execute a production request.
///
/// On success the ledger's quantity of `item` has increased by exactly
/// `quantity`, no component balance has gone negative, and no call was
/// issued for a component the ledger already covered.
///
/// # Errors
///
/// Returns [`CraftError::InsufficientResource`] when recursion reaches
/// an item with no recipe and a real shortfall, or propagates service
/// and ledger failures. No failure is retried.
pub fn resolve(
    session: &mut Session,
    service: &mut dyn GameService,
    ledger: &mut Ledger,
    data: &GameData,
    item: ItemId,
    method: CraftMethod,
    quantity: i64,
) -> Result<CraftOutcome, CraftError> {
    if quantity <= 0 {
        return Ok(CraftOutcome::Produced(0));
    }
    if !session.permits_continue() {
        return Ok(CraftOutcome::Unwound { produced: 0 });
    }

    debug!(%item, ?method, quantity, "resolving production request");

    if data.recipes.is_bulk_intermediate(item) {
        return batch::execute(session, service, ledger, &data.recipes, quantity);
    }

    if let Some(unit_cost) = data.recipes.single_batch_cost(item) {
        return produce_single_batch(session, service, ledger, data, item, unit_cost, quantity);
    }

    let Some(recipe) = data.recipes.recipe(item).copied() else {
        return Err(CraftError::InsufficientResource {
            item,
            needed: quantity,
            held: ledger.quantity(item),
        });
    };

    let [first, second] = recipe.slots;
    let duplicate_slots = first.item == second.item;

    // A duplicate slot still consumes one unit per slot, so the single
    // make-call must cover both.
    let first_need = if duplicate_slots {
        quantity.saturating_mul(2)
    } else {
        quantity
    };
    if let Some(unwound) =
        ensure_component(session, service, ledger, data, first.item, first.method, first_need)?
    {
        return Ok(unwound);
    }
    if !duplicate_slots
        && let Some(unwound) = ensure_component(
            session, service, ledger, data, second.item, second.method, quantity,
        )?
    {
        return Ok(unwound);
    }

    // Combining consumes the bulk intermediate on top of the two
    // components.
    if method == CraftMethod::Combine
        && let Some(unwound) = ensure_component(
            session,
            service,
            ledger,
            data,
            data.recipes.bulk_intermediate,
            CraftMethod::Combine,
            quantity,
        )?
    {
        return Ok(unwound);
    }

    if !session.permits_continue() {
        return Ok(CraftOutcome::Unwound { produced: 0 });
    }

    let mut fields: Vec<(String, String)> = Vec::new();
    if let Some(credential) = session.credential() {
        fields.push((String::from("pwd"), String::from(credential)));
    }
    fields.push((String::from("action"), String::from(method.form_action())));
    fields.push((String::from("item1"), first.item.to_string()));
    fields.push((String::from("item2"), second.item.to_string()));
    fields.push((String::from("quantity"), quantity.to_string()));

    service.submit(method.endpoint(), &fields)?;

    // The single apply-delta step for this production call.
    let mut deltas = vec![
        LedgerDelta { item: first.item, delta: quantity.saturating_neg() },
        LedgerDelta { item: second.item, delta: quantity.saturating_neg() },
    ];
    if method == CraftMethod::Combine {
        deltas.push(LedgerDelta {
            item: data.recipes.bulk_intermediate,
            delta: quantity.saturating_neg(),
        });
    }
    deltas.push(LedgerDelta { item, delta: quantity });
    ledger.apply(&deltas, "produce")?;

    info!(%item, quantity, "production call complete");
    Ok(CraftOutcome::Produced(quantity))
}

/// Recursively produce a component's shortfall, if any.
///
/// The shortfall is always `needed − held`; a component the ledger
/// already covers triggers no call at all. Shortfalls of the bulk
/// intermediate are rounded up to the next denomination boundary to
/// batch otherwise-chatty single-unit production.
///
/// Returns `Some` when the recursion unwound on a denied continuation.
fn ensure_component(
    session: &mut Session,
    service: &mut dyn GameService,
    ledger: &mut Ledger,
    data: &GameData,
    component: ItemId,
    method: CraftMethod,
    needed: i64,
) -> Result<Option<CraftOutcome>, CraftError> {
    let held = ledger.quantity(component);
    let mut shortfall = needed.saturating_sub(held);
    if shortfall <= 0 {
        return Ok(None);
    }

    if data.recipes.is_bulk_intermediate(component) {
        shortfall = round_up_bulk(shortfall);
    }

    match resolve(session, service, ledger, data, component, method, shortfall)? {
        CraftOutcome::Produced(_) => Ok(None),
        CraftOutcome::Unwound { .. } => Ok(Some(CraftOutcome::Unwound { produced: 0 })),
    }
}

/// Produce a single-batch family item one unit per call.
fn produce_single_batch(
    session: &mut Session,
    service: &mut dyn GameService,
    ledger: &mut Ledger,
    data: &GameData,
    item: ItemId,
    unit_cost: i64,
    quantity: i64,
) -> Result<CraftOutcome, CraftError> {
    let mut produced: i64 = 0;

    for _ in 0..quantity {
        if !session.permits_continue() {
            return Ok(CraftOutcome::Unwound { produced });
        }

        let held = ledger.quantity(data.recipes.base_currency);
        if held < unit_cost {
            return Err(CraftError::InsufficientResource {
                item: data.recipes.base_currency,
                needed: unit_cost,
                held,
            });
        }

        let mut fields: Vec<(String, String)> = Vec::new();
        if let Some(credential) = session.credential() {
            fields.push((String::from("pwd"), String::from(credential)));
        }
        fields.push((String::from("which"), String::from("3")));
        fields.push((String::from("action"), String::from("compress")));
        fields.push((String::from("into"), item.to_string()));

        service.submit(STOCKPILE_ENDPOINT, &fields)?;

        ledger.apply(
            &[
                LedgerDelta {
                    item: data.recipes.base_currency,
                    delta: unit_cost.saturating_neg(),
                },
                LedgerDelta { item, delta: 1 },
            ],
            "single-batch conversion",
        )?;
        produced = produced.saturating_add(1);
    }

    Ok(CraftOutcome::Produced(produced))
}

/// Round a bulk-intermediate shortfall up to the next denomination
/// boundary.
///
/// The table deliberately overproduces to cut call count; its values
/// are a policy choice, preserved exactly.
fn round_up_bulk(shortfall: i64) -> i64 {
    if shortfall > 1000 {
        // `shortfall > 1000` here, so the value is always positive; the
        // unsigned `div_ceil` is stable and identical on this domain
        // (signed `div_ceil` is still unstable: rust-lang/rust#88581).
        ((shortfall as u64).div_ceil(1000) as i64).saturating_mul(1000)
    } else if shortfall > 100 {
        1000
    } else if shortfall > 10 {
        100
    } else if shortfall > 1 {
        10
    } else {
        1
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use famulus_types::{Recipe, RecipeSlot, ScriptedService, Severity};

    use super::*;

    const CURRENCY: ItemId = ItemId::new(1);
    const BULK: ItemId = ItemId::new(25);
    const LEAF_A: ItemId = ItemId::new(80);
    const LEAF_B: ItemId = ItemId::new(81);
    const PART_A: ItemId = ItemId::new(86);
    const PART_B: ItemId = ItemId::new(87);
    const TARGET: ItemId = ItemId::new(92);

    fn combine_pair(a: ItemId, b: ItemId) -> Recipe {
        Recipe {
            slots: [
                RecipeSlot { item: a, method: CraftMethod::Combine },
                RecipeSlot { item: b, method: CraftMethod::Combine },
            ],
        }
    }

    fn game_data() -> GameData {
        let mut data = GameData::default();
        data.recipes.bulk_intermediate = BULK;
        data.recipes.base_currency = CURRENCY;
        data.recipes.bulk_unit_cost = 10;
        data.recipes.insert(PART_A, combine_pair(LEAF_A, LEAF_B));
        data.recipes.insert(PART_B, combine_pair(LEAF_A, LEAF_B));
        data.recipes.insert(TARGET, combine_pair(PART_A, PART_B));
        data
    }

    fn session() -> Session {
        Session::new(Some(String::from("hash")))
    }

    #[test]
    fn rounding_table_is_exact() {
        assert_eq!(round_up_bulk(1), 1);
        assert_eq!(round_up_bulk(2), 10);
        assert_eq!(round_up_bulk(10), 10);
        assert_eq!(round_up_bulk(11), 100);
        assert_eq!(round_up_bulk(100), 100);
        assert_eq!(round_up_bulk(101), 1000);
        assert_eq!(round_up_bulk(1000), 1000);
        assert_eq!(round_up_bulk(1001), 2000);
        assert_eq!(round_up_bulk(2345), 3000);
    }

    #[test]
    fn covered_components_trigger_no_calls() {
        let mut data = GameData::default();
        data.recipes.insert(
            TARGET,
            Recipe {
                slots: [
                    RecipeSlot { item: LEAF_A, method: CraftMethod::Cook },
                    RecipeSlot { item: LEAF_B, method: CraftMethod::Cook },
                ],
            },
        );
        let mut session = session();
        let mut service = ScriptedService::default();
        let mut ledger = Ledger::with_balances([(LEAF_A, 10), (LEAF_B, 10)]);

        let outcome = resolve(
            &mut session, &mut service, &mut ledger, &data, TARGET, CraftMethod::Cook, 10,
        )
        .unwrap();

        assert_eq!(outcome, CraftOutcome::Produced(10));
        // One production call, nothing for the components.
        assert_eq!(service.call_count(), 1);
        assert_eq!(service.calls[0].endpoint, "cook.php");
        assert_eq!(service.calls[0].field("action"), Some("cook"));
        assert_eq!(service.calls[0].field("quantity"), Some("10"));
        assert_eq!(ledger.quantity(TARGET), 10);
        assert_eq!(ledger.quantity(LEAF_A), 0);
        assert_eq!(ledger.quantity(LEAF_B), 0);
    }

    #[test]
    fn shortfalls_recurse_per_component() {
        let data = game_data();
        let mut session = session();
        let mut service = ScriptedService::default();
        let mut ledger = Ledger::with_balances([
            (CURRENCY, 10_000),
            (LEAF_A, 100),
            (LEAF_B, 100),
            (PART_A, 5),
            (PART_B, 0),
        ]);

        let outcome = resolve(
            &mut session, &mut service, &mut ledger, &data, TARGET, CraftMethod::Combine, 10,
        )
        .unwrap();

        assert_eq!(outcome, CraftOutcome::Produced(10));

        // Target gained exactly the requested quantity.
        assert_eq!(ledger.quantity(TARGET), 10);
        // Part A: held 5, made 5 more, consumed 10.
        assert_eq!(ledger.quantity(PART_A), 0);
        // Part B: made 10, consumed 10.
        assert_eq!(ledger.quantity(PART_B), 0);
        // Leaves fed both sub-productions: 5 + 10 each.
        assert_eq!(ledger.quantity(LEAF_A), 85);
        assert_eq!(ledger.quantity(LEAF_B), 85);
        // Bulk intermediate was batched in rounded lots of 10: three
        // conversions of 10, consumed 5 + 10 + 10.
        assert_eq!(ledger.quantity(BULK), 5);
        assert_eq!(ledger.quantity(CURRENCY), 10_000 - 300);

        // Call order: convert, make A, convert, make B, convert, make
        // the target.
        let endpoints: Vec<&str> =
            service.calls.iter().map(|c| c.endpoint.as_str()).collect();
        assert_eq!(
            endpoints,
            vec![
                STOCKPILE_ENDPOINT,
                "combine.php",
                STOCKPILE_ENDPOINT,
                "combine.php",
                STOCKPILE_ENDPOINT,
                "combine.php",
            ],
        );
        assert_eq!(service.calls[5].field("item1"), Some("86"));
        assert_eq!(service.calls[5].field("item2"), Some("87"));
        assert_eq!(service.calls[5].field("quantity"), Some("10"));
    }

    #[test]
    fn leaf_with_no_recipe_fails_fast() {
        let data = game_data();
        let mut session = session();
        let mut service = ScriptedService::default();
        // No leaves held: part production bottoms out at leaf A.
        let mut ledger = Ledger::with_balances([(CURRENCY, 10_000)]);

        let result = resolve(
            &mut session, &mut service, &mut ledger, &data, TARGET, CraftMethod::Combine, 10,
        );

        assert!(matches!(
            result,
            Err(CraftError::InsufficientResource { item: LEAF_A, needed: 10, held: 0 }),
        ));
        // Failure happened before any production call was issued.
        assert_eq!(service.call_count(), 0);
    }

    #[test]
    fn unknown_target_fails_fast() {
        let data = GameData::default();
        let mut session = session();
        let mut service = ScriptedService::default();
        let mut ledger = Ledger::new();

        let result = resolve(
            &mut session, &mut service, &mut ledger, &data, ItemId::new(99), CraftMethod::Smith, 3,
        );

        assert!(matches!(
            result,
            Err(CraftError::InsufficientResource { needed: 3, held: 0, .. }),
        ));
    }

    #[test]
    fn duplicate_slots_consume_two_per_unit() {
        let mut data = GameData::default();
        data.recipes.insert(
            TARGET,
            Recipe {
                slots: [
                    RecipeSlot { item: LEAF_A, method: CraftMethod::Cook },
                    RecipeSlot { item: LEAF_A, method: CraftMethod::Cook },
                ],
            },
        );
        let mut session = session();
        let mut service = ScriptedService::default();
        let mut ledger = Ledger::with_balances([(LEAF_A, 8)]);

        let outcome = resolve(
            &mut session, &mut service, &mut ledger, &data, TARGET, CraftMethod::Cook, 4,
        )
        .unwrap();

        assert_eq!(outcome, CraftOutcome::Produced(4));
        // One production call; the duplicate slot was not resolved
        // twice.
        assert_eq!(service.call_count(), 1);
        assert_eq!(ledger.quantity(LEAF_A), 0);
        assert_eq!(ledger.quantity(TARGET), 4);
    }

    #[test]
    fn single_batch_family_goes_one_per_call() {
        let mut data = GameData::default();
        data.recipes.base_currency = CURRENCY;
        data.recipes.single_batch.insert(ItemId::new(88), 100);
        let mut session = session();
        let mut service = ScriptedService::default();
        let mut ledger = Ledger::with_balances([(CURRENCY, 1000)]);

        let outcome = resolve(
            &mut session, &mut service, &mut ledger, &data, ItemId::new(88),
            CraftMethod::Combine, 3,
        )
        .unwrap();

        assert_eq!(outcome, CraftOutcome::Produced(3));
        assert_eq!(service.call_count(), 3);
        assert_eq!(service.calls[0].endpoint, STOCKPILE_ENDPOINT);
        assert_eq!(service.calls[0].field("action"), Some("compress"));
        assert_eq!(ledger.quantity(ItemId::new(88)), 3);
        assert_eq!(ledger.quantity(CURRENCY), 700);
    }

    #[test]
    fn non_positive_quantities_produce_nothing() {
        let data = game_data();
        let mut session = session();
        let mut service = ScriptedService::default();
        let mut ledger = Ledger::new();

        let outcome = resolve(
            &mut session, &mut service, &mut ledger, &data, TARGET, CraftMethod::Combine, 0,
        )
        .unwrap();

        assert_eq!(outcome, CraftOutcome::Produced(0));
        assert_eq!(service.call_count(), 0);
    }

    #[test]
    fn denied_continuation_unwinds_without_calls() {
        let data = game_data();
        let mut session = session();
        session.notify(Severity::Abort, "stopped by user");
        let mut service = ScriptedService::default();
        let mut ledger = Ledger::with_balances([(CURRENCY, 10_000)]);

        let outcome = resolve(
            &mut session, &mut service, &mut ledger, &data, TARGET, CraftMethod::Combine, 10,
        )
        .unwrap();

        assert_eq!(outcome, CraftOutcome::Unwound { produced: 0 });
        assert_eq!(service.call_count(), 0);
    }

    #[test]
    fn requests_sort_by_display_name() {
        let mut catalog = ItemCatalog::default();
        catalog.insert(PART_A, "walnut shell");
        catalog.insert(PART_B, "acorn cap");
        let mut requests = vec![
            ProductionRequest { item: PART_A, method: CraftMethod::Combine, quantity: 2 },
            ProductionRequest { item: PART_B, method: CraftMethod::Combine, quantity: 7 },
        ];

        sort_by_name(&mut requests, &catalog);

        assert_eq!(requests[0].item, PART_B);
        assert_eq!(requests[0].describe(&catalog), "acorn cap (7)");
        assert_eq!(requests[1].describe(&catalog), "walnut shell (2)");
    }
}
