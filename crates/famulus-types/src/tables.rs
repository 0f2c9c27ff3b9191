//! Data-driven lookup tables consulted by the combat and crafting cores.
//!
//! All domain content lives in these tables rather than in code: skill
//! costs and combat effects, item names and the free-to-use exception
//! set, opponent dodge/accuracy profiles, and the two-slot recipe
//! graph. New service content is new table rows, never new branches.
//!
//! The tables are deserializable so the collaborator can ship them as
//! YAML next to the settings file (see [`crate::config`]).

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::ids::{ItemId, SkillId};

// ---------------------------------------------------------------------------
// Skills
// ---------------------------------------------------------------------------

/// One skill's cost and combat effect.
///
/// The offense/defense deltas are applied to the encounter's cumulative
/// modifiers when the skill's cost is paid; weakening skills carry
/// negative deltas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillEntry {
    /// Display name, used for session-log echo lines.
    pub name: String,
    /// Mana cost per cast.
    #[serde(default)]
    pub mp_cost: u32,
    /// Change to the encounter's offense modifier per cast.
    #[serde(default)]
    pub offense_delta: i32,
    /// Change to the encounter's defense modifier per cast.
    #[serde(default)]
    pub defense_delta: i32,
}

/// One rung of the weakening escalation ladder.
///
/// The threat resolver walks tiers in order, weakest first, and tests
/// each tier's deltas against the opponent profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeakenTier {
    /// The skill this tier casts.
    pub skill: SkillId,
    /// Offense delta the cast would apply.
    pub offense_delta: i32,
    /// Defense delta the cast would apply.
    pub defense_delta: i32,
}

/// The skill lookup: costs, effects, capabilities, escalation ladder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillBook {
    /// Skill id to entry.
    #[serde(default)]
    pub entries: BTreeMap<SkillId, SkillEntry>,
    /// The skill that grants dual-wielding of combat items, if any.
    #[serde(default)]
    pub dual_wield: Option<SkillId>,
    /// Weakening tiers in escalation order, weakest first.
    #[serde(default)]
    pub weaken_tiers: Vec<WeakenTier>,
}

impl SkillBook {
    /// Look up a skill entry.
    pub fn get(&self, skill: SkillId) -> Option<&SkillEntry> {
        self.entries.get(&skill)
    }

    /// Display name for a skill, if known.
    pub fn name(&self, skill: SkillId) -> Option<&str> {
        self.entries.get(&skill).map(|e| e.name.as_str())
    }

    /// Mana cost for a skill. Unknown skills cost nothing; the
    /// known-skill gate rejects them before any cost matters.
    pub fn mp_cost(&self, skill: SkillId) -> u32 {
        self.entries.get(&skill).map_or(0, |e| e.mp_cost)
    }

    /// Register a skill entry.
    pub fn insert(&mut self, skill: SkillId, entry: SkillEntry) {
        self.entries.insert(skill, entry);
    }
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// The item lookup: display names and the free-to-use exception set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCatalog {
    /// Item id to display name.
    #[serde(default)]
    pub names: BTreeMap<ItemId, String>,
    /// Items that are not consumed when used in combat.
    #[serde(default)]
    pub no_cost: BTreeSet<ItemId>,
}

impl ItemCatalog {
    /// Display name for an item, if known.
    pub fn name(&self, item: ItemId) -> Option<&str> {
        self.names.get(&item).map(String::as_str)
    }

    /// Whether using this item in combat costs nothing.
    pub fn is_no_cost(&self, item: ItemId) -> bool {
        self.no_cost.contains(&item)
    }

    /// Register an item name.
    pub fn insert(&mut self, item: ItemId, name: impl Into<String>) {
        self.names.insert(item, name.into());
    }
}

// ---------------------------------------------------------------------------
// Opponents
// ---------------------------------------------------------------------------

/// An opponent's dodge/accuracy profile.
///
/// Weakening skills lower the encounter's offense/defense modifiers;
/// the profile decides when the fight is safe enough to proceed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpponentProfile {
    /// The opponent's attack rating.
    pub attack: i32,
    /// The opponent's defense rating.
    pub defense: i32,
    /// Highest effective defense at which the dodge rate is tolerable.
    pub dodge_tolerance: i32,
}

impl OpponentProfile {
    /// Whether the opponent's dodge rate is tolerable under the given
    /// cumulative offense modifier.
    pub const fn has_acceptable_dodge_rate(&self, offense_modifier: i32) -> bool {
        self.defense.saturating_add(offense_modifier) <= self.dodge_tolerance
    }

    /// Whether the given cumulative defense modifier would reduce the
    /// opponent's attack to nothing, wasting every further weakening.
    pub const fn always_misses(&self, defense_modifier: i32) -> bool {
        self.attack.saturating_add(defense_modifier) <= 0
    }
}

/// The opponent lookup, keyed by lowercase encounter key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bestiary {
    /// Encounter key to profile.
    #[serde(default)]
    pub profiles: BTreeMap<String, OpponentProfile>,
}

impl Bestiary {
    /// Normalize an opponent display name into its lookup key.
    pub fn encounter_key(display_name: &str) -> String {
        display_name.trim().to_lowercase()
    }

    /// Look up an opponent profile by encounter key.
    ///
    /// A missing profile means the opponent is unlisted; callers must
    /// treat unlisted opponents as always acceptable.
    pub fn profile(&self, key: &str) -> Option<&OpponentProfile> {
        self.profiles.get(key)
    }

    /// Register an opponent profile under its normalized key.
    pub fn insert(&mut self, display_name: &str, profile: OpponentProfile) {
        self.profiles.insert(Self::encounter_key(display_name), profile);
    }
}

// ---------------------------------------------------------------------------
// Recipes
// ---------------------------------------------------------------------------

/// How a derived item is prepared from its components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CraftMethod {
    /// Join two components with the bulk intermediate.
    Combine,
    /// Cook two components.
    Cook,
    /// Mix two components into a drink.
    Mix,
    /// Forge two components.
    Smith,
    /// Cook with a reagent.
    ReagentCook,
    /// Cook with dry noodles.
    PastaCook,
}

impl CraftMethod {
    /// Service endpoint that executes this method.
    pub const fn endpoint(self) -> &'static str {
        match self {
            Self::Combine => "combine.php",
            Self::Cook | Self::ReagentCook | Self::PastaCook => "cook.php",
            Self::Mix => "cocktail.php",
            Self::Smith => "smith.php",
        }
    }

    /// Form action verb submitted with a production call.
    pub const fn form_action(self) -> &'static str {
        match self {
            Self::Combine => "combine",
            Self::Cook | Self::ReagentCook | Self::PastaCook => "cook",
            Self::Mix => "mix",
            Self::Smith => "smith",
        }
    }
}

/// One component slot of a recipe: which item, prepared how.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeSlot {
    /// The component item.
    pub item: ItemId,
    /// How the component itself is produced when short.
    pub method: CraftMethod,
}

/// A two-slot recipe. A slot may repeat the other slot's item; the
/// resolver collapses the duplicate to one make-call but the service
/// still consumes one unit per slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// The two component slots, in submission order.
    pub slots: [RecipeSlot; 2],
}

/// The recipe lookup plus the special production families.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeBook {
    /// Derived item id to its recipe.
    #[serde(default)]
    pub recipes: BTreeMap<ItemId, Recipe>,
    /// The bulk intermediate produced from the base currency in fixed
    /// denominations and consumed by every combine-method production.
    #[serde(default)]
    pub bulk_intermediate: ItemId,
    /// The convertible base currency the bulk intermediate and the
    /// single-batch family are produced from.
    #[serde(default)]
    pub base_currency: ItemId,
    /// Currency cost per unit of the bulk intermediate.
    #[serde(default)]
    pub bulk_unit_cost: i64,
    /// Items producible only one unit per service call, with their
    /// per-unit currency cost.
    #[serde(default)]
    pub single_batch: BTreeMap<ItemId, i64>,
}

impl RecipeBook {
    /// Look up the recipe for a derived item.
    pub fn recipe(&self, item: ItemId) -> Option<&Recipe> {
        self.recipes.get(&item)
    }

    /// Whether this item is the bulk intermediate.
    pub fn is_bulk_intermediate(&self, item: ItemId) -> bool {
        item == self.bulk_intermediate
    }

    /// Per-unit currency cost when the item belongs to the
    /// one-unit-per-call family.
    pub fn single_batch_cost(&self, item: ItemId) -> Option<i64> {
        self.single_batch.get(&item).copied()
    }

    /// Register a recipe.
    pub fn insert(&mut self, item: ItemId, recipe: Recipe) {
        self.recipes.insert(item, recipe);
    }
}
