//! Combat action tokens and resolved decisions.
//!
//! The settings layer stores actions as short text tokens:
//! `attack`, `run`, `abort`,
//! `custom`, `delevel`, `consult <handler>`, `item<id>`, or a bare
//! numeric skill id. [`ActionToken`] is the parsed form of that
//! grammar; [`CombatAction`] is the concrete decision the encounter
//! controller resolves a token into after applying its gates.

use serde::{Deserialize, Serialize};

use crate::ids::{ItemId, SkillId};

/// A raw policy token parsed from the settings text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionToken {
    /// Plain attack.
    Attack,
    /// Run away from the encounter.
    Flee,
    /// Stop fighting. Also produced by an empty token.
    Abort,
    /// Look the action up in the per-opponent round table.
    Custom,
    /// Let the threat resolver pick a weakening skill.
    Delevel,
    /// Hand the round to a named external handler.
    Consult(String),
    /// Use an item from the ledger.
    Item(ItemId),
    /// Cast a skill by id.
    Skill(SkillId),
    /// A token this layer does not recognize. Resolved through the
    /// unknown-skill gate, which falls back to Attack.
    Unrecognized(String),
}

impl ActionToken {
    /// Parse a settings token. Never fails: unknown text becomes
    /// [`ActionToken::Unrecognized`] and the empty token becomes
    /// [`ActionToken::Abort`].
    pub fn parse(raw: &str) -> Self {
        let token = raw.trim();

        if token.is_empty() || token == "abort" {
            return Self::Abort;
        }
        if token == "attack" {
            return Self::Attack;
        }
        if token.starts_with("run") {
            return Self::Flee;
        }
        if token == "custom" {
            return Self::Custom;
        }
        if token == "delevel" {
            return Self::Delevel;
        }
        if let Some(handler) = token.strip_prefix("consult") {
            return Self::Consult(handler.trim().to_owned());
        }
        if let Some(digits) = token.strip_prefix("item")
            && let Ok(raw_id) = digits.trim().parse::<u32>()
        {
            return Self::Item(ItemId::new(raw_id));
        }
        if let Ok(raw_id) = token.parse::<u32>() {
            return Self::Skill(SkillId::new(raw_id));
        }

        Self::Unrecognized(token.to_owned())
    }
}

/// A fully resolved combat decision for one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatAction {
    /// Attack with the equipped weapon.
    Attack,
    /// Run away.
    Flee,
    /// Use an item, optionally twice when dual-wielding.
    UseItem {
        /// The item to use.
        item: ItemId,
        /// A second copy of the same item, populated only when the
        /// actor can dual-wield and holds at least two units.
        second: Option<ItemId>,
    },
    /// Cast a skill.
    UseSkill(SkillId),
    /// Hand the remaining rounds to an external handler.
    Delegate {
        /// Name of the external round handler.
        handler: String,
    },
    /// Take no action; the encounter is being abandoned.
    Abort,
}
