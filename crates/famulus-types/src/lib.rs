//! Shared type definitions for the famulus automation core.
//!
//! This crate is the single source of truth for the types used across
//! the famulus workspace: service ids, action tokens and decisions,
//! the actor's character sheet, the data-driven lookup tables, the
//! external service seam, and the session context.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe wrappers for the service's numeric ids
//! - [`action`] -- Action tokens and resolved combat decisions
//! - [`character`] -- The actor's vital and skill state
//! - [`tables`] -- Skill, item, opponent, and recipe lookups
//! - [`service`] -- The blocking service call contract and markers
//! - [`session`] -- Continuation flag, credential, and notices
//! - [`config`] -- YAML loaders for settings and data tables

pub mod action;
pub mod character;
pub mod config;
pub mod ids;
pub mod service;
pub mod session;
pub mod tables;

// Re-export all public types at crate root for convenience.
pub use action::{ActionToken, CombatAction};
pub use character::CharacterSheet;
pub use config::{CombatSettings, ConfigError, GameData};
pub use ids::{ItemId, SkillId};
pub use service::{
    ENCOUNTER_ENDPOINT, GameService, ITEM_FIELD_MARKER, SECOND_ITEM_FIELD_MARKER,
    SKILL_FIELD_MARKER, ScriptedService, ServiceError, SubmittedCall, numeric_field,
    shows_encounter,
};
pub use session::{Notice, Session, Severity};
pub use tables::{
    Bestiary, CraftMethod, ItemCatalog, OpponentProfile, Recipe, RecipeBook, RecipeSlot,
    SkillBook, SkillEntry, WeakenTier,
};
