//! Configuration loading and typed settings structures.
//!
//! The combat settings and the game data tables are external data,
//! shipped by the collaborator as YAML. This module defines the
//! strongly-typed structs mirroring that YAML and provides loaders
//! that read and validate the files. Persisting configuration is out
//! of scope; only loading lives here.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::tables::{Bestiary, ItemCatalog, RecipeBook, SkillBook};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// The policy settings driving encounter decisions.
///
/// Mirrors the combat section of the collaborator's settings file.
/// All fields default to safe values: attack every round, no HP halt,
/// no custom tables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CombatSettings {
    /// The action token proposed when no custom table applies.
    #[serde(default = "default_action")]
    pub default_action: String,

    /// Fraction of maximum hit points at or below which a round is
    /// aborted instead of fought. Zero disables the halt.
    #[serde(default)]
    pub halt_fraction: f32,

    /// Per-opponent round tables: opponent key to an ordered list of
    /// action tokens. Round N uses index N−2; out-of-range rounds fall
    /// back to [`CombatSettings::default_action`].
    #[serde(default)]
    pub custom_rounds: BTreeMap<String, Vec<String>>,

    /// Opponent keys that trigger an advisory abort notice when first
    /// seen, matched by substring against the encounter key.
    #[serde(default = "default_rare_opponents")]
    pub rare_opponents: Vec<String>,
}

impl Default for CombatSettings {
    fn default() -> Self {
        Self {
            default_action: default_action(),
            halt_fraction: 0.0,
            custom_rounds: BTreeMap::new(),
            rare_opponents: default_rare_opponents(),
        }
    }
}

impl CombatSettings {
    /// Load combat settings from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_yml::from_str(&contents)?)
    }

    /// Parse combat settings from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// The action token for round `round` against `opponent_key` when
    /// the custom table applies.
    ///
    /// Round N maps to table index N−2 (the opening round submits no
    /// action, so tables start at round 2). Out-of-range rounds and
    /// opponents without a table fall back to the default action.
    pub fn round_action(&self, opponent_key: &str, round: i32) -> &str {
        let Some(table) = self.custom_rounds.get(opponent_key) else {
            return &self.default_action;
        };
        let Some(index) = round.checked_sub(2).and_then(|i| usize::try_from(i).ok()) else {
            return &self.default_action;
        };
        match table.get(index) {
            Some(token) => token,
            None => &self.default_action,
        }
    }
}

fn default_action() -> String {
    String::from("attack")
}

/// Ultra-rare opponents; encountering one is worth stopping
/// automation for.
fn default_rare_opponents() -> Vec<String> {
    [
        "baiowulf",
        "crazy bastard",
        "hockey elemental",
        "hypnotist of hey deze",
        "infinite meat bug",
        "master of thieves",
    ]
    .map(String::from)
    .to_vec()
}

/// The full set of game data tables the core consults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GameData {
    /// Skill costs, effects, and the weakening ladder.
    #[serde(default)]
    pub skills: SkillBook,

    /// Item names and the free-to-use set.
    #[serde(default)]
    pub items: ItemCatalog,

    /// Opponent dodge/accuracy profiles.
    #[serde(default)]
    pub opponents: Bestiary,

    /// The recipe graph and special production families.
    #[serde(default)]
    pub recipes: RecipeBook,
}

impl GameData {
    /// Load game data from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_yml::from_str(&contents)?)
    }

    /// Parse game data from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }
}
