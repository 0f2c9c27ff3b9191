//! The action policy: settings in, proposed token out.
//!
//! A pure function with no side effects. The controller interprets the
//! returned token, applies its gates, and may override it entirely
//! (first round, hit point halt). The policy's only responsibilities
//! are the unauthenticated fallback and expanding the `custom` token
//! through the per-opponent round table.

use famulus_types::{ActionToken, CombatSettings};

/// Propose an action token for the given round.
///
/// An unauthenticated session (no credential) forces Attack
/// unconditionally: without a credential the service accepts no form
/// parameters beyond the plain attack.
pub fn proposed_token(
    settings: &CombatSettings,
    credential: Option<&str>,
    opponent_key: &str,
    round: i32,
) -> ActionToken {
    if credential.is_none() {
        return ActionToken::Attack;
    }

    let token = ActionToken::parse(&settings.default_action);
    if token == ActionToken::Custom {
        return ActionToken::parse(settings.round_action(opponent_key, round));
    }
    token
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use famulus_types::SkillId;

    use super::*;

    #[test]
    fn unauthenticated_always_attacks() {
        let settings = CombatSettings {
            default_action: String::from("3004"),
            ..CombatSettings::default()
        };
        assert_eq!(proposed_token(&settings, None, "zmobie", 3), ActionToken::Attack);
    }

    #[test]
    fn default_action_passes_through() {
        let settings = CombatSettings {
            default_action: String::from("3004"),
            ..CombatSettings::default()
        };
        assert_eq!(
            proposed_token(&settings, Some("hash"), "zmobie", 3),
            ActionToken::Skill(SkillId::new(3004)),
        );
    }

    #[test]
    fn custom_expands_through_the_round_table() {
        let mut custom_rounds = BTreeMap::new();
        custom_rounds.insert(
            String::from("zmobie"),
            vec![String::from("5003"), String::from("run")],
        );
        let settings = CombatSettings {
            default_action: String::from("custom"),
            custom_rounds,
            ..CombatSettings::default()
        };

        assert_eq!(
            proposed_token(&settings, Some("hash"), "zmobie", 2),
            ActionToken::Skill(SkillId::new(5003)),
        );
        assert_eq!(proposed_token(&settings, Some("hash"), "zmobie", 3), ActionToken::Flee);
        // Past the end of the table the default action applies; for a
        // custom policy that default is re-read as written.
        assert_eq!(proposed_token(&settings, Some("hash"), "zmobie", 9), ActionToken::Custom);
    }
}
