//! The threat resolver: pick the cheapest sufficient weakening skill.
//!
//! When the policy proposes the `delevel` token, the controller asks
//! this module for a concrete skill. The resolver walks the configured
//! escalation ladder weakest-tier first, testing each tier's deltas
//! against the opponent profile on top of the encounter's cumulative
//! modifiers. Escalation stops at the first tier whose test passes.
//!
//! An unlisted opponent (no profile) is always acceptable: encounters
//! against unknown opponents are never treated as unsafe.

use famulus_types::{CharacterSheet, OpponentProfile, SkillBook, SkillId};

/// The resolver's verdict for one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weakening {
    /// The fight is already acceptable; attack instead of weakening.
    Unnecessary,
    /// Cast this skill.
    Skill(SkillId),
    /// No held skill can make the fight acceptable. The controller
    /// must treat this as Abort, not retry.
    NoSafeAction,
}

/// Resolve the `delevel` token into a concrete weakening action.
///
/// Tiers whose skill the actor does not hold are skipped. When at
/// least one tier is held but no held tier's test passes, the
/// strongest held tier is still returned: weakening some is better
/// than standing still, and the next round re-evaluates.
pub fn weakening_action(
    profile: Option<&OpponentProfile>,
    sheet: &CharacterSheet,
    skills: &SkillBook,
    offense_modifier: i32,
    defense_modifier: i32,
) -> Weakening {
    let acceptable = |extra_offense: i32, extra_defense: i32| {
        profile.is_none_or(|p| {
            p.has_acceptable_dodge_rate(offense_modifier.saturating_add(extra_offense))
                && !p.always_misses(defense_modifier.saturating_add(extra_defense))
        })
    };

    if acceptable(0, 0) {
        return Weakening::Unnecessary;
    }

    let mut chosen: Option<SkillId> = None;
    let mut settled = false;

    for tier in &skills.weaken_tiers {
        if !settled && sheet.knows(tier.skill) {
            chosen = Some(tier.skill);
            settled = acceptable(tier.offense_delta, tier.defense_delta);
        }
    }

    chosen.map_or(Weakening::NoSafeAction, Weakening::Skill)
}

#[cfg(test)]
mod tests {
    use famulus_types::WeakenTier;

    use super::*;

    /// The escalation ladder used throughout these tests, weakest
    /// tier first.
    fn ladder() -> SkillBook {
        SkillBook {
            weaken_tiers: vec![
                WeakenTier { skill: SkillId::new(5003), offense_delta: -1, defense_delta: -1 },
                WeakenTier { skill: SkillId::new(5005), offense_delta: -3, defense_delta: -3 },
                WeakenTier { skill: SkillId::new(5008), offense_delta: -5, defense_delta: -5 },
                WeakenTier { skill: SkillId::new(3004), offense_delta: -6, defense_delta: 0 },
                WeakenTier { skill: SkillId::new(5012), offense_delta: -7, defense_delta: -7 },
            ],
            ..SkillBook::default()
        }
    }

    fn sheet_knowing(skills: &[u32]) -> CharacterSheet {
        let mut sheet = CharacterSheet::new(100, 100);
        for &raw in skills {
            sheet.learn(SkillId::new(raw));
        }
        sheet
    }

    #[test]
    fn unlisted_opponent_needs_no_weakening() {
        let skills = ladder();
        let sheet = sheet_knowing(&[5003]);
        assert_eq!(
            weakening_action(None, &sheet, &skills, 0, 0),
            Weakening::Unnecessary,
        );
    }

    #[test]
    fn acceptable_baseline_attacks() {
        let profile = OpponentProfile { attack: 10, defense: 4, dodge_tolerance: 5 };
        let skills = ladder();
        let sheet = sheet_knowing(&[5003, 5005]);
        assert_eq!(
            weakening_action(Some(&profile), &sheet, &skills, 0, 0),
            Weakening::Unnecessary,
        );
    }

    #[test]
    fn escalation_is_ordered_not_first_passing() {
        // Defense 10 against tolerance 5 needs a -5 offense delta;
        // the first two tiers cannot reach it even though the actor
        // holds all of them. The third tier is the answer.
        let profile = OpponentProfile { attack: 20, defense: 10, dodge_tolerance: 5 };
        let skills = ladder();
        let sheet = sheet_knowing(&[5003, 5005, 5008, 3004, 5012]);
        assert_eq!(
            weakening_action(Some(&profile), &sheet, &skills, 0, 0),
            Weakening::Skill(SkillId::new(5008)),
        );
    }

    #[test]
    fn missing_tiers_are_skipped() {
        // Same opponent, but the actor lacks the third tier: the
        // fourth tier (-6 offense) is the first held one that passes.
        let profile = OpponentProfile { attack: 20, defense: 10, dodge_tolerance: 5 };
        let skills = ladder();
        let sheet = sheet_knowing(&[5003, 5005, 3004]);
        assert_eq!(
            weakening_action(Some(&profile), &sheet, &skills, 0, 0),
            Weakening::Skill(SkillId::new(3004)),
        );
    }

    #[test]
    fn cumulative_modifiers_count() {
        // Offense already at -4: the weakest tier's extra -1 now
        // suffices against defense 10 / tolerance 5.
        let profile = OpponentProfile { attack: 20, defense: 10, dodge_tolerance: 5 };
        let skills = ladder();
        let sheet = sheet_knowing(&[5003]);
        assert_eq!(
            weakening_action(Some(&profile), &sheet, &skills, -4, 0),
            Weakening::Skill(SkillId::new(5003)),
        );
    }

    #[test]
    fn no_held_tier_means_no_safe_action() {
        let profile = OpponentProfile { attack: 20, defense: 10, dodge_tolerance: 5 };
        let skills = ladder();
        let sheet = sheet_knowing(&[]);
        assert_eq!(
            weakening_action(Some(&profile), &sheet, &skills, 0, 0),
            Weakening::NoSafeAction,
        );
    }

    #[test]
    fn strongest_held_tier_is_best_effort() {
        // Nothing the actor holds passes (would need -20), but the
        // strongest held tier is still returned.
        let profile = OpponentProfile { attack: 40, defense: 30, dodge_tolerance: 5 };
        let skills = ladder();
        let sheet = sheet_knowing(&[5003, 5005]);
        assert_eq!(
            weakening_action(Some(&profile), &sheet, &skills, 0, 0),
            Weakening::Skill(SkillId::new(5005)),
        );
    }

    #[test]
    fn over_weakening_defense_is_rejected() {
        // Attack 4: a -5/-5 tier would drop the opponent's attack to
        // nothing, so the test fails and escalation moves on to the
        // offense-only tier.
        let profile = OpponentProfile { attack: 4, defense: 10, dodge_tolerance: 5 };
        let skills = ladder();
        let sheet = sheet_knowing(&[5008, 3004]);
        assert_eq!(
            weakening_action(Some(&profile), &sheet, &skills, 0, 0),
            Weakening::Skill(SkillId::new(3004)),
        );
    }
}
