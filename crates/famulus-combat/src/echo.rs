//! Session-log echo of submitted encounter forms.
//!
//! The collaborator keeps a human-readable session log; this module
//! renders the one-line description of a submitted encounter URL by
//! searching for the skill/item form-field markers. Only the markers
//! are inspected; the rest of the URL grammar is ignored.

use famulus_types::{
    ENCOUNTER_ENDPOINT, ITEM_FIELD_MARKER, ItemCatalog, ItemId, SECOND_ITEM_FIELD_MARKER,
    SKILL_FIELD_MARKER, SkillBook, SkillId, numeric_field,
};

/// Render the session-log line for a submitted encounter URL.
///
/// Returns `None` when the URL is not an encounter submission (no
/// query string on the encounter endpoint).
pub fn describe_submission(
    url: &str,
    skills: &SkillBook,
    items: &ItemCatalog,
) -> Option<String> {
    let submission_marker = format!("{ENCOUNTER_ENDPOINT}?");
    if !url.contains(&submission_marker) {
        return None;
    }

    if let Some(raw) = numeric_field(url, SKILL_FIELD_MARKER) {
        let line = skills.name(SkillId::new(raw)).map_or_else(
            || String::from("casts a spell nobody has heard of!"),
            |name| format!("casts the enchanted spell of {}!", name.to_uppercase()),
        );
        return Some(line);
    }

    if let Some(raw) = numeric_field(url, ITEM_FIELD_MARKER) {
        let mut line = items.name(ItemId::new(raw)).map_or_else(
            || String::from("uses an unidentified item"),
            |name| format!("uses the {name}"),
        );
        if let Some(second_raw) = numeric_field(url, SECOND_ITEM_FIELD_MARKER) {
            let second = items
                .name(ItemId::new(second_raw))
                .unwrap_or("an unidentified item");
            line.push_str(" and the ");
            line.push_str(second);
        }
        line.push('!');
        return Some(line);
    }

    if url.contains("runaway") {
        return Some(String::from("casts the spell of RETURN!"));
    }

    Some(String::from("attacks with fear-inducing body language!"))
}

#[cfg(test)]
mod tests {
    use famulus_types::SkillEntry;

    use super::*;

    fn fixtures() -> (SkillBook, ItemCatalog) {
        let mut skills = SkillBook::default();
        skills.insert(
            SkillId::new(3004),
            SkillEntry {
                name: String::from("Tangling Strike"),
                mp_cost: 3,
                offense_delta: -6,
                defense_delta: 0,
            },
        );
        let mut items = ItemCatalog::default();
        items.insert(ItemId::new(2), "chipped fang");
        items.insert(ItemId::new(536), "weighty tome");
        (skills, items)
    }

    #[test]
    fn non_submissions_render_nothing() {
        let (skills, items) = fixtures();
        assert_eq!(describe_submission("inventory.php?which=3", &skills, &items), None);
        // The bare encounter page is a fetch, not a submission.
        assert_eq!(describe_submission("fight.php", &skills, &items), None);
    }

    #[test]
    fn skill_casts_are_shouted() {
        let (skills, items) = fixtures();
        assert_eq!(
            describe_submission("fight.php?action=skill&whichskill=3004", &skills, &items),
            Some(String::from("casts the enchanted spell of TANGLING STRIKE!")),
        );
    }

    #[test]
    fn unknown_skills_get_the_fallback_line() {
        let (skills, items) = fixtures();
        assert_eq!(
            describe_submission("fight.php?action=skill&whichskill=42", &skills, &items),
            Some(String::from("casts a spell nobody has heard of!")),
        );
    }

    #[test]
    fn item_use_names_both_items() {
        let (skills, items) = fixtures();
        assert_eq!(
            describe_submission(
                "fight.php?action=useitem&whichitem=2&whichitem2=536",
                &skills,
                &items,
            ),
            Some(String::from("uses the chipped fang and the weighty tome!")),
        );
    }

    #[test]
    fn plain_rounds_have_flavor() {
        let (skills, items) = fixtures();
        assert_eq!(
            describe_submission("fight.php?action=runaway", &skills, &items),
            Some(String::from("casts the spell of RETURN!")),
        );
        assert_eq!(
            describe_submission("fight.php?action=attack", &skills, &items),
            Some(String::from("attacks with fear-inducing body language!")),
        );
    }
}
