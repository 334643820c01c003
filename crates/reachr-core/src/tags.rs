//! Tag aggregation for autocomplete.
//!
//! Sources are merged by normalized (trimmed, lowercase) text in priority
//! order: custom, suggested, contact-derived, then the `general` defaults.
//! The first source to claim a tag keeps it; later sources only add to its
//! `count`, which always reflects how many contact tags carry it.

use std::collections::HashMap;

use crate::catalog;
use crate::models::{Contact, TagEntry, TagSource, UserPreferences};

/// Trim and lowercase a tag. Returns `None` when nothing is left.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let tag = tag.trim().to_lowercase();
    (!tag.is_empty()).then_some(tag)
}

/// Build the ranked autocomplete list for one user.
///
/// Sorted by count descending, then tag text ascending.
pub fn aggregate(preferences: &UserPreferences, contacts: &[Contact]) -> Vec<TagEntry> {
    let mut entries: HashMap<String, TagEntry> = HashMap::new();

    for tag in &preferences.custom_tags {
        seed(&mut entries, tag, TagSource::Custom);
    }
    for tag in &preferences.suggested_tags {
        seed(&mut entries, tag, TagSource::Suggested);
    }

    for tag in contacts.iter().flat_map(|c| c.tags.iter()) {
        let Some(key) = normalize_tag(tag) else {
            continue;
        };
        entries
            .entry(key.clone())
            .and_modify(|e| e.count += 1)
            .or_insert(TagEntry {
                tag: key,
                count: 1,
                source: TagSource::Contact,
            });
    }

    if preferences.industry.is_none() && preferences.suggested_tags.is_empty() {
        for tag in catalog::general().default_tags {
            seed(&mut entries, tag, TagSource::Default);
        }
    }

    let mut out: Vec<TagEntry> = entries.into_values().collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    out
}

/// Insert a zero-count entry unless a higher-priority source already has it.
fn seed(entries: &mut HashMap<String, TagEntry>, tag: &str, source: TagSource) {
    if let Some(key) = normalize_tag(tag) {
        entries.entry(key.clone()).or_insert(TagEntry {
            tag: key,
            count: 0,
            source,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewContact, UserId};

    fn tagged(id: &str, tags: &[&str]) -> Contact {
        NewContact {
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..NewContact::named("Someone")
        }
        .into_contact(id.into(), &UserId::Anonymous, "now")
        .unwrap()
    }

    fn prefs(industry: Option<&str>, custom: &[&str], suggested: &[&str]) -> UserPreferences {
        UserPreferences {
            industry: industry.map(str::to_string),
            custom_tags: custom.iter().map(|t| t.to_string()).collect(),
            suggested_tags: suggested.iter().map(|t| t.to_string()).collect(),
            updated_at: None,
        }
    }

    fn find<'a>(entries: &'a [TagEntry], tag: &str) -> &'a TagEntry {
        entries.iter().find(|e| e.tag == tag).unwrap()
    }

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag("  VC "), Some("vc".to_string()));
        assert_eq!(normalize_tag("   "), None);
    }

    #[test]
    fn test_custom_keeps_source_but_counts_contacts() {
        let p = prefs(Some("technology"), &["fintech"], &["ai"]);
        let contacts = vec![tagged("a", &["FinTech"]), tagged("b", &["fintech", "vc"])];
        let entries = aggregate(&p, &contacts);

        let fintech = find(&entries, "fintech");
        assert_eq!(fintech.source, TagSource::Custom);
        assert_eq!(fintech.count, 2);
        assert_eq!(entries.iter().filter(|e| e.tag == "fintech").count(), 1);

        let vc = find(&entries, "vc");
        assert_eq!(vc.source, TagSource::Contact);
        assert_eq!(vc.count, 1);

        let ai = find(&entries, "ai");
        assert_eq!(ai.source, TagSource::Suggested);
        assert_eq!(ai.count, 0);
    }

    #[test]
    fn test_custom_beats_suggested() {
        let p = prefs(Some("finance"), &["vc"], &["vc", "angel"]);
        let entries = aggregate(&p, &[]);
        assert_eq!(find(&entries, "vc").source, TagSource::Custom);
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_ordering_count_then_alpha() {
        let p = prefs(Some("general"), &[], &["zeta", "alpha"]);
        let contacts = vec![
            tagged("a", &["mid", "top"]),
            tagged("b", &["top", "mid"]),
            tagged("c", &["top"]),
        ];
        let entries = aggregate(&p, &contacts);
        let order: Vec<&str> = entries.iter().map(|e| e.tag.as_str()).collect();
        assert_eq!(order, vec!["top", "mid", "alpha", "zeta"]);
    }

    #[test]
    fn test_new_user_gets_general_defaults() {
        let entries = aggregate(&UserPreferences::default(), &[tagged("a", &["networking"])]);
        for tag in catalog::general().default_tags {
            assert!(entries.iter().any(|e| e.tag == *tag), "missing {tag}");
        }
        let networking = find(&entries, "networking");
        assert_eq!(networking.source, TagSource::Contact);
        assert_eq!(networking.count, 1);
        assert_eq!(find(&entries, "mentor").source, TagSource::Default);
    }

    #[test]
    fn test_no_defaults_once_industry_selected() {
        let p = prefs(Some("legal"), &[], &["attorney"]);
        let entries = aggregate(&p, &[]);
        assert_eq!(entries.len(), 1);
        assert!(entries.iter().all(|e| e.source != TagSource::Default));
    }

    #[test]
    fn test_deterministic_across_calls() {
        let p = prefs(None, &["b", "a"], &[]);
        let contacts = vec![tagged("a", &["c", "d", "c"])];
        assert_eq!(aggregate(&p, &contacts), aggregate(&p, &contacts));
    }
}
