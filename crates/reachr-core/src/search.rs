//! Weighted substring search over a user's contacts.
//!
//! Every contact is scanned; there is no index. Contact lists are small
//! (hundreds to low thousands per user) and the scoring must stay a plain
//! O(contacts × fields) containment test.
//!
//! # Scoring
//!
//! The trimmed, lowercased query is tested for containment in each field.
//! Matching fields add their weight and append a label to `match_reason`:
//!
//! | Field | Weight | Label |
//! |-------|--------|-------|
//! | name | 100 | `name` |
//! | company | 80 | `company` |
//! | role | 70 | `role` |
//! | industry | 60 | `industry` |
//! | location | 50 | `location` |
//! | first matching tag | 40 | `tag:<value>` |
//! | raw_context | 20 | `notes` |
//!
//! Empty fields never match. An empty query is contained in every
//! non-empty field, so it returns every contact that has any text.
//! Contacts scoring 0 are dropped and the rest are stably sorted by score,
//! descending, so ties keep collection order.

use crate::models::{Contact, SearchResult};

pub const NAME_WEIGHT: u32 = 100;
pub const COMPANY_WEIGHT: u32 = 80;
pub const ROLE_WEIGHT: u32 = 70;
pub const INDUSTRY_WEIGHT: u32 = 60;
pub const LOCATION_WEIGHT: u32 = 50;
pub const TAG_WEIGHT: u32 = 40;
pub const NOTES_WEIGHT: u32 = 20;

/// Rank `contacts` against `query`.
pub fn search(query: &str, contacts: &[Contact]) -> Vec<SearchResult> {
    let needle = query.trim().to_lowercase();

    let mut results: Vec<SearchResult> = contacts
        .iter()
        .filter_map(|contact| {
            let (score, reasons) = score_contact(&needle, contact);
            (score > 0).then(|| SearchResult {
                contact: contact.clone(),
                score,
                match_reason: reasons.join(", "),
            })
        })
        .collect();

    // `sort_by` is stable: equal scores keep their input order.
    results.sort_by(|a, b| b.score.cmp(&a.score));
    results
}

/// Highest score in `results`, or 0 when empty.
pub fn top_score(results: &[SearchResult]) -> u32 {
    results.iter().map(|r| r.score).max().unwrap_or(0)
}

/// Score one contact against an already-normalized needle.
pub fn score_contact(needle: &str, contact: &Contact) -> (u32, Vec<String>) {
    let mut score = 0;
    let mut reasons = Vec::new();

    let fields: [(Option<&str>, u32, &str); 5] = [
        (Some(contact.name.as_str()), NAME_WEIGHT, "name"),
        (contact.company.as_deref(), COMPANY_WEIGHT, "company"),
        (contact.role.as_deref(), ROLE_WEIGHT, "role"),
        (contact.industry.as_deref(), INDUSTRY_WEIGHT, "industry"),
        (contact.location.as_deref(), LOCATION_WEIGHT, "location"),
    ];
    for (value, weight, label) in fields {
        if contains(value, needle) {
            score += weight;
            reasons.push(label.to_string());
        }
    }

    if let Some(tag) = contact
        .tags
        .iter()
        .find(|tag| tag.to_lowercase().contains(needle))
    {
        score += TAG_WEIGHT;
        reasons.push(format!("tag:{tag}"));
    }

    if contains(contact.raw_context.as_deref(), needle) {
        score += NOTES_WEIGHT;
        reasons.push("notes".to_string());
    }

    (score, reasons)
}

fn contains(value: Option<&str>, needle: &str) -> bool {
    match value {
        Some(v) if !v.is_empty() => v.to_lowercase().contains(needle),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewContact, UserId};

    fn contact(id: &str, new: NewContact) -> Contact {
        new.into_contact(id.into(), &UserId::Anonymous, "2024-01-01T00:00:00.000Z")
            .unwrap()
    }

    fn named(id: &str, name: &str) -> NewContact {
        NewContact::named(format!("{name} {id}"))
    }

    #[test]
    fn test_company_match_scores_80() {
        let c = contact(
            "c1",
            NewContact {
                company: Some("Analytical Engines".into()),
                ..NewContact::named("Ada Lovelace")
            },
        );
        let results = search("analytical", &[c]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 80);
        assert_eq!(results[0].match_reason, "company");
    }

    #[test]
    fn test_only_first_matching_tag_counts() {
        let c = contact(
            "c1",
            NewContact {
                tags: vec!["vc".into(), "fintech".into()],
                ..NewContact::named("Zed")
            },
        );
        let results = search("vc", &[c]);
        assert_eq!(results[0].score, 40);
        assert_eq!(results[0].match_reason, "tag:vc");
    }

    #[test]
    fn test_second_tag_match_adds_nothing() {
        let c = contact(
            "c1",
            NewContact {
                tags: vec!["ai".into(), "ai research".into()],
                ..NewContact::named("Zed")
            },
        );
        let results = search("AI", &[c]);
        assert_eq!(results[0].score, TAG_WEIGHT);
        assert_eq!(results[0].match_reason, "tag:ai");
    }

    #[test]
    fn test_weight_ordering() {
        let by_tag = contact(
            "t",
            NewContact {
                tags: vec!["acme".into()],
                ..NewContact::named("Tag Person")
            },
        );
        let by_company = contact(
            "c",
            NewContact {
                company: Some("Acme".into()),
                ..NewContact::named("Company Person")
            },
        );
        let by_name = contact("n", NewContact::named("Acme Smith"));

        let results = search("acme", &[by_tag, by_company, by_name]);
        let ids: Vec<&str> = results.iter().map(|r| r.contact.id.as_str()).collect();
        assert_eq!(ids, vec!["n", "c", "t"]);
    }

    #[test]
    fn test_stable_tie_break() {
        let contacts: Vec<Contact> = ["a", "b", "c", "d"]
            .iter()
            .map(|id| {
                contact(
                    id,
                    NewContact {
                        role: Some("Engineer".into()),
                        ..named(id, "Person")
                    },
                )
            })
            .collect();
        let results = search("engineer", &contacts);
        let ids: Vec<&str> = results.iter().map(|r| r.contact.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_additive_and_reason_order() {
        let c = contact(
            "c1",
            NewContact {
                company: Some("Denver Ventures".into()),
                location: Some("Denver".into()),
                raw_context: Some("met in denver".into()),
                tags: vec!["denver".into()],
                ..NewContact::named("Dana")
            },
        );
        let results = search("  DENVER ", &[c]);
        assert_eq!(results[0].score, 80 + 50 + 40 + 20);
        assert_eq!(
            results[0].match_reason,
            "company, location, tag:denver, notes"
        );
    }

    #[test]
    fn test_no_match_excluded() {
        let c = contact("c1", NewContact::named("Ada"));
        assert!(search("babbage", &[c]).is_empty());
    }

    #[test]
    fn test_empty_query_matches_non_empty_fields() {
        let with_company = contact(
            "c1",
            NewContact {
                company: Some("X".into()),
                email: Some("ignored@example.com".into()),
                ..NewContact::named("Ada")
            },
        );
        let mut bare = contact("c2", NewContact::named("Bob"));
        bare.company = Some(String::new());

        let results = search("   ", &[bare, with_company]);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].contact.id, "c1");
        assert_eq!(results[0].score, NAME_WEIGHT + COMPANY_WEIGHT);
        assert_eq!(results[1].score, NAME_WEIGHT);
        assert_eq!(results[1].match_reason, "name");
    }

    #[test]
    fn test_deterministic() {
        let c = contact(
            "c1",
            NewContact {
                role: Some("Founder".into()),
                tags: vec!["founder".into()],
                ..NewContact::named("Found Er")
            },
        );
        let first = search("found", std::slice::from_ref(&c));
        let second = search("found", std::slice::from_ref(&c));
        assert_eq!(first, second);
    }

    #[test]
    fn test_top_score() {
        assert_eq!(top_score(&[]), 0);
        let a = contact("a", NewContact::named("Acme"));
        let b = contact(
            "b",
            NewContact {
                company: Some("acme".into()),
                ..NewContact::named("Bob")
            },
        );
        let results = search("acme", &[b, a]);
        assert_eq!(top_score(&results), NAME_WEIGHT);
    }
}
