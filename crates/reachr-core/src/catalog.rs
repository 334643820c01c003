//! Closed industry catalog and per-industry default tag lists.
//!
//! The catalog is static data compiled into the binary and never mutated
//! at runtime. `general` is always present and is the fallback for any
//! industry id that does not resolve.

use serde::Serialize;

/// One selectable industry.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Industry {
    pub id: &'static str,
    pub display_name: &'static str,
    #[serde(skip)]
    pub default_tags: &'static [&'static str],
}

/// Id of the fallback entry.
pub const GENERAL: &str = "general";

static INDUSTRIES: &[Industry] = &[
    Industry {
        id: "real_estate",
        display_name: "Real Estate",
        default_tags: &[
            "buyer",
            "seller",
            "investor",
            "agent",
            "broker",
            "lender",
            "property manager",
            "developer",
            "commercial",
            "residential",
            "open house",
        ],
    },
    Industry {
        id: "technology",
        display_name: "Technology",
        default_tags: &[
            "engineer",
            "founder",
            "cto",
            "product",
            "saas",
            "ai",
            "startup",
            "investor",
            "hiring",
            "open source",
            "conference",
        ],
    },
    Industry {
        id: "finance",
        display_name: "Finance",
        default_tags: &[
            "vc",
            "angel",
            "banker",
            "analyst",
            "fintech",
            "private equity",
            "wealth management",
            "cfo",
            "accountant",
            "investor",
        ],
    },
    Industry {
        id: "healthcare",
        display_name: "Healthcare",
        default_tags: &[
            "physician",
            "nurse",
            "clinic",
            "hospital",
            "biotech",
            "pharma",
            "medtech",
            "researcher",
            "administrator",
        ],
    },
    Industry {
        id: "marketing",
        display_name: "Marketing",
        default_tags: &[
            "brand",
            "growth",
            "content",
            "seo",
            "social media",
            "agency",
            "cmo",
            "influencer",
            "partnerships",
        ],
    },
    Industry {
        id: "legal",
        display_name: "Legal",
        default_tags: &[
            "attorney",
            "paralegal",
            "litigation",
            "corporate",
            "ip",
            "compliance",
            "in-house",
            "law firm",
        ],
    },
    Industry {
        id: "consulting",
        display_name: "Consulting",
        default_tags: &[
            "consultant",
            "strategy",
            "operations",
            "advisor",
            "freelance",
            "partner",
            "client",
            "referral",
        ],
    },
    Industry {
        id: "sales",
        display_name: "Sales",
        default_tags: &[
            "lead",
            "prospect",
            "client",
            "account executive",
            "sdr",
            "partner",
            "follow up",
            "decision maker",
        ],
    },
    Industry {
        id: GENERAL,
        display_name: "General / Other",
        default_tags: &[
            "networking",
            "conference",
            "client",
            "partner",
            "mentor",
            "friend",
            "follow up",
            "investor",
            "hiring",
        ],
    },
];

/// Every industry in catalog order.
pub fn industries() -> &'static [Industry] {
    INDUSTRIES
}

/// Canonical form of a caller-supplied industry id: `"Real Estate"` becomes
/// `"real_estate"`.
pub fn normalize_industry_id(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "_")
}

/// Exact lookup after normalization.
pub fn find(raw: &str) -> Option<&'static Industry> {
    let id = normalize_industry_id(raw);
    INDUSTRIES.iter().find(|i| i.id == id)
}

/// The `general` entry.
pub fn general() -> &'static Industry {
    INDUSTRIES
        .iter()
        .find(|i| i.id == GENERAL)
        .unwrap_or(&INDUSTRIES[INDUSTRIES.len() - 1])
}

/// Lookup with the `general` fallback for unknown ids.
pub fn resolve(raw: &str) -> &'static Industry {
    find(raw).unwrap_or_else(general)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_general_always_present() {
        assert_eq!(general().id, GENERAL);
        assert!(!general().default_tags.is_empty());
    }

    #[test]
    fn test_resolve_normalizes_display_names() {
        assert_eq!(resolve("Real Estate").id, "real_estate");
        assert_eq!(resolve("  TECHNOLOGY ").id, "technology");
    }

    #[test]
    fn test_unknown_falls_back_to_general() {
        assert!(find("basket weaving").is_none());
        assert_eq!(resolve("basket weaving").id, GENERAL);
    }

    #[test]
    fn test_ids_unique_and_tags_lowercase() {
        let mut ids: Vec<&str> = industries().iter().map(|i| i.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), industries().len());
        for industry in industries() {
            for tag in industry.default_tags {
                assert_eq!(*tag, tag.to_lowercase());
            }
        }
    }
}
