//! One-time merge of the legacy shared collection into a user's contacts.
//!
//! The merge is keyed on contact id and is idempotent: ids already present
//! are never overwritten, and running it again with the same legacy input
//! migrates nothing.

use std::collections::HashSet;

use serde::Serialize;

use crate::models::{Contact, UserId};

/// Outcome of `migrate_contacts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Contacts appended by this run.
    pub migrated: usize,
    /// Size of the user's collection afterwards.
    pub total: usize,
}

/// Append every legacy contact whose id is not already in `existing`,
/// stamped with `owner_id = user`.
///
/// Returns the merged collection and the number of contacts appended.
/// Duplicate ids inside `legacy` are appended once.
pub fn migrate(
    legacy: &[Contact],
    user: &UserId,
    existing: Vec<Contact>,
) -> (Vec<Contact>, usize) {
    let mut seen: HashSet<String> = existing.iter().map(|c| c.id.clone()).collect();
    let mut merged = existing;
    let mut migrated = 0;

    for contact in legacy {
        if !seen.insert(contact.id.clone()) {
            continue;
        }
        let mut contact = contact.clone();
        contact.owner_id = Some(user.as_str().to_string());
        merged.push(contact);
        migrated += 1;
    }

    (merged, migrated)
}
