//! Record Store: a user's contact collection.
//!
//! The collection is one `{"contacts": [...]}` document per user. Every
//! mutation reloads the whole document, edits it, and writes it back while
//! holding the user's [`WriteGuard`]. A successful return means the backend
//! has accepted the new document.
//!
//! Entries are decoded one at a time: an entry that does not decode is
//! logged and skipped, and a document that is not JSON at all reads as an
//! empty collection. Either way the stored body is handed to
//! [`Store::quarantine`] before the next write replaces it, and the write is
//! refused if that fails. A failing backend surfaces as
//! [`Error::StorageUnavailable`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::locks::{UserLocks, WriteGuard};
use crate::migrate::{migrate, MigrationReport};
use crate::models::{now_timestamp, Contact, ContactPatch, NewContact, UserId};
use crate::store::{DocumentKey, Store};

#[derive(Deserialize)]
struct RawContactsDocument {
    #[serde(default)]
    contacts: Vec<serde_json::Value>,
}

/// Decoded collection plus the stored body when any of it was unreadable.
struct Loaded {
    contacts: Vec<Contact>,
    damaged: Option<String>,
}

#[derive(Serialize)]
struct ContactsDocumentRef<'a> {
    contacts: &'a [Contact],
}

/// Contact persistence for every user, backed by any [`Store`].
#[derive(Clone)]
pub struct RecordStore {
    store: Arc<dyn Store>,
    locks: Arc<UserLocks>,
}

impl RecordStore {
    pub fn new(store: Arc<dyn Store>, locks: Arc<UserLocks>) -> Self {
        Self { store, locks }
    }

    /// All contacts in stored order. Empty if the user has none yet.
    pub async fn list(&self, user: &UserId) -> Result<Vec<Contact>> {
        Ok(self.load(user).await?.contacts)
    }

    pub async fn get(&self, user: &UserId, id: &str) -> Result<Contact> {
        self.load(user)
            .await?
            .contacts
            .into_iter()
            .find(|c| c.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Assign an id and timestamps, append, persist.
    pub async fn create(&self, user: &UserId, new: NewContact) -> Result<Contact> {
        let _guard = self.lock(user).await?;
        let Loaded {
            mut contacts,
            damaged,
        } = self.load(user).await?;

        let mut id = Uuid::new_v4().to_string();
        while contacts.iter().any(|c| c.id == id) {
            id = Uuid::new_v4().to_string();
        }
        let contact = new.into_contact(id, user, &now_timestamp())?;

        contacts.push(contact.clone());
        self.save(user, &contacts, damaged.as_deref()).await?;
        Ok(contact)
    }

    /// Merge only the supplied fields, bump `updated_at`, persist.
    pub async fn update(&self, user: &UserId, id: &str, patch: ContactPatch) -> Result<Contact> {
        let _guard = self.lock(user).await?;
        let Loaded {
            mut contacts,
            damaged,
        } = self.load(user).await?;

        let contact = contacts
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        patch.apply_to(contact)?;
        contact.updated_at = now_timestamp();
        let updated = contact.clone();

        self.save(user, &contacts, damaged.as_deref()).await?;
        Ok(updated)
    }

    pub async fn delete(&self, user: &UserId, id: &str) -> Result<()> {
        let _guard = self.lock(user).await?;
        let Loaded {
            mut contacts,
            damaged,
        } = self.load(user).await?;

        let index = contacts
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        contacts.remove(index);

        self.save(user, &contacts, damaged.as_deref()).await
    }

    /// Merge the shared legacy collection into `user`'s contacts.
    ///
    /// Writes only when something was migrated. For the anonymous user the
    /// source and target are the same collection, so nothing moves.
    pub async fn migrate_legacy(&self, user: &UserId) -> Result<MigrationReport> {
        if user.is_anonymous() {
            let total = self.load(user).await?.contacts.len();
            return Ok(MigrationReport { migrated: 0, total });
        }

        let legacy = self.load(&UserId::Anonymous).await?.contacts;

        let _guard = self.lock(user).await?;
        let Loaded {
            contacts: existing,
            damaged,
        } = self.load(user).await?;
        let (merged, migrated) = migrate(&legacy, user, existing);
        if migrated > 0 {
            self.save(user, &merged, damaged.as_deref()).await?;
        }
        info!(user = %user, migrated, total = merged.len(), "legacy migration finished");

        Ok(MigrationReport {
            migrated,
            total: merged.len(),
        })
    }

    async fn lock(&self, user: &UserId) -> Result<WriteGuard> {
        self.locks.acquire_write(self.store.as_ref(), user).await
    }

    async fn load(&self, user: &UserId) -> Result<Loaded> {
        let key = DocumentKey::contacts(user);
        let body = self.store.get(&key).await.map_err(|e| {
            error!(key = %key, error = %format!("{e:#}"), "failed to read contacts");
            Error::storage(e)
        })?;

        Ok(match body {
            Some(body) => decode(&key, body),
            None => Loaded {
                contacts: Vec::new(),
                damaged: None,
            },
        })
    }

    /// Write `contacts`, first setting aside `damaged` if the document it
    /// replaces could not be read in full.
    async fn save(&self, user: &UserId, contacts: &[Contact], damaged: Option<&str>) -> Result<()> {
        let key = DocumentKey::contacts(user);
        let body = serde_json::to_string_pretty(&ContactsDocumentRef { contacts })
            .map_err(|e| Error::StorageUnavailable(format!("encode {key}: {e}")))?;

        if let Some(raw) = damaged {
            let kept = self.store.quarantine(&key, raw).await.map_err(|e| {
                error!(key = %key, error = %format!("{e:#}"), "failed to keep unreadable contacts");
                Error::storage(e)
            })?;
            warn!(key = %key, kept = %kept, "unreadable contacts kept before rewrite");
        }

        self.store.put(&key, &body).await.map_err(|e| {
            error!(key = %key, error = %format!("{e:#}"), "failed to write contacts");
            Error::storage(e)
        })?;
        debug!(key = %key, count = contacts.len(), "contacts written");
        Ok(())
    }
}

fn decode(key: &DocumentKey, body: String) -> Loaded {
    let doc = match serde_json::from_str::<RawContactsDocument>(&body) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(key = %key, error = %e, "unreadable contacts document, treating as empty");
            return Loaded {
                contacts: Vec::new(),
                damaged: Some(body),
            };
        }
    };

    let mut contacts = Vec::with_capacity(doc.contacts.len());
    let mut skipped = 0usize;
    for (index, entry) in doc.contacts.into_iter().enumerate() {
        match serde_json::from_value::<Contact>(entry) {
            Ok(contact) => contacts.push(contact),
            Err(e) => {
                warn!(key = %key, index, error = %e, "skipping unreadable contact");
                skipped += 1;
            }
        }
    }

    Loaded {
        contacts,
        damaged: (skipped > 0).then_some(body),
    }
}
