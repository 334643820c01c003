//! In-memory [`Store`] implementation for testing.
//!
//! Uses a `HashMap` behind `std::sync::RwLock`. Every `put` swaps the whole
//! body under the write lock, which satisfies the atomic-replace contract.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use anyhow::Result;
use async_trait::async_trait;

use super::{DocumentKey, DocumentKind, Store};

/// In-memory store for tests and ephemeral runs.
pub struct InMemoryStore {
    docs: RwLock<HashMap<DocumentKey, String>>,
    quarantined: RwLock<Vec<(DocumentKey, String)>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(HashMap::new()),
            quarantined: RwLock::new(Vec::new()),
        }
    }

    /// Bodies set aside by [`Store::quarantine`], oldest first.
    pub fn quarantined(&self) -> Vec<(DocumentKey, String)> {
        self.quarantined
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Insert a raw body, bypassing the Record Store. Useful for seeding
    /// legacy or corrupt documents.
    pub fn insert_raw(&self, key: DocumentKey, body: impl Into<String>) {
        self.docs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, body.into());
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get(&self, key: &DocumentKey) -> Result<Option<String>> {
        let docs = self.docs.read().unwrap_or_else(PoisonError::into_inner);
        Ok(docs.get(key).cloned())
    }

    async fn put(&self, key: &DocumentKey, body: &str) -> Result<()> {
        let mut docs = self.docs.write().unwrap_or_else(PoisonError::into_inner);
        docs.insert(key.clone(), body.to_string());
        Ok(())
    }

    async fn delete(&self, key: &DocumentKey) -> Result<bool> {
        let mut docs = self.docs.write().unwrap_or_else(PoisonError::into_inner);
        Ok(docs.remove(key).is_some())
    }

    async fn list(&self, kind: DocumentKind) -> Result<Vec<DocumentKey>> {
        let docs = self.docs.read().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<DocumentKey> = docs.keys().filter(|k| k.kind == kind).cloned().collect();
        keys.sort();
        Ok(keys)
    }

    async fn quarantine(&self, key: &DocumentKey, body: &str) -> Result<String> {
        let mut quarantined = self
            .quarantined
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        quarantined.push((key.clone(), body.to_string()));
        Ok(format!("memory quarantine #{}", quarantined.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserId;

    #[tokio::test]
    async fn test_get_put_delete() {
        let store = InMemoryStore::new();
        let key = DocumentKey::contacts(&UserId::Account("u".into()));

        assert_eq!(store.get(&key).await.unwrap(), None);
        store.put(&key, "{}").await.unwrap();
        assert_eq!(store.get(&key).await.unwrap().as_deref(), Some("{}"));
        assert!(store.delete(&key).await.unwrap());
        assert!(!store.delete(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_filters_by_kind() {
        let store = InMemoryStore::new();
        let u = UserId::Account("u".into());
        store.put(&DocumentKey::contacts(&u), "{}").await.unwrap();
        store.put(&DocumentKey::preferences(&u), "{}").await.unwrap();
        store
            .put(&DocumentKey::contacts(&UserId::Anonymous), "{}")
            .await
            .unwrap();

        let keys = store.list(DocumentKind::Contacts).await.unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0], DocumentKey::contacts(&UserId::Anonymous));
    }
}
