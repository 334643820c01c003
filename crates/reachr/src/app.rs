//! The operation surface shared by the CLI and the HTTP server.
//!
//! [`App`] wires a [`Store`] backend into the Record and Preference stores
//! and exposes one method per operation. Every method takes the calling
//! [`UserId`] explicitly; there is no ambient "current user".

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use reachr_core::catalog::{self, Industry};
use reachr_core::locks::UserLocks;
use reachr_core::migrate::MigrationReport;
use reachr_core::search;
use reachr_core::store::{DocumentKind, Namespace, Store};
use reachr_core::tags;
use reachr_core::{
    Contact, ContactFilter, ContactPatch, NewContact, PreferenceStore, PreferencesUpdate,
    RecordStore, SearchResult, TagEntry, UserId, UserPreferences,
};

use crate::config::{Backend, Config};
use crate::db;
use crate::fs_store::FsStore;
use crate::schema;
use crate::sqlite_store::SqliteStore;

/// Ranked results for `search`.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    /// Highest score in `results`, 0 when nothing matched.
    #[serde(rename = "topScore")]
    pub top_score: u32,
    pub query: String,
}

/// Trimmed result set for `quick_search`.
#[derive(Debug, Clone, Serialize)]
pub struct QuickSearchResponse {
    pub success: bool,
    pub results: Vec<Contact>,
    pub explanation: String,
    /// Which matcher produced `results`; always the substring scorer.
    pub source: &'static str,
}

#[derive(Clone)]
pub struct App {
    store: Arc<dyn Store>,
    records: RecordStore,
    preferences: PreferenceStore,
    quick_limit: usize,
}

impl App {
    /// Open the backend named in `[storage]`, creating directories and the
    /// SQLite schema as needed.
    pub async fn open(config: &Config) -> Result<Self> {
        let store: Arc<dyn Store> = match config.storage.backend {
            Backend::Files => {
                let fs = FsStore::new(&config.storage.root);
                fs.prepare().await?;
                info!(root = %fs.root().display(), "using file storage");
                Arc::new(fs)
            }
            Backend::Sqlite => {
                let path = config.sqlite_path();
                let pool = db::connect(&path)
                    .await
                    .with_context(|| format!("Failed to open database: {}", path.display()))?;
                schema::run_migrations(&pool).await?;
                info!(path = %path.display(), "using sqlite storage");
                Arc::new(SqliteStore::new(pool, SqliteStore::default_lock_dir(&path)))
            }
        };

        Ok(Self::with_store(store, config))
    }

    /// Build on an already-open backend.
    pub fn with_store(store: Arc<dyn Store>, config: &Config) -> Self {
        let locks = Arc::new(UserLocks::new());
        Self {
            records: RecordStore::new(store.clone(), locks.clone()),
            preferences: PreferenceStore::new(store.clone(), locks),
            store,
            quick_limit: config.search.quick_limit,
        }
    }

    pub async fn list_contacts(
        &self,
        user: &UserId,
        filter: &ContactFilter,
    ) -> reachr_core::Result<Vec<Contact>> {
        Ok(filter.apply(self.records.list(user).await?))
    }

    pub async fn create_contact(
        &self,
        user: &UserId,
        new: NewContact,
    ) -> reachr_core::Result<Contact> {
        self.records.create(user, new).await
    }

    pub async fn get_contact(&self, user: &UserId, id: &str) -> reachr_core::Result<Contact> {
        self.records.get(user, id).await
    }

    pub async fn update_contact(
        &self,
        user: &UserId,
        id: &str,
        patch: ContactPatch,
    ) -> reachr_core::Result<Contact> {
        self.records.update(user, id, patch).await
    }

    pub async fn delete_contact(&self, user: &UserId, id: &str) -> reachr_core::Result<()> {
        self.records.delete(user, id).await
    }

    pub async fn search(&self, user: &UserId, query: &str) -> reachr_core::Result<SearchResponse> {
        let contacts = self.records.list(user).await?;
        let results = search::search(query, &contacts);
        Ok(SearchResponse {
            top_score: search::top_score(&results),
            results,
            query: query.to_string(),
        })
    }

    /// The first `search.quick_limit` contacts of [`App::search`] with a
    /// one-line summary.
    pub async fn quick_search(
        &self,
        user: &UserId,
        query: &str,
    ) -> reachr_core::Result<QuickSearchResponse> {
        let response = self.search(user, query).await?;
        let results: Vec<Contact> = response
            .results
            .into_iter()
            .take(self.quick_limit)
            .map(|r| r.contact)
            .collect();
        Ok(QuickSearchResponse {
            success: true,
            explanation: format!("Found {} contacts matching '{}'", results.len(), query),
            results,
            source: "simple",
        })
    }

    pub async fn get_tags(&self, user: &UserId) -> reachr_core::Result<Vec<TagEntry>> {
        let preferences = self.preferences.get(user).await?;
        let contacts = self.records.list(user).await?;
        Ok(tags::aggregate(&preferences, &contacts))
    }

    pub async fn add_tag(&self, user: &UserId, tag: &str) -> reachr_core::Result<UserPreferences> {
        self.preferences.add_custom_tag(user, tag).await
    }

    pub async fn remove_tag(
        &self,
        user: &UserId,
        tag: &str,
    ) -> reachr_core::Result<UserPreferences> {
        self.preferences.remove_custom_tag(user, tag).await
    }

    pub async fn get_preferences(&self, user: &UserId) -> reachr_core::Result<UserPreferences> {
        self.preferences.get(user).await
    }

    pub async fn set_industry(
        &self,
        user: &UserId,
        industry: &str,
    ) -> reachr_core::Result<UserPreferences> {
        self.preferences.set_industry(user, industry).await
    }

    pub async fn set_preferences(
        &self,
        user: &UserId,
        update: PreferencesUpdate,
    ) -> reachr_core::Result<UserPreferences> {
        self.preferences.update(user, update).await
    }

    pub async fn migrate_contacts(&self, user: &UserId) -> reachr_core::Result<MigrationReport> {
        self.records.migrate_legacy(user).await
    }

    pub fn list_industries(&self) -> &'static [Industry] {
        catalog::industries()
    }

    /// Every user holding a contacts document, anonymous first.
    pub async fn users(&self) -> reachr_core::Result<Vec<UserId>> {
        let keys = self
            .store
            .list(DocumentKind::Contacts)
            .await
            .map_err(reachr_core::Error::storage)?;
        Ok(keys
            .into_iter()
            .map(|k| match k.namespace {
                Namespace::Shared => UserId::Anonymous,
                Namespace::User(id) => UserId::Account(id),
            })
            .collect())
    }
}
