//! Preference Store: one [`UserPreferences`] document per user.
//!
//! Never-written preferences read as defaults, and so does a document that
//! no longer decodes. Writers follow the same lock → load → edit → save
//! cycle as the Record Store, including keeping an unreadable body in
//! quarantine before it is overwritten.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::catalog;
use crate::error::{Error, Result};
use crate::locks::UserLocks;
use crate::models::{now_timestamp, PreferencesUpdate, UserId, UserPreferences};
use crate::store::{DocumentKey, Store};
use crate::tags::normalize_tag;

#[derive(Clone)]
pub struct PreferenceStore {
    store: Arc<dyn Store>,
    locks: Arc<UserLocks>,
}

impl PreferenceStore {
    pub fn new(store: Arc<dyn Store>, locks: Arc<UserLocks>) -> Self {
        Self { store, locks }
    }

    pub async fn get(&self, user: &UserId) -> Result<UserPreferences> {
        Ok(self.load(user).await?.0)
    }

    /// Select an industry and replace `suggested_tags` with its defaults.
    ///
    /// Unknown ids resolve to the `general` entry instead of failing.
    pub async fn set_industry(&self, user: &UserId, industry: &str) -> Result<UserPreferences> {
        self.modify(user, |prefs| {
            apply_industry(prefs, industry);
            Ok(true)
        })
        .await
    }

    /// Add a lowercase, trimmed tag unless it is already present.
    pub async fn add_custom_tag(&self, user: &UserId, tag: &str) -> Result<UserPreferences> {
        let tag = normalize_tag(tag)
            .ok_or_else(|| Error::InvalidInput("tag must not be empty".into()))?;

        self.modify(user, |prefs| {
            if prefs.custom_tags.iter().any(|t| t.to_lowercase() == tag) {
                return Ok(false);
            }
            prefs.custom_tags.push(tag);
            Ok(true)
        })
        .await
    }

    /// Case-insensitive removal. Removing an absent tag succeeds.
    pub async fn remove_custom_tag(&self, user: &UserId, tag: &str) -> Result<UserPreferences> {
        let Some(tag) = normalize_tag(tag) else {
            return self.get(user).await;
        };

        self.modify(user, |prefs| {
            let before = prefs.custom_tags.len();
            prefs.custom_tags.retain(|t| t.to_lowercase() != tag);
            Ok(prefs.custom_tags.len() != before)
        })
        .await
    }

    /// Apply an industry change and/or a wholesale custom tag replacement
    /// in one write.
    pub async fn update(&self, user: &UserId, update: PreferencesUpdate) -> Result<UserPreferences> {
        let custom_tags = match update.custom_tags {
            Some(tags) => Some(normalize_tag_set(&tags)?),
            None => None,
        };

        self.modify(user, |prefs| {
            if let Some(industry) = update.industry.as_deref() {
                apply_industry(prefs, industry);
            }
            if let Some(tags) = custom_tags {
                prefs.custom_tags = tags;
            }
            Ok(true)
        })
        .await
    }

    /// Run `edit` under the user's lock; it returns whether anything changed.
    async fn modify<F>(&self, user: &UserId, edit: F) -> Result<UserPreferences>
    where
        F: FnOnce(&mut UserPreferences) -> Result<bool>,
    {
        let _guard = self
            .locks
            .acquire_write(self.store.as_ref(), user)
            .await?;
        let (mut prefs, damaged) = self.load(user).await?;
        if edit(&mut prefs)? {
            prefs.updated_at = Some(now_timestamp());
            self.save(user, &prefs, damaged.as_deref()).await?;
        }
        Ok(prefs)
    }

    /// The stored preferences, plus the raw body if it could not be decoded.
    async fn load(&self, user: &UserId) -> Result<(UserPreferences, Option<String>)> {
        let key = DocumentKey::preferences(user);
        let body = self.store.get(&key).await.map_err(|e| {
            error!(key = %key, error = %format!("{e:#}"), "failed to read preferences");
            Error::storage(e)
        })?;

        let Some(body) = body else {
            return Ok((UserPreferences::default(), None));
        };

        match serde_json::from_str(&body) {
            Ok(prefs) => Ok((prefs, None)),
            Err(e) => {
                warn!(key = %key, error = %e, "unreadable preferences document, using defaults");
                Ok((UserPreferences::default(), Some(body)))
            }
        }
    }

    async fn save(
        &self,
        user: &UserId,
        prefs: &UserPreferences,
        damaged: Option<&str>,
    ) -> Result<()> {
        let key = DocumentKey::preferences(user);
        let body = serde_json::to_string_pretty(prefs)
            .map_err(|e| Error::StorageUnavailable(format!("encode {key}: {e}")))?;

        if let Some(raw) = damaged {
            let kept = self.store.quarantine(&key, raw).await.map_err(|e| {
                error!(
                    key = %key,
                    error = %format!("{e:#}"),
                    "failed to keep unreadable preferences"
                );
                Error::storage(e)
            })?;
            warn!(key = %key, kept = %kept, "unreadable preferences kept before rewrite");
        }

        self.store.put(&key, &body).await.map_err(|e| {
            error!(key = %key, error = %format!("{e:#}"), "failed to write preferences");
            Error::storage(e)
        })?;
        debug!(key = %key, "preferences written");
        Ok(())
    }
}

fn apply_industry(prefs: &mut UserPreferences, raw: &str) {
    let industry = catalog::resolve(raw);
    if catalog::find(raw).is_none() {
        info!(requested = raw, fallback = industry.id, "unknown industry id");
    }
    prefs.industry = Some(industry.id.to_string());
    prefs.suggested_tags = industry
        .default_tags
        .iter()
        .map(|t| t.to_string())
        .collect();
}

fn normalize_tag_set(tags: &[String]) -> Result<Vec<String>> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = normalize_tag(tag)
            .ok_or_else(|| Error::InvalidInput("tag must not be empty".into()))?;
        if !out.contains(&tag) {
            out.push(tag);
        }
    }
    Ok(out)
}
