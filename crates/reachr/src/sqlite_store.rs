//! SQLite-backed [`Store`] implementation.
//!
//! Each document is one row of the `documents` table keyed by
//! `(namespace, kind)`. A `put` is a single upsert statement, so readers
//! see either the old body or the new one. Unreadable bodies are copied
//! into the `quarantine` table.
//!
//! SQLite serializes statements, not read-modify-write cycles, so writers
//! in different processes also take a per-namespace lock file in
//! `lock_dir` (by default `reachr.locks/` next to the database).

use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use tracing::warn;

use reachr_core::store::{DocumentKey, DocumentKind, Namespace, NamespaceLock, Store};

use crate::file_lock;

/// SQLite implementation of the [`Store`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
    lock_dir: PathBuf,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool, lock_dir: impl Into<PathBuf>) -> Self {
        Self {
            pool,
            lock_dir: lock_dir.into(),
        }
    }

    /// Lock directory conventionally used for the database at `db_path`.
    pub fn default_lock_dir(db_path: &Path) -> PathBuf {
        db_path.with_extension("locks")
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn lock_path(&self, namespace: &Namespace) -> PathBuf {
        match namespace {
            Namespace::Shared => self.lock_dir.join("shared.lock"),
            Namespace::User(id) => self.lock_dir.join(format!("user-{id}.lock")),
        }
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn get(&self, key: &DocumentKey) -> Result<Option<String>> {
        let row = sqlx::query("SELECT body FROM documents WHERE namespace = ? AND kind = ?")
            .bind(key.namespace.as_key())
            .bind(key.kind.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.get::<String, _>("body")))
    }

    async fn put(&self, key: &DocumentKey, body: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (namespace, kind, body, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(namespace, kind) DO UPDATE SET
                body = excluded.body,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key.namespace.as_key())
        .bind(key.kind.as_str())
        .bind(body)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, key: &DocumentKey) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE namespace = ? AND kind = ?")
            .bind(key.namespace.as_key())
            .bind(key.kind.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, kind: DocumentKind) -> Result<Vec<DocumentKey>> {
        let rows = sqlx::query("SELECT namespace FROM documents WHERE kind = ?")
            .bind(kind.as_str())
            .fetch_all(&self.pool)
            .await?;

        let mut keys = Vec::with_capacity(rows.len());
        for row in rows {
            let raw: String = row.get("namespace");
            match Namespace::from_key(&raw) {
                Some(namespace) => keys.push(DocumentKey { namespace, kind }),
                None => warn!(namespace = %raw, "skipping row with unknown namespace"),
            }
        }
        keys.sort();
        Ok(keys)
    }

    async fn lock(&self, namespace: &Namespace) -> Result<NamespaceLock> {
        file_lock::lock_exclusive(self.lock_path(namespace)).await
    }

    async fn quarantine(&self, key: &DocumentKey, body: &str) -> Result<String> {
        let result = sqlx::query(
            "INSERT INTO quarantine (namespace, kind, body, quarantined_at) VALUES (?, ?, ?, ?)",
        )
        .bind(key.namespace.as_key())
        .bind(key.kind.as_str())
        .bind(body)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await?;

        Ok(format!("quarantine row {}", result.last_insert_rowid()))
    }
}
