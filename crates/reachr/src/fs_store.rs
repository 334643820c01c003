//! File-backed [`Store`] implementation.
//!
//! ```text
//! {root}/contacts.json                 shared (legacy) contacts
//! {root}/preferences.json              shared preferences
//! {root}/users/{U}/contacts.json
//! {root}/users/{U}/preferences.json
//! {root}/users/{U}/.lock               held by whichever process is writing
//! {root}/users/{U}/contacts.json.corrupt-{timestamp}
//! ```
//!
//! Writes go to a temp file in the target directory and are renamed over
//! the target, so a reader sees either the previous body or the new one.
//! Unreadable documents are copied next to the original before they are
//! replaced. The shared namespace locks `{root}/.lock`.
//! Blocking filesystem calls run on tokio's blocking pool.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::task;

use reachr_core::models::UserId;
use reachr_core::store::{DocumentKey, DocumentKind, Namespace, NamespaceLock, Store};

use crate::file_lock;

const LOCK_FILE: &str = ".lock";

pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root and `users/` directories.
    pub async fn prepare(&self) -> Result<()> {
        let users = self.root.join("users");
        tokio::fs::create_dir_all(&users)
            .await
            .with_context(|| format!("Failed to create {}", users.display()))
    }

    /// Path of the file backing `key`.
    pub fn path_for(&self, key: &DocumentKey) -> PathBuf {
        let file = format!("{}.json", key.kind.as_str());
        match &key.namespace {
            Namespace::Shared => self.root.join(file),
            Namespace::User(id) => self.root.join("users").join(id).join(file),
        }
    }

    /// Lock file guarding every document in `namespace`.
    pub fn lock_path(&self, namespace: &Namespace) -> PathBuf {
        match namespace {
            Namespace::Shared => self.root.join(LOCK_FILE),
            Namespace::User(id) => self.root.join("users").join(id).join(LOCK_FILE),
        }
    }
}

#[async_trait]
impl Store for FsStore {
    async fn get(&self, key: &DocumentKey) -> Result<Option<String>> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(body) => Ok(Some(body)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    async fn put(&self, key: &DocumentKey, body: &str) -> Result<()> {
        let path = self.path_for(key);
        let body = body.to_owned();
        task::spawn_blocking(move || atomic_write(&path, body.as_bytes()))
            .await
            .context("write task panicked")?
    }

    async fn delete(&self, key: &DocumentKey) -> Result<bool> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }

    async fn list(&self, kind: DocumentKind) -> Result<Vec<DocumentKey>> {
        let root = self.root.clone();
        task::spawn_blocking(move || scan(&root, kind))
            .await
            .context("scan task panicked")?
    }

    async fn lock(&self, namespace: &Namespace) -> Result<NamespaceLock> {
        file_lock::lock_exclusive(self.lock_path(namespace)).await
    }

    async fn quarantine(&self, key: &DocumentKey, body: &str) -> Result<String> {
        let original = self.path_for(key);
        let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%3fZ");
        let mut name = original.file_name().unwrap_or_default().to_os_string();
        name.push(format!(".corrupt-{stamp}"));
        let target = original.with_file_name(name);

        let body = body.to_owned();
        let dest = target.clone();
        task::spawn_blocking(move || atomic_write(&dest, body.as_bytes()))
            .await
            .context("write task panicked")??;
        Ok(target.display().to_string())
    }
}

fn atomic_write(target: &Path, data: &[u8]) -> Result<()> {
    let parent = target.parent().context("Target path has no parent")?;
    std::fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create {}", parent.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temp file in {}", parent.display()))?;
    tmp.write_all(data).context("Failed to write temp file")?;
    tmp.as_file().sync_all().context("Failed to sync temp file")?;

    tmp.persist(target)
        .with_context(|| format!("Failed to persist to {}", target.display()))?;
    Ok(())
}

fn scan(root: &Path, kind: DocumentKind) -> Result<Vec<DocumentKey>> {
    let file = format!("{}.json", kind.as_str());
    let mut keys = Vec::new();

    if root.join(&file).is_file() {
        keys.push(DocumentKey {
            namespace: Namespace::Shared,
            kind,
        });
    }

    let users = root.join("users");
    let entries = match std::fs::read_dir(&users) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(keys),
        Err(e) => return Err(e).with_context(|| format!("Failed to list {}", users.display())),
    };

    let mut ids = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to list {}", users.display()))?;
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        // Directories that could not have been created from a valid id.
        match UserId::parse(&name) {
            Ok(UserId::Account(id)) if entry.path().join(&file).is_file() => ids.push(id),
            _ => {}
        }
    }
    ids.sort();

    keys.extend(ids.into_iter().map(|id| DocumentKey {
        namespace: Namespace::User(id),
        kind,
    }));
    Ok(keys)
}
