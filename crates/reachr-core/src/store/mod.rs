//! Storage abstraction for Reachr.
//!
//! The [`Store`] trait moves opaque JSON documents addressed by a
//! [`DocumentKey`] (namespace + kind). The Record and Preference stores
//! own encoding, validation and locking; backends only need atomic
//! whole-document writes so readers never see a torn document.
//!
//! Writers from different processes are kept apart by [`Store::lock`];
//! damaged bodies are set aside with [`Store::quarantine`] before anything
//! overwrites them.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use std::fmt;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::UserId;

/// Which collection a document belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    /// The pre-authentication collection, also used by anonymous callers.
    Shared,
    User(String),
}

impl From<&UserId> for Namespace {
    fn from(user: &UserId) -> Self {
        match user {
            UserId::Anonymous => Namespace::Shared,
            UserId::Account(id) => Namespace::User(id.clone()),
        }
    }
}

impl Namespace {
    /// Stable string form, used as the SQLite key.
    pub fn as_key(&self) -> String {
        match self {
            Namespace::Shared => "shared".to_string(),
            Namespace::User(id) => format!("user:{id}"),
        }
    }

    /// Inverse of [`Namespace::as_key`].
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "shared" => Some(Namespace::Shared),
            _ => key
                .strip_prefix("user:")
                .map(|id| Namespace::User(id.to_string())),
        }
    }
}

/// The two persisted document types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DocumentKind {
    Contacts,
    Preferences,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::Contacts => "contacts",
            DocumentKind::Preferences => "preferences",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "contacts" => Some(DocumentKind::Contacts),
            "preferences" => Some(DocumentKind::Preferences),
            _ => None,
        }
    }
}

/// Address of one document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentKey {
    pub namespace: Namespace,
    pub kind: DocumentKind,
}

impl DocumentKey {
    pub fn new(user: &UserId, kind: DocumentKind) -> Self {
        Self {
            namespace: Namespace::from(user),
            kind,
        }
    }

    pub fn contacts(user: &UserId) -> Self {
        Self::new(user, DocumentKind::Contacts)
    }

    pub fn preferences(user: &UserId) -> Self {
        Self::new(user, DocumentKind::Preferences)
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace.as_key(), self.kind.as_str())
    }
}

/// Exclusive hold on one namespace. Dropping it releases the hold.
pub struct NamespaceLock {
    _held: Option<Box<dyn Send + Sync>>,
}

impl NamespaceLock {
    /// Wrap whatever keeps the backend's lock alive.
    pub fn new(held: impl Send + Sync + 'static) -> Self {
        Self {
            _held: Some(Box::new(held)),
        }
    }

    /// A lock that holds nothing, for backends only one process can reach.
    pub fn unshared() -> Self {
        Self { _held: None }
    }
}

/// Abstract document backend.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`get`](Store::get) | Read a document, `None` if it was never written |
/// | [`put`](Store::put) | Atomically replace a document |
/// | [`delete`](Store::delete) | Remove a document, `true` if one existed |
/// | [`list`](Store::list) | Keys of every document of one kind |
/// | [`lock`](Store::lock) | Exclude other processes from a namespace |
/// | [`quarantine`](Store::quarantine) | Keep a copy of an unreadable body |
#[async_trait]
pub trait Store: Send + Sync {
    async fn get(&self, key: &DocumentKey) -> Result<Option<String>>;

    /// Replace the whole document. A reader must see either the old or the
    /// new body, never a mix.
    async fn put(&self, key: &DocumentKey, body: &str) -> Result<()>;

    async fn delete(&self, key: &DocumentKey) -> Result<bool>;

    /// Shared namespace first, then users ordered by id.
    async fn list(&self, kind: DocumentKind) -> Result<Vec<DocumentKey>>;

    /// Wait until no other process holds `namespace`, then hold it until
    /// the returned guard is dropped.
    ///
    /// Backends that cannot be shared between processes may rely on the
    /// in-process [`UserLocks`](crate::locks::UserLocks) alone.
    async fn lock(&self, namespace: &Namespace) -> Result<NamespaceLock> {
        let _ = namespace;
        Ok(NamespaceLock::unshared())
    }

    /// Store `body` somewhere `put` on `key` will not overwrite it.
    /// Returns a description of where it went, for the log.
    async fn quarantine(&self, key: &DocumentKey, body: &str) -> Result<String>;
}
