//! Per-user write serialization.
//!
//! Every read-modify-write of a user's documents runs while holding a
//! [`WriteGuard`]: that user's in-process mutex, then the backend's
//! [`Store::lock`] on the user's namespace. Concurrent writers for one user
//! queue up instead of losing updates, whether they share a process or not.
//! Different users never share a lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::error;

use crate::error::{Error, Result};
use crate::models::UserId;
use crate::store::{Namespace, NamespaceLock, Store};

/// Held for the whole of one read-modify-write.
///
/// Fields drop in order, so the backend lock is released before the
/// in-process mutex lets the next local writer in.
pub struct WriteGuard {
    _backend: NamespaceLock,
    _local: OwnedMutexGuard<()>,
}

/// Registry of one async mutex per user.
#[derive(Default)]
pub struct UserLocks {
    locks: Mutex<HashMap<UserId, Arc<AsyncMutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive write access to `user`'s documents.
    pub async fn acquire(&self, user: &UserId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Drop idle entries; a count of 1 means only the map holds it.
            locks.retain(|id, lock| id == user || Arc::strong_count(lock) > 1);
            locks.entry(user.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Take `user`'s mutex, then the backend's lock on their namespace.
    ///
    /// Local writers queue on the mutex first, so at most one task per user
    /// waits on the backend.
    pub async fn acquire_write(&self, store: &dyn Store, user: &UserId) -> Result<WriteGuard> {
        let local = self.acquire(user).await;
        let namespace = Namespace::from(user);
        let backend = store.lock(&namespace).await.map_err(|e| {
            error!(
                namespace = %namespace.as_key(),
                error = %format!("{e:#}"),
                "failed to lock namespace"
            );
            Error::storage(e)
        })?;
        Ok(WriteGuard {
            _backend: backend,
            _local: local,
        })
    }

    /// Number of users with a live mutex.
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
