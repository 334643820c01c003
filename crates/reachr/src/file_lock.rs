//! Advisory file locks that exclude writers in other processes.
//!
//! Both backends put one lock file per namespace somewhere under their data
//! location and hold it with [`fd_lock`] for the length of a write. The
//! `fd_lock` guard borrows its lock, so the pair lives on a blocking-pool
//! thread and the caller gets back a [`NamespaceLock`] that wakes that
//! thread when dropped.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tokio::sync::oneshot;
use tokio::task;

use reachr_core::store::NamespaceLock;

/// Wait for an exclusive lock on `path`, creating the file and its parent
/// directory if needed.
pub async fn lock_exclusive(path: PathBuf) -> Result<NamespaceLock> {
    let (acquired_tx, acquired_rx) = oneshot::channel::<Result<()>>();
    let (release_tx, release_rx) = oneshot::channel::<()>();

    task::spawn_blocking(move || {
        let file = match open_lock_file(&path) {
            Ok(file) => file,
            Err(e) => {
                let _ = acquired_tx.send(Err(e));
                return;
            }
        };
        let mut lock = fd_lock::RwLock::new(file);
        let _guard = match lock.write() {
            Ok(guard) => guard,
            Err(e) => {
                let _ = acquired_tx.send(Err(anyhow!("Failed to lock {}: {e}", path.display())));
                return;
            }
        };
        // The waiting caller was cancelled.
        if acquired_tx.send(Ok(())).is_err() {
            return;
        }
        let _ = release_rx.blocking_recv();
    });

    acquired_rx
        .await
        .context("lock task ended before acquiring")??;
    Ok(NamespaceLock::new(release_tx))
}

fn open_lock_file(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)
        .with_context(|| format!("Failed to open lock file {}", path.display()))
}
