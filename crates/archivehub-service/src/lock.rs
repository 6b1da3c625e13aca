//! Per-root subtree locking through store transactions.
//!
//! Structural operations read a subtree and then rewrite it. Two such
//! operations on overlapping trees must not interleave, so every operation
//! opens a transaction holding the lock for each top-level segment it
//! touches, reads through that transaction, and commits through it. The
//! store enforces the locks, so the exclusion holds across processes.

use tracing::trace;
use uuid::Uuid;

use archivehub_core::error::AppError;
use archivehub_core::path;
use archivehub_database::{ArchiveStore, ArchiveTransaction};
use archivehub_entity::entry::Entry;

use crate::entry::fetch_entry;

/// Open a transaction locking the trees an operation on `entry_id`
/// touches, and return the entry as read inside it.
///
/// `paths` maps the entry to every path the operation will touch. If the
/// entry moved between the unlocked read and lock acquisition the keys no
/// longer match; the transaction is rolled back and opened again.
pub(crate) async fn lock_entry<F>(
    store: &dyn ArchiveStore,
    entry_id: Uuid,
    paths: F,
) -> Result<(Box<dyn ArchiveTransaction>, Entry), AppError>
where
    F: Fn(&Entry) -> Vec<String>,
{
    let mut entry = fetch_entry(store, entry_id).await?;
    loop {
        let keys = lock_keys(paths(&entry));
        let mut tx = store.begin(&keys).await?;
        let current = tx
            .find_entry(entry_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Entry {entry_id} not found")))?;
        if lock_keys(paths(&current)) == keys {
            return Ok((tx, current));
        }
        tx.rollback().await?;
        trace!(entry_id = %entry_id, "Entry moved while locking; retrying");
        entry = current;
    }
}

/// Open a transaction holding the locks covering every path in `paths`.
pub(crate) async fn lock_paths<I, S>(
    store: &dyn ArchiveStore,
    paths: I,
) -> Result<Box<dyn ArchiveTransaction>, AppError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    store.begin(&lock_keys(paths)).await
}

/// Sorted, deduplicated lock keys for `paths`.
pub(crate) fn lock_keys<I, S>(paths: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut keys: Vec<String> = paths
        .into_iter()
        .map(|p| path::root_segment(p.as_ref()).to_string())
        .collect();
    keys.sort();
    keys.dedup();
    keys
}
