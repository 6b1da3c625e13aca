//! Bin operations: soft delete with path rewriting, restore, and purge.
//!
//! Each owner has a synthetic top-level namespace `{username}_bin`. Moving
//! an entry there records its original parent path in `old_path` and keeps
//! the structure of a binned directory intact below the bin root, so
//! `/docs/report.pdf` becomes `alice_bin/docs/report.pdf`.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use archivehub_core::config::ArchiveConfig;
use archivehub_core::error::AppError;
use archivehub_core::path;
use archivehub_core::traits::Clock;
use archivehub_database::{ArchiveStore, ArchiveTransaction, WriteBatch};
use archivehub_entity::entry::Entry;

use crate::access::AccessEvaluator;
use crate::context::RequestContext;
use crate::lock;

/// Moves entries into and out of their owner's bin.
#[derive(Clone)]
pub struct BinService {
    store: Arc<dyn ArchiveStore>,
    access: Arc<AccessEvaluator>,
    clock: Arc<dyn Clock>,
    config: ArchiveConfig,
}

impl std::fmt::Debug for BinService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinService").finish()
    }
}

impl BinService {
    /// Creates a new bin service.
    pub fn new(
        store: Arc<dyn ArchiveStore>,
        access: Arc<AccessEvaluator>,
        clock: Arc<dyn Clock>,
        config: ArchiveConfig,
    ) -> Self {
        Self {
            store,
            access,
            clock,
            config,
        }
    }

    /// The bin namespace of the calling employee.
    pub fn bin_root(&self, ctx: &RequestContext) -> String {
        path::bin_root(&ctx.username, &self.config.bin_suffix)
    }

    /// Moves an entry and its subtree into the owner's bin, severing every
    /// share on the moved rows.
    pub async fn move_to_bin(&self, ctx: &RequestContext, entry_id: Uuid) -> Result<Entry, AppError> {
        let bin_root = self.bin_root(ctx);
        let (mut tx, mut entry) = lock::lock_entry(self.store.as_ref(), entry_id, |e| {
            vec![e.canonical_path(), bin_root.clone()]
        })
        .await?;

        self.access.require_owner(ctx, &entry)?;
        if entry.old_path.is_some() || path::is_in_bin(&entry.path, &bin_root) {
            return Err(AppError::not_changed(format!(
                "Entry '{}' is already in the bin",
                entry.name
            )));
        }
        if tx.find_entry_by_name(&bin_root, &entry.name).await?.is_some() {
            return Err(AppError::conflict(format!(
                "The bin already holds an entry named '{}'",
                entry.name
            )));
        }

        let canonical = entry.canonical_path();
        let binned_canonical = path::child_path(&bin_root, &entry.name);
        let mut batch = WriteBatch::new();

        let subtree = if entry.is_directory() {
            tx.find_subtree(&canonical).await?
        } else {
            Vec::new()
        };
        debug!(
            entry_id = %entry.id,
            descendants = subtree.len(),
            "Moving subtree to bin"
        );
        for mut descendant in subtree {
            let Some(rebased) = path::rebase_path(&descendant.path, &canonical, &binned_canonical)
            else {
                continue;
            };
            batch.delete_entry_permissions(descendant.id);
            descendant.old_path = Some(std::mem::replace(&mut descendant.path, rebased));
            batch.update_entry(descendant);
        }

        batch.delete_entry_permissions(entry.id);
        entry.old_path = Some(std::mem::replace(&mut entry.path, bin_root.clone()));
        entry.touch(ctx.employee_id, self.clock.now());
        batch.update_entry(entry.clone());

        tx.commit(batch).await?;

        info!(
            employee_id = %ctx.employee_id,
            entry_id = %entry.id,
            from = %canonical,
            to = %binned_canonical,
            "Entry moved to bin"
        );

        Ok(entry)
    }

    /// Restores a binned entry to its original location, recreating any
    /// missing ancestor directories. Shares removed by the bin are not
    /// restored.
    pub async fn restore_from_bin(
        &self,
        ctx: &RequestContext,
        entry_id: Uuid,
    ) -> Result<Entry, AppError> {
        let bin_root = self.bin_root(ctx);
        let (mut tx, mut entry) = lock::lock_entry(self.store.as_ref(), entry_id, |e| {
            let mut paths = vec![e.canonical_path()];
            if let Some(old_path) = &e.old_path {
                paths.push(path::child_path(old_path, &e.name));
            }
            paths
        })
        .await?;

        let target_parent = match &entry.old_path {
            Some(old_path) if path::is_in_bin(&entry.path, &bin_root) => old_path.clone(),
            _ => {
                return Err(AppError::not_changed(format!(
                    "Entry '{}' is not in your bin",
                    entry.name
                )));
            }
        };
        self.access.require_owner(ctx, &entry)?;

        if tx
            .find_entry_by_name(&target_parent, &entry.name)
            .await?
            .is_some()
        {
            return Err(AppError::conflict(format!(
                "An entry named '{}' already exists in '{target_parent}'",
                entry.name
            )));
        }

        let now = self.clock.now();
        let mut batch = WriteBatch::new();

        let mut recreated = 0usize;
        for (parent_path, name) in path::ancestors(&target_parent) {
            match tx.find_entry_by_name(&parent_path, &name).await? {
                Some(existing) if existing.is_directory() => {}
                Some(_) => {
                    return Err(AppError::conflict(format!(
                        "Cannot restore into '{target_parent}': '{}' is a file",
                        path::child_path(&parent_path, &name)
                    )));
                }
                None => {
                    batch.insert_entry(Entry::directory(
                        parent_path,
                        name,
                        ctx.employee_id,
                        ctx.employee_id,
                        now,
                    ));
                    recreated += 1;
                }
            }
        }

        let binned_canonical = entry.canonical_path();
        let restored_canonical = path::child_path(&target_parent, &entry.name);
        let subtree = if entry.is_directory() {
            tx.find_subtree(&binned_canonical).await?
        } else {
            Vec::new()
        };
        debug!(
            entry_id = %entry.id,
            descendants = subtree.len(),
            recreated_ancestors = recreated,
            "Restoring subtree from bin"
        );
        for mut descendant in subtree {
            if let Some(rebased) =
                path::rebase_path(&descendant.path, &binned_canonical, &restored_canonical)
            {
                descendant.path = rebased;
                descendant.old_path = None;
                batch.update_entry(descendant);
            }
        }

        entry.path = target_parent;
        entry.old_path = None;
        entry.touch(ctx.employee_id, now);
        batch.update_entry(entry.clone());

        tx.commit(batch).await?;

        info!(
            employee_id = %ctx.employee_id,
            entry_id = %entry.id,
            to = %restored_canonical,
            recreated_ancestors = recreated,
            "Entry restored from bin"
        );

        Ok(entry)
    }

    /// Permanently deletes a binned entry with its subtree, payloads, and
    /// permissions. Returns the number of entries removed.
    pub async fn delete_from_bin(
        &self,
        ctx: &RequestContext,
        entry_id: Uuid,
    ) -> Result<usize, AppError> {
        let bin_root = self.bin_root(ctx);
        let (mut tx, entry) =
            lock::lock_entry(self.store.as_ref(), entry_id, |e| vec![e.canonical_path()]).await?;

        if !path::is_in_bin(&entry.path, &bin_root) {
            return Err(AppError::not_changed(format!(
                "Entry '{}' is not in your bin",
                entry.name
            )));
        }
        self.access.require_owner(ctx, &entry)?;

        let mut doomed = if entry.is_directory() {
            tx.find_subtree(&entry.canonical_path()).await?
        } else {
            Vec::new()
        };
        doomed.push(entry.clone());
        let removed = purge(tx, doomed).await?;

        info!(
            employee_id = %ctx.employee_id,
            entry_id = %entry.id,
            removed,
            "Entry deleted from bin"
        );

        Ok(removed)
    }

    /// Permanently deletes everything in the caller's bin. Returns the
    /// number of entries removed.
    pub async fn empty_bin(&self, ctx: &RequestContext) -> Result<usize, AppError> {
        let bin_root = self.bin_root(ctx);
        let mut tx = lock::lock_paths(self.store.as_ref(), [bin_root.as_str()]).await?;

        let doomed: Vec<Entry> = tx
            .find_subtree(&bin_root)
            .await?
            .into_iter()
            .filter(|e| e.is_owned_by(ctx.employee_id))
            .collect();
        let removed = purge(tx, doomed).await?;

        info!(
            employee_id = %ctx.employee_id,
            bin = %bin_root,
            removed,
            "Bin emptied"
        );

        Ok(removed)
    }

    /// Lists the top-level entries of the caller's bin.
    pub async fn list_bin(&self, ctx: &RequestContext) -> Result<Vec<Entry>, AppError> {
        self.store.list_children(&self.bin_root(ctx)).await
    }
}

/// Delete `doomed` with their permissions and payloads, committing through
/// `tx`. Returns the number of entries removed.
async fn purge(tx: Box<dyn ArchiveTransaction>, doomed: Vec<Entry>) -> Result<usize, AppError> {
    let removed = doomed.len();
    let mut batch = WriteBatch::new();
    let mut files = Vec::new();
    for entry in doomed {
        batch.delete_entry_permissions(entry.id).delete_entry(entry.id);
        files.extend(entry.file_id);
    }
    for file_id in files {
        batch.delete_file(file_id);
    }
    tx.commit(batch).await?;
    Ok(removed)
}
