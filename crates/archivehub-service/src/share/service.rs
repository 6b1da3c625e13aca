//! Grant, update, and revoke per-employee access with subtree propagation.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use archivehub_core::error::AppError;
use archivehub_core::path;
use archivehub_core::traits::Clock;
use archivehub_database::{ArchiveStore, ArchiveTransaction, WriteBatch};
use archivehub_entity::entry::Entry;
use archivehub_entity::permission::{EntryOperation, EntryPermission};

use super::request::ShareRequest;
use crate::access::AccessEvaluator;
use crate::context::RequestContext;
use crate::entry::fetch_entry;
use crate::lock;

/// An entry shared with the caller, paired with the grant at its root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedEntry {
    /// The shared entry.
    pub entry: Entry,
    /// The caller's shared-root permission on it.
    pub permission: EntryPermission,
}

/// Manages sharing of entries between employees.
#[derive(Clone)]
pub struct ShareService {
    /// Entry store.
    store: Arc<dyn ArchiveStore>,
    /// Ownership and delegated-right checks.
    access: Arc<AccessEvaluator>,
    /// Time source for expiry checks.
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ShareService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShareService").finish()
    }
}

impl ShareService {
    /// Creates a new share service.
    pub fn new(
        store: Arc<dyn ArchiveStore>,
        access: Arc<AccessEvaluator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            access,
            clock,
        }
    }

    /// Grants, updates, or revokes one employee's access to an entry.
    ///
    /// For a directory the same operation set and expiry are written to
    /// every descendant with the same owner. Returns the permission now
    /// held on the entry itself, or `None` after a revoke.
    pub async fn share(
        &self,
        ctx: &RequestContext,
        entry_id: Uuid,
        req: ShareRequest,
    ) -> Result<Option<EntryPermission>, AppError> {
        let (mut tx, entry) =
            lock::lock_entry(self.store.as_ref(), entry_id, |e| vec![e.canonical_path()]).await?;

        let target = tx
            .find_employee(req.employee_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Employee {} not found", req.employee_id)))?;

        self.access
            .require_within(tx.as_mut(), ctx, &entry, EntryOperation::Edit)
            .await?;

        if entry.is_owned_by(target.id) {
            return Err(AppError::conflict("The owner's rights cannot be modified"));
        }
        if target.id == ctx.employee_id {
            return Err(AppError::conflict("You cannot modify your own permission"));
        }
        let now = self.clock.now();
        if !req.is_revoke() && req.expiry.is_some_and(|expiry| expiry <= now) {
            return Err(AppError::conflict("Expiry must be in the future"));
        }
        if entry.old_path.is_some() {
            return Err(AppError::conflict("Entries in the bin cannot be shared"));
        }

        let mut members = vec![entry.clone()];
        if entry.is_directory() {
            members.extend(
                tx.find_subtree(&entry.canonical_path())
                    .await?
                    .into_iter()
                    .filter(|d| d.owner_id == entry.owner_id),
            );
        }
        debug!(
            entry_id = %entry.id,
            members = members.len(),
            "Propagating share across subtree"
        );

        let member_ids: Vec<Uuid> = members.iter().map(|m| m.id).collect();
        let existing: HashMap<Uuid, EntryPermission> = tx
            .permissions_for_entries(&member_ids)
            .await?
            .into_iter()
            .filter(|p| p.employee_id == target.id)
            .map(|p| (p.entry_id, p))
            .collect();

        let mut batch = WriteBatch::new();

        if req.is_revoke() {
            if existing.is_empty() {
                return Err(AppError::not_changed(format!(
                    "'{}' has no access to '{}'",
                    target.username, entry.name
                )));
            }
            for entry_id in existing.keys() {
                batch.delete_permission(*entry_id, target.id);
            }
            tx.commit(batch).await?;

            info!(
                employee_id = %ctx.employee_id,
                entry_id = %entry.id,
                target_id = %target.id,
                revoked = existing.len(),
                "Share revoked"
            );
            return Ok(None);
        }

        let is_shared_root = match existing.get(&entry.id) {
            Some(current) => current.is_shared_root,
            None => !holds_ancestor_permission(tx.as_mut(), &entry, target.id).await?,
        };
        let operations = req.operations();

        let mut root_permission = None;
        for member in &members {
            let is_root = member.id == entry.id;
            let permission = EntryPermission {
                entry_id: member.id,
                employee_id: target.id,
                allowed_operations: operations.clone(),
                expiry_date_time: req.expiry,
                is_shared_root: is_root && is_shared_root,
                granted_by: ctx.employee_id,
                created_at: existing.get(&member.id).map_or(now, |p| p.created_at),
            };
            if is_root {
                root_permission = Some(permission.clone());
            }
            batch.upsert_permission(permission);
        }
        tx.commit(batch).await?;

        info!(
            employee_id = %ctx.employee_id,
            entry_id = %entry.id,
            target_id = %target.id,
            operations = %operations,
            shared_root = is_shared_root,
            propagated = members.len() - 1,
            "Share granted"
        );

        Ok(root_permission)
    }

    /// Lists every permission row on an entry.
    ///
    /// Visible to the owner and to holders of `ChangePermission` or `Edit`.
    pub async fn list_permissions(
        &self,
        ctx: &RequestContext,
        entry_id: Uuid,
    ) -> Result<Vec<EntryPermission>, AppError> {
        let entry = fetch_entry(self.store.as_ref(), entry_id).await?;

        let allowed = self
            .access
            .can_perform(&entry, ctx.employee_id, EntryOperation::ChangePermission)
            .await?
            || self
                .access
                .can_perform(&entry, ctx.employee_id, EntryOperation::Edit)
                .await?;
        if !allowed {
            warn!(
                employee_id = %ctx.employee_id,
                entry_id = %entry.id,
                "Permission listing denied"
            );
            return Err(AppError::authorization(format!(
                "Cannot inspect permissions of '{}'",
                entry.name
            )));
        }

        self.store.permissions_for_entry(entry.id).await
    }

    /// Lists the entries explicitly shared with the caller whose grant is
    /// still live.
    pub async fn shared_with_me(&self, ctx: &RequestContext) -> Result<Vec<SharedEntry>, AppError> {
        let now = self.clock.now();
        let roots: Vec<EntryPermission> = self
            .store
            .permissions_for_employee(ctx.employee_id)
            .await?
            .into_iter()
            .filter(|p| p.is_shared_root && !p.is_expired_at(now))
            .collect();

        let mut shared = Vec::with_capacity(roots.len());
        for permission in roots {
            if let Some(entry) = self.store.find_entry(permission.entry_id).await? {
                shared.push(SharedEntry { entry, permission });
            }
        }
        Ok(shared)
    }
}

/// Whether `employee_id` already holds a row on an ancestor of `entry` that
/// belongs to the same owner.
async fn holds_ancestor_permission(
    tx: &mut dyn ArchiveTransaction,
    entry: &Entry,
    employee_id: Uuid,
) -> Result<bool, AppError> {
    for (parent_path, name) in path::ancestors(&entry.path) {
        let Some(ancestor) = tx.find_entry_by_name(&parent_path, &name).await? else {
            continue;
        };
        if ancestor.owner_id != entry.owner_id {
            continue;
        }
        if tx.find_permission(ancestor.id, employee_id).await?.is_some() {
            return Ok(true);
        }
    }
    Ok(false)
}
