//! The access evaluator.
//!
//! An employee may perform an operation on an entry when they own it, or
//! when their permission row on that exact entry is unexpired and lists
//! the operation. There is no walk up the tree: propagation writes
//! explicit rows on descendants at share time.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use archivehub_core::error::AppError;
use archivehub_core::traits::Clock;
use archivehub_database::{ArchiveStore, ArchiveTransaction};
use archivehub_entity::entry::Entry;
use archivehub_entity::permission::{EntryOperation, EntryPermission};

use crate::context::RequestContext;

/// Decide whether `employee_id` may perform `op` on `entry` given their
/// permission row (if any) at instant `now`.
pub fn evaluate(
    entry: &Entry,
    employee_id: Uuid,
    permission: Option<&EntryPermission>,
    op: EntryOperation,
    now: DateTime<Utc>,
) -> bool {
    if entry.is_owned_by(employee_id) {
        return true;
    }
    permission.is_some_and(|p| {
        p.entry_id == entry.id && p.employee_id == employee_id && p.allows_at(op, now)
    })
}

/// Evaluates ownership and delegated rights against the store.
#[derive(Clone)]
pub struct AccessEvaluator {
    store: Arc<dyn ArchiveStore>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for AccessEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessEvaluator").finish()
    }
}

impl AccessEvaluator {
    /// Creates a new access evaluator.
    pub fn new(store: Arc<dyn ArchiveStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Whether `employee_id` may perform `op` on `entry` right now.
    pub async fn can_perform(
        &self,
        entry: &Entry,
        employee_id: Uuid,
        op: EntryOperation,
    ) -> Result<bool, AppError> {
        if entry.is_owned_by(employee_id) {
            return Ok(true);
        }
        let permission = self.store.find_permission(entry.id, employee_id).await?;
        Ok(evaluate(
            entry,
            employee_id,
            permission.as_ref(),
            op,
            self.clock.now(),
        ))
    }

    /// Same as [`can_perform`](Self::can_perform), looking the entry up by ID.
    pub async fn can_perform_by_id(
        &self,
        entry_id: Uuid,
        employee_id: Uuid,
        op: EntryOperation,
    ) -> Result<bool, AppError> {
        let entry = self
            .store
            .find_entry(entry_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Entry {entry_id} not found")))?;
        self.can_perform(&entry, employee_id, op).await
    }

    /// Require that the caller may perform `op` on `entry`.
    ///
    /// Returns the permission row that granted access, or `None` when the
    /// caller is the owner.
    pub async fn require(
        &self,
        ctx: &RequestContext,
        entry: &Entry,
        op: EntryOperation,
    ) -> Result<Option<EntryPermission>, AppError> {
        if entry.is_owned_by(ctx.employee_id) {
            return Ok(None);
        }
        let permission = self.store.find_permission(entry.id, ctx.employee_id).await?;
        self.check(ctx, entry, op, permission)
    }

    /// Same as [`require`](Self::require), reading the permission row
    /// inside `tx`.
    pub async fn require_within(
        &self,
        tx: &mut dyn ArchiveTransaction,
        ctx: &RequestContext,
        entry: &Entry,
        op: EntryOperation,
    ) -> Result<Option<EntryPermission>, AppError> {
        if entry.is_owned_by(ctx.employee_id) {
            return Ok(None);
        }
        let permission = tx.find_permission(entry.id, ctx.employee_id).await?;
        self.check(ctx, entry, op, permission)
    }

    fn check(
        &self,
        ctx: &RequestContext,
        entry: &Entry,
        op: EntryOperation,
        permission: Option<EntryPermission>,
    ) -> Result<Option<EntryPermission>, AppError> {
        if evaluate(
            entry,
            ctx.employee_id,
            permission.as_ref(),
            op,
            self.clock.now(),
        ) {
            return Ok(permission);
        }

        warn!(
            employee_id = %ctx.employee_id,
            entry_id = %entry.id,
            operation = %op,
            "Access denied"
        );
        Err(AppError::authorization(format!(
            "Missing '{op}' right on entry '{}'",
            entry.name
        )))
    }

    /// Require that the caller owns `entry`.
    pub fn require_owner(&self, ctx: &RequestContext, entry: &Entry) -> Result<(), AppError> {
        if entry.is_owned_by(ctx.employee_id) {
            return Ok(());
        }
        warn!(
            employee_id = %ctx.employee_id,
            entry_id = %entry.id,
            "Access denied: not the owner"
        );
        Err(AppError::authorization(format!(
            "Only the owner can modify entry '{}'",
            entry.name
        )))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use archivehub_entity::permission::AllowedOperations;

    use super::*;

    fn entry(owner: Uuid) -> Entry {
        Entry::file("/docs", "report.pdf", Uuid::new_v4(), 1024, owner, owner, Utc::now())
    }

    fn grant(entry: &Entry, employee_id: Uuid, ops: AllowedOperations) -> EntryPermission {
        EntryPermission {
            entry_id: entry.id,
            employee_id,
            allowed_operations: ops,
            expiry_date_time: None,
            is_shared_root: true,
            granted_by: entry.owner_id,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_owner_always_allowed() {
        let owner = Uuid::new_v4();
        let e = entry(owner);
        for op in EntryOperation::ALL {
            assert!(evaluate(&e, owner, None, op, Utc::now()));
        }
    }

    #[test]
    fn test_missing_row_denies() {
        let e = entry(Uuid::new_v4());
        assert!(!evaluate(&e, Uuid::new_v4(), None, EntryOperation::View, Utc::now()));
    }

    #[test]
    fn test_row_must_contain_operation() {
        let e = entry(Uuid::new_v4());
        let bob = Uuid::new_v4();
        let perm = grant(&e, bob, AllowedOperations::view());
        let now = Utc::now();
        assert!(evaluate(&e, bob, Some(&perm), EntryOperation::View, now));
        assert!(!evaluate(&e, bob, Some(&perm), EntryOperation::Edit, now));
        assert!(!evaluate(&e, bob, Some(&perm), EntryOperation::Download, now));
    }

    #[test]
    fn test_expired_row_denies_everything() {
        let e = entry(Uuid::new_v4());
        let bob = Uuid::new_v4();
        let now = Utc::now();
        let mut perm = grant(&e, bob, EntryOperation::ALL.into_iter().collect());
        perm.expiry_date_time = Some(now - Duration::minutes(1));
        for op in EntryOperation::ALL {
            assert!(!evaluate(&e, bob, Some(&perm), op, now));
        }
    }

    #[test]
    fn test_row_for_other_entry_is_ignored() {
        let e = entry(Uuid::new_v4());
        let other = entry(e.owner_id);
        let bob = Uuid::new_v4();
        let perm = grant(&other, bob, AllowedOperations::view());
        assert!(!evaluate(&e, bob, Some(&perm), EntryOperation::View, Utc::now()));
    }
}
