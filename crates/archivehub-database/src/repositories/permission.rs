//! Entry permission repository implementation.

use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

use archivehub_core::error::{AppError, ErrorKind};
use archivehub_core::result::AppResult;
use archivehub_entity::permission::EntryPermission;

/// Repository for the `entry_permissions` table.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionRepository;

impl PermissionRepository {
    /// Create a new permission repository.
    pub fn new() -> Self {
        Self
    }

    /// Find the grant held by `employee_id` on `entry_id`.
    pub async fn find<'e, E>(
        &self,
        executor: E,
        entry_id: Uuid,
        employee_id: Uuid,
    ) -> AppResult<Option<EntryPermission>>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, EntryPermission>(
            "SELECT * FROM entry_permissions WHERE entry_id = $1 AND employee_id = $2",
        )
        .bind(entry_id)
        .bind(employee_id)
        .fetch_optional(executor)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find permission", e))
    }

    /// List every grant on an entry, expired ones included.
    pub async fn find_by_entry<'e, E>(
        &self,
        executor: E,
        entry_id: Uuid,
    ) -> AppResult<Vec<EntryPermission>>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, EntryPermission>(
            "SELECT * FROM entry_permissions WHERE entry_id = $1 ORDER BY created_at ASC",
        )
        .bind(entry_id)
        .fetch_all(executor)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list entry permissions", e)
        })
    }

    /// List every grant held by an employee.
    pub async fn find_by_employee<'e, E>(
        &self,
        executor: E,
        employee_id: Uuid,
    ) -> AppResult<Vec<EntryPermission>>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, EntryPermission>(
            "SELECT * FROM entry_permissions WHERE employee_id = $1 ORDER BY created_at ASC",
        )
        .bind(employee_id)
        .fetch_all(executor)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list employee permissions", e)
        })
    }

    /// List every grant on any of `entry_ids`.
    pub async fn find_by_entries<'e, E>(
        &self,
        executor: E,
        entry_ids: &[Uuid],
    ) -> AppResult<Vec<EntryPermission>>
    where
        E: PgExecutor<'e>,
    {
        if entry_ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, EntryPermission>(
            "SELECT * FROM entry_permissions WHERE entry_id = ANY($1)",
        )
        .bind(entry_ids)
        .fetch_all(executor)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to load subtree permissions", e)
        })
    }

    /// Insert a grant, or overwrite the existing one for the same pair.
    ///
    /// `created_at` of an existing row is preserved.
    pub async fn upsert(&self, conn: &mut PgConnection, perm: &EntryPermission) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO entry_permissions (entry_id, employee_id, allowed_operations, \
             expiry_date_time, is_shared_root, granted_by, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (entry_id, employee_id) DO UPDATE SET \
             allowed_operations = EXCLUDED.allowed_operations, \
             expiry_date_time = EXCLUDED.expiry_date_time, \
             is_shared_root = EXCLUDED.is_shared_root, \
             granted_by = EXCLUDED.granted_by",
        )
        .bind(perm.entry_id)
        .bind(perm.employee_id)
        .bind(perm.allowed_operations.to_string())
        .bind(perm.expiry_date_time)
        .bind(perm.is_shared_root)
        .bind(perm.granted_by)
        .bind(perm.created_at)
        .execute(conn)
        .await
        .map_err(|e| super::map_write_error(e, "Failed to save permission"))?;
        Ok(())
    }

    /// Delete the grant held by `employee_id` on `entry_id`.
    pub async fn delete(
        &self,
        conn: &mut PgConnection,
        entry_id: Uuid,
        employee_id: Uuid,
    ) -> AppResult<()> {
        sqlx::query("DELETE FROM entry_permissions WHERE entry_id = $1 AND employee_id = $2")
            .bind(entry_id)
            .bind(employee_id)
            .execute(conn)
            .await
            .map_err(|e| super::map_write_error(e, "Failed to delete permission"))?;
        Ok(())
    }

    /// Delete every grant on an entry.
    pub async fn delete_by_entry(&self, conn: &mut PgConnection, entry_id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM entry_permissions WHERE entry_id = $1")
            .bind(entry_id)
            .execute(conn)
            .await
            .map_err(|e| super::map_write_error(e, "Failed to delete entry permissions"))?;
        Ok(())
    }
}
