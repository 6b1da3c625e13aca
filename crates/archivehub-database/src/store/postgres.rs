//! PostgreSQL-backed [`ArchiveStore`].

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tracing::{debug, trace};
use uuid::Uuid;

use archivehub_core::error::{AppError, ErrorKind};
use archivehub_core::result::AppResult;
use archivehub_entity::employee::Employee;
use archivehub_entity::entry::{Entry, FileEntity};
use archivehub_entity::permission::EntryPermission;

use super::{ArchiveStore, ArchiveTransaction, WriteBatch, WriteOp, lock_order};
use crate::repositories::{
    EmployeeRepository, EntryRepository, FileRepository, PermissionRepository, map_write_error,
};

/// The four table repositories, shared by the store and its transactions.
#[derive(Debug, Clone, Copy, Default)]
struct Tables {
    entries: EntryRepository,
    files: FileRepository,
    permissions: PermissionRepository,
    employees: EmployeeRepository,
}

impl Tables {
    async fn apply(&self, conn: &mut PgConnection, batch: WriteBatch) -> AppResult<()> {
        for op in batch.into_ops() {
            match op {
                WriteOp::InsertEntry(entry) => self.entries.insert(conn, &entry).await?,
                WriteOp::UpdateEntry(entry) => self.entries.update(conn, &entry).await?,
                WriteOp::DeleteEntry(id) => self.entries.delete(conn, id).await?,
                WriteOp::InsertFile(file) => self.files.insert(conn, &file).await?,
                WriteOp::DeleteFile(id) => self.files.delete(conn, id).await?,
                WriteOp::UpdateFileType {
                    file_id,
                    file_type,
                    file_extension,
                } => {
                    self.files
                        .update_type(conn, file_id, &file_type, &file_extension)
                        .await?
                }
                WriteOp::UpsertPermission(perm) => self.permissions.upsert(conn, &perm).await?,
                WriteOp::DeletePermission {
                    entry_id,
                    employee_id,
                } => self.permissions.delete(conn, entry_id, employee_id).await?,
                WriteOp::DeleteEntryPermissions(entry_id) => {
                    self.permissions.delete_by_entry(conn, entry_id).await?
                }
                WriteOp::InsertEmployee(employee) => self.employees.insert(conn, &employee).await?,
            }
        }
        Ok(())
    }
}

/// Store backed by the repositories over one connection pool.
///
/// Transactions run at READ COMMITTED and serialize on
/// `pg_advisory_xact_lock(hashtext(key))` for each lock key. Every writer
/// of a subtree holds the key of its root, so a read taken after the lock
/// is granted sees the last committed state of that subtree, whichever
/// process wrote it.
#[derive(Debug, Clone)]
pub struct PgArchiveStore {
    pool: PgPool,
    tables: Tables,
}

impl PgArchiveStore {
    /// Create a store over `pool`.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            tables: Tables::default(),
        }
    }
}

#[async_trait]
impl ArchiveStore for PgArchiveStore {
    async fn find_entry(&self, id: Uuid) -> AppResult<Option<Entry>> {
        self.tables.entries.find_by_id(&self.pool, id).await
    }

    async fn find_entry_by_name(
        &self,
        parent_path: &str,
        name: &str,
    ) -> AppResult<Option<Entry>> {
        self.tables
            .entries
            .find_by_path_and_name(&self.pool, parent_path, name)
            .await
    }

    async fn list_children(&self, parent_path: &str) -> AppResult<Vec<Entry>> {
        self.tables.entries.find_children(&self.pool, parent_path).await
    }

    async fn find_subtree(&self, root: &str) -> AppResult<Vec<Entry>> {
        self.tables.entries.find_subtree(&self.pool, root).await
    }

    async fn find_file(&self, id: Uuid) -> AppResult<Option<FileEntity>> {
        self.tables.files.find_by_id(&self.pool, id).await
    }

    async fn find_permission(
        &self,
        entry_id: Uuid,
        employee_id: Uuid,
    ) -> AppResult<Option<EntryPermission>> {
        self.tables
            .permissions
            .find(&self.pool, entry_id, employee_id)
            .await
    }

    async fn permissions_for_entry(&self, entry_id: Uuid) -> AppResult<Vec<EntryPermission>> {
        self.tables.permissions.find_by_entry(&self.pool, entry_id).await
    }

    async fn permissions_for_employee(
        &self,
        employee_id: Uuid,
    ) -> AppResult<Vec<EntryPermission>> {
        self.tables
            .permissions
            .find_by_employee(&self.pool, employee_id)
            .await
    }

    async fn permissions_for_entries(
        &self,
        entry_ids: &[Uuid],
    ) -> AppResult<Vec<EntryPermission>> {
        self.tables
            .permissions
            .find_by_entries(&self.pool, entry_ids)
            .await
    }

    async fn find_employee(&self, id: Uuid) -> AppResult<Option<Employee>> {
        self.tables.employees.find_by_id(&self.pool, id).await
    }

    async fn find_employee_by_username(&self, username: &str) -> AppResult<Option<Employee>> {
        self.tables
            .employees
            .find_by_username(&self.pool, username)
            .await
    }

    async fn begin(&self, lock_keys: &[String]) -> AppResult<Box<dyn ArchiveTransaction>> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        // Released by COMMIT or ROLLBACK.
        for key in lock_order(lock_keys) {
            sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
                .bind(key.as_str())
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to acquire subtree lock", e)
                })?;
            trace!(key = %key, "Acquired subtree lock");
        }

        Ok(Box::new(PgArchiveTransaction {
            tx,
            tables: self.tables,
        }))
    }
}

/// An open Postgres transaction holding advisory locks.
pub struct PgArchiveTransaction {
    tx: Transaction<'static, Postgres>,
    tables: Tables,
}

impl std::fmt::Debug for PgArchiveTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgArchiveTransaction").finish()
    }
}

#[async_trait]
impl ArchiveTransaction for PgArchiveTransaction {
    async fn find_entry(&mut self, id: Uuid) -> AppResult<Option<Entry>> {
        self.tables.entries.find_by_id(&mut *self.tx, id).await
    }

    async fn find_entry_by_name(
        &mut self,
        parent_path: &str,
        name: &str,
    ) -> AppResult<Option<Entry>> {
        self.tables
            .entries
            .find_by_path_and_name(&mut *self.tx, parent_path, name)
            .await
    }

    async fn find_subtree(&mut self, root: &str) -> AppResult<Vec<Entry>> {
        self.tables.entries.find_subtree(&mut *self.tx, root).await
    }

    async fn find_permission(
        &mut self,
        entry_id: Uuid,
        employee_id: Uuid,
    ) -> AppResult<Option<EntryPermission>> {
        self.tables
            .permissions
            .find(&mut *self.tx, entry_id, employee_id)
            .await
    }

    async fn permissions_for_entry(&mut self, entry_id: Uuid) -> AppResult<Vec<EntryPermission>> {
        self.tables
            .permissions
            .find_by_entry(&mut *self.tx, entry_id)
            .await
    }

    async fn permissions_for_entries(
        &mut self,
        entry_ids: &[Uuid],
    ) -> AppResult<Vec<EntryPermission>> {
        self.tables
            .permissions
            .find_by_entries(&mut *self.tx, entry_ids)
            .await
    }

    async fn find_employee(&mut self, id: Uuid) -> AppResult<Option<Employee>> {
        self.tables.employees.find_by_id(&mut *self.tx, id).await
    }

    async fn commit(mut self: Box<Self>, batch: WriteBatch) -> AppResult<()> {
        let op_count = batch.len();
        let tables = self.tables;
        tables.apply(&mut *self.tx, batch).await?;

        // Deferred uniqueness checks fire here.
        self.tx
            .commit()
            .await
            .map_err(|e| map_write_error(e, "Failed to commit transaction"))?;

        debug!(ops = op_count, "Committed write batch");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        self.tx.rollback().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to roll back transaction", e)
        })
    }
}
