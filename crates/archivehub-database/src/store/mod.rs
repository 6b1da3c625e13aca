//! The transactional entry store.
//!
//! Services read through [`ArchiveStore`] and express every mutation as a
//! [`WriteBatch`]. A batch is applied atomically: either every operation
//! lands or none does.
//!
//! Operations that read a subtree and then rewrite it open an
//! [`ArchiveTransaction`] with [`ArchiveStore::begin`]. The transaction
//! holds exclusive locks on the named root keys until it commits or is
//! dropped, and its reads observe every commit made before the locks were
//! granted. Two processes sharing one database therefore serialize on the
//! same keys.

pub mod batch;
#[cfg(feature = "memory")]
pub mod locks;
#[cfg(feature = "memory")]
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use archivehub_core::result::AppResult;
use archivehub_entity::employee::Employee;
use archivehub_entity::entry::{Entry, FileEntity};
use archivehub_entity::permission::EntryPermission;

pub use batch::{WriteBatch, WriteOp};
#[cfg(feature = "memory")]
pub use locks::{RootLockGuard, RootLocks};
#[cfg(feature = "memory")]
pub use memory::MemoryArchiveStore;
pub use postgres::{PgArchiveStore, PgArchiveTransaction};

/// A unit of work holding exclusive root locks.
///
/// Dropping the transaction without calling [`commit`](Self::commit)
/// discards it and releases the locks.
#[async_trait]
pub trait ArchiveTransaction: Send {
    /// Find an entry by ID.
    async fn find_entry(&mut self, id: Uuid) -> AppResult<Option<Entry>>;

    /// Find the entry named `name` directly inside `parent_path`.
    async fn find_entry_by_name(
        &mut self,
        parent_path: &str,
        name: &str,
    ) -> AppResult<Option<Entry>>;

    /// List every entry whose parent path is `root` or lies below it.
    async fn find_subtree(&mut self, root: &str) -> AppResult<Vec<Entry>>;

    /// Find the grant held by `employee_id` on `entry_id`.
    async fn find_permission(
        &mut self,
        entry_id: Uuid,
        employee_id: Uuid,
    ) -> AppResult<Option<EntryPermission>>;

    /// List every grant on an entry.
    async fn permissions_for_entry(&mut self, entry_id: Uuid) -> AppResult<Vec<EntryPermission>>;

    /// List every grant on any of `entry_ids`.
    async fn permissions_for_entries(
        &mut self,
        entry_ids: &[Uuid],
    ) -> AppResult<Vec<EntryPermission>>;

    /// Find an employee by ID.
    async fn find_employee(&mut self, id: Uuid) -> AppResult<Option<Employee>>;

    /// Apply `batch` and release the locks.
    async fn commit(self: Box<Self>, batch: WriteBatch) -> AppResult<()>;

    /// Discard the transaction and release the locks.
    async fn rollback(self: Box<Self>) -> AppResult<()>;
}

/// Read access plus atomic batch commit over entries, payloads,
/// permissions, and employees.
#[async_trait]
pub trait ArchiveStore: Send + Sync + 'static {
    /// Find an entry by ID.
    async fn find_entry(&self, id: Uuid) -> AppResult<Option<Entry>>;

    /// Find the entry named `name` directly inside `parent_path`.
    async fn find_entry_by_name(&self, parent_path: &str, name: &str)
    -> AppResult<Option<Entry>>;

    /// List the direct children of `parent_path`, directories first.
    async fn list_children(&self, parent_path: &str) -> AppResult<Vec<Entry>>;

    /// List every entry whose parent path is `root` or lies below it.
    async fn find_subtree(&self, root: &str) -> AppResult<Vec<Entry>>;

    /// Load a file payload.
    async fn find_file(&self, id: Uuid) -> AppResult<Option<FileEntity>>;

    /// Find the grant held by `employee_id` on `entry_id`.
    async fn find_permission(
        &self,
        entry_id: Uuid,
        employee_id: Uuid,
    ) -> AppResult<Option<EntryPermission>>;

    /// List every grant on an entry.
    async fn permissions_for_entry(&self, entry_id: Uuid) -> AppResult<Vec<EntryPermission>>;

    /// List every grant held by an employee.
    async fn permissions_for_employee(&self, employee_id: Uuid)
    -> AppResult<Vec<EntryPermission>>;

    /// List every grant on any of `entry_ids`.
    async fn permissions_for_entries(&self, entry_ids: &[Uuid])
    -> AppResult<Vec<EntryPermission>>;

    /// Find an employee by ID.
    async fn find_employee(&self, id: Uuid) -> AppResult<Option<Employee>>;

    /// Find an employee by username.
    async fn find_employee_by_username(&self, username: &str) -> AppResult<Option<Employee>>;

    /// Open a transaction holding exclusive locks on `lock_keys`.
    ///
    /// Keys are locked in sorted order, so callers naming overlapping
    /// sets cannot deadlock. Waits until every key is free.
    async fn begin(&self, lock_keys: &[String]) -> AppResult<Box<dyn ArchiveTransaction>>;

    /// Apply every operation in `batch` atomically without taking locks.
    ///
    /// Fails with `Conflict` when the result would hold two entries with
    /// the same `(path, name)` or would reference a missing row.
    async fn commit(&self, batch: WriteBatch) -> AppResult<()> {
        self.begin(&[]).await?.commit(batch).await
    }
}

/// Sort and deduplicate lock keys into acquisition order.
pub fn lock_order(lock_keys: &[String]) -> Vec<String> {
    let mut keys = lock_keys.to_vec();
    keys.sort();
    keys.dedup();
    keys
}
