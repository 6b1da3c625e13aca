//! In-process [`ArchiveStore`] for tests and local tooling.
//!
//! Commits are serialized behind a write lock. Each batch is applied to a
//! copy of the state, the copy is checked for duplicate `(path, name)`
//! pairs and dangling references, and only then swapped in. Nothing is
//! written before commit, so dropping a transaction discards it.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use archivehub_core::error::AppError;
use archivehub_core::path;
use archivehub_core::result::AppResult;
use archivehub_entity::employee::Employee;
use archivehub_entity::entry::{Entry, FileEntity};
use archivehub_entity::permission::EntryPermission;

use super::locks::{RootLockGuard, RootLocks};
use super::{ArchiveStore, ArchiveTransaction, WriteBatch, WriteOp};

#[derive(Debug, Clone, Default)]
struct State {
    entries: HashMap<Uuid, Entry>,
    files: HashMap<Uuid, Arc<FileEntity>>,
    permissions: HashMap<(Uuid, Uuid), EntryPermission>,
    employees: HashMap<Uuid, Employee>,
}

impl State {
    fn apply(&mut self, op: WriteOp) -> AppResult<()> {
        match op {
            WriteOp::InsertEntry(entry) => {
                if self.entries.contains_key(&entry.id) {
                    return Err(AppError::conflict(format!("Entry {} already exists", entry.id)));
                }
                self.entries.insert(entry.id, entry);
            }
            WriteOp::UpdateEntry(entry) => match self.entries.get_mut(&entry.id) {
                Some(existing) => {
                    let created_at = existing.created_at;
                    let created_by = existing.created_by;
                    *existing = Entry {
                        created_at,
                        created_by,
                        ..entry
                    };
                }
                None => {
                    return Err(AppError::not_found(format!("Entry {} not found", entry.id)));
                }
            },
            WriteOp::DeleteEntry(id) => {
                self.entries.remove(&id);
                self.permissions.retain(|(entry_id, _), _| *entry_id != id);
            }
            WriteOp::InsertFile(file) => {
                if self.files.contains_key(&file.id) {
                    return Err(AppError::conflict(format!("File {} already exists", file.id)));
                }
                self.files.insert(file.id, Arc::new(file));
            }
            WriteOp::DeleteFile(id) => {
                self.files.remove(&id);
            }
            WriteOp::UpdateFileType {
                file_id,
                file_type,
                file_extension,
            } => match self.files.get_mut(&file_id) {
                Some(file) => {
                    let file = Arc::make_mut(file);
                    file.file_type = file_type;
                    file.file_extension = file_extension;
                }
                None => return Err(AppError::not_found(format!("File {file_id} not found"))),
            },
            WriteOp::UpsertPermission(perm) => {
                let key = (perm.entry_id, perm.employee_id);
                let perm = match self.permissions.get(&key) {
                    Some(existing) => EntryPermission {
                        created_at: existing.created_at,
                        ..perm
                    },
                    None => perm,
                };
                self.permissions.insert(key, perm);
            }
            WriteOp::DeletePermission {
                entry_id,
                employee_id,
            } => {
                self.permissions.remove(&(entry_id, employee_id));
            }
            WriteOp::DeleteEntryPermissions(entry_id) => {
                self.permissions.retain(|(id, _), _| *id != entry_id);
            }
            WriteOp::InsertEmployee(employee) => {
                if self
                    .employees
                    .values()
                    .any(|e| e.username == employee.username)
                {
                    return Err(AppError::conflict("Username already exists"));
                }
                self.employees.insert(employee.id, employee);
            }
        }
        Ok(())
    }

    /// Enforce the constraints the relational schema would.
    fn check_constraints(&self) -> AppResult<()> {
        let mut seen = HashSet::with_capacity(self.entries.len());
        for entry in self.entries.values() {
            if !seen.insert((entry.path.as_str(), entry.name.as_str())) {
                return Err(AppError::conflict(
                    "An entry with the same name already exists at this path",
                ));
            }
            if let Some(file_id) = entry.file_id {
                if !self.files.contains_key(&file_id) {
                    return Err(AppError::conflict(format!(
                        "Entry {} references missing file {file_id}",
                        entry.id
                    )));
                }
            }
            for employee_id in [entry.owner_id, entry.created_by, entry.last_modified_by] {
                if !self.employees.contains_key(&employee_id) {
                    return Err(AppError::conflict(format!(
                        "Entry {} references unknown employee {employee_id}",
                        entry.id
                    )));
                }
            }
        }
        for (entry_id, employee_id) in self.permissions.keys() {
            if !self.entries.contains_key(entry_id) {
                return Err(AppError::conflict(format!(
                    "Permission references missing entry {entry_id}"
                )));
            }
            if !self.employees.contains_key(employee_id) {
                return Err(AppError::conflict(format!(
                    "Permission references unknown employee {employee_id}"
                )));
            }
        }
        Ok(())
    }

    fn entry(&self, id: Uuid) -> Option<Entry> {
        self.entries.get(&id).cloned()
    }

    fn entry_by_name(&self, parent_path: &str, name: &str) -> Option<Entry> {
        self.entries
            .values()
            .find(|e| e.path == parent_path && e.name == name)
            .cloned()
    }

    fn subtree(&self, root: &str) -> Vec<Entry> {
        let mut entries: Vec<Entry> = self
            .entries
            .values()
            .filter(|e| path::is_descendant_path(&e.path, root))
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.name.cmp(&b.name)));
        entries
    }

    fn permissions_where(&self, keep: impl Fn(&EntryPermission) -> bool) -> Vec<EntryPermission> {
        let mut perms: Vec<EntryPermission> =
            self.permissions.values().filter(|p| keep(*p)).cloned().collect();
        perms.sort_by_key(|p| p.created_at);
        perms
    }

    fn permissions_for_entries(&self, entry_ids: &[Uuid]) -> Vec<EntryPermission> {
        let wanted: HashSet<&Uuid> = entry_ids.iter().collect();
        self.permissions_where(|p| wanted.contains(&p.entry_id))
    }
}

fn sort_listing(entries: &mut [Entry]) {
    entries.sort_by(|a, b| {
        a.is_file()
            .cmp(&b.is_file())
            .then_with(|| a.name.cmp(&b.name))
    });
}

/// Apply `batch` to a copy of the state and swap it in if the copy is valid.
async fn commit_state(state: &RwLock<State>, batch: WriteBatch) -> AppResult<()> {
    if batch.is_empty() {
        return Ok(());
    }
    let op_count = batch.len();

    let mut state = state.write().await;
    let mut next = state.clone();
    for op in batch.into_ops() {
        next.apply(op)?;
    }
    next.check_constraints()?;
    *state = next;

    debug!(ops = op_count, "Committed write batch");
    Ok(())
}

/// Store holding every table in memory.
///
/// Transactions take [`RootLocks`] on the store itself, so services built
/// separately over one shared store exclude each other the way separate
/// processes do over one database.
#[derive(Debug, Default)]
pub struct MemoryArchiveStore {
    state: Arc<RwLock<State>>,
    locks: RootLocks,
}

impl MemoryArchiveStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register employees directly, bypassing batch semantics.
    pub async fn with_employees(employees: impl IntoIterator<Item = Employee>) -> AppResult<Self> {
        let store = Self::new();
        let mut batch = WriteBatch::new();
        for employee in employees {
            batch.insert_employee(employee);
        }
        store.commit(batch).await?;
        Ok(store)
    }

    /// Number of stored entries.
    pub async fn entry_count(&self) -> usize {
        self.state.read().await.entries.len()
    }

    /// Number of stored payloads.
    pub async fn file_count(&self) -> usize {
        self.state.read().await.files.len()
    }

    /// Number of stored permission rows.
    pub async fn permission_count(&self) -> usize {
        self.state.read().await.permissions.len()
    }

    /// Number of lock keys currently held or awaited.
    pub fn held_lock_count(&self) -> usize {
        self.locks.len()
    }
}

#[async_trait]
impl ArchiveStore for MemoryArchiveStore {
    async fn find_entry(&self, id: Uuid) -> AppResult<Option<Entry>> {
        Ok(self.state.read().await.entry(id))
    }

    async fn find_entry_by_name(
        &self,
        parent_path: &str,
        name: &str,
    ) -> AppResult<Option<Entry>> {
        Ok(self.state.read().await.entry_by_name(parent_path, name))
    }

    async fn list_children(&self, parent_path: &str) -> AppResult<Vec<Entry>> {
        let state = self.state.read().await;
        let mut children: Vec<Entry> = state
            .entries
            .values()
            .filter(|e| e.path == parent_path)
            .cloned()
            .collect();
        sort_listing(&mut children);
        Ok(children)
    }

    async fn find_subtree(&self, root: &str) -> AppResult<Vec<Entry>> {
        Ok(self.state.read().await.subtree(root))
    }

    async fn find_file(&self, id: Uuid) -> AppResult<Option<FileEntity>> {
        let state = self.state.read().await;
        Ok(state.files.get(&id).map(|f| f.as_ref().clone()))
    }

    async fn find_permission(
        &self,
        entry_id: Uuid,
        employee_id: Uuid,
    ) -> AppResult<Option<EntryPermission>> {
        let state = self.state.read().await;
        Ok(state.permissions.get(&(entry_id, employee_id)).cloned())
    }

    async fn permissions_for_entry(&self, entry_id: Uuid) -> AppResult<Vec<EntryPermission>> {
        let state = self.state.read().await;
        Ok(state.permissions_where(|p| p.entry_id == entry_id))
    }

    async fn permissions_for_employee(
        &self,
        employee_id: Uuid,
    ) -> AppResult<Vec<EntryPermission>> {
        let state = self.state.read().await;
        Ok(state.permissions_where(|p| p.employee_id == employee_id))
    }

    async fn permissions_for_entries(
        &self,
        entry_ids: &[Uuid],
    ) -> AppResult<Vec<EntryPermission>> {
        Ok(self.state.read().await.permissions_for_entries(entry_ids))
    }

    async fn find_employee(&self, id: Uuid) -> AppResult<Option<Employee>> {
        Ok(self.state.read().await.employees.get(&id).cloned())
    }

    async fn find_employee_by_username(&self, username: &str) -> AppResult<Option<Employee>> {
        let state = self.state.read().await;
        Ok(state
            .employees
            .values()
            .find(|e| e.username == username)
            .cloned())
    }

    async fn begin(&self, lock_keys: &[String]) -> AppResult<Box<dyn ArchiveTransaction>> {
        let guard = self.locks.acquire(lock_keys).await;
        Ok(Box::new(MemoryTransaction {
            state: Arc::clone(&self.state),
            _locks: guard,
        }))
    }

    async fn commit(&self, batch: WriteBatch) -> AppResult<()> {
        commit_state(&self.state, batch).await
    }
}

/// A unit of work over a [`MemoryArchiveStore`].
#[derive(Debug)]
pub struct MemoryTransaction {
    state: Arc<RwLock<State>>,
    _locks: RootLockGuard,
}

#[async_trait]
impl ArchiveTransaction for MemoryTransaction {
    async fn find_entry(&mut self, id: Uuid) -> AppResult<Option<Entry>> {
        Ok(self.state.read().await.entry(id))
    }

    async fn find_entry_by_name(
        &mut self,
        parent_path: &str,
        name: &str,
    ) -> AppResult<Option<Entry>> {
        Ok(self.state.read().await.entry_by_name(parent_path, name))
    }

    async fn find_subtree(&mut self, root: &str) -> AppResult<Vec<Entry>> {
        Ok(self.state.read().await.subtree(root))
    }

    async fn find_permission(
        &mut self,
        entry_id: Uuid,
        employee_id: Uuid,
    ) -> AppResult<Option<EntryPermission>> {
        let state = self.state.read().await;
        Ok(state.permissions.get(&(entry_id, employee_id)).cloned())
    }

    async fn permissions_for_entry(&mut self, entry_id: Uuid) -> AppResult<Vec<EntryPermission>> {
        let state = self.state.read().await;
        Ok(state.permissions_where(|p| p.entry_id == entry_id))
    }

    async fn permissions_for_entries(
        &mut self,
        entry_ids: &[Uuid],
    ) -> AppResult<Vec<EntryPermission>> {
        Ok(self.state.read().await.permissions_for_entries(entry_ids))
    }

    async fn find_employee(&mut self, id: Uuid) -> AppResult<Option<Employee>> {
        Ok(self.state.read().await.employees.get(&id).cloned())
    }

    async fn commit(self: Box<Self>, batch: WriteBatch) -> AppResult<()> {
        commit_state(&self.state, batch).await
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }
}
