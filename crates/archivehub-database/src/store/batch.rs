//! Ordered write batches.

use uuid::Uuid;

use archivehub_entity::employee::Employee;
use archivehub_entity::entry::{Entry, FileEntity};
use archivehub_entity::permission::EntryPermission;

/// A single row mutation.
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Insert a new entry row.
    InsertEntry(Entry),
    /// Overwrite an existing entry row.
    UpdateEntry(Entry),
    /// Delete an entry row and its permissions.
    DeleteEntry(Uuid),
    /// Insert a payload row.
    InsertFile(FileEntity),
    /// Delete a payload row.
    DeleteFile(Uuid),
    /// Rewrite the MIME type and extension of a payload row.
    UpdateFileType {
        /// Payload to update.
        file_id: Uuid,
        /// New MIME type.
        file_type: String,
        /// New extension.
        file_extension: String,
    },
    /// Insert or overwrite a permission row.
    UpsertPermission(EntryPermission),
    /// Delete one permission row.
    DeletePermission {
        /// Entry the grant is on.
        entry_id: Uuid,
        /// Employee holding the grant.
        employee_id: Uuid,
    },
    /// Delete every permission row on an entry.
    DeleteEntryPermissions(Uuid),
    /// Insert an employee row.
    InsertEmployee(Employee),
}

/// An ordered list of [`WriteOp`]s applied in one transaction.
///
/// Operations run in insertion order, so payloads must be inserted before
/// the entries pointing at them and deleted after.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an operation.
    pub fn push(&mut self, op: WriteOp) -> &mut Self {
        self.ops.push(op);
        self
    }

    /// Queue an entry insert.
    pub fn insert_entry(&mut self, entry: Entry) -> &mut Self {
        self.push(WriteOp::InsertEntry(entry))
    }

    /// Queue an entry update.
    pub fn update_entry(&mut self, entry: Entry) -> &mut Self {
        self.push(WriteOp::UpdateEntry(entry))
    }

    /// Queue an entry delete.
    pub fn delete_entry(&mut self, id: Uuid) -> &mut Self {
        self.push(WriteOp::DeleteEntry(id))
    }

    /// Queue a payload insert.
    pub fn insert_file(&mut self, file: FileEntity) -> &mut Self {
        self.push(WriteOp::InsertFile(file))
    }

    /// Queue a payload delete.
    pub fn delete_file(&mut self, id: Uuid) -> &mut Self {
        self.push(WriteOp::DeleteFile(id))
    }

    /// Queue a payload type rewrite.
    pub fn update_file_type(
        &mut self,
        file_id: Uuid,
        file_type: impl Into<String>,
        file_extension: impl Into<String>,
    ) -> &mut Self {
        self.push(WriteOp::UpdateFileType {
            file_id,
            file_type: file_type.into(),
            file_extension: file_extension.into(),
        })
    }

    /// Queue a permission upsert.
    pub fn upsert_permission(&mut self, perm: EntryPermission) -> &mut Self {
        self.push(WriteOp::UpsertPermission(perm))
    }

    /// Queue a single permission delete.
    pub fn delete_permission(&mut self, entry_id: Uuid, employee_id: Uuid) -> &mut Self {
        self.push(WriteOp::DeletePermission {
            entry_id,
            employee_id,
        })
    }

    /// Queue removal of every grant on an entry.
    pub fn delete_entry_permissions(&mut self, entry_id: Uuid) -> &mut Self {
        self.push(WriteOp::DeleteEntryPermissions(entry_id))
    }

    /// Queue an employee insert.
    pub fn insert_employee(&mut self, employee: Employee) -> &mut Self {
        self.push(WriteOp::InsertEmployee(employee))
    }

    /// Number of queued operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Borrow the queued operations.
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Consume the batch into its operations.
    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}
