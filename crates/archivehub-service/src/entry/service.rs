//! Entry lifecycle operations with ownership and delegated-right checks.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use archivehub_core::config::ArchiveConfig;
use archivehub_core::error::AppError;
use archivehub_core::path;
use archivehub_core::traits::Clock;
use archivehub_database::{ArchiveStore, ArchiveTransaction, WriteBatch};
use archivehub_entity::entry::Entry;
use archivehub_entity::permission::{AllowedOperations, EntryOperation, EntryPermission};

use super::fetch_entry;
use super::request::{
    CreateEntryRequest, CreateSharedEntryRequest, FileUpload, RenameEntryRequest,
    UploadSharedEntryRequest, guess_content_type,
};
use crate::access::{AccessEvaluator, evaluate};
use crate::context::RequestContext;
use crate::lock;
use crate::validation::validate_request;

/// Creates, renames, and rewrites entries.
#[derive(Clone)]
pub struct EntryService {
    /// Entry store.
    store: Arc<dyn ArchiveStore>,
    /// Ownership and delegated-right checks.
    access: Arc<AccessEvaluator>,
    /// Time source for audit fields.
    clock: Arc<dyn Clock>,
    /// Size and naming limits.
    config: ArchiveConfig,
}

impl std::fmt::Debug for EntryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryService")
            .field("config", &self.config)
            .finish()
    }
}

impl EntryService {
    /// Creates a new entry service.
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

    /// Creates a directory or file in the caller's own tree.
    ///
    /// The parent path must be `/` or the canonical path of an existing
    /// directory owned by the caller.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        req: CreateEntryRequest,
    ) -> Result<Entry, AppError> {
        validate_request(&req)?;
        path::validate_path(&req.path, self.config.max_name_length)?;
        path::validate_name(&req.name, self.config.max_name_length)?;
        let payload = split_payload(req.is_directory, req.file)?;
        if let Some(upload) = &payload {
            self.check_size(upload.size())?;
        }

        let canonical = path::child_path(&req.path, &req.name);
        let mut tx = lock::lock_paths(self.store.as_ref(), [canonical.as_str()]).await?;

        ensure_name_free(tx.as_mut(), &req.path, &req.name).await?;

        let parent = match path::parent_and_name(&req.path) {
            None => None,
            Some((parent_path, parent_name)) => {
                let parent = tx
                    .find_entry_by_name(&parent_path, &parent_name)
                    .await?
                    .filter(Entry::is_directory)
                    .ok_or_else(|| {
                        AppError::conflict(format!(
                            "Parent directory '{}' does not exist",
                            req.path
                        ))
                    })?;
                self.access.require_owner(ctx, &parent)?;
                Some(parent)
            }
        };

        let now = self.clock.now();
        let mut batch = WriteBatch::new();
        let entry = self.build_entry(
            &mut batch,
            &req.path,
            &req.name,
            payload,
            ctx.employee_id,
            ctx.employee_id,
            now,
        );
        batch.insert_entry(entry.clone());
        if let Some(parent) = &parent {
            for perm in inherited_permissions(tx.as_mut(), parent, &entry, None, now).await? {
                batch.upsert_permission(perm);
            }
        }

        tx.commit(batch).await?;

        info!(
            employee_id = %ctx.employee_id,
            entry_id = %entry.id,
            path = %canonical,
            kind = %entry.kind(),
            "Entry created"
        );

        Ok(entry)
    }

    /// Creates a child inside a directory, on behalf of its owner when the
    /// caller holds `Edit` on it.
    pub async fn create_shared(
        &self,
        ctx: &RequestContext,
        parent_id: Uuid,
        req: CreateSharedEntryRequest,
    ) -> Result<Entry, AppError> {
        validate_request(&req)?;
        let payload = split_payload(req.is_directory, req.file)?;
        self.create_in_parent(ctx, parent_id, req.name, payload, EntryOperation::Edit)
            .await
    }

    /// Uploads a file into a directory, on behalf of its owner when the
    /// caller holds `Upload` on it.
    pub async fn upload_shared(
        &self,
        ctx: &RequestContext,
        parent_id: Uuid,
        req: UploadSharedEntryRequest,
    ) -> Result<Entry, AppError> {
        validate_request(&req)?;
        self.create_in_parent(
            ctx,
            parent_id,
            req.name,
            Some(req.file),
            EntryOperation::Upload,
        )
        .await
    }

    async fn create_in_parent(
        &self,
        ctx: &RequestContext,
        parent_id: Uuid,
        name: String,
        payload: Option<FileUpload>,
        required: EntryOperation,
    ) -> Result<Entry, AppError> {
        path::validate_name(&name, self.config.max_name_length)?;
        if let Some(upload) = &payload {
            self.check_size(upload.size())?;
        }

        let (mut tx, parent) =
            lock::lock_entry(self.store.as_ref(), parent_id, |e| vec![e.canonical_path()]).await?;

        if !parent.is_directory() {
            return Err(AppError::conflict(format!(
                "Entry '{}' is not a directory",
                parent.name
            )));
        }
        if parent.old_path.is_some() {
            return Err(AppError::conflict("Cannot create entries inside the bin"));
        }
        let caller_permission = self
            .access
            .require_within(tx.as_mut(), ctx, &parent, required)
            .await?;

        let parent_path = parent.canonical_path();
        ensure_name_free(tx.as_mut(), &parent_path, &name).await?;

        let now = self.clock.now();
        let mut batch = WriteBatch::new();
        let entry = self.build_entry(
            &mut batch,
            &parent_path,
            &name,
            payload,
            parent.owner_id,
            ctx.employee_id,
            now,
        );
        batch.insert_entry(entry.clone());

        for perm in
            inherited_permissions(tx.as_mut(), &parent, &entry, Some(ctx.employee_id), now).await?
        {
            batch.upsert_permission(perm);
        }
        if let Some(parent_permission) = &caller_permission {
            batch.upsert_permission(EntryPermission {
                entry_id: entry.id,
                employee_id: ctx.employee_id,
                allowed_operations: AllowedOperations::view_edit(),
                expiry_date_time: parent_permission.expiry_date_time,
                is_shared_root: false,
                granted_by: parent.owner_id,
                created_at: now,
            });
        }

        tx.commit(batch).await?;

        info!(
            employee_id = %ctx.employee_id,
            entry_id = %entry.id,
            owner_id = %entry.owner_id,
            path = %entry.canonical_path(),
            operation = %required,
            "Entry created in shared directory"
        );

        Ok(entry)
    }

    /// Renames an entry, rebasing every descendant path.
    pub async fn rename(
        &self,
        ctx: &RequestContext,
        entry_id: Uuid,
        req: RenameEntryRequest,
    ) -> Result<Entry, AppError> {
        validate_request(&req)?;
        path::validate_name(&req.new_name, self.config.max_name_length)?;

        let (mut tx, mut entry) = lock::lock_entry(self.store.as_ref(), entry_id, |e| {
            vec![e.canonical_path(), path::child_path(&e.path, &req.new_name)]
        })
        .await?;

        self.access
            .require_within(tx.as_mut(), ctx, &entry, EntryOperation::Upload)
            .await?;
        if entry.name == req.new_name {
            return Err(AppError::not_changed(format!(
                "Entry is already named '{}'",
                req.new_name
            )));
        }
        if entry.old_path.is_some() {
            return Err(AppError::conflict("Entries in the bin cannot be renamed"));
        }
        ensure_name_free(tx.as_mut(), &entry.path, &req.new_name).await?;

        let old_canonical = entry.canonical_path();
        let new_canonical = path::child_path(&entry.path, &req.new_name);
        let mut batch = WriteBatch::new();

        if entry.is_directory() {
            let subtree = tx.find_subtree(&old_canonical).await?;
            debug!(
                entry_id = %entry.id,
                descendants = subtree.len(),
                "Rebasing renamed subtree"
            );
            for mut descendant in subtree {
                if let Some(rebased) =
                    path::rebase_path(&descendant.path, &old_canonical, &new_canonical)
                {
                    descendant.path = rebased;
                    batch.update_entry(descendant);
                }
            }
        }

        if let Some(file_id) = entry.file_id {
            let new_extension = path::extension_of(&req.new_name);
            if new_extension != path::extension_of(&entry.name) {
                batch.update_file_type(file_id, guess_content_type(&req.new_name), new_extension);
            }
        }

        let old_name = std::mem::replace(&mut entry.name, req.new_name);
        entry.touch(ctx.employee_id, self.clock.now());
        batch.update_entry(entry.clone());

        tx.commit(batch).await?;

        info!(
            employee_id = %ctx.employee_id,
            entry_id = %entry.id,
            old_name = %old_name,
            new_name = %entry.name,
            "Entry renamed"
        );

        Ok(entry)
    }

    /// Replaces the content of a file entry. The previous payload row is
    /// removed in the same batch.
    pub async fn replace_content(
        &self,
        ctx: &RequestContext,
        entry_id: Uuid,
        upload: FileUpload,
    ) -> Result<Entry, AppError> {
        self.check_size(upload.size())?;

        let (mut tx, mut entry) =
            lock::lock_entry(self.store.as_ref(), entry_id, |e| vec![e.canonical_path()]).await?;

        if entry.is_directory() {
            return Err(AppError::conflict(
                "Cannot replace the content of a directory",
            ));
        }
        self.access
            .require_within(tx.as_mut(), ctx, &entry, EntryOperation::Upload)
            .await?;
        if entry.old_path.is_some() {
            return Err(AppError::conflict("Entries in the bin cannot be modified"));
        }

        let file = upload.into_file_entity(&entry.name);
        let previous = entry.file_id.replace(file.id);
        entry.size_in_bytes = Some(file.size() as i64);
        entry.touch(ctx.employee_id, self.clock.now());

        let mut batch = WriteBatch::new();
        batch.insert_file(file).update_entry(entry.clone());
        if let Some(previous) = previous {
            batch.delete_file(previous);
        }
        tx.commit(batch).await?;

        info!(
            employee_id = %ctx.employee_id,
            entry_id = %entry.id,
            size = entry.size_in_bytes.unwrap_or_default(),
            "Entry content replaced"
        );

        Ok(entry)
    }

    /// Gets an entry the caller can view.
    pub async fn get(&self, ctx: &RequestContext, entry_id: Uuid) -> Result<Entry, AppError> {
        let entry = fetch_entry(self.store.as_ref(), entry_id).await?;
        self.access.require(ctx, &entry, EntryOperation::View).await?;
        Ok(entry)
    }

    /// Lists the children of a directory that the caller can view,
    /// directories first.
    pub async fn list_directory(
        &self,
        ctx: &RequestContext,
        dir_path: &str,
    ) -> Result<Vec<Entry>, AppError> {
        path::validate_path(dir_path, self.config.max_name_length)?;
        if let Some((parent_path, name)) = path::parent_and_name(dir_path) {
            self.store
                .find_entry_by_name(&parent_path, &name)
                .await?
                .filter(Entry::is_directory)
                .ok_or_else(|| AppError::not_found(format!("Directory '{dir_path}' not found")))?;
        }

        let children = self.store.list_children(dir_path).await?;
        let foreign: Vec<Uuid> = children
            .iter()
            .filter(|e| !e.is_owned_by(ctx.employee_id))
            .map(|e| e.id)
            .collect();
        let permissions: HashMap<Uuid, EntryPermission> = self
            .store
            .permissions_for_entries(&foreign)
            .await?
            .into_iter()
            .filter(|p| p.employee_id == ctx.employee_id)
            .map(|p| (p.entry_id, p))
            .collect();

        let now = self.clock.now();
        Ok(children
            .into_iter()
            .filter(|e| {
                evaluate(
                    e,
                    ctx.employee_id,
                    permissions.get(&e.id),
                    EntryOperation::View,
                    now,
                )
            })
            .collect())
    }

    fn check_size(&self, size: usize) -> Result<(), AppError> {
        if size as u64 > self.config.max_file_size_bytes {
            return Err(AppError::conflict(format!(
                "File of {size} bytes exceeds the {} byte limit",
                self.config.max_file_size_bytes
            )));
        }
        Ok(())
    }

    /// Build the new entry, queueing its payload row first when it is a file.
    #[allow(clippy::too_many_arguments)]
    fn build_entry(
        &self,
        batch: &mut WriteBatch,
        parent_path: &str,
        name: &str,
        payload: Option<FileUpload>,
        owner_id: Uuid,
        created_by: Uuid,
        now: DateTime<Utc>,
    ) -> Entry {
        match payload {
            None => Entry::directory(parent_path, name, owner_id, created_by, now),
            Some(upload) => {
                let file = upload.into_file_entity(name);
                let entry = Entry::file(
                    parent_path,
                    name,
                    file.id,
                    file.size() as i64,
                    owner_id,
                    created_by,
                    now,
                );
                batch.insert_file(file);
                entry
            }
        }
    }
}

async fn ensure_name_free(
    tx: &mut dyn ArchiveTransaction,
    parent_path: &str,
    name: &str,
) -> Result<(), AppError> {
    if tx.find_entry_by_name(parent_path, name).await?.is_some() {
        return Err(AppError::conflict(format!(
            "An entry named '{name}' already exists in '{parent_path}'"
        )));
    }
    Ok(())
}

/// Copies the live grants on `parent` onto a new child so that a shared
/// directory stays shared as it grows.
async fn inherited_permissions(
    tx: &mut dyn ArchiveTransaction,
    parent: &Entry,
    child: &Entry,
    skip: Option<Uuid>,
    now: DateTime<Utc>,
) -> Result<Vec<EntryPermission>, AppError> {
    let inherited = tx
        .permissions_for_entry(parent.id)
        .await?
        .into_iter()
        .filter(|p| {
            p.employee_id != child.owner_id && Some(p.employee_id) != skip && !p.is_expired_at(now)
        })
        .map(|p| EntryPermission {
            entry_id: child.id,
            is_shared_root: false,
            created_at: now,
            ..p
        })
        .collect();
    Ok(inherited)
}

/// Pair the directory flag with the optional payload.
fn split_payload(
    is_directory: bool,
    file: Option<FileUpload>,
) -> Result<Option<FileUpload>, AppError> {
    match (is_directory, file) {
        (true, Some(_)) => Err(AppError::validation(
            "A directory cannot carry file content",
        )),
        (true, None) => Ok(None),
        (false, Some(file)) => Ok(Some(file)),
        (false, None) => Err(AppError::validation("A file entry requires content")),
    }
}
