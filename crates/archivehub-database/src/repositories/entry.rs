//! Entry repository implementation.

use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

use archivehub_core::error::{AppError, ErrorKind};
use archivehub_core::path;
use archivehub_core::result::AppResult;
use archivehub_entity::entry::Entry;

/// Repository for the `entries` table.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryRepository;

impl EntryRepository {
    /// Create a new entry repository.
    pub fn new() -> Self {
        Self
    }

    /// Find an entry by ID.
    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> AppResult<Option<Entry>>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Entry>("SELECT * FROM entries WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find entry", e))
    }

    /// Find the entry named `name` directly inside `parent_path`.
    pub async fn find_by_path_and_name<'e, E>(
        &self,
        executor: E,
        parent_path: &str,
        name: &str,
    ) -> AppResult<Option<Entry>>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Entry>("SELECT * FROM entries WHERE path = $1 AND name = $2")
            .bind(parent_path)
            .bind(name)
            .fetch_optional(executor)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find entry by name", e)
            })
    }

    /// List the direct children of the directory at `parent_path`.
    pub async fn find_children<'e, E>(
        &self,
        executor: E,
        parent_path: &str,
    ) -> AppResult<Vec<Entry>>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Entry>(
            "SELECT * FROM entries WHERE path = $1 \
             ORDER BY (file_id IS NOT NULL), name ASC",
        )
        .bind(parent_path)
        .fetch_all(executor)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list children", e))
    }

    /// List every entry at or below the canonical path `root`.
    ///
    /// Matches `path = root` or a `root/` prefix by exact string
    /// comparison; names containing `%` or `_` are not treated as
    /// wildcards.
    pub async fn find_subtree<'e, E>(&self, executor: E, root: &str) -> AppResult<Vec<Entry>>
    where
        E: PgExecutor<'e>,
    {
        let query = if root == path::ROOT {
            sqlx::query_as::<_, Entry>(
                "SELECT * FROM entries WHERE left(path, 1) = $1 ORDER BY path, name",
            )
        } else {
            sqlx::query_as::<_, Entry>(
                "SELECT * FROM entries \
                 WHERE path = $1 OR left(path, length($1) + 1) = $1 || '/' \
                 ORDER BY path, name",
            )
        };
        query
            .bind(root)
            .fetch_all(executor)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load subtree", e))
    }

    /// Insert an entry row.
    pub async fn insert(&self, conn: &mut PgConnection, entry: &Entry) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO entries (id, name, path, file_id, owner_id, created_by, created_at, \
             last_modified_at, last_modified_by, old_path, size_in_bytes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(entry.id)
        .bind(&entry.name)
        .bind(&entry.path)
        .bind(entry.file_id)
        .bind(entry.owner_id)
        .bind(entry.created_by)
        .bind(entry.created_at)
        .bind(entry.last_modified_at)
        .bind(entry.last_modified_by)
        .bind(&entry.old_path)
        .bind(entry.size_in_bytes)
        .execute(conn)
        .await
        .map_err(|e| super::map_write_error(e, "Failed to insert entry"))?;
        Ok(())
    }

    /// Overwrite the mutable columns of an existing entry.
    pub async fn update(&self, conn: &mut PgConnection, entry: &Entry) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE entries SET name = $2, path = $3, file_id = $4, owner_id = $5, \
             last_modified_at = $6, last_modified_by = $7, old_path = $8, size_in_bytes = $9 \
             WHERE id = $1",
        )
        .bind(entry.id)
        .bind(&entry.name)
        .bind(&entry.path)
        .bind(entry.file_id)
        .bind(entry.owner_id)
        .bind(entry.last_modified_at)
        .bind(entry.last_modified_by)
        .bind(&entry.old_path)
        .bind(entry.size_in_bytes)
        .execute(conn)
        .await
        .map_err(|e| super::map_write_error(e, "Failed to update entry"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Entry {} not found", entry.id)));
        }
        Ok(())
    }

    /// Delete an entry row. Its permission rows cascade.
    pub async fn delete(&self, conn: &mut PgConnection, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM entries WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await
            .map_err(|e| super::map_write_error(e, "Failed to delete entry"))?;
        Ok(())
    }
}
