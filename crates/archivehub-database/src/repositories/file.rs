//! File payload repository implementation.

use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

use archivehub_core::error::{AppError, ErrorKind};
use archivehub_core::result::AppResult;
use archivehub_entity::entry::FileEntity;

/// Repository for the `files` table.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileRepository;

impl FileRepository {
    /// Create a new file repository.
    pub fn new() -> Self {
        Self
    }

    /// Load a payload by ID.
    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> AppResult<Option<FileEntity>>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, FileEntity>("SELECT * FROM files WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find file", e))
    }

    /// Insert a payload row.
    pub async fn insert(&self, conn: &mut PgConnection, file: &FileEntity) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO files (id, file_data, file_type, file_extension) VALUES ($1, $2, $3, $4)",
        )
        .bind(file.id)
        .bind(&file.file_data)
        .bind(&file.file_type)
        .bind(&file.file_extension)
        .execute(conn)
        .await
        .map_err(|e| super::map_write_error(e, "Failed to insert file"))?;
        Ok(())
    }

    /// Rewrite the MIME type and extension of a payload.
    pub async fn update_type(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        file_type: &str,
        file_extension: &str,
    ) -> AppResult<()> {
        let result =
            sqlx::query("UPDATE files SET file_type = $2, file_extension = $3 WHERE id = $1")
                .bind(id)
                .bind(file_type)
                .bind(file_extension)
                .execute(conn)
                .await
                .map_err(|e| super::map_write_error(e, "Failed to update file type"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("File {id} not found")));
        }
        Ok(())
    }

    /// Delete a payload row.
    pub async fn delete(&self, conn: &mut PgConnection, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await
            .map_err(|e| super::map_write_error(e, "Failed to delete file"))?;
        Ok(())
    }
}
