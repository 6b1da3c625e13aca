//! Repository implementations for every ArchiveHub table.
//!
//! Repositories hold no connection. Read methods accept any executor, so
//! the same query runs against the pool or inside an open transaction.
//! Write methods take the transaction's connection so that a whole
//! operation commits or rolls back as one unit.

pub mod employee;
pub mod entry;
pub mod file;
pub mod permission;

pub use employee::EmployeeRepository;
pub use entry::EntryRepository;
pub use file::FileRepository;
pub use permission::PermissionRepository;

use archivehub_core::error::{AppError, ErrorKind};

/// Map a write-path sqlx error into an [`AppError`].
///
/// Constraint violations that correspond to domain invariants become
/// `Conflict`; everything else is a `Database` error carrying its source.
pub(crate) fn map_write_error(e: sqlx::Error, context: &str) -> AppError {
    match e {
        sqlx::Error::Database(ref db_err)
            if db_err.constraint() == Some("entries_path_name_key") =>
        {
            AppError::conflict("An entry with the same name already exists at this path")
        }
        sqlx::Error::Database(ref db_err)
            if db_err.constraint() == Some("employees_username_key") =>
        {
            AppError::conflict("Username already exists")
        }
        sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
            AppError::conflict(format!("{context}: referenced row does not exist"))
        }
        _ => AppError::with_source(ErrorKind::Database, context.to_string(), e),
    }
}
