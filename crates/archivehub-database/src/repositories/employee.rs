//! Employee repository implementation.

use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

use archivehub_core::error::{AppError, ErrorKind};
use archivehub_core::result::AppResult;
use archivehub_entity::employee::Employee;

/// Repository for the `employees` table.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmployeeRepository;

impl EmployeeRepository {
    /// Create a new employee repository.
    pub fn new() -> Self {
        Self
    }

    /// Find an employee by ID.
    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> AppResult<Option<Employee>>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find employee", e))
    }

    /// Find an employee by username.
    pub async fn find_by_username<'e, E>(
        &self,
        executor: E,
        username: &str,
    ) -> AppResult<Option<Employee>>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE username = $1")
            .bind(username)
            .fetch_optional(executor)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find employee by username", e)
            })
    }

    /// Insert an employee row.
    pub async fn insert(&self, conn: &mut PgConnection, employee: &Employee) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO employees (id, username, display_name, role, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(employee.id)
        .bind(&employee.username)
        .bind(&employee.display_name)
        .bind(employee.role)
        .bind(employee.created_at)
        .execute(conn)
        .await
        .map_err(|e| super::map_write_error(e, "Failed to insert employee"))?;
        Ok(())
    }
}
