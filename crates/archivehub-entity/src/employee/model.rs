//! Employee entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::role::EmployeeRole;

/// An employee known to the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Employee {
    /// Unique employee identifier.
    pub id: Uuid,
    /// Unique login name; also names the employee's bin namespace.
    pub username: String,
    /// Human-readable display name.
    pub display_name: Option<String>,
    /// Employee role.
    pub role: EmployeeRole,
    /// When the employee was created.
    pub created_at: DateTime<Utc>,
}

impl Employee {
    /// Create an employee record with a fresh identifier.
    pub fn new(username: impl Into<String>, role: EmployeeRole, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            display_name: None,
            role,
            created_at: now,
        }
    }

    /// Return the display name, falling back to the username.
    pub fn display(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}
