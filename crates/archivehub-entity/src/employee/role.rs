//! Employee role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Roles an employee can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "employee_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EmployeeRole {
    /// System administrator.
    Admin,
    /// Manages the physical and digital archive.
    Archivist,
    /// Regular staff member.
    Employee,
}

impl EmployeeRole {
    /// Check if this role is an admin.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Archivist => "archivist",
            Self::Employee => "employee",
        }
    }
}

impl fmt::Display for EmployeeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EmployeeRole {
    type Err = archivehub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "archivist" => Ok(Self::Archivist),
            "employee" => Ok(Self::Employee),
            _ => Err(archivehub_core::AppError::validation(format!(
                "Invalid employee role: '{s}'. Expected one of: admin, archivist, employee"
            ))),
        }
    }
}
