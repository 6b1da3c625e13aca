//! Request context carrying the acting employee.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use archivehub_entity::employee::{Employee, EmployeeRole};

/// Context for the current request.
///
/// Built by the calling layer and passed into service methods so that
/// every operation knows *who* is acting. The username names the caller's
/// bin namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The acting employee's ID.
    pub employee_id: Uuid,
    /// The acting employee's username.
    pub username: String,
    /// The acting employee's role.
    pub role: EmployeeRole,
    /// Correlation ID for log events.
    pub request_id: Uuid,
}

impl RequestContext {
    /// Creates a new request context with a fresh request ID.
    pub fn new(employee_id: Uuid, username: impl Into<String>, role: EmployeeRole) -> Self {
        Self {
            employee_id,
            username: username.into(),
            role,
            request_id: Uuid::now_v7(),
        }
    }

    /// Creates a context acting as `employee`.
    pub fn for_employee(employee: &Employee) -> Self {
        Self::new(employee.id, employee.username.clone(), employee.role)
    }

    /// Returns whether the current employee is an admin.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
