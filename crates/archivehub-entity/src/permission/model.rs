//! Entry permission entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::operation::{AllowedOperations, EntryOperation};

/// A grant of rights on one entry to one employee.
///
/// Identity is the `(entry_id, employee_id)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct EntryPermission {
    /// The entry the grant applies to.
    pub entry_id: Uuid,
    /// The employee receiving the grant.
    pub employee_id: Uuid,
    /// Granted operations.
    #[sqlx(try_from = "String")]
    pub allowed_operations: AllowedOperations,
    /// When the grant stops applying (None = never).
    pub expiry_date_time: Option<DateTime<Utc>>,
    /// Whether access was granted explicitly here rather than inherited
    /// through propagation from an ancestor.
    pub is_shared_root: bool,
    /// Who issued the grant.
    pub granted_by: Uuid,
    /// When the grant was first created.
    pub created_at: DateTime<Utc>,
}

impl EntryPermission {
    /// Check if the grant has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date_time.is_some_and(|exp| exp <= now)
    }

    /// Check if the grant is live at `now` and contains `op`.
    pub fn allows_at(&self, op: EntryOperation, now: DateTime<Utc>) -> bool {
        !self.is_expired_at(now) && self.allowed_operations.contains(op)
    }
}
