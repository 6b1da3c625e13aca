//! Request records accepted by [`ShareService`](super::ShareService).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use archivehub_entity::permission::AllowedOperations;

/// Grant, update, or revoke one employee's access to an entry.
///
/// `view == false` revokes. `edit` only counts together with `view`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareRequest {
    /// The employee receiving the grant.
    pub employee_id: Uuid,
    /// Whether the employee may view.
    pub view: bool,
    /// Whether the employee may also edit (share onward, create children).
    #[serde(default)]
    pub edit: bool,
    /// When the grant stops applying; `None` = never.
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

impl ShareRequest {
    /// Grant `{View}`.
    pub fn view(employee_id: Uuid) -> Self {
        Self {
            employee_id,
            view: true,
            edit: false,
            expiry: None,
        }
    }

    /// Grant `{View, Edit}`.
    pub fn view_edit(employee_id: Uuid) -> Self {
        Self {
            edit: true,
            ..Self::view(employee_id)
        }
    }

    /// Revoke every right.
    pub fn revoke(employee_id: Uuid) -> Self {
        Self {
            view: false,
            ..Self::view(employee_id)
        }
    }

    /// Set the expiry.
    pub fn expiring_at(mut self, expiry: DateTime<Utc>) -> Self {
        self.expiry = Some(expiry);
        self
    }

    /// Whether this request removes access.
    pub fn is_revoke(&self) -> bool {
        !self.view
    }

    /// The operation set this request grants; empty for a revoke.
    pub fn operations(&self) -> AllowedOperations {
        match (self.view, self.edit) {
            (false, _) => AllowedOperations::empty(),
            (true, false) => AllowedOperations::view(),
            (true, true) => AllowedOperations::view_edit(),
        }
    }
}
