//! Entry entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use archivehub_core::path;

/// Whether an entry is a directory or a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A directory; has no payload.
    Directory,
    /// A file; owns exactly one `FileEntity`.
    File,
}

impl EntryKind {
    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::File => "file",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A node in the virtual file system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Entry {
    /// Unique entry identifier.
    pub id: Uuid,
    /// Display name, unique among entries sharing `path`.
    pub name: String,
    /// Canonical path of the parent directory (`/`, `/a/b`, `alice_bin`).
    pub path: String,
    /// The payload row; `None` for directories.
    pub file_id: Option<Uuid>,
    /// The employee whose namespace the entry lives in.
    pub owner_id: Uuid,
    /// The employee who created or uploaded the entry.
    pub created_by: Uuid,
    /// When the entry was created.
    pub created_at: DateTime<Utc>,
    /// When the entry was last modified.
    pub last_modified_at: DateTime<Utc>,
    /// Who last modified the entry.
    pub last_modified_by: Uuid,
    /// Path to restore to while the entry sits in a bin.
    pub old_path: Option<String>,
    /// Payload size; files only.
    pub size_in_bytes: Option<i64>,
}

impl Entry {
    /// Build a new directory entry.
    pub fn directory(
        path: impl Into<String>,
        name: impl Into<String>,
        owner_id: Uuid,
        created_by: Uuid,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            path: path.into(),
            file_id: None,
            owner_id,
            created_by,
            created_at: now,
            last_modified_at: now,
            last_modified_by: created_by,
            old_path: None,
            size_in_bytes: None,
        }
    }

    /// Build a new file entry pointing at `file_id`.
    pub fn file(
        path: impl Into<String>,
        name: impl Into<String>,
        file_id: Uuid,
        size_in_bytes: i64,
        owner_id: Uuid,
        created_by: Uuid,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            file_id: Some(file_id),
            size_in_bytes: Some(size_in_bytes),
            ..Self::directory(path, name, owner_id, created_by, now)
        }
    }

    /// Check if this entry is a directory.
    pub fn is_directory(&self) -> bool {
        self.file_id.is_none()
    }

    /// Check if this entry is a file.
    pub fn is_file(&self) -> bool {
        self.file_id.is_some()
    }

    /// Return the entry kind.
    pub fn kind(&self) -> EntryKind {
        if self.is_directory() {
            EntryKind::Directory
        } else {
            EntryKind::File
        }
    }

    /// The entry's own canonical path.
    pub fn canonical_path(&self) -> String {
        path::child_path(&self.path, &self.name)
    }

    /// Check whether `employee_id` owns this entry.
    pub fn is_owned_by(&self, employee_id: Uuid) -> bool {
        self.owner_id == employee_id
    }

    /// Stamp the modification audit fields.
    pub fn touch(&mut self, by: Uuid, at: DateTime<Utc>) {
        self.last_modified_by = by;
        self.last_modified_at = at;
    }
}
