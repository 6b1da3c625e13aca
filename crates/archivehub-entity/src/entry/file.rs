//! Binary payload of a file entry.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The stored content of a file entry.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct FileEntity {
    /// Unique payload identifier.
    pub id: Uuid,
    /// Raw content.
    #[serde(skip_serializing, default)]
    pub file_data: Vec<u8>,
    /// MIME type.
    pub file_type: String,
    /// Lower-cased extension without the dot; empty when the name has none.
    pub file_extension: String,
}

impl FileEntity {
    /// Create a payload row with a fresh identifier.
    pub fn new(
        file_data: Vec<u8>,
        file_type: impl Into<String>,
        file_extension: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_data,
            file_type: file_type.into(),
            file_extension: file_extension.into(),
        }
    }

    /// Payload size in bytes.
    pub fn size(&self) -> usize {
        self.file_data.len()
    }
}

impl std::fmt::Debug for FileEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileEntity")
            .field("id", &self.id)
            .field("size", &self.file_data.len())
            .field("file_type", &self.file_type)
            .field("file_extension", &self.file_extension)
            .finish()
    }
}
