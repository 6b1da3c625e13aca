//! Request records accepted by [`EntryService`](super::EntryService).

use serde::{Deserialize, Serialize};
use validator::Validate;

use archivehub_core::path;
use archivehub_entity::entry::FileEntity;

/// File content supplied by the caller.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct FileUpload {
    /// Raw bytes.
    pub data: Vec<u8>,
    /// MIME type declared by the uploader; guessed from the name when absent.
    pub content_type: Option<String>,
}

impl std::fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileUpload")
            .field("size", &self.data.len())
            .field("content_type", &self.content_type)
            .finish()
    }
}

impl FileUpload {
    /// Upload `data` with no declared content type.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            content_type: None,
        }
    }

    /// Declare the MIME type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Payload size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Build the payload row for a file called `name`.
    pub(crate) fn into_file_entity(self, name: &str) -> FileEntity {
        let content_type = self
            .content_type
            .filter(|ct| !ct.trim().is_empty())
            .unwrap_or_else(|| guess_content_type(name));
        FileEntity::new(self.data, content_type, path::extension_of(name))
    }
}

/// Guess a MIME type from a file name.
pub(crate) fn guess_content_type(name: &str) -> String {
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Request to create an entry in the caller's own tree.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateEntryRequest {
    /// Canonical path of the parent directory.
    #[validate(length(min = 1, message = "Path cannot be empty"))]
    pub path: String,
    /// Entry name.
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: String,
    /// Whether to create a directory rather than a file.
    pub is_directory: bool,
    /// File content; required for files, forbidden for directories.
    pub file: Option<FileUpload>,
}

impl CreateEntryRequest {
    /// A directory named `name` inside `path`.
    pub fn directory(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            is_directory: true,
            file: None,
        }
    }

    /// A file named `name` inside `path` holding `file`.
    pub fn file(path: impl Into<String>, name: impl Into<String>, file: FileUpload) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            is_directory: false,
            file: Some(file),
        }
    }
}

/// Request to create a child inside a directory shared with the caller.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSharedEntryRequest {
    /// Entry name.
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: String,
    /// Whether to create a directory rather than a file.
    pub is_directory: bool,
    /// File content; required for files, forbidden for directories.
    pub file: Option<FileUpload>,
}

/// Request to upload a file into a directory shared with the caller.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UploadSharedEntryRequest {
    /// File name.
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: String,
    /// File content.
    pub file: FileUpload,
}

/// Request to rename an entry.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RenameEntryRequest {
    /// The new name.
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub new_name: String,
}
