//! Entry lifecycle: creation, shared creation, rename, and content replacement.

pub mod request;
pub mod service;

pub use request::{
    CreateEntryRequest, CreateSharedEntryRequest, FileUpload, RenameEntryRequest,
    UploadSharedEntryRequest,
};
pub use service::EntryService;

use uuid::Uuid;

use archivehub_core::error::AppError;
use archivehub_database::ArchiveStore;
use archivehub_entity::entry::Entry;

/// Load an entry or fail with `NotFound`.
pub(crate) async fn fetch_entry(store: &dyn ArchiveStore, entry_id: Uuid) -> Result<Entry, AppError> {
    store
        .find_entry(entry_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Entry {entry_id} not found")))
}
