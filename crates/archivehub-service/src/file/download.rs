//! File download service: returns payload bytes after an access check.

use std::sync::Arc;

use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use archivehub_core::error::AppError;
use archivehub_database::ArchiveStore;
use archivehub_entity::entry::Entry;
use archivehub_entity::permission::EntryOperation;

use crate::access::AccessEvaluator;
use crate::context::RequestContext;
use crate::entry::fetch_entry;

/// Handles file downloads with access checking.
#[derive(Clone)]
pub struct DownloadService {
    /// Entry store.
    store: Arc<dyn ArchiveStore>,
    /// Ownership and delegated-right checks.
    access: Arc<AccessEvaluator>,
}

impl std::fmt::Debug for DownloadService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadService").finish()
    }
}

/// File metadata and content bytes for a download.
#[derive(Debug, Clone)]
pub struct DownloadResult {
    /// The downloaded entry.
    pub entry: Entry,
    /// Suggested filename for Content-Disposition.
    pub filename: String,
    /// MIME type for Content-Type.
    pub content_type: String,
    /// Content bytes.
    pub data: Bytes,
    /// Content length.
    pub size: usize,
}

impl DownloadService {
    /// Creates a new download service.
    pub fn new(store: Arc<dyn ArchiveStore>, access: Arc<AccessEvaluator>) -> Self {
        Self { store, access }
    }

    /// Downloads a file, checking the `Download` right for non-owners.
    pub async fn download(
        &self,
        ctx: &RequestContext,
        entry_id: Uuid,
    ) -> Result<DownloadResult, AppError> {
        let entry = fetch_entry(self.store.as_ref(), entry_id).await?;

        let Some(file_id) = entry.file_id else {
            return Err(AppError::conflict(format!(
                "'{}' is a directory and cannot be downloaded",
                entry.name
            )));
        };

        self.access
            .require(ctx, &entry, EntryOperation::Download)
            .await?;

        let file = self
            .store
            .find_file(file_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Content of '{}' not found", entry.name)))?;

        let filename = download_filename(&entry.name, &file.file_extension);
        let size = file.file_data.len();

        info!(
            employee_id = %ctx.employee_id,
            entry_id = %entry.id,
            size,
            "File downloaded"
        );

        Ok(DownloadResult {
            entry,
            filename,
            content_type: file.file_type,
            data: Bytes::from(file.file_data),
            size,
        })
    }
}

/// Compose the download filename as `{name}.{extension}`, leaving the name
/// alone when it already carries that extension or there is none.
pub fn download_filename(name: &str, extension: &str) -> String {
    if extension.is_empty() {
        return name.to_string();
    }
    let suffix = format!(".{extension}");
    let lower = name.to_lowercase();
    if lower.ends_with(&suffix.to_lowercase()) {
        name.to_string()
    } else {
        format!("{name}{suffix}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_filename() {
        assert_eq!(download_filename("report.pdf", "pdf"), "report.pdf");
        assert_eq!(download_filename("Report.PDF", "pdf"), "Report.PDF");
        assert_eq!(download_filename("report", "pdf"), "report.pdf");
        assert_eq!(download_filename("LICENSE", ""), "LICENSE");
    }
}
