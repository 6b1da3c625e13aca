//! File download command.

use std::path::PathBuf;

use clap::Args;

use super::Session;
use crate::output;
use archivehub_core::error::AppError;

/// Arguments for the download command
#[derive(Debug, Args)]
pub struct DownloadArgs {
    /// Entry ID or path
    pub target: String,
    /// Destination file or directory (defaults to the current directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Execute the download command
pub async fn execute(args: &DownloadArgs, session: &Session) -> Result<(), AppError> {
    let entry_id = session.resolve_entry(&args.target).await?;
    let download = session.services.downloads.download(&session.ctx, entry_id).await?;

    let dest = match &args.output {
        Some(path) if path.is_dir() => path.join(&download.filename),
        Some(path) => path.clone(),
        None => PathBuf::from(&download.filename),
    };

    tokio::fs::write(&dest, &download.data)
        .await
        .map_err(|e| AppError::internal(format!("Cannot write '{}': {e}", dest.display())))?;

    output::print_success(&format!(
        "Saved {} ({} bytes, {}) to {}",
        download.filename,
        download.size,
        download.content_type,
        dest.display()
    ));
    Ok(())
}
