//! Entry lifecycle commands.

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};

use super::Session;
use crate::output::{self, OutputFormat};
use archivehub_core::error::AppError;
use archivehub_service::entry::{
    CreateEntryRequest, CreateSharedEntryRequest, FileUpload, RenameEntryRequest,
    UploadSharedEntryRequest,
};

/// Arguments for entry commands
#[derive(Debug, Args)]
pub struct EntryArgs {
    /// Entry subcommand
    #[command(subcommand)]
    pub command: EntryCommand,
}

/// Entry subcommands
#[derive(Debug, Subcommand)]
pub enum EntryCommand {
    /// Create a directory in your own tree
    Mkdir {
        /// Canonical path of the parent directory
        parent: String,
        /// Directory name
        name: String,
    },
    /// Upload a local file into your own tree
    Upload {
        /// Canonical path of the parent directory
        parent: String,
        /// Local file to read
        file: PathBuf,
        /// Entry name (defaults to the local file name)
        #[arg(short, long)]
        name: Option<String>,
        /// Declared MIME type
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Create a directory inside a directory shared with you
    MkdirShared {
        /// Parent directory ID or path
        parent: String,
        /// Directory name
        name: String,
    },
    /// Upload a local file into a directory shared with you
    UploadShared {
        /// Parent directory ID or path
        parent: String,
        /// Local file to read
        file: PathBuf,
        /// Entry name (defaults to the local file name)
        #[arg(short, long)]
        name: Option<String>,
        /// Require Upload rather than Edit on the parent
        #[arg(long)]
        upload_right: bool,
    },
    /// Rename an entry
    Rename {
        /// Entry ID or path
        target: String,
        /// New name
        new_name: String,
    },
    /// Replace the content of a file entry
    Replace {
        /// Entry ID or path
        target: String,
        /// Local file to read
        file: PathBuf,
    },
    /// List the visible children of a directory
    List {
        /// Canonical directory path
        #[arg(default_value = "/")]
        path: String,
    },
    /// Show one entry
    Get {
        /// Entry ID or path
        target: String,
    },
}

/// Execute entry commands
pub async fn execute(
    args: &EntryArgs,
    session: &Session,
    format: OutputFormat,
) -> Result<(), AppError> {
    let entries = &session.services.entries;
    let ctx = &session.ctx;

    match &args.command {
        EntryCommand::Mkdir { parent, name } => {
            let entry = entries
                .create(ctx, CreateEntryRequest::directory(parent, name))
                .await?;
            output::print_entry(&entry, format);
        }
        EntryCommand::Upload {
            parent,
            file,
            name,
            content_type,
        } => {
            let name = entry_name(file, name.as_deref())?;
            let mut upload = read_upload(file).await?;
            if let Some(content_type) = content_type {
                upload = upload.with_content_type(content_type);
            }
            let entry = entries
                .create(ctx, CreateEntryRequest::file(parent, name, upload))
                .await?;
            output::print_entry(&entry, format);
        }
        EntryCommand::MkdirShared { parent, name } => {
            let parent_id = session.resolve_entry(parent).await?;
            let entry = entries
                .create_shared(
                    ctx,
                    parent_id,
                    CreateSharedEntryRequest {
                        name: name.clone(),
                        is_directory: true,
                        file: None,
                    },
                )
                .await?;
            output::print_entry(&entry, format);
        }
        EntryCommand::UploadShared {
            parent,
            file,
            name,
            upload_right,
        } => {
            let parent_id = session.resolve_entry(parent).await?;
            let name = entry_name(file, name.as_deref())?;
            let upload = read_upload(file).await?;
            let entry = if *upload_right {
                entries
                    .upload_shared(ctx, parent_id, UploadSharedEntryRequest { name, file: upload })
                    .await?
            } else {
                entries
                    .create_shared(
                        ctx,
                        parent_id,
                        CreateSharedEntryRequest {
                            name,
                            is_directory: false,
                            file: Some(upload),
                        },
                    )
                    .await?
            };
            output::print_entry(&entry, format);
        }
        EntryCommand::Rename { target, new_name } => {
            let entry_id = session.resolve_entry(target).await?;
            let entry = entries
                .rename(
                    ctx,
                    entry_id,
                    RenameEntryRequest {
                        new_name: new_name.clone(),
                    },
                )
                .await?;
            output::print_success(&format!("Renamed to '{}'", entry.canonical_path()));
        }
        EntryCommand::Replace { target, file } => {
            let entry_id = session.resolve_entry(target).await?;
            let upload = read_upload(file).await?;
            let entry = entries.replace_content(ctx, entry_id, upload).await?;
            output::print_entry(&entry, format);
        }
        EntryCommand::List { path } => {
            let children = entries.list_directory(ctx, path).await?;
            output::print_entries(&children, format);
        }
        EntryCommand::Get { target } => {
            let entry_id = session.resolve_entry(target).await?;
            let entry = entries.get(ctx, entry_id).await?;
            output::print_entry(&entry, format);
        }
    }

    Ok(())
}

/// Read a local file into an upload payload.
async fn read_upload(file: &Path) -> Result<FileUpload, AppError> {
    let data = tokio::fs::read(file)
        .await
        .map_err(|e| AppError::validation(format!("Cannot read '{}': {e}", file.display())))?;
    Ok(FileUpload::new(data))
}

fn entry_name(file: &Path, explicit: Option<&str>) -> Result<String, AppError> {
    if let Some(name) = explicit {
        return Ok(name.to_string());
    }
    file.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| AppError::validation("Cannot derive an entry name; pass --name"))
}
