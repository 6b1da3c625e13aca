//! Recycle bin commands.

use clap::{Args, Subcommand};

use super::Session;
use crate::output::{self, OutputFormat};
use archivehub_core::error::AppError;

/// Arguments for bin commands
#[derive(Debug, Args)]
pub struct BinArgs {
    /// Bin subcommand
    #[command(subcommand)]
    pub command: BinCommand,
}

/// Bin subcommands
#[derive(Debug, Subcommand)]
pub enum BinCommand {
    /// Move an entry and its subtree into your bin
    Move {
        /// Entry ID or path
        target: String,
    },
    /// Restore a binned entry to where it came from
    Restore {
        /// Entry ID or path
        target: String,
    },
    /// Permanently delete one binned entry and its subtree
    Delete {
        /// Entry ID or path
        target: String,
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
    /// Permanently delete everything in your bin
    Empty {
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
    /// List the top level of your bin
    List,
}

/// Execute bin commands
pub async fn execute(args: &BinArgs, session: &Session, format: OutputFormat) -> Result<(), AppError> {
    let bin = &session.services.bin;
    let ctx = &session.ctx;

    match &args.command {
        BinCommand::Move { target } => {
            let entry_id = session.resolve_entry(target).await?;
            let entry = bin.move_to_bin(ctx, entry_id).await?;
            output::print_success(&format!(
                "Moved '{}' to {}",
                entry.name,
                bin.bin_root(ctx)
            ));
        }
        BinCommand::Restore { target } => {
            let entry_id = session.resolve_entry(target).await?;
            let entry = bin.restore_from_bin(ctx, entry_id).await?;
            output::print_success(&format!("Restored '{}'", entry.canonical_path()));
        }
        BinCommand::Delete { target, force } => {
            let entry_id = session.resolve_entry(target).await?;
            if !*force && !confirm(&format!("Permanently delete '{target}'?"))? {
                println!("Cancelled.");
                return Ok(());
            }
            let removed = bin.delete_from_bin(ctx, entry_id).await?;
            output::print_success(&format!("Deleted {removed} entries"));
        }
        BinCommand::Empty { force } => {
            if !*force && !confirm("Permanently delete everything in your bin?")? {
                println!("Cancelled.");
                return Ok(());
            }
            let removed = bin.empty_bin(ctx).await?;
            if removed == 0 {
                output::print_warning("Bin is already empty.");
            } else {
                output::print_success(&format!("Deleted {removed} entries"));
            }
        }
        BinCommand::List => {
            let entries = bin.list_bin(ctx).await?;
            output::print_entries(&entries, format);
        }
    }

    Ok(())
}

fn confirm(prompt: &str) -> Result<bool, AppError> {
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| AppError::internal(format!("Input error: {e}")))
}
