//! Sharing commands.

use chrono::{DateTime, Duration, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use super::Session;
use crate::output::{self, OutputFormat};
use archivehub_core::error::AppError;
use archivehub_entity::permission::EntryPermission;
use archivehub_service::SharedEntry;
use archivehub_service::share::ShareRequest;

/// Arguments for share commands
#[derive(Debug, Args)]
pub struct ShareArgs {
    /// Share subcommand
    #[command(subcommand)]
    pub command: ShareCommand,
}

/// Share subcommands
#[derive(Debug, Subcommand)]
pub enum ShareCommand {
    /// Grant or update access for an employee
    Grant {
        /// Entry ID or path
        target: String,
        /// Employee to share with
        username: String,
        /// Also grant Edit
        #[arg(long)]
        edit: bool,
        /// Expiry as an RFC 3339 timestamp
        #[arg(long, conflicts_with = "days")]
        expires: Option<DateTime<Utc>>,
        /// Expiry as a number of days from now
        #[arg(long)]
        days: Option<i64>,
    },
    /// Revoke an employee's access
    Revoke {
        /// Entry ID or path
        target: String,
        /// Employee to revoke
        username: String,
    },
    /// List the permission rows on an entry
    List {
        /// Entry ID or path
        target: String,
    },
    /// List entries shared with you
    Mine,
}

/// Permission display row for table output
#[derive(Debug, Serialize, Tabled)]
struct PermissionRow {
    /// Entry ID
    entry_id: String,
    /// Grantee ID
    employee_id: String,
    /// Granted operations
    operations: String,
    /// Expiry
    expires: String,
    /// Granted explicitly at this entry
    shared_root: bool,
}

impl From<&EntryPermission> for PermissionRow {
    fn from(p: &EntryPermission) -> Self {
        Self {
            entry_id: p.entry_id.to_string(),
            employee_id: p.employee_id.to_string(),
            operations: p.allowed_operations.to_string(),
            expires: format_expiry(p.expiry_date_time),
            shared_root: p.is_shared_root,
        }
    }
}

/// Shared-with-me display row for table output
#[derive(Debug, Serialize, Tabled)]
struct SharedRow {
    /// Entry ID
    id: String,
    /// Kind
    kind: String,
    /// Canonical path
    path: String,
    /// Granted operations
    operations: String,
    /// Expiry
    expires: String,
}

impl From<&SharedEntry> for SharedRow {
    fn from(s: &SharedEntry) -> Self {
        Self {
            id: s.entry.id.to_string(),
            kind: s.entry.kind().to_string(),
            path: s.entry.canonical_path(),
            operations: s.permission.allowed_operations.to_string(),
            expires: format_expiry(s.permission.expiry_date_time),
        }
    }
}

/// Execute share commands
pub async fn execute(
    args: &ShareArgs,
    session: &Session,
    format: OutputFormat,
) -> Result<(), AppError> {
    let shares = &session.services.shares;
    let ctx = &session.ctx;

    match &args.command {
        ShareCommand::Grant {
            target,
            username,
            edit,
            expires,
            days,
        } => {
            let entry_id = session.resolve_entry(target).await?;
            let employee_id = session.resolve_employee(username).await?;

            let mut req = if *edit {
                ShareRequest::view_edit(employee_id)
            } else {
                ShareRequest::view(employee_id)
            };
            let expiry = match (expires, days) {
                (Some(at), _) => Some(*at),
                (None, Some(days)) => Some(Utc::now() + Duration::days(*days)),
                (None, None) => None,
            };
            if let Some(expiry) = expiry {
                req = req.expiring_at(expiry);
            }

            if let Some(permission) = shares.share(ctx, entry_id, req).await? {
                output::print_list(&[PermissionRow::from(&permission)], format);
            }
            output::print_success(&format!("Shared with '{username}'"));
        }
        ShareCommand::Revoke { target, username } => {
            let entry_id = session.resolve_entry(target).await?;
            let employee_id = session.resolve_employee(username).await?;
            shares
                .share(ctx, entry_id, ShareRequest::revoke(employee_id))
                .await?;
            output::print_success(&format!("Revoked access for '{username}'"));
        }
        ShareCommand::List { target } => {
            let entry_id = session.resolve_entry(target).await?;
            let rows: Vec<PermissionRow> = shares
                .list_permissions(ctx, entry_id)
                .await?
                .iter()
                .map(PermissionRow::from)
                .collect();
            output::print_list(&rows, format);
        }
        ShareCommand::Mine => {
            let rows: Vec<SharedRow> = shares
                .shared_with_me(ctx)
                .await?
                .iter()
                .map(SharedRow::from)
                .collect();
            output::print_list(&rows, format);
        }
    }

    Ok(())
}

fn format_expiry(expiry: Option<DateTime<Utc>>) -> String {
    expiry
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "never".to_string())
}
