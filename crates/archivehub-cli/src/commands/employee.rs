//! Employee management commands.

use chrono::Utc;
use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use archivehub_core::config::AppConfig;
use archivehub_core::error::AppError;
use archivehub_database::{ArchiveStore, WriteBatch};
use archivehub_entity::employee::{Employee, EmployeeRole};

/// Arguments for employee commands
#[derive(Debug, Args)]
pub struct EmployeeArgs {
    /// Employee subcommand
    #[command(subcommand)]
    pub command: EmployeeCommand,
}

/// Employee subcommands
#[derive(Debug, Subcommand)]
pub enum EmployeeCommand {
    /// Register an employee
    Add {
        /// Login name; also names the employee's bin
        username: String,
        /// Role: admin, archivist, or employee
        #[arg(short, long, default_value = "employee")]
        role: String,
        /// Human-readable name
        #[arg(short, long)]
        display_name: Option<String>,
    },
    /// Show an employee
    Show {
        /// Username
        username: String,
    },
}

/// Employee display row for table output
#[derive(Debug, Serialize, Tabled)]
struct EmployeeRow {
    /// Employee ID
    id: String,
    /// Username
    username: String,
    /// Display name
    name: String,
    /// Role
    role: String,
    /// Created at
    created_at: String,
}

impl From<&Employee> for EmployeeRow {
    fn from(e: &Employee) -> Self {
        Self {
            id: e.id.to_string(),
            username: e.username.clone(),
            name: e.display().to_string(),
            role: e.role.to_string(),
            created_at: e.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Execute employee commands
pub async fn execute(
    args: &EmployeeArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let store = super::open_store(config).await?;

    match &args.command {
        EmployeeCommand::Add {
            username,
            role,
            display_name,
        } => {
            let role: EmployeeRole = role.parse()?;
            let mut employee = Employee::new(username.trim(), role, Utc::now());
            employee.display_name = display_name.clone();

            let mut batch = WriteBatch::new();
            batch.insert_employee(employee.clone());
            store.commit(batch).await?;

            output::print_list(&[EmployeeRow::from(&employee)], format);
            output::print_success(&format!("Employee '{}' added", employee.username));
        }
        EmployeeCommand::Show { username } => {
            let employee = store
                .find_employee_by_username(username)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Employee '{username}' not found")))?;
            output::print_list(&[EmployeeRow::from(&employee)], format);
        }
    }

    Ok(())
}
