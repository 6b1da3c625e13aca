//! CLI command definitions and dispatch.

pub mod bin;
pub mod download;
pub mod employee;
pub mod entry;
pub mod migrate;
pub mod share;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::output::OutputFormat;
use archivehub_core::config::AppConfig;
use archivehub_core::error::AppError;
use archivehub_core::path;
use archivehub_core::traits::SystemClock;
use archivehub_database::{ArchiveStore, DatabasePool, PgArchiveStore};
use archivehub_service::{ArchiveServices, RequestContext};

/// ArchiveHub: digital entry store with bins and sharing
#[derive(Debug, Parser)]
#[command(name = "archivehub", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Username to act as
    #[arg(long = "as", global = true)]
    pub actor: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Employee management
    Employee(employee::EmployeeArgs),
    /// Create, rename, and browse entries
    Entry(entry::EntryArgs),
    /// Recycle bin management
    Bin(bin::BinArgs),
    /// Sharing management
    Share(share::ShareArgs),
    /// Download a file entry
    Download(download::DownloadArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: &AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, config).await,
            Commands::Employee(args) => employee::execute(args, config, self.format).await,
            Commands::Entry(args) => {
                let session = Session::open(config, self.actor.as_deref()).await?;
                entry::execute(args, &session, self.format).await
            }
            Commands::Bin(args) => {
                let session = Session::open(config, self.actor.as_deref()).await?;
                bin::execute(args, &session, self.format).await
            }
            Commands::Share(args) => {
                let session = Session::open(config, self.actor.as_deref()).await?;
                share::execute(args, &session, self.format).await
            }
            Commands::Download(args) => {
                let session = Session::open(config, self.actor.as_deref()).await?;
                download::execute(args, &session).await
            }
        }
    }
}

/// Helper: open the Postgres-backed store
pub async fn open_store(config: &AppConfig) -> Result<Arc<PgArchiveStore>, AppError> {
    let pool = DatabasePool::connect(&config.database).await?;
    Ok(Arc::new(PgArchiveStore::new(pool.into_pool())))
}

/// A connected archive plus the employee the command acts as.
pub struct Session {
    /// Backing store, for lookups the services do not expose.
    pub store: Arc<PgArchiveStore>,
    /// Archive services over the store.
    pub services: ArchiveServices,
    /// The acting employee.
    pub ctx: RequestContext,
}

impl Session {
    /// Connect and resolve the `--as` employee.
    pub async fn open(config: &AppConfig, actor: Option<&str>) -> Result<Self, AppError> {
        let username = actor.ok_or_else(|| {
            AppError::validation("This command needs an acting employee: pass --as <username>")
        })?;

        let store = open_store(config).await?;
        let employee = store
            .find_employee_by_username(username)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Employee '{username}' not found")))?;

        let services = ArchiveServices::new(
            store.clone(),
            Arc::new(SystemClock),
            config.archive.clone(),
        );

        tracing::debug!(employee_id = %employee.id, username, "Session opened");

        Ok(Self {
            store,
            services,
            ctx: RequestContext::for_employee(&employee),
        })
    }

    /// Resolve an entry given either its ID or its canonical path.
    pub async fn resolve_entry(&self, target: &str) -> Result<Uuid, AppError> {
        if let Ok(id) = Uuid::parse_str(target) {
            return Ok(id);
        }
        let (parent_path, name) = path::parent_and_name(target)
            .ok_or_else(|| AppError::validation(format!("'{target}' does not name an entry")))?;
        self.store
            .find_entry_by_name(&parent_path, &name)
            .await?
            .map(|e| e.id)
            .ok_or_else(|| AppError::not_found(format!("Entry '{target}' not found")))
    }

    /// Resolve an employee by username.
    pub async fn resolve_employee(&self, username: &str) -> Result<Uuid, AppError> {
        self.store
            .find_employee_by_username(username)
            .await?
            .map(|e| e.id)
            .ok_or_else(|| AppError::not_found(format!("Employee '{username}' not found")))
    }
}
