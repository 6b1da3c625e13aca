//! Table and JSON output formatting for CLI commands.

use serde::Serialize;
use tabled::{Table, Tabled};

use archivehub_entity::entry::Entry;

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

/// Entry display row for table output
#[derive(Debug, Serialize, Tabled)]
pub struct EntryRow {
    /// Entry ID
    pub id: String,
    /// Kind
    pub kind: String,
    /// Canonical path
    pub path: String,
    /// Size in bytes
    pub size: String,
    /// Original location while binned
    pub old_path: String,
    /// Last modified at
    pub modified: String,
}

impl From<&Entry> for EntryRow {
    fn from(entry: &Entry) -> Self {
        Self {
            id: entry.id.to_string(),
            kind: entry.kind().to_string(),
            path: entry.canonical_path(),
            size: entry
                .size_in_bytes
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string()),
            old_path: entry.old_path.clone().unwrap_or_default(),
            modified: entry.last_modified_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Print a list of items in the selected format
pub fn print_list<T: Serialize + Tabled>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("No results found.");
            } else {
                println!("{}", Table::new(items));
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string());
            println!("{json}");
        }
    }
}

/// Print a list of entries in the selected format
pub fn print_entries(entries: &[Entry], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            let rows: Vec<EntryRow> = entries.iter().map(EntryRow::from).collect();
            print_list(&rows, format);
        }
        OutputFormat::Json => print_list_json(entries),
    }
}

/// Print a single entry in the selected format
pub fn print_entry(entry: &Entry, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            print_kv("ID", &entry.id.to_string());
            print_kv("Path", &entry.canonical_path());
            print_kv("Kind", entry.kind().as_str());
            if let Some(size) = entry.size_in_bytes {
                print_kv("Size", &format!("{size} bytes"));
            }
            print_kv("Owner", &entry.owner_id.to_string());
            print_kv("Created", &entry.created_at.to_rfc3339());
            print_kv("Modified", &entry.last_modified_at.to_rfc3339());
            if let Some(old_path) = &entry.old_path {
                print_kv("Restores to", old_path);
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(entry).unwrap_or_else(|_| "{}".to_string());
            println!("{json}");
        }
    }
}

fn print_list_json<T: Serialize>(items: &[T]) {
    let json = serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string());
    println!("{json}");
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("✓ {msg}");
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("⚠ {msg}");
}

/// Print an error message
pub fn print_error(msg: &str) {
    eprintln!("✗ {msg}");
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:<16} {}", format!("{key}:"), value);
}
