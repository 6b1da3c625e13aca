//! Digital-entry configuration.

use serde::{Deserialize, Serialize};

/// 20 MiB.
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 20 * 1024 * 1024;

/// Maximum entry name length in characters.
pub const DEFAULT_MAX_NAME_LENGTH: usize = 256;

/// Limits applied by the entry services and the naming of bin namespaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Largest accepted file payload in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,
    /// Longest accepted entry name in characters.
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
    /// Suffix appended to a username to form that user's bin namespace.
    #[serde(default = "default_bin_suffix")]
    pub bin_suffix: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: default_max_file_size(),
            max_name_length: default_max_name_length(),
            bin_suffix: default_bin_suffix(),
        }
    }
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE_BYTES
}

fn default_max_name_length() -> usize {
    DEFAULT_MAX_NAME_LENGTH
}

fn default_bin_suffix() -> String {
    "_bin".to_string()
}
