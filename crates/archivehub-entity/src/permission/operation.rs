//! Operations that can be granted on an entry, and their persisted set form.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use archivehub_core::AppError;

/// A single right a permission row may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntryOperation {
    /// See the entry and its metadata.
    View,
    /// Share onward and create children inside a shared directory.
    Edit,
    /// Rename, replace content, and upload files into a shared directory.
    Upload,
    /// Read the file payload.
    Download,
    /// Inspect and manage the permission rows of the entry.
    ChangePermission,
}

impl EntryOperation {
    /// Every operation, in persisted order.
    pub const ALL: [EntryOperation; 5] = [
        Self::View,
        Self::Edit,
        Self::Upload,
        Self::Download,
        Self::ChangePermission,
    ];

    /// Return the persisted name of the operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "View",
            Self::Edit => "Edit",
            Self::Upload => "Upload",
            Self::Download => "Download",
            Self::ChangePermission => "ChangePermission",
        }
    }
}

impl fmt::Display for EntryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntryOperation {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "view" => Ok(Self::View),
            "edit" => Ok(Self::Edit),
            "upload" => Ok(Self::Upload),
            "download" => Ok(Self::Download),
            "changepermission" | "change_permission" => Ok(Self::ChangePermission),
            _ => Err(AppError::validation(format!(
                "Invalid entry operation: '{s}'"
            ))),
        }
    }
}

/// The set of operations a permission row allows.
///
/// Persisted as a comma-delimited list such as `View,Edit`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllowedOperations(BTreeSet<EntryOperation>);

impl AllowedOperations {
    /// An empty set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// `{View}`.
    pub fn view() -> Self {
        [EntryOperation::View].into_iter().collect()
    }

    /// `{View, Edit}`.
    pub fn view_edit() -> Self {
        [EntryOperation::View, EntryOperation::Edit]
            .into_iter()
            .collect()
    }

    /// Check whether the set contains `op`.
    pub fn contains(&self, op: EntryOperation) -> bool {
        self.0.contains(&op)
    }

    /// Add `op` to the set.
    pub fn insert(&mut self, op: EntryOperation) {
        self.0.insert(op);
    }

    /// Check whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate the operations in persisted order.
    pub fn iter(&self) -> impl Iterator<Item = EntryOperation> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<EntryOperation> for AllowedOperations {
    fn from_iter<I: IntoIterator<Item = EntryOperation>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for AllowedOperations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(EntryOperation::as_str).collect();
        write!(f, "{}", names.join(","))
    }
}

impl FromStr for AllowedOperations {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .filter(|part| !part.trim().is_empty())
            .map(str::parse)
            .collect()
    }
}

impl TryFrom<String> for AllowedOperations {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_ordered_and_comma_delimited() {
        let ops: AllowedOperations = [EntryOperation::Edit, EntryOperation::View]
            .into_iter()
            .collect();
        assert_eq!(ops.to_string(), "View,Edit");
        assert_eq!(AllowedOperations::empty().to_string(), "");
    }

    #[test]
    fn test_parse_tolerates_spacing_and_case() {
        let ops: AllowedOperations = "view, Download ,changePermission".parse().unwrap();
        assert!(ops.contains(EntryOperation::View));
        assert!(ops.contains(EntryOperation::Download));
        assert!(ops.contains(EntryOperation::ChangePermission));
        assert!(!ops.contains(EntryOperation::Edit));
        assert!("".parse::<AllowedOperations>().unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!("View,Delete".parse::<AllowedOperations>().is_err());
    }

    #[test]
    fn test_serializes_as_list() {
        let json = serde_json::to_string(&AllowedOperations::view_edit()).unwrap();
        assert_eq!(json, r#"["View","Edit"]"#);
    }
}
