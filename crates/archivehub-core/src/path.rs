//! Path resolution for the flat, path-indexed entry store.
//!
//! Every entry stores the canonical path of its *parent* directory in
//! `path` and its own name in `name`. The root directory is the literal
//! string `/`; bin namespaces (`{username}_bin`) are synthetic top-level
//! paths that never start with `/`.
//!
//! A descendant of the entry with canonical path `P` is any entry whose
//! `path` equals `P` or begins with `P/`. Store-level subtree scans use
//! exactly this rule.

use crate::error::AppError;

/// The root directory path.
pub const ROOT: &str = "/";

/// Path separator.
pub const SEPARATOR: char = '/';

/// Compute the canonical path of the child `name` living in `parent_path`.
pub fn child_path(parent_path: &str, name: &str) -> String {
    if parent_path == ROOT {
        format!("{ROOT}{name}")
    } else {
        format!("{parent_path}{SEPARATOR}{name}")
    }
}

/// Whether `candidate` is `ancestor` itself or lies below it.
pub fn is_descendant_path(candidate: &str, ancestor: &str) -> bool {
    if candidate == ancestor {
        return true;
    }
    if ancestor == ROOT {
        return candidate.starts_with(ROOT);
    }
    candidate.len() > ancestor.len()
        && candidate.starts_with(ancestor)
        && candidate.as_bytes()[ancestor.len()] == b'/'
}

/// Replace the `old_prefix` of a descendant path with `new_prefix`,
/// keeping whatever follows it. Returns `None` when `path` is not under
/// `old_prefix`.
pub fn rebase_path(path: &str, old_prefix: &str, new_prefix: &str) -> Option<String> {
    if !is_descendant_path(path, old_prefix) {
        return None;
    }
    let suffix = &path[old_prefix.len()..];
    Some(format!("{new_prefix}{suffix}"))
}

/// Split a canonical path into the `(parent path, name)` pair of every
/// directory leading to it, outermost first.
///
/// `/a/b/c` yields `[("/", "a"), ("/a", "b"), ("/a/b", "c")]`; `/` yields
/// nothing.
pub fn ancestors(path: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let mut parent = ROOT.to_string();
    for segment in path.split(SEPARATOR).filter(|s| !s.is_empty()) {
        let next = child_path(&parent, segment);
        out.push((parent, segment.to_string()));
        parent = next;
    }
    out
}

/// Split a canonical path into its parent path and final name.
///
/// `/a/b` → `("/a", "b")`, `/a` → `("/", "a")`. Returns `None` for `/`
/// and for single-segment bin roots, which have no parent entry.
pub fn parent_and_name(path: &str) -> Option<(String, String)> {
    let idx = path.rfind(SEPARATOR)?;
    let name = &path[idx + 1..];
    if name.is_empty() {
        return None;
    }
    let parent = if idx == 0 { ROOT } else { &path[..idx] };
    Some((parent.to_string(), name.to_string()))
}

/// Return the top-level segment of a path, used to key subtree locks.
///
/// `/a/b` → `a`, `alice_bin/docs` → `alice_bin`, `/` → `/`.
pub fn root_segment(path: &str) -> &str {
    path.split(SEPARATOR)
        .find(|s| !s.is_empty())
        .unwrap_or(ROOT)
}

/// The bin namespace owned by `username`.
pub fn bin_root(username: &str, suffix: &str) -> String {
    format!("{username}{suffix}")
}

/// Whether `path` lies inside the bin namespace `bin_root`.
pub fn is_in_bin(path: &str, bin_root: &str) -> bool {
    is_descendant_path(path, bin_root)
}

/// Derive the lower-cased extension from the trailing `.` suffix of `name`.
///
/// Leading-dot names (`.profile`) and names without a dot have no extension.
pub fn extension_of(name: &str) -> String {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => name[idx + 1..].to_lowercase(),
        _ => String::new(),
    }
}

/// Validate an entry name.
pub fn validate_name(name: &str, max_length: usize) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::validation("Entry name cannot be empty"));
    }
    if name.chars().count() > max_length {
        return Err(AppError::validation(format!(
            "Entry name exceeds {max_length} characters"
        )));
    }
    if name.contains(SEPARATOR) {
        return Err(AppError::validation("Entry name cannot contain '/'"));
    }
    if name == "." || name == ".." {
        return Err(AppError::validation("Entry name cannot be '.' or '..'"));
    }
    if name.chars().any(char::is_control) {
        return Err(AppError::validation(
            "Entry name cannot contain control characters",
        ));
    }
    Ok(())
}

/// Validate a user-supplied directory path.
///
/// Accepted: `/` or `/seg(/seg)*` with every segment a valid name. Bin
/// paths are never accepted here; they are only produced internally.
pub fn validate_path(path: &str, max_segment_length: usize) -> Result<(), AppError> {
    if path == ROOT {
        return Ok(());
    }
    if !path.starts_with(ROOT) {
        return Err(AppError::validation(format!(
            "Path '{path}' must start with '/'"
        )));
    }
    if path.ends_with(SEPARATOR) {
        return Err(AppError::validation(format!(
            "Path '{path}' must not end with '/'"
        )));
    }
    for segment in path[1..].split(SEPARATOR) {
        validate_name(segment, max_segment_length)
            .map_err(|e| AppError::validation(format!("Invalid path '{path}': {}", e.message)))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_path() {
        assert_eq!(child_path("/", "docs"), "/docs");
        assert_eq!(child_path("/docs", "2024"), "/docs/2024");
        assert_eq!(child_path("alice_bin", "docs"), "alice_bin/docs");
    }

    #[test]
    fn test_descendant_rule_requires_separator() {
        assert!(is_descendant_path("/docs", "/docs"));
        assert!(is_descendant_path("/docs/a", "/docs"));
        assert!(!is_descendant_path("/docsx", "/docs"));
        assert!(!is_descendant_path("/doc", "/docs"));
        assert!(is_descendant_path("/anything", "/"));
        assert!(!is_descendant_path("alice_bin", "/"));
    }

    #[test]
    fn test_rebase_path() {
        assert_eq!(
            rebase_path("/docs/a/b", "/docs", "alice_bin/docs").as_deref(),
            Some("alice_bin/docs/a/b")
        );
        assert_eq!(
            rebase_path("alice_bin/docs", "alice_bin/docs", "/docs").as_deref(),
            Some("/docs")
        );
        assert_eq!(rebase_path("/other", "/docs", "x"), None);
    }

    #[test]
    fn test_ancestors() {
        assert!(ancestors("/").is_empty());
        assert_eq!(
            ancestors("/a/b"),
            vec![
                ("/".to_string(), "a".to_string()),
                ("/a".to_string(), "b".to_string())
            ]
        );
    }

    #[test]
    fn test_parent_and_name() {
        assert_eq!(
            parent_and_name("/a/b"),
            Some(("/a".to_string(), "b".to_string()))
        );
        assert_eq!(
            parent_and_name("/a"),
            Some(("/".to_string(), "a".to_string()))
        );
        assert_eq!(
            parent_and_name("alice_bin/docs"),
            Some(("alice_bin".to_string(), "docs".to_string()))
        );
        assert_eq!(parent_and_name("/"), None);
        assert_eq!(parent_and_name("alice_bin"), None);
    }

    #[test]
    fn test_root_segment() {
        assert_eq!(root_segment("/a/b"), "a");
        assert_eq!(root_segment("alice_bin/docs"), "alice_bin");
        assert_eq!(root_segment("/"), "/");
    }

    #[test]
    fn test_bin_membership() {
        let bin = bin_root("alice", "_bin");
        assert_eq!(bin, "alice_bin");
        assert!(is_in_bin("alice_bin", &bin));
        assert!(is_in_bin("alice_bin/docs", &bin));
        assert!(!is_in_bin("alice_binder", &bin));
        assert!(!is_in_bin("/alice_bin", &bin));
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("report.PDF"), "pdf");
        assert_eq!(extension_of("archive.tar.gz"), "gz");
        assert_eq!(extension_of("README"), "");
        assert_eq!(extension_of(".profile"), "");
        assert_eq!(extension_of("trailing."), "");
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("report.pdf", 256).is_ok());
        assert!(validate_name("", 256).is_err());
        assert!(validate_name("   ", 256).is_err());
        assert!(validate_name("a/b", 256).is_err());
        assert!(validate_name("..", 256).is_err());
        assert!(validate_name(&"x".repeat(256), 256).is_ok());
        assert!(validate_name(&"x".repeat(257), 256).is_err());
    }

    #[test]
    fn test_validate_path() {
        assert!(validate_path("/", 256).is_ok());
        assert!(validate_path("/docs/2024", 256).is_ok());
        assert!(validate_path("docs", 256).is_err());
        assert!(validate_path("alice_bin", 256).is_err());
        assert!(validate_path("/docs/", 256).is_err());
        assert!(validate_path("/docs//x", 256).is_err());
        assert!(validate_path("/docs/../x", 256).is_err());
    }
}
