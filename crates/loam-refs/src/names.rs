//! Ref name validation following git-style conventions.
//!
//! A full ref name (`refs/heads/main`) must start with `refs/`; the part
//! after it, and any short branch name, obeys these rules:
//! - Must be non-empty
//! - Must not contain whitespace, `~`, `^`, `:`, `?`, `*`, `[`, `\`
//! - Must not contain `..` (double dot) or `@{`
//! - Must not end with `.`, `/` or `.lock`
//! - Components between slashes must be non-empty and not start with `.`

use crate::error::{RefError, Result};

/// Characters that are forbidden anywhere in a ref name.
const FORBIDDEN_CHARS: &[char] = &[' ', '\t', '\n', '\r', '~', '^', ':', '?', '*', '[', '\\'];

/// Validate a short branch name such as `main` or `feature/auth`.
///
/// # Examples
///
/// ```
/// use loam_refs::names::validate_branch_name;
///
/// assert!(validate_branch_name("main").is_ok());
/// assert!(validate_branch_name("feature/auth").is_ok());
/// assert!(validate_branch_name("").is_err());
/// assert!(validate_branch_name("bad..name").is_err());
/// ```
pub fn validate_branch_name(name: &str) -> Result<()> {
    check(name).map_err(|reason| RefError::InvalidRefName {
        name: name.to_string(),
        reason,
    })
}

/// Validate a full ref name such as `refs/heads/main`.
pub fn validate_ref_name(name: &str) -> Result<()> {
    let invalid = |reason: String| RefError::InvalidRefName {
        name: name.to_string(),
        reason,
    };
    let rest = name
        .strip_prefix("refs/")
        .ok_or_else(|| invalid("must start with 'refs/'".into()))?;
    check(rest).map_err(invalid)
}

fn check(name: &str) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("name must not be empty".into());
    }
    if let Some(ch) = FORBIDDEN_CHARS.iter().find(|ch| name.contains(**ch)) {
        return Err(format!("contains forbidden character: {ch:?}"));
    }
    if name.contains("..") {
        return Err("must not contain '..'".into());
    }
    if name.contains("@{") {
        return Err("must not contain '@{'".into());
    }
    if name.ends_with('.') || name.ends_with('/') {
        return Err("must not end with '.' or '/'".into());
    }
    if name.ends_with(".lock") {
        return Err("must not end with '.lock'".into());
    }
    for component in name.split('/') {
        if component.is_empty() {
            return Err("path components must not be empty".into());
        }
        if component.starts_with('.') {
            return Err(format!("component must not start with '.': {component:?}"));
        }
    }
    Ok(())
}
