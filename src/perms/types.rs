//! Core permission types
//!
//! Types shared between the rule compiler, the evaluator, and the client.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Database identifier of a user. `0` means unauthenticated.
pub type UserId = i32;

/// Database identifier of a repository.
pub type RepoId = i32;

/// Repository name, unique within the system (e.g. `github.com/org/repo`).
pub type RepoName = String;

/// The level of access a user holds on a path.
///
/// Sub-repo permissions only distinguish readable from invisible; write
/// access is governed at the repository level, upstream of this engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Perms {
    /// The path is not visible to the user.
    None,
    /// The path may be read.
    Read,
}

impl Perms {
    pub const fn is_read(&self) -> bool {
        matches!(self, Perms::Read)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Perms::None => "none",
            Perms::Read => "read",
        }
    }
}

impl fmt::Display for Perms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One candidate access: a path within a repository.
///
/// Constructed per-call by the authorization layer; `path` may be empty,
/// which stands for the repository itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoContent {
    pub repo: RepoName,
    pub path: String,
}

impl RepoContent {
    pub fn new(repo: impl Into<RepoName>, path: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            path: path.into(),
        }
    }
}

/// Raw sub-repo permissions for one repository, as fetched from the
/// upstream source.
///
/// Each entry is a glob pattern; a leading `-` marks an exclusion. Order
/// is significant: later entries take precedence over earlier ones for
/// overlapping matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubRepoPermissions {
    pub paths: Vec<String>,
}

impl SubRepoPermissions {
    pub fn new(paths: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perms_is_read() {
        assert!(Perms::Read.is_read());
        assert!(!Perms::None.is_read());
    }

    #[test]
    fn test_perms_display() {
        assert_eq!(Perms::Read.to_string(), "read");
        assert_eq!(Perms::None.to_string(), "none");
    }

    #[test]
    fn test_perms_serde_roundtrip() {
        let json = serde_json::to_string(&Perms::Read).unwrap();
        assert_eq!(json, r#""read""#);
        let parsed: Perms = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Perms::Read);
    }

    #[test]
    fn test_sub_repo_permissions_new() {
        let perms = SubRepoPermissions::new(["/src/**", "-/src/secret/**"]);
        assert_eq!(perms.paths.len(), 2);
        assert_eq!(perms.paths[1], "-/src/secret/**");
    }
}
