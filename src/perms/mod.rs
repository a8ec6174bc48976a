//! Sub-repo permissions core
//!
//! Path-level read restrictions within a repository the user already has
//! coarse-grained access to.
//!
//! ## Rule model
//!
//! A repository's permissions are an ordered list of glob patterns.
//! A leading `-` marks an exclusion; everything else is an inclusion:
//!
//! ```text
//! /**              # everything...
//! -/storage/**     # ...except the storage tree
//! ```
//!
//! Evaluation is last-match-wins: the compiled rules are scanned from the
//! most recently declared backwards, and the first match decides. Inclusion
//! rules also grant their ancestor directories, so a file browser can walk
//! down to a permitted leaf without being blocked at `/storage/`'s parent.

pub mod evaluator;
pub mod rules;
pub mod types;

pub use evaluator::{FilePermissions, evaluate};
pub use rules::{CompiledRule, RuleSet};
pub use types::{Perms, RepoContent, RepoId, RepoName, SubRepoPermissions, UserId};
