//! Error types for subrepo-perms
//!
//! This module defines the error hierarchy used throughout the crate.
//! We use `thiserror` for library-style errors that are part of the API;
//! translating them into HTTP statuses (401 for unauthenticated callers,
//! 5xx for the rest) is the host's responsibility.

use crate::perms::types::UserId;
use thiserror::Error;

/// Errors produced by the permissions engine.
///
/// The enum is `Clone` so that a single refresh outcome can be handed
/// verbatim to every caller waiting on the same in-flight fetch.
#[derive(Debug, Clone, Error)]
pub enum PermsError {
    /// A path rule is not a syntactically valid glob.
    #[error("building include matcher for '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The upstream permissions source failed while fetching a user's rules.
    #[error("fetching sub-repo permissions for user {user_id}: {reason}")]
    Fetch { user_id: UserId, reason: String },

    /// An in-flight refresh terminated without producing a result.
    #[error("sub-repo permissions refresh for user {user_id} was aborted")]
    RefreshAborted { user_id: UserId },

    /// The upstream source failed while answering a repo-support probe.
    #[error("checking sub-repo support for '{repo}': {reason}")]
    RepoSupport { repo: String, reason: String },

    /// There is no anonymous access to sub-repo permissions.
    #[error("unauthenticated: anonymous users have no sub-repo permissions")]
    Unauthenticated,
}

impl PermsError {
    /// Whether this error should map to an authentication failure (401)
    /// rather than an internal error (500).
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, PermsError::Unauthenticated)
    }
}

/// Errors surfaced by a [`SubRepoPermissionsGetter`] implementation.
///
/// [`SubRepoPermissionsGetter`]: crate::getter::SubRepoPermissionsGetter
#[derive(Debug, Error)]
pub enum GetterError {
    #[error("permissions backend request failed: {0}")]
    Backend(String),

    #[error("permissions backend timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(String),

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}
