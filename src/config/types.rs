//! Configuration types for subrepo-perms
//!
//! The engine is configured from the host's site configuration. Absence
//! of the `[sub_repo_permissions]` table means the feature is disabled.

use serde::Deserialize;
use std::time::Duration;

/// Default number of users whose compiled rules are kept cached.
pub const DEFAULT_USER_CACHE_SIZE: usize = 1000;

/// Default freshness window for a cached user entry, in seconds.
pub const DEFAULT_USER_CACHE_TTL_SECS: u64 = 10;

/// Root of the site configuration as seen by this crate.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Sub-repo permissions settings
    pub sub_repo_permissions: SubRepoConfig,
}

/// Sub-repo permissions configuration
///
/// All three values are hot-reloadable: the client applies every change
/// atomically, with no restart and no torn reads on in-flight calls.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SubRepoConfig {
    /// Site-wide toggle. Off means every path check short-circuits to
    /// full read access.
    pub enabled: bool,

    /// Capacity of the per-user compiled rule cache
    pub user_cache_size: usize,

    /// Seconds a cached user entry stays fresh
    pub user_cache_ttl_seconds: u64,
}

impl Default for SubRepoConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            user_cache_size: DEFAULT_USER_CACHE_SIZE,
            user_cache_ttl_seconds: DEFAULT_USER_CACHE_TTL_SECS,
        }
    }
}

impl SubRepoConfig {
    /// The cache TTL as a [`Duration`].
    pub fn user_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.user_cache_ttl_seconds)
    }
}
