//! Sub-repo permissions client
//!
//! The public entry point of the engine. One instance is constructed at
//! service startup with the upstream getter and handed to the
//! authorization layer; there is no process-wide singleton. The client
//! owns the per-user rule cache and the metrics, and reads its
//! enabled/capacity/TTL settings from atomics so configuration changes
//! never race an in-flight check.

use crate::cache::{RepoRules, UserPermsCache};
use crate::config::types::SubRepoConfig;
use crate::error::PermsError;
use crate::getter::SharedGetter;
use crate::metrics::{MetricsSnapshot, PermsMetrics};
use crate::perms::evaluator::FilePermissions;
use crate::perms::types::{Perms, RepoContent, RepoId, UserId};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::debug;

/// Checks which paths within a repository a user may read.
///
/// Callers are expected to have verified repository-level access already;
/// this client only refines it per path. When the feature is disabled the
/// client is a true no-op: every check answers [`Perms::Read`] without
/// touching the cache or the getter.
pub struct SubRepoPermsClient {
    enabled: AtomicBool,
    getter: SharedGetter,
    cache: UserPermsCache,
    metrics: Arc<PermsMetrics>,
}

impl SubRepoPermsClient {
    /// Create a client over the given permissions source. The client
    /// starts disabled until the first configuration is applied.
    pub fn new(getter: SharedGetter) -> Self {
        let metrics = Arc::new(PermsMetrics::new());
        let cache = UserPermsCache::new(Arc::clone(&getter), Arc::clone(&metrics));
        Self {
            enabled: AtomicBool::new(false),
            getter,
            cache,
            metrics,
        }
    }

    /// Whether sub-repo permission enforcement is currently on.
    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Apply a configuration change. Called by the host's config watcher
    /// on every update; cheap enough to call unconditionally.
    pub fn apply_config(&self, config: &SubRepoConfig) {
        self.enabled.store(config.enabled, Ordering::Relaxed);
        self.cache
            .set_limits(config.user_cache_size, config.user_cache_ttl());
        debug!(enabled = config.enabled, "sub-repo permissions configured");
    }

    /// The user's permission level on one path.
    ///
    /// The whole check (cache lookup, possible refresh, evaluation) is
    /// timed onto the latency histogram, labeled by outcome.
    pub async fn permissions(
        &self,
        user_id: UserId,
        content: &RepoContent,
    ) -> Result<Perms, PermsError> {
        if !self.enabled() {
            return Ok(Perms::Read);
        }

        let started = Instant::now();
        let result = self
            .file_permissions(user_id, &content.repo)
            .await
            .map(|perms| perms.check(&content.path));
        self.metrics.record_check(started.elapsed(), result.is_ok());
        result
    }

    /// A reusable checker bound to one repository's rules for this user.
    ///
    /// Use this instead of [`permissions`](Self::permissions) when many
    /// paths of one repository are checked in a single call, e.g. for a
    /// directory listing. A repository absent from the user's rule map
    /// does not support sub-repo permissions, so it is fully readable.
    pub async fn file_permissions(
        &self,
        user_id: UserId,
        repo: &str,
    ) -> Result<FilePermissions, PermsError> {
        if !self.enabled() {
            return Ok(FilePermissions::all_read());
        }
        if user_id == 0 {
            return Err(PermsError::Unauthenticated);
        }

        let rules: RepoRules = self.cache.compiled_rules(user_id).await?;
        match rules.get(repo) {
            Some(rule_set) => Ok(FilePermissions::restricted(Arc::clone(rule_set))),
            None => Ok(FilePermissions::all_read()),
        }
    }

    /// Keep the paths of `repo` the user may read, preserving order.
    pub async fn filter_paths<I, S>(
        &self,
        user_id: UserId,
        repo: &str,
        paths: I,
    ) -> Result<Vec<String>, PermsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let perms = self.file_permissions(user_id, repo).await?;
        Ok(perms.filter_paths(paths))
    }

    /// Whether the upstream source has sub-repo rules for this repository
    /// at all, independent of any user.
    pub async fn enabled_for_repo(&self, repo: &str) -> Result<bool, PermsError> {
        self.getter
            .repo_supported(repo)
            .await
            .map_err(|e| PermsError::RepoSupport {
                repo: repo.to_string(),
                reason: e.to_string(),
            })
    }

    /// Same as [`enabled_for_repo`](Self::enabled_for_repo), keyed by id.
    pub async fn enabled_for_repo_id(&self, repo_id: RepoId) -> Result<bool, PermsError> {
        self.getter
            .repo_id_supported(repo_id)
            .await
            .map_err(|e| PermsError::RepoSupport {
                repo: repo_id.to_string(),
                reason: e.to_string(),
            })
    }

    /// Point-in-time metrics for host scraping.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    #[cfg(test)]
    pub(crate) fn metrics_inner(&self) -> &PermsMetrics {
        &self.metrics
    }
}
