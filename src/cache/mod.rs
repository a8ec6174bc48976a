//! Per-user compiled rule cache
//!
//! Amortizes fetching and compiling a user's full cross-repository rule
//! set. Entries live in a bounded LRU keyed by user id and are considered
//! fresh for a configurable TTL; a stale or absent entry triggers a
//! refresh against the upstream getter, deduplicated per user through a
//! single-flight so N concurrent misses cost one upstream call.

pub(crate) mod singleflight;

use crate::error::PermsError;
use crate::getter::SharedGetter;
use crate::metrics::PermsMetrics;
use crate::perms::rules::RuleSet;
use crate::perms::types::{RepoName, UserId};
use lru::LruCache;
use singleflight::SingleFlight;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

use crate::config::types::{DEFAULT_USER_CACHE_SIZE, DEFAULT_USER_CACHE_TTL_SECS};

/// A user's compiled rules, one entry per repository with sub-repo
/// restrictions. Shared immutably between the cache and all readers.
pub type RepoRules = Arc<HashMap<RepoName, Arc<RuleSet>>>;

/// One cached refresh outcome. Replaced wholesale on refresh, never
/// mutated in place.
#[derive(Clone)]
struct CachedRules {
    repos: RepoRules,
    fetched_at: Instant,
}

/// Bounded, TTL-checked cache of compiled rules per user.
pub struct UserPermsCache {
    getter: SharedGetter,
    entries: Arc<Mutex<LruCache<UserId, CachedRules>>>,
    ttl_ms: AtomicU64,
    flight: SingleFlight<Result<RepoRules, PermsError>>,
    metrics: Arc<PermsMetrics>,
}

impl UserPermsCache {
    pub fn new(getter: SharedGetter, metrics: Arc<PermsMetrics>) -> Self {
        let capacity = NonZeroUsize::new(DEFAULT_USER_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN);
        Self {
            getter,
            entries: Arc::new(Mutex::new(LruCache::new(capacity))),
            ttl_ms: AtomicU64::new(DEFAULT_USER_CACHE_TTL_SECS * 1_000),
            flight: SingleFlight::new(),
            metrics,
        }
    }

    /// Apply a new capacity and TTL. Safe to call concurrently with
    /// lookups; shrinking evicts least-recently-used entries beyond the
    /// new capacity.
    pub fn set_limits(&self, capacity: usize, ttl: Duration) {
        self.ttl_ms
            .store(ttl.as_millis().min(u64::MAX as u128) as u64, Ordering::Relaxed);
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        lock(&self.entries).resize(capacity);
        debug!(
            capacity = capacity.get(),
            ttl_ms = ttl.as_millis() as u64,
            "resized sub-repo perms cache"
        );
    }

    /// The compiled per-repo rules for a user.
    ///
    /// Served from cache when the entry is younger than the TTL;
    /// otherwise fetched from the getter, compiled, stored, and returned.
    /// Concurrent misses for the same user share one fetch and receive
    /// the same result or the same error. Errors are never cached.
    pub async fn compiled_rules(&self, user_id: UserId) -> Result<RepoRules, PermsError> {
        let ttl = Duration::from_millis(self.ttl_ms.load(Ordering::Relaxed));
        {
            let mut entries = lock(&self.entries);
            if let Some(entry) = entries.get(&user_id) {
                if entry.fetched_at.elapsed() <= ttl {
                    trace!(user_id, "sub-repo perms cache hit");
                    self.metrics.record_cache_hit();
                    return Ok(Arc::clone(&entry.repos));
                }
            }
        }
        self.metrics.record_cache_miss();

        let getter = Arc::clone(&self.getter);
        let entries = Arc::clone(&self.entries);
        let refresh = async move {
            debug!(user_id, "refreshing sub-repo permissions");
            let fetched = getter
                .get_by_user(user_id)
                .await
                .map_err(|e| PermsError::Fetch {
                    user_id,
                    reason: e.to_string(),
                })?;

            let mut repos = HashMap::with_capacity(fetched.len());
            for (repo, perms) in fetched {
                let rules = RuleSet::compile(&perms.paths)?;
                repos.insert(repo, Arc::new(rules));
            }
            let repos: RepoRules = Arc::new(repos);

            lock(&entries).put(
                user_id,
                CachedRules {
                    repos: Arc::clone(&repos),
                    fetched_at: Instant::now(),
                },
            );
            Ok(repos)
        };

        match self.flight.run(&user_id.to_string(), refresh).await {
            Some(result) => result,
            None => Err(PermsError::RefreshAborted { user_id }),
        }
    }

    /// Number of users currently cached.
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        warn!("sub-repo perms cache lock poisoned, recovering");
        poisoned.into_inner()
    })
}
