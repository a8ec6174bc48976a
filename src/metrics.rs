//! Metrics for the permissions engine
//!
//! Thread-safe counters around the hot path: per-user cache hit/miss and
//! permission-check latency. Counters are atomics updated lock-free; the
//! host scrapes them through [`PermsMetrics::snapshot`], whose field names
//! follow Prometheus conventions.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Upper bucket bounds for the check-latency histogram, in microseconds.
/// A final overflow bucket catches everything above the last bound.
const LATENCY_BUCKET_BOUNDS_US: [u64; 8] = [50, 100, 250, 500, 1_000, 5_000, 25_000, 100_000];

/// Metrics collector for one engine instance.
pub struct PermsMetrics {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    checks: AtomicU64,
    check_errors: AtomicU64,
    latency_sum_us: AtomicU64,
    latency_buckets: [AtomicU64; LATENCY_BUCKET_BOUNDS_US.len() + 1],
}

/// Point-in-time view of all counters.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub sub_repo_perms_cache_hits_total: u64,
    pub sub_repo_perms_cache_misses_total: u64,
    pub sub_repo_perms_checks_total: u64,
    pub sub_repo_perms_check_errors_total: u64,
    pub sub_repo_perms_check_duration_us_sum: u64,
    pub sub_repo_perms_check_duration_us_buckets: Vec<LatencyBucket>,
}

/// One cumulative histogram bucket; `le_us` is `None` for the overflow
/// (`+Inf`) bucket.
#[derive(Debug, Clone, Serialize)]
pub struct LatencyBucket {
    pub le_us: Option<u64>,
    pub count: u64,
}

impl PermsMetrics {
    pub fn new() -> Self {
        Self {
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            checks: AtomicU64::new(0),
            check_errors: AtomicU64::new(0),
            latency_sum_us: AtomicU64::new(0),
            latency_buckets: [const { AtomicU64::new(0) }; LATENCY_BUCKET_BOUNDS_US.len() + 1],
        }
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one permission check and where its latency landed.
    pub fn record_check(&self, duration: Duration, success: bool) {
        self.checks.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.check_errors.fetch_add(1, Ordering::Relaxed);
        }

        let us = duration.as_micros().min(u64::MAX as u128) as u64;
        self.latency_sum_us.fetch_add(us, Ordering::Relaxed);
        let idx = LATENCY_BUCKET_BOUNDS_US
            .iter()
            .position(|bound| us <= *bound)
            .unwrap_or(LATENCY_BUCKET_BOUNDS_US.len());
        self.latency_buckets[idx].fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> u64 {
        self.cache_misses.load(Ordering::Relaxed)
    }

    pub fn checks(&self) -> u64 {
        self.checks.load(Ordering::Relaxed)
    }

    pub fn check_errors(&self) -> u64 {
        self.check_errors.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics. Buckets are cumulative, in
    /// Prometheus histogram style.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut cumulative = 0;
        let mut buckets = Vec::with_capacity(self.latency_buckets.len());
        for (idx, counter) in self.latency_buckets.iter().enumerate() {
            cumulative += counter.load(Ordering::Relaxed);
            buckets.push(LatencyBucket {
                le_us: LATENCY_BUCKET_BOUNDS_US.get(idx).copied(),
                count: cumulative,
            });
        }

        MetricsSnapshot {
            sub_repo_perms_cache_hits_total: self.cache_hits(),
            sub_repo_perms_cache_misses_total: self.cache_misses(),
            sub_repo_perms_checks_total: self.checks(),
            sub_repo_perms_check_errors_total: self.check_errors(),
            sub_repo_perms_check_duration_us_sum: self.latency_sum_us.load(Ordering::Relaxed),
            sub_repo_perms_check_duration_us_buckets: buckets,
        }
    }
}

impl Default for PermsMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_start_at_zero() {
        let metrics = PermsMetrics::new();
        assert_eq!(metrics.cache_hits(), 0);
        assert_eq!(metrics.cache_misses(), 0);
        assert_eq!(metrics.checks(), 0);
        assert_eq!(metrics.check_errors(), 0);
    }

    #[test]
    fn test_record_cache_outcomes() {
        let metrics = PermsMetrics::new();
        metrics.record_cache_hit();
        metrics.record_cache_hit();
        metrics.record_cache_miss();
        assert_eq!(metrics.cache_hits(), 2);
        assert_eq!(metrics.cache_misses(), 1);
    }

    #[test]
    fn test_record_check_counts_errors() {
        let metrics = PermsMetrics::new();
        metrics.record_check(Duration::from_micros(80), true);
        metrics.record_check(Duration::from_micros(80), false);
        assert_eq!(metrics.checks(), 2);
        assert_eq!(metrics.check_errors(), 1);
    }

    #[test]
    fn test_latency_buckets_are_cumulative() {
        let metrics = PermsMetrics::new();
        metrics.record_check(Duration::from_micros(40), true); // bucket le=50
        metrics.record_check(Duration::from_micros(200), true); // bucket le=250
        metrics.record_check(Duration::from_secs(1), true); // overflow

        let snapshot = metrics.snapshot();
        let buckets = &snapshot.sub_repo_perms_check_duration_us_buckets;
        assert_eq!(buckets.len(), LATENCY_BUCKET_BOUNDS_US.len() + 1);
        assert_eq!(buckets[0].count, 1); // <= 50us
        assert_eq!(buckets[2].count, 2); // <= 250us
        let overflow = buckets.last().unwrap();
        assert_eq!(overflow.le_us, None);
        assert_eq!(overflow.count, 3);
    }

    #[test]
    fn test_snapshot_serializes() {
        let metrics = PermsMetrics::new();
        metrics.record_check(Duration::from_micros(10), true);
        let json = serde_json::to_string(&metrics.snapshot()).unwrap();
        assert!(json.contains("sub_repo_perms_checks_total"));
    }
}
