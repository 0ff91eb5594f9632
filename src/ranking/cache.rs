//! Read-through, time-bounded cache of affinity profiles.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use super::aggregator::AffinitySource;
use crate::domain::AffinityProfile;
use crate::error::{CacheError, FeedError};
use crate::observability::metrics::FeedMetrics;
use crate::port::CacheStore;

pub const DEFAULT_AFFINITY_TTL: Duration = Duration::from_secs(300);

/// Holds at most one profile per user. A cached entry is served unchanged
/// until its TTL elapses or [`AffinityCache::invalidate`] drops it.
///
/// Backend failures never fail a request: reads degrade to a miss and
/// writes are skipped. Concurrent misses for the same user may each
/// recompute; the write is the final step, so an abandoned request
/// leaves no entry behind.
pub struct AffinityCache {
    backend: Arc<dyn CacheStore>,
    source: Arc<dyn AffinitySource>,
    ttl: Duration,
    metrics: Arc<FeedMetrics>,
}

impl AffinityCache {
    #[must_use]
    pub fn new(
        backend: Arc<dyn CacheStore>,
        source: Arc<dyn AffinitySource>,
        ttl: Duration,
        metrics: Arc<FeedMetrics>,
    ) -> Self {
        Self {
            backend,
            source,
            ttl,
            metrics,
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    #[must_use]
    pub fn key(user_id: &str) -> String {
        format!("affinity:{user_id}")
    }

    /// Returns the cached profile if fresh, else computes and stores one.
    ///
    /// # Errors
    /// Only aggregation failures surface; cache failures are absorbed.
    #[instrument(skip(self))]
    pub async fn get_or_compute(&self, user_id: &str) -> Result<AffinityProfile, FeedError> {
        let key = Self::key(user_id);

        if let Some(profile) = self.lookup(&key).await {
            self.metrics.affinity_cache_hits.inc();
            debug!(user_id, "affinity cache hit");
            return Ok(profile);
        }
        self.metrics.affinity_cache_misses.inc();
        debug!(user_id, "affinity cache miss");

        let profile = self.source.compute(user_id).await?;
        self.store(&key, &profile).await;
        Ok(profile)
    }

    /// Drops the user's entry so the next request recomputes.
    ///
    /// # Errors
    /// Returns the backend failure; callers on the feedback path only log it.
    #[instrument(skip(self))]
    pub async fn invalidate(&self, user_id: &str) -> Result<(), CacheError> {
        self.backend.delete(&Self::key(user_id)).await?;
        self.metrics.affinity_invalidations.inc();
        debug!(user_id, "affinity cache entry invalidated");
        Ok(())
    }

    async fn lookup(&self, key: &str) -> Option<AffinityProfile> {
        let bytes = match self.backend.get(key).await {
            Ok(bytes) => bytes?,
            Err(error) => {
                self.metrics.affinity_cache_fallbacks.inc();
                warn!(key, error = %error, "affinity cache read failed; recomputing");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(profile) => Some(profile),
            Err(error) => {
                self.metrics.affinity_cache_fallbacks.inc();
                warn!(key, error = %CacheError::from(error), "discarding undecodable affinity entry");
                None
            }
        }
    }

    async fn store(&self, key: &str, profile: &AffinityProfile) {
        let bytes = match serde_json::to_vec(profile) {
            Ok(bytes) => bytes,
            Err(error) => {
                warn!(key, error = %error, "failed to encode affinity profile");
                return;
            }
        };
        if let Err(error) = self.backend.set_with_ttl(key, bytes, self.ttl).await {
            self.metrics.affinity_cache_fallbacks.inc();
            warn!(key, error = %error, "affinity cache write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    use crate::adapter::memory::InMemoryCacheStore;
    use crate::test_support::{CountingAffinitySource, FailingCacheStore, ManualClock};

    fn profile() -> AffinityProfile {
        let mut profile = AffinityProfile::empty();
        profile.set_completion("Technology".into(), 10.0);
        profile
    }

    fn cache_with_clock() -> (AffinityCache, Arc<CountingAffinitySource>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let backend = Arc::new(InMemoryCacheStore::new(clock.clone()));
        let source = Arc::new(CountingAffinitySource::new(profile()));
        let cache = AffinityCache::new(
            backend,
            source.clone(),
            DEFAULT_AFFINITY_TTL,
            Arc::new(FeedMetrics::detached()),
        );
        (cache, source, clock)
    }

    #[tokio::test]
    async fn second_read_within_ttl_is_served_from_cache() {
        let (cache, source, clock) = cache_with_clock();
        let first = cache.get_or_compute("u").await.unwrap();
        clock.advance(ChronoDuration::seconds(299));
        let second = cache.get_or_compute("u").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(source.calls(), 1);
        assert!((cache.metrics.affinity_cache_hits.get() - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn expired_entry_is_recomputed() {
        let (cache, source, clock) = cache_with_clock();
        cache.get_or_compute("u").await.unwrap();
        clock.advance(ChronoDuration::seconds(300));
        cache.get_or_compute("u").await.unwrap();
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_recomputation() {
        let (cache, source, _clock) = cache_with_clock();
        cache.get_or_compute("u").await.unwrap();
        cache.invalidate("u").await.unwrap();
        cache.get_or_compute("u").await.unwrap();
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn failing_backend_degrades_to_recompute() {
        let source = Arc::new(CountingAffinitySource::new(profile()));
        let cache = AffinityCache::new(
            Arc::new(FailingCacheStore),
            source.clone(),
            DEFAULT_AFFINITY_TTL,
            Arc::new(FeedMetrics::detached()),
        );

        assert_eq!(cache.get_or_compute("u").await.unwrap(), profile());
        assert_eq!(cache.get_or_compute("u").await.unwrap(), profile());
        assert_eq!(source.calls(), 2);
        // one read and one write failure per request
        assert!((cache.metrics.affinity_cache_fallbacks.get() - 4.0).abs() < f64::EPSILON);
        assert!(cache.invalidate("u").await.is_err());
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn backend_outage_is_logged_as_warning() {
        let cache = AffinityCache::new(
            Arc::new(FailingCacheStore),
            Arc::new(CountingAffinitySource::new(profile())),
            DEFAULT_AFFINITY_TTL,
            Arc::new(FeedMetrics::detached()),
        );
        cache.get_or_compute("reader-7").await.unwrap();
        assert!(logs_contain("affinity cache read failed; recomputing"));
        assert!(logs_contain("affinity cache write failed"));
    }

    #[tokio::test]
    async fn undecodable_entry_counts_as_miss() {
        let (cache, source, _clock) = cache_with_clock();
        cache
            .backend
            .set_with_ttl(&AffinityCache::key("u"), b"not json".to_vec(), DEFAULT_AFFINITY_TTL)
            .await
            .unwrap();
        assert_eq!(cache.get_or_compute("u").await.unwrap(), profile());
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn aggregation_failure_is_not_cached() {
        let (cache, source, _clock) = cache_with_clock();
        source.fail_next();
        assert!(cache.get_or_compute("u").await.is_err());
        assert!(cache.get_or_compute("u").await.is_ok());
        assert_eq!(source.calls(), 2);
    }
}
