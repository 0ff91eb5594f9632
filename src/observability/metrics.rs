//! Prometheus metrics for the ranking core.

use prometheus::{
    Counter, Histogram, Registry, register_counter_with_registry,
    register_histogram_with_registry,
};

const LATENCY_BUCKETS: &[f64] = &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5];

#[derive(Debug, Clone)]
pub struct FeedMetrics {
    // counters
    pub affinity_cache_hits: Counter,
    pub affinity_cache_misses: Counter,
    pub affinity_cache_fallbacks: Counter,
    pub affinity_invalidations: Counter,
    pub affinity_computations: Counter,
    pub feed_requests_personalized: Counter,
    pub feed_requests_chronological: Counter,
    pub wildcard_boosts: Counter,

    // histograms
    pub assemble_duration: Histogram,
    pub affinity_compute_duration: Histogram,
}

impl FeedMetrics {
    /// Registers every collector with `registry`.
    ///
    /// # Errors
    /// Fails when a metric with the same name is already registered.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        Ok(Self {
            affinity_cache_hits: register_counter_with_registry!(
                "feed_affinity_cache_hits_total",
                "Affinity profiles served from cache",
                registry
            )?,
            affinity_cache_misses: register_counter_with_registry!(
                "feed_affinity_cache_misses_total",
                "Affinity cache lookups that required recomputation",
                registry
            )?,
            affinity_cache_fallbacks: register_counter_with_registry!(
                "feed_affinity_cache_fallbacks_total",
                "Cache backend failures downgraded to a miss or skipped write",
                registry
            )?,
            affinity_invalidations: register_counter_with_registry!(
                "feed_affinity_invalidations_total",
                "Affinity cache entries dropped after relevance feedback",
                registry
            )?,
            affinity_computations: register_counter_with_registry!(
                "feed_affinity_computations_total",
                "Affinity profiles computed from behavioral history",
                registry
            )?,
            feed_requests_personalized: register_counter_with_registry!(
                "feed_requests_personalized_total",
                "Feed requests served through the scoring path",
                registry
            )?,
            feed_requests_chronological: register_counter_with_registry!(
                "feed_requests_chronological_total",
                "Feed requests served newest-first without scoring",
                registry
            )?,
            wildcard_boosts: register_counter_with_registry!(
                "feed_wildcard_boosts_total",
                "Candidates that received the discovery wildcard",
                registry
            )?,
            assemble_duration: register_histogram_with_registry!(
                "feed_assemble_duration_seconds",
                "Wall time to assemble a personalized feed",
                LATENCY_BUCKETS.to_vec(),
                registry
            )?,
            affinity_compute_duration: register_histogram_with_registry!(
                "feed_affinity_compute_duration_seconds",
                "Wall time to aggregate one affinity profile",
                LATENCY_BUCKETS.to_vec(),
                registry
            )?,
        })
    }

    /// Metrics bound to a private registry; nothing is exported.
    #[must_use]
    pub fn detached() -> Self {
        match Self::new(&Registry::new()) {
            Ok(metrics) => metrics,
            // A fresh registry cannot hold duplicates.
            Err(err) => unreachable!("fresh registry rejected feed metrics: {err}"),
        }
    }
}
