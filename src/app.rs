use std::sync::Arc;

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::{
    adapter::{
        memory::{InMemoryCacheStore, InMemoryDocumentStore},
        postgres::PgDocumentStore,
        redis::RedisCacheStore,
    },
    config::{CacheBackend, Config, StoreBackend},
    feed::{EngagementRecorder, FeedAssembler, ReadingInsights},
    observability::Telemetry,
    port::{CacheStore, Clock, DocumentStore, SystemClock},
    ranking::{AffinityAggregator, AffinityCache, ArticleScorer},
};

/// Backends selected by configuration, wired into the feed services.
pub struct ComponentRegistry {
    config: Arc<Config>,
    telemetry: Telemetry,
    store: Arc<dyn DocumentStore>,
    affinity_cache: Arc<AffinityCache>,
    assembler: Arc<FeedAssembler>,
    recorder: Arc<EngagementRecorder>,
    insights: Arc<ReadingInsights>,
}

impl ComponentRegistry {
    /// Initializes telemetry and builds every component.
    ///
    /// The Postgres pool connects lazily and must be created inside a
    /// Tokio runtime.
    ///
    /// # Errors
    /// Fails when telemetry, the pool or the Redis client cannot be set up.
    pub fn build(config: Config) -> Result<Self> {
        let telemetry = Telemetry::new()?;
        Self::build_with(config, telemetry, Arc::new(SystemClock))
    }

    /// Same as [`ComponentRegistry::build`] with caller-supplied telemetry and clock.
    ///
    /// # Errors
    /// Fails when the pool or the Redis client cannot be set up.
    pub fn build_with(config: Config, telemetry: Telemetry, clock: Arc<dyn Clock>) -> Result<Self> {
        let config = Arc::new(config);
        let metrics = telemetry.metrics_arc();

        let store: Arc<dyn DocumentStore> = match config.store_backend() {
            StoreBackend::Memory => Arc::new(InMemoryDocumentStore::new()),
            StoreBackend::Postgres => {
                let dsn = config
                    .db_dsn()
                    .context("FEED_DB_DSN is required for the postgres store")?;
                let pool = PgPoolOptions::new()
                    .max_connections(config.db_max_connections())
                    .min_connections(config.db_min_connections())
                    .acquire_timeout(config.db_acquire_timeout())
                    .test_before_acquire(true)
                    .connect_lazy(dsn)
                    .context("failed to configure feed database pool")?;
                Arc::new(PgDocumentStore::new(pool))
            }
        };

        let cache_backend: Arc<dyn CacheStore> = match config.cache_backend() {
            CacheBackend::Memory => Arc::new(InMemoryCacheStore::new(Arc::clone(&clock))),
            CacheBackend::Redis => {
                let url = config
                    .redis_url()
                    .context("FEED_REDIS_URL is required for the redis cache")?;
                Arc::new(
                    RedisCacheStore::new(url, config.cache_key_prefix(), config.cache_timeout())
                        .context("failed to configure redis affinity cache")?,
                )
            }
        };

        let aggregator = Arc::new(AffinityAggregator::new(
            Arc::clone(&store),
            Arc::clone(&metrics),
        ));
        let affinity_cache = Arc::new(AffinityCache::new(
            cache_backend,
            aggregator,
            config.affinity_ttl(),
            Arc::clone(&metrics),
        ));

        let rng = config
            .random_seed()
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        let assembler = Arc::new(
            FeedAssembler::new(
                Arc::clone(&store),
                Arc::clone(&affinity_cache),
                ArticleScorer::new(config.wildcard_probability()),
                Arc::clone(&clock),
                rng,
                metrics,
            )
            .with_candidate_window(config.candidate_window())
            .with_personalized_limit(config.personalized_limit()),
        );
        let recorder = Arc::new(EngagementRecorder::new(
            Arc::clone(&store),
            Arc::clone(&affinity_cache),
            clock,
        ));
        let insights = Arc::new(ReadingInsights::new(Arc::clone(&store)));

        info!(
            store = ?config.store_backend(),
            cache = ?config.cache_backend(),
            ttl_secs = config.affinity_ttl().as_secs(),
            "feed components built"
        );

        Ok(Self {
            config,
            telemetry,
            store,
            affinity_cache,
            assembler,
            recorder,
            insights,
        })
    }

    #[must_use]
    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    #[must_use]
    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    #[must_use]
    pub fn store(&self) -> Arc<dyn DocumentStore> {
        Arc::clone(&self.store)
    }

    #[must_use]
    pub fn affinity_cache(&self) -> Arc<AffinityCache> {
        Arc::clone(&self.affinity_cache)
    }

    #[must_use]
    pub fn assembler(&self) -> Arc<FeedAssembler> {
        Arc::clone(&self.assembler)
    }

    #[must_use]
    pub fn recorder(&self) -> Arc<EngagementRecorder> {
        Arc::clone(&self.recorder)
    }

    #[must_use]
    pub fn insights(&self) -> Arc<ReadingInsights> {
        Arc::clone(&self.insights)
    }
}
