//! Feed assembly: candidate retrieval, scoring and truncation.

use std::collections::{BTreeMap, BTreeSet};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use tracing::{debug, info, instrument};

use crate::domain::{AffinityProfile, Article, ArticleQuery, Category};
use crate::error::FeedError;
use crate::observability::metrics::FeedMetrics;
use crate::port::{Clock, DocumentStore};
use crate::ranking::{AffinityCache, ArticleScorer, category_relevance};

pub const DEFAULT_CANDIDATE_WINDOW: usize = 50;
pub const DEFAULT_PERSONALIZED_LIMIT: usize = 10;
pub const DEVELOPING_STORIES_LIMIT: usize = 10;

/// Retrieval filters shared by both feed paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedFilters {
    pub category: Option<Category>,
    pub subcategory: Option<String>,
    pub developing: Option<bool>,
}

impl FeedFilters {
    #[must_use]
    pub fn category(category: impl Into<Category>) -> Self {
        Self {
            category: Some(category.into()),
            ..Self::default()
        }
    }

    fn query(&self, limit: usize) -> ArticleQuery {
        ArticleQuery::new(limit)
            .with_category(self.category.clone())
            .with_subcategory(self.subcategory.clone())
            .with_developing(self.developing)
    }
}

pub struct FeedAssembler {
    store: Arc<dyn DocumentStore>,
    cache: Arc<AffinityCache>,
    scorer: ArticleScorer,
    clock: Arc<dyn Clock>,
    rng: Mutex<StdRng>,
    metrics: Arc<FeedMetrics>,
    candidate_window: usize,
    personalized_limit: usize,
}

impl FeedAssembler {
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        cache: Arc<AffinityCache>,
        scorer: ArticleScorer,
        clock: Arc<dyn Clock>,
        rng: StdRng,
        metrics: Arc<FeedMetrics>,
    ) -> Self {
        Self {
            store,
            cache,
            scorer,
            clock,
            rng: Mutex::new(rng),
            metrics,
            candidate_window: DEFAULT_CANDIDATE_WINDOW,
            personalized_limit: DEFAULT_PERSONALIZED_LIMIT,
        }
    }

    #[must_use]
    pub fn with_candidate_window(mut self, window: NonZeroUsize) -> Self {
        self.candidate_window = window.get();
        self
    }

    #[must_use]
    pub fn with_personalized_limit(mut self, limit: NonZeroUsize) -> Self {
        self.personalized_limit = limit.get();
        self
    }

    /// Ranked feed for `user_id`.
    ///
    /// Anonymous callers, unknown users and users without declared
    /// interests get the newest matching articles, paginated by
    /// `skip`/`page_size`. Everyone else gets at most the personalized
    /// limit of scored candidates; `page_size` and `skip` do not apply on
    /// that path.
    ///
    /// # Errors
    /// Store and aggregation failures propagate. Cache outages do not.
    #[instrument(skip(self))]
    pub async fn get_personalized_feed(
        &self,
        user_id: Option<&str>,
        filters: &FeedFilters,
        page_size: usize,
        skip: usize,
    ) -> Result<Vec<Article>, FeedError> {
        let user = match user_id {
            Some(id) => self.store.get_user(id).await?,
            None => None,
        };
        let Some(user) = user.filter(|user| user.has_interests()) else {
            self.metrics.feed_requests_chronological.inc();
            debug!(path = "chronological", "serving unranked feed");
            let query = filters.query(page_size).with_skip(skip);
            return self.store.find_articles(&query).await;
        };

        self.metrics.feed_requests_personalized.inc();
        let timer = self.metrics.assemble_duration.start_timer();

        let candidates = self
            .store
            .find_articles(&filters.query(self.candidate_window))
            .await?;
        if candidates.is_empty() {
            debug!(user_id = %user.user_id, "no candidates match filters");
            return Ok(Vec::new());
        }

        let (affinity, relevance) = futures::try_join!(
            self.cache.get_or_compute(&user.user_id),
            category_relevance(self.store.as_ref(), &user.user_id),
        )?;

        let candidate_count = candidates.len();
        let ranked = self.rank(
            candidates,
            &user.declared_interests,
            &affinity,
            &relevance,
            self.clock.now(),
        );
        let elapsed_ms = timer.stop_and_record() * 1000.0;
        info!(
            user_id = %user.user_id,
            candidates = candidate_count,
            returned = ranked.len(),
            elapsed_ms,
            "personalized feed assembled"
        );
        Ok(ranked)
    }

    /// Up to ten developing or breaking articles, newest first.
    ///
    /// # Errors
    /// Propagates store failures.
    #[instrument(skip(self))]
    pub async fn developing_stories(&self) -> Result<Vec<Article>, FeedError> {
        let query = ArticleQuery::new(DEVELOPING_STORIES_LIMIT).highlighted();
        self.store.find_articles(&query).await
    }

    /// Scores every candidate and keeps the top of a stable descending
    /// sort, so equal scores stay in retrieval order.
    fn rank(
        &self,
        candidates: Vec<Article>,
        interests: &BTreeSet<Category>,
        affinity: &AffinityProfile,
        relevance: &BTreeMap<Category, f64>,
        now: DateTime<Utc>,
    ) -> Vec<Article> {
        let mut scored: Vec<(f64, Article)> = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            candidates
                .into_iter()
                .map(|article| {
                    let breakdown = self.scorer.breakdown(
                        &article,
                        interests,
                        affinity,
                        relevance,
                        now,
                        &mut *rng,
                    );
                    if breakdown.wildcard_applied() {
                        self.metrics.wildcard_boosts.inc();
                    }
                    (breakdown.total(), article)
                })
                .collect()
        };
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(self.personalized_limit);
        scored.into_iter().map(|(_, article)| article).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rand::SeedableRng;

    use crate::adapter::memory::{InMemoryCacheStore, InMemoryDocumentStore};
    use crate::domain::User;
    use crate::ranking::cache::DEFAULT_AFFINITY_TTL;
    use crate::test_support::{CountingAffinitySource, FailingDocumentStore, ManualClock};

    fn assembler(store: Arc<dyn DocumentStore>, clock: Arc<ManualClock>) -> FeedAssembler {
        let metrics = Arc::new(FeedMetrics::detached());
        let cache = Arc::new(AffinityCache::new(
            Arc::new(InMemoryCacheStore::new(clock.clone())),
            Arc::new(CountingAffinitySource::new(AffinityProfile::empty())),
            DEFAULT_AFFINITY_TTL,
            metrics.clone(),
        ));
        FeedAssembler::new(
            store,
            cache,
            ArticleScorer::without_wildcard(),
            clock,
            StdRng::seed_from_u64(3),
            metrics,
        )
    }

    #[tokio::test]
    async fn personalized_path_caps_results_and_ignores_skip() {
        let clock = Arc::new(ManualClock::default());
        let store = Arc::new(InMemoryDocumentStore::new());
        store.insert_user(User::new("u").with_interests(["World"]));
        for i in 0..15 {
            store.insert_article(
                Article::new(format!("w{i:02}"), clock.now() - Duration::minutes(i))
                    .with_category("World"),
            );
        }

        let feed = assembler(store, clock)
            .get_personalized_feed(Some("u"), &FeedFilters::default(), 3, 5)
            .await
            .unwrap();
        assert_eq!(feed.len(), DEFAULT_PERSONALIZED_LIMIT);
        // equal scores keep newest-first retrieval order
        assert_eq!(feed[0].article_id, "w00");
        assert_eq!(feed[9].article_id, "w09");
    }

    #[tokio::test]
    async fn unknown_user_gets_chronological_feed() {
        let clock = Arc::new(ManualClock::default());
        let store = Arc::new(InMemoryDocumentStore::new());
        for i in 0..4 {
            store.insert_article(Article::new(format!("a{i}"), clock.now() - Duration::hours(i)));
        }
        let feed = assembler(store, clock)
            .get_personalized_feed(Some("ghost"), &FeedFilters::default(), 2, 1)
            .await
            .unwrap();
        let ids: Vec<_> = feed.iter().map(|a| a.article_id.as_str()).collect();
        assert_eq!(ids, ["a1", "a2"]);
    }

    #[tokio::test]
    async fn developing_stories_include_breaking() {
        let clock = Arc::new(ManualClock::default());
        let store = Arc::new(InMemoryDocumentStore::new());
        store.insert_article(Article::new("calm", clock.now()));
        store.insert_article(Article::new("dev", clock.now() - Duration::hours(2)).developing(true));
        store.insert_article(Article::new("brk", clock.now() - Duration::hours(1)).breaking(true));

        let stories = assembler(store, clock).developing_stories().await.unwrap();
        let ids: Vec<_> = stories.iter().map(|a| a.article_id.as_str()).collect();
        assert_eq!(ids, ["brk", "dev"]);
    }

    #[tokio::test]
    async fn store_outage_surfaces_as_error() {
        let clock = Arc::new(ManualClock::default());
        let result = assembler(Arc::new(FailingDocumentStore), clock)
            .get_personalized_feed(None, &FeedFilters::default(), 10, 0)
            .await;
        assert!(matches!(result, Err(FeedError::Store { .. })));
    }
}
