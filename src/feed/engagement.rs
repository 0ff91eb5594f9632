//! Write paths that feed the affinity signals.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::domain::{Category, InteractionAction, RelevanceFeedback, User};
use crate::error::FeedError;
use crate::port::{ArticleCounter, Clock, DocumentStore};
use crate::ranking::AffinityCache;

pub struct EngagementRecorder {
    store: Arc<dyn DocumentStore>,
    cache: Arc<AffinityCache>,
    clock: Arc<dyn Clock>,
}

impl EngagementRecorder {
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        cache: Arc<AffinityCache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            cache,
            clock,
        }
    }

    /// Applies a view, like or dislike to an existing article.
    ///
    /// # Errors
    /// `ArticleNotFound` for unknown ids; store failures otherwise.
    #[instrument(skip(self))]
    pub async fn record_interaction(
        &self,
        user_id: &str,
        article_id: &str,
        action: InteractionAction,
    ) -> Result<(), FeedError> {
        if self.store.get_article(article_id).await?.is_none() {
            return Err(FeedError::ArticleNotFound(article_id.to_string()));
        }

        match action {
            InteractionAction::View => {
                self.store
                    .increment_article_counter(article_id, ArticleCounter::Views)
                    .await?;
                self.store.ensure_reading_history(user_id, article_id).await?;
            }
            InteractionAction::Like => {
                self.store
                    .increment_article_counter(article_id, ArticleCounter::Likes)
                    .await?;
                let inserted = self.store.upsert_like(user_id, article_id).await?;
                debug!(user_id, article_id, inserted, "like recorded");
            }
            InteractionAction::Dislike => {
                self.store
                    .increment_article_counter(article_id, ArticleCounter::Dislikes)
                    .await?;
            }
        }
        Ok(())
    }

    /// Adds `time_spent` seconds to the (user, article) entry and
    /// overwrites its completion flag.
    ///
    /// # Errors
    /// Propagates store failures.
    #[instrument(skip(self))]
    pub async fn report_reading_time(
        &self,
        user_id: &str,
        article_id: &str,
        time_spent: u64,
        completed: bool,
    ) -> Result<(), FeedError> {
        self.store
            .record_reading_time(user_id, article_id, time_spent, completed)
            .await
    }

    /// Appends the feedback and drops the user's cached profile so the
    /// next feed reflects it.
    ///
    /// # Errors
    /// Only the append can fail the call.
    #[instrument(skip(self))]
    pub async fn submit_relevance_feedback(
        &self,
        user_id: &str,
        article_id: &str,
        is_relevant: bool,
    ) -> Result<RelevanceFeedback, FeedError> {
        let feedback = RelevanceFeedback::new(user_id, article_id, is_relevant, self.clock.now());
        self.store.append_relevance_feedback(&feedback).await?;

        if let Err(error) = self.cache.invalidate(user_id).await {
            warn!(user_id, error = %error, "failed to invalidate affinity cache after feedback");
        }
        Ok(feedback)
    }

    /// Replaces the user's declared interests, dropping duplicates.
    ///
    /// # Errors
    /// `UserNotFound` for unknown users; store failures otherwise.
    #[instrument(skip(self, interests))]
    pub async fn update_interests<I, C>(&self, user_id: &str, interests: I) -> Result<User, FeedError>
    where
        I: IntoIterator<Item = C>,
        C: Into<Category>,
    {
        let unique: BTreeSet<Category> = interests.into_iter().map(Into::into).collect();
        let unique: Vec<Category> = unique.into_iter().collect();
        self.store
            .set_interests(user_id, &unique)
            .await?
            .ok_or_else(|| FeedError::UserNotFound(user_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::adapter::memory::{InMemoryCacheStore, InMemoryDocumentStore};
    use crate::domain::Article;
    use crate::observability::metrics::FeedMetrics;
    use crate::ranking::cache::DEFAULT_AFFINITY_TTL;
    use crate::test_support::{CountingAffinitySource, FailingCacheStore, ManualClock};

    fn recorder_with(
        store: Arc<InMemoryDocumentStore>,
        backend: Arc<dyn crate::port::CacheStore>,
    ) -> EngagementRecorder {
        let cache = Arc::new(AffinityCache::new(
            backend,
            Arc::new(CountingAffinitySource::new(Default::default())),
            DEFAULT_AFFINITY_TTL,
            Arc::new(FeedMetrics::detached()),
        ));
        EngagementRecorder::new(store, cache, Arc::new(ManualClock::default()))
    }

    #[tokio::test]
    async fn view_creates_history_once() {
        let store = Arc::new(InMemoryDocumentStore::new());
        store.insert_article(Article::new("a", Utc::now()));
        let clock = Arc::new(ManualClock::default());
        let recorder = recorder_with(store.clone(), Arc::new(InMemoryCacheStore::new(clock)));

        recorder
            .record_interaction("u", "a", InteractionAction::View)
            .await
            .unwrap();
        recorder
            .record_interaction("u", "a", InteractionAction::View)
            .await
            .unwrap();

        let history = store.reading_history("u").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].time_spent, 0);
        assert!(!history[0].completed);
        let article = store.get_article("a").await.unwrap().unwrap();
        assert_eq!(article.view_count, 2);
    }

    #[tokio::test]
    async fn feedback_survives_cache_outage() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let recorder = recorder_with(store.clone(), Arc::new(FailingCacheStore));

        let feedback = recorder
            .submit_relevance_feedback("u", "a", false)
            .await
            .unwrap();
        assert!(!feedback.is_relevant);
        assert_eq!(store.relevance_feedback_count(), 1);
    }

    #[tokio::test]
    async fn update_interests_rejects_unknown_user() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let recorder = recorder_with(store, Arc::new(FailingCacheStore));
        let err = recorder
            .update_interests("ghost", ["Sports"])
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::UserNotFound(id) if id == "ghost"));
    }
}
