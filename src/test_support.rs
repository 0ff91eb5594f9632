//! Shared test doubles
//!
//! Clock, affinity source and failing backends used by unit and
//! integration tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::domain::{
    AffinityProfile, Article, ArticleQuery, Category, CommentRecord, LikeRecord, Poll,
    PollVoteRecord, ReadingHistoryEntry, RelevanceFeedback, User,
};
use crate::error::{CacheError, FeedError};
use crate::port::{ArticleCounter, CacheStore, Clock, DocumentStore};
use crate::ranking::AffinitySource;

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        let start = Utc
            .with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        Self::at(start)
    }
}

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut guard = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *guard += by;
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Returns a fixed profile and counts how often it was asked.
pub struct CountingAffinitySource {
    profile: Mutex<AffinityProfile>,
    calls: AtomicUsize,
    fail_next: AtomicBool,
}

impl CountingAffinitySource {
    pub fn new(profile: AffinityProfile) -> Self {
        Self {
            profile: Mutex::new(profile),
            calls: AtomicUsize::new(0),
            fail_next: AtomicBool::new(false),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_profile(&self, profile: AffinityProfile) {
        *self.profile.lock().unwrap_or_else(PoisonError::into_inner) = profile;
    }

    /// Makes the next `compute` fail with a store error.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl AffinitySource for CountingAffinitySource {
    async fn compute(&self, _user_id: &str) -> Result<AffinityProfile, FeedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(FeedError::store(
                "compute",
                anyhow::anyhow!("mock aggregation failure"),
            ));
        }
        Ok(self
            .profile
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}

/// Document store whose every call fails.
pub struct FailingDocumentStore;

fn unavailable(operation: &'static str) -> FeedError {
    FeedError::store(operation, anyhow::anyhow!("mock store unavailable"))
}

#[async_trait]
impl DocumentStore for FailingDocumentStore {
    async fn get_user(&self, _user_id: &str) -> Result<Option<User>, FeedError> {
        Err(unavailable("get_user"))
    }

    async fn get_article(&self, _article_id: &str) -> Result<Option<Article>, FeedError> {
        Err(unavailable("get_article"))
    }

    async fn find_articles(&self, _query: &ArticleQuery) -> Result<Vec<Article>, FeedError> {
        Err(unavailable("find_articles"))
    }

    async fn get_articles_by_ids(
        &self,
        _article_ids: &[String],
    ) -> Result<Vec<Article>, FeedError> {
        Err(unavailable("get_articles_by_ids"))
    }

    async fn reading_history(
        &self,
        _user_id: &str,
    ) -> Result<Vec<ReadingHistoryEntry>, FeedError> {
        Err(unavailable("reading_history"))
    }

    async fn comments_by_user(&self, _user_id: &str) -> Result<Vec<CommentRecord>, FeedError> {
        Err(unavailable("comments_by_user"))
    }

    async fn poll_votes_by_user(
        &self,
        _user_id: &str,
    ) -> Result<Vec<PollVoteRecord>, FeedError> {
        Err(unavailable("poll_votes_by_user"))
    }

    async fn get_polls_by_ids(&self, _poll_ids: &[String]) -> Result<Vec<Poll>, FeedError> {
        Err(unavailable("get_polls_by_ids"))
    }

    async fn likes_by_user(&self, _user_id: &str) -> Result<Vec<LikeRecord>, FeedError> {
        Err(unavailable("likes_by_user"))
    }

    async fn relevance_feedback_by_user(
        &self,
        _user_id: &str,
    ) -> Result<Vec<RelevanceFeedback>, FeedError> {
        Err(unavailable("relevance_feedback_by_user"))
    }

    async fn set_interests(
        &self,
        _user_id: &str,
        _interests: &[Category],
    ) -> Result<Option<User>, FeedError> {
        Err(unavailable("set_interests"))
    }

    async fn increment_article_counter(
        &self,
        _article_id: &str,
        _counter: ArticleCounter,
    ) -> Result<(), FeedError> {
        Err(unavailable("increment_article_counter"))
    }

    async fn ensure_reading_history(
        &self,
        _user_id: &str,
        _article_id: &str,
    ) -> Result<(), FeedError> {
        Err(unavailable("ensure_reading_history"))
    }

    async fn record_reading_time(
        &self,
        _user_id: &str,
        _article_id: &str,
        _time_delta: u64,
        _completed: bool,
    ) -> Result<(), FeedError> {
        Err(unavailable("record_reading_time"))
    }

    async fn upsert_like(&self, _user_id: &str, _article_id: &str) -> Result<bool, FeedError> {
        Err(unavailable("upsert_like"))
    }

    async fn append_relevance_feedback(
        &self,
        _feedback: &RelevanceFeedback,
    ) -> Result<(), FeedError> {
        Err(unavailable("append_relevance_feedback"))
    }
}

/// Cache backend that is always down.
pub struct FailingCacheStore;

#[async_trait]
impl CacheStore for FailingCacheStore {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Err(CacheError::Unavailable("mock cache down".to_string()))
    }

    async fn set_with_ttl(
        &self,
        _key: &str,
        _value: Vec<u8>,
        _ttl: Duration,
    ) -> Result<(), CacheError> {
        Err(CacheError::Timeout)
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("mock cache down".to_string()))
    }
}
