//! Document store port.
//!
//! Durable collections keyed by opaque string ids. Reads are independent
//! of each other; the aggregator may issue them concurrently.

use async_trait::async_trait;

use crate::domain::{
    Article, ArticleQuery, Category, CommentRecord, LikeRecord, Poll, PollVoteRecord,
    ReadingHistoryEntry, RelevanceFeedback, User,
};
use crate::error::FeedError;

/// Counter columns on an article that interactions increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleCounter {
    Likes,
    Dislikes,
    Views,
}

impl ArticleCounter {
    #[must_use]
    pub fn column(self) -> &'static str {
        match self {
            ArticleCounter::Likes => "likes",
            ArticleCounter::Dislikes => "dislikes",
            ArticleCounter::Views => "view_count",
        }
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, FeedError>;

    async fn get_article(&self, article_id: &str) -> Result<Option<Article>, FeedError>;

    /// Articles matching `query`, newest `published_at` first.
    async fn find_articles(&self, query: &ArticleQuery) -> Result<Vec<Article>, FeedError>;

    /// Point lookups; unknown ids are silently skipped.
    async fn get_articles_by_ids(&self, article_ids: &[String])
    -> Result<Vec<Article>, FeedError>;

    async fn reading_history(&self, user_id: &str)
    -> Result<Vec<ReadingHistoryEntry>, FeedError>;

    async fn comments_by_user(&self, user_id: &str) -> Result<Vec<CommentRecord>, FeedError>;

    async fn poll_votes_by_user(&self, user_id: &str)
    -> Result<Vec<PollVoteRecord>, FeedError>;

    async fn get_polls_by_ids(&self, poll_ids: &[String]) -> Result<Vec<Poll>, FeedError>;

    async fn likes_by_user(&self, user_id: &str) -> Result<Vec<LikeRecord>, FeedError>;

    async fn relevance_feedback_by_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<RelevanceFeedback>, FeedError>;

    /// Replaces declared interests. Returns the updated user, or `None`
    /// when the user does not exist.
    async fn set_interests(
        &self,
        user_id: &str,
        interests: &[Category],
    ) -> Result<Option<User>, FeedError>;

    async fn increment_article_counter(
        &self,
        article_id: &str,
        counter: ArticleCounter,
    ) -> Result<(), FeedError>;

    /// Creates an empty history entry unless one exists already.
    async fn ensure_reading_history(&self, user_id: &str, article_id: &str)
    -> Result<(), FeedError>;

    /// Upsert: `time_delta` is added, `completed` overwrites.
    async fn record_reading_time(
        &self,
        user_id: &str,
        article_id: &str,
        time_delta: u64,
        completed: bool,
    ) -> Result<(), FeedError>;

    /// Returns `true` when the like was newly recorded.
    async fn upsert_like(&self, user_id: &str, article_id: &str) -> Result<bool, FeedError>;

    async fn append_relevance_feedback(&self, feedback: &RelevanceFeedback)
    -> Result<(), FeedError>;
}
